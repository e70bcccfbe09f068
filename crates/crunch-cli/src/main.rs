use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use crunch_core::config::{parse_padding, parse_page_size, Options};
use crunch_core::pipeline::{BuildJob, BuildOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "crunch",
    about = "Pack sprites into power-of-two texture atlases",
    version,
    disable_help_flag = true
)]
struct Cli {
    /// Output path prefix; the directory part is the output directory,
    /// the file part (without extension) the atlas name
    #[arg(value_name = "outputPrefix")]
    output_prefix: String,

    /// Comma-separated input files and directories
    #[arg(value_name = "input1,input2,...")]
    inputs: String,

    /// Palette file constraining the output pngs (act, jasc, mspal,
    /// gimp, paint.net or png)
    #[arg(value_name = "paletteFilename")]
    palette: Option<PathBuf>,

    /// Save the atlas data in xml, binary or json format
    #[arg(short, long, default_value = "xml", value_name = "xml|bin|json")]
    output: String,

    /// Texture format tag copied into the manifest
    #[arg(short = 'f', long = "format", default_value_t = 0, value_name = "n")]
    texture_format: i32,

    /// Premultiply the pixels of the bitmaps by their alpha channel
    #[arg(short, long, action = ArgAction::SetTrue)]
    alpha: bool,

    /// Trim excess transparency off the bitmaps
    #[arg(short, long, action = ArgAction::SetTrue)]
    trim: bool,

    /// Print progress as the packer works
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Ignore the stored hash, forcing a repack
    #[arg(short, long, action = ArgAction::SetTrue)]
    ignore: bool,

    /// Remove duplicate bitmaps from the atlas
    #[arg(short, long, action = ArgAction::SetTrue)]
    unique: bool,

    /// Enable rotating bitmaps 90 degrees clockwise when packing
    #[arg(short, long, action = ArgAction::SetTrue)]
    rotate: bool,

    /// Max atlas size (4096, 2048, 1024, 512, 256, 128 or 64)
    #[arg(short, long, default_value = "4096", value_name = "n")]
    size: String,

    /// Max atlas width (overrides --size)
    #[arg(short, long, value_name = "n")]
    width: Option<String>,

    /// Max atlas height (overrides --size)
    #[arg(short = 'h', long, value_name = "n")]
    height: Option<String>,

    /// Padding between images (0 to 16)
    #[arg(short, long, default_value = "1", value_name = "n")]
    padding: String,

    /// String type in the binary format: n (null-terminated),
    /// p (int16 prefixed), 7 (7-bit prefixed), f (fixed 16 bytes)
    #[arg(short, long, default_value = "n", value_name = "n|p|7|f")]
    binstr: String,

    /// Hash file modification times instead of file contents
    #[arg(short, long, action = ArgAction::SetTrue)]
    last: bool,

    /// Split output textures by subdirectories
    #[arg(short, long, action = ArgAction::SetTrue)]
    dirs: bool,

    /// Omit the 0 suffix when only one texture is packed
    #[arg(short, long, action = ArgAction::SetTrue)]
    nozero: bool,

    /// Print help
    #[arg(long, action = ArgAction::HelpLong)]
    help: Option<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<BuildOutcome> {
    let options = build_options(cli)?;
    let (output_dir, name) = split_output_prefix(&cli.output_prefix);
    fs::create_dir_all(&output_dir)?;

    let job = BuildJob {
        output_dir,
        name: name.clone(),
        inputs: cli.inputs.split(',').map(str::to_string).collect(),
        args: std::env::args().skip(1).collect(),
        options,
    };
    let outcome = job.run()?;
    if outcome == BuildOutcome::Unchanged {
        println!("atlas is unchanged: {name}");
    }
    Ok(outcome)
}

fn build_options(cli: &Cli) -> anyhow::Result<Options> {
    let size = parse_page_size(&cli.size)?;
    let max_width = match &cli.width {
        Some(w) => parse_page_size(w)?,
        None => size,
    };
    let max_height = match &cli.height {
        Some(h) => parse_page_size(h)?,
        None => size,
    };
    Ok(Options {
        output_format: cli.output.parse()?,
        texture_format: cli.texture_format,
        alpha: cli.alpha,
        trim: cli.trim,
        verbose: cli.verbose,
        ignore: cli.ignore,
        unique: cli.unique,
        rotate: cli.rotate,
        max_width,
        max_height,
        padding: parse_padding(&cli.padding)?,
        binstr: cli.binstr.parse()?,
        last: cli.last,
        dirs: cli.dirs,
        nozero: cli.nozero,
        palette_file: cli.palette.clone(),
    })
}

/// Splits `bin/atlases/atlas` into (`bin/atlases/`, `atlas`), dropping
/// any extension from the name part.
fn split_output_prefix(prefix: &str) -> (PathBuf, String) {
    let normalized = prefix.replace('\\', "/");
    let (dir, file) = match normalized.rfind('/') {
        Some(i) => (&normalized[..=i], &normalized[i + 1..]),
        None => ("", normalized.as_str()),
    };
    let name = match file.rfind('.') {
        Some(i) => &file[..i],
        None => file,
    };
    let dir = if dir.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(dir)
    };
    (dir, name.to_string())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
