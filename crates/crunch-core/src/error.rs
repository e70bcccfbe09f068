use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrunchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to decode png: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("failed to encode png: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to read aseprite file: {0}")]
    Aseprite(#[from] asefile::AsepriteParseError),

    #[error("failed to serialize manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not read palette: {}", .path.display())]
    Palette { path: PathBuf },

    #[error("packing failed, could not fit bitmap: {name}")]
    PackFailure { name: String },
}

pub type Result<T> = std::result::Result<T, CrunchError>;
