use super::Rect;

/// Free-rectangle scoring heuristics. Lower scores win; ties keep the
/// first candidate in free-list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heuristic {
    #[default]
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
}

/// A successful insertion. `w`/`h` are the stored (post-rotation) sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub rotated: bool,
}

/// MaxRects bin: maintains the set of maximal free rectangles inside the
/// page, starting from one rectangle covering the whole bin.
pub struct MaxRectsBin {
    free: Vec<Rect>,
}

impl MaxRectsBin {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            free: vec![Rect::new(0, 0, width, height)],
        }
    }

    /// Places a `w` x `h` rectangle at the best-scoring free rectangle's
    /// top-left, trying the rotated orientation too when `allow_rotate`.
    /// Returns `None` when no free rectangle can hold it.
    pub fn insert(
        &mut self,
        w: u32,
        h: u32,
        allow_rotate: bool,
        heuristic: Heuristic,
    ) -> Option<Placed> {
        if w == 0 || h == 0 {
            return None;
        }
        let (node, rotated) = self.find_position(w, h, allow_rotate, heuristic)?;
        self.place(&node);
        Some(Placed {
            x: node.x,
            y: node.y,
            w: node.w,
            h: node.h,
            rotated,
        })
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    fn score(fr: &Rect, w: u32, h: u32, heuristic: Heuristic) -> (i64, i64) {
        let leftover_h = i64::from(fr.w) - i64::from(w);
        let leftover_v = i64::from(fr.h) - i64::from(h);
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        match heuristic {
            Heuristic::BestShortSideFit => (short_fit, long_fit),
            Heuristic::BestLongSideFit => (long_fit, short_fit),
            Heuristic::BestAreaFit => (
                i64::from(fr.w) * i64::from(fr.h) - i64::from(w) * i64::from(h),
                short_fit,
            ),
            Heuristic::BottomLeft => (i64::from(fr.y) + i64::from(h), i64::from(fr.x)),
        }
    }

    fn find_position(
        &self,
        w: u32,
        h: u32,
        allow_rotate: bool,
        heuristic: Heuristic,
    ) -> Option<(Rect, bool)> {
        let mut best: Option<(Rect, bool, (i64, i64))> = None;
        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                let score = Self::score(fr, w, h, heuristic);
                if best.as_ref().map_or(true, |(_, _, s)| score < *s) {
                    best = Some((Rect::new(fr.x, fr.y, w, h), false, score));
                }
            }
            if allow_rotate && fr.w >= h && fr.h >= w {
                let score = Self::score(fr, h, w, heuristic);
                if best.as_ref().map_or(true, |(_, _, s)| score < *s) {
                    best = Some((Rect::new(fr.x, fr.y, h, w), true, score));
                }
            }
        }
        best.map(|(rect, rotated, _)| (rect, rotated))
    }

    /// Splits every intersecting free rectangle around `node`, then
    /// prunes rectangles contained in another so the list stays maximal.
    fn place(&mut self, node: &Rect) {
        let mut split: Vec<Rect> = Vec::new();
        let mut i = 0;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(node) {
                self.free.swap_remove(i);
                split_free_node(fr, node, &mut split);
            } else {
                i += 1;
            }
        }
        self.free.extend(split.into_iter().filter(|r| r.w > 0 && r.h > 0));
        self.prune();
    }

    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Cuts the parts of `fr` not covered by `node` into up to four maximal
/// sub-rectangles: left/right keep the full height, top/bottom the full
/// width.
fn split_free_node(fr: Rect, node: &Rect, out: &mut Vec<Rect>) {
    let fr_x2 = fr.x + fr.w;
    let fr_y2 = fr.y + fr.h;
    let n_x2 = node.x + node.w;
    let n_y2 = node.y + node.h;

    if node.x > fr.x && node.x < fr_x2 {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    if n_x2 < fr_x2 {
        out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
    }
    if node.y > fr.y && node.y < fr_y2 {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    if n_y2 < fr_y2 {
        out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
    }
}
