use crunch_core::packer::{Heuristic, MaxRectsBin, Placed};

fn disjoint(placed: &[Placed]) -> bool {
    for i in 0..placed.len() {
        for j in (i + 1)..placed.len() {
            let a = &placed[i];
            let b = &placed[j];
            let overlap = !(a.x >= b.x + b.w
                || b.x >= a.x + a.w
                || a.y >= b.y + b.h
                || b.y >= a.y + a.h);
            if overlap {
                return false;
            }
        }
    }
    true
}

#[test]
fn placements_are_disjoint_and_in_bounds() {
    let mut bin = MaxRectsBin::new(256, 256);
    let rects = [
        (64, 64),
        (32, 64),
        (64, 32),
        (48, 48),
        (16, 80),
        (80, 16),
        (40, 40),
        (30, 50),
        (50, 30),
    ];
    let mut placed = Vec::new();
    for (w, h) in rects {
        match bin.insert(w, h, true, Heuristic::BestShortSideFit) {
            Some(p) => placed.push(p),
            None => break,
        }
    }
    assert_eq!(placed.len(), rects.len());
    assert!(disjoint(&placed));
    for p in &placed {
        assert!(p.x + p.w <= 256);
        assert!(p.y + p.h <= 256);
    }
}

#[test]
fn full_bin_rejects_insert() {
    let mut bin = MaxRectsBin::new(64, 64);
    assert!(bin.insert(64, 64, false, Heuristic::BestShortSideFit).is_some());
    assert_eq!(bin.free_count(), 0);
    assert!(bin.insert(1, 1, false, Heuristic::BestShortSideFit).is_none());
}

#[test]
fn oversized_rect_is_rejected() {
    let mut bin = MaxRectsBin::new(64, 64);
    assert!(bin.insert(65, 10, false, Heuristic::BestShortSideFit).is_none());
    assert!(bin.insert(0, 10, false, Heuristic::BestShortSideFit).is_none());
}
