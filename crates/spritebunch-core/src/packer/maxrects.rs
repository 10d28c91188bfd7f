use super::FreeRectBin;
use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

/// MaxRects bin: keeps every maximal free rectangle and splits all of them that a
/// placement touches.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    bounds: Rect,
    allow_rotation: bool,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl MaxRectsBin {
    pub fn new(width: u32, height: u32, allow_rotation: bool) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        Self {
            bounds,
            allow_rotation,
            free: if bounds.is_empty() { Vec::new() } else { vec![bounds] },
            used: Vec::new(),
        }
    }

    fn rect_right_ex(r: &Rect) -> u32 {
        r.x + r.w
    }
    fn rect_bottom_ex(r: &Rect) -> u32 {
        r.y + r.h
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::new();
        let mut i = 0usize;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(node) {
                self.free.swap_remove(i);
                Self::split_free_node(fr, node, &mut new_free);
            } else {
                i += 1;
            }
        }
        new_free.retain(|r| !r.is_empty());
        self.free.extend(new_free);
        self.prune_free_list();
        self.used.push(*node);
    }

    fn split_free_node(fr: Rect, node: &Rect, out: &mut Vec<Rect>) {
        let fr_x2 = Self::rect_right_ex(&fr);
        let fr_y2 = Self::rect_bottom_ex(&fr);
        let n_x2 = Self::rect_right_ex(node);
        let n_y2 = Self::rect_bottom_ex(node);

        // left
        if node.x > fr.x && node.x < fr_x2 {
            out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
        }
        // right
        if n_x2 < fr_x2 {
            out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
        }
        // top
        if node.y > fr.y && node.y < fr_y2 {
            out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
        }
        // bottom
        if n_y2 < fr_y2 {
            out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
        }
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            let a = self.free[i];
            let mut remove_i = false;
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

    fn score(&self, heuristic: MaxRectsHeuristic, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = (fr.w as i64 - w as i64).abs();
        let leftover_v = (fr.h as i64 - h as i64).abs();
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as i64 * h as i64);
        match heuristic {
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y as i64 + h as i64, fr.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                // maximize contact score: use negative for minimization
                let contact = self.contact_point_score(fr.x, fr.y, w, h);
                (-(contact as i64), area_fit)
            }
        }
    }

    fn find_position(&self, heuristic: MaxRectsHeuristic, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<((i64, i64, u32, u32), Rect)> = None;

        let mut consider = |key: (i64, i64, u32, u32), rect: Rect| {
            if best.as_ref().is_none_or(|(k, _)| key < *k) {
                best = Some((key, rect));
            }
        };

        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                // perfect fit early-out
                if fr.w == w && fr.h == h {
                    return Some(Rect::new(fr.x, fr.y, w, h));
                }
                let (s1, s2) = self.score(heuristic, fr, w, h);
                // tie-break: smaller top side (y + h), then smaller x
                consider((s1, s2, fr.y + h, fr.x), Rect::new(fr.x, fr.y, w, h));
            }
            if self.allow_rotation && w != h && fr.w >= h && fr.h >= w {
                if fr.w == h && fr.h == w {
                    return Some(Rect::new(fr.x, fr.y, h, w));
                }
                let (s1, s2) = self.score(heuristic, fr, h, w);
                consider((s1, s2, fr.y + w, fr.x), Rect::new(fr.x, fr.y, h, w));
            }
        }

        best.map(|(_, r)| r)
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let node = Rect::new(x, y, w, h);
        let mut score = 0u32;
        // contact with bin edges
        if node.x == self.bounds.x {
            score += node.h;
        }
        if node.y == self.bounds.y {
            score += node.w;
        }
        if node.x + node.w == Self::rect_right_ex(&self.bounds) {
            score += node.h;
        }
        if node.y + node.h == Self::rect_bottom_ex(&self.bounds) {
            score += node.w;
        }

        // contact with used rectangles
        for u in &self.used {
            if node.x == u.x + u.w || u.x == node.x + node.w {
                score += overlap_1d(node.y, node.y + node.h, u.y, u.y + u.h);
            }
            if node.y == u.y + u.h || u.y == node.y + node.h {
                score += overlap_1d(node.x, node.x + node.w, u.x, u.x + u.w);
            }
        }
        score
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    pub fn used_rects(&self) -> &[Rect] {
        &self.used
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}

impl FreeRectBin for MaxRectsBin {
    fn init(&mut self, width: u32, height: u32, allow_rotation: bool) {
        *self = Self::new(width, height, allow_rotation);
    }

    fn insert(&mut self, width: u32, height: u32, heuristic: MaxRectsHeuristic) -> Option<Rect> {
        if width == 0 || height == 0 {
            return None;
        }
        let place = self.find_position(heuristic, width, height)?;
        self.place_rect(&place);
        Some(place)
    }

    fn occupancy(&self) -> f32 {
        let total = self.bounds.area();
        if total == 0 {
            return 0.0;
        }
        let used: u64 = self.used.iter().map(Rect::area).sum();
        (used as f64 / total as f64) as f32
    }
}
