//! 2D segment tests used for visibility culling

use glam::Vec2;

/// 2D cross product (z component)
#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Whether the closed segments `a1-a2` and `b1-b2` share at least one point
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = cross(r, s);
    let qp = b1 - a1;

    if denom.abs() < f32::EPSILON {
        // Parallel. Only collinear overlap counts.
        if cross(qp, r).abs() > f32::EPSILON {
            return false;
        }
        let rr = r.length_squared();
        if rr == 0.0 {
            return point_on_segment(a1, b1, b2);
        }
        let t0 = qp.dot(r) / rr;
        let t1 = t0 + s.dot(r) / rr;
        let (lo, hi) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        return hi >= 0.0 && lo <= 1.0;
    }

    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

fn point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    let ab = b - a;
    if cross(p - a, ab).abs() > f32::EPSILON {
        return false;
    }
    let t = (p - a).dot(ab);
    t >= 0.0 && t <= ab.length_squared()
}

/// Whether a line from `p1` to `p2` can touch a `width` x `height` pixel area.
///
/// Either endpoint inside the area, or the segment crossing one of its edges.
pub fn segment_touches_rect(p1: Vec2, p2: Vec2, width: f32, height: f32) -> bool {
    let inside = |p: Vec2| p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height;
    if inside(p1) || inside(p2) {
        return true;
    }
    let tl = Vec2::new(0.0, 0.0);
    let tr = Vec2::new(width, 0.0);
    let bl = Vec2::new(0.0, height);
    let br = Vec2::new(width, height);
    segments_intersect(p1, p2, tl, bl)
        || segments_intersect(p1, p2, tr, br)
        || segments_intersect(p1, p2, tl, tr)
        || segments_intersect(p1, p2, bl, br)
}
