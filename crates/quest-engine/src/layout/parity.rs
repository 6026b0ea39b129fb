use glam::Vec2;

use super::{MapPoint, Side};

const LEFT_X: f32 = 0.25;
const RIGHT_X: f32 = 0.75;

/// Even stages on the left column, odd stages on the right, walking down the
/// padded height in equal steps.
pub fn points(size: Vec2, n: usize, padding: f32) -> Vec<MapPoint> {
    if n == 0 {
        return Vec::new();
    }

    let pad = padding.max(0.0).min(size.y / 2.0);
    let step = (size.y - 2.0 * pad) / n as f32;

    (0..n)
        .map(|i| {
            let (side, fx) = if i % 2 == 0 {
                (Side::Left, LEFT_X)
            } else {
                (Side::Right, RIGHT_X)
            };
            let pos = Vec2::new(size.x * fx, pad + (i as f32 + 0.5) * step);
            MapPoint::new(pos, 5.0 * (i % 5) as f32, i)
                .with_side(side)
                .with_number(i as u32 + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_sides() {
        let pts = points(Vec2::new(800.0, 600.0), 6, 24.0);
        for p in &pts {
            let expected = if p.index % 2 == 0 { Side::Left } else { Side::Right };
            assert_eq!(p.side, Some(expected));
        }
        assert_eq!(pts[0].x, 200.0);
        assert_eq!(pts[1].x, 600.0);
    }

    #[test]
    fn walks_downwards() {
        let pts = points(Vec2::new(375.0, 667.0), 25, 24.0);
        for w in pts.windows(2) {
            assert!(w[1].y > w[0].y);
        }
    }
}
