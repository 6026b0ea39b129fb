use glam::Vec2;

use super::MapPoint;

/// Column count for `n` markers so grid cells stay roughly square.
pub fn columns(size: Vec2, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let aspect = size.x / size.y;
    let cols = (n as f32 * aspect).sqrt().ceil() as usize;
    cols.clamp(1, n)
}

/// Snake layout: left to right on even rows, right to left on odd rows,
/// each marker centred in its grid cell inside the padded area.
pub fn points(size: Vec2, n: usize, padding: f32) -> Vec<MapPoint> {
    if n == 0 {
        return Vec::new();
    }

    let cols = columns(size, n);
    let rows = n.div_ceil(cols);
    let pad = padding.max(0.0).min(size.x.min(size.y) / 2.0);
    let cell = Vec2::new(
        (size.x - 2.0 * pad) / cols as f32,
        (size.y - 2.0 * pad) / rows as f32,
    );

    (0..n)
        .map(|i| {
            let row = i / cols;
            let mut col = i % cols;
            if row % 2 == 1 {
                col = cols - 1 - col;
            }
            let pos = Vec2::new(
                pad + (col as f32 + 0.5) * cell.x,
                pad + (row as f32 + 0.5) * cell.y,
            );
            // Alternate rows step toward the viewer
            let z = if row % 2 == 0 { 0.0 } else { 10.0 };
            MapPoint::new(pos, z, i).with_number(i as u32 + 1)
        })
        .collect()
}
