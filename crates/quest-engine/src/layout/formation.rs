use glam::Vec2;

use super::{MapPoint, Role, Side};

/// One line of a formation: role, distance from the own goal line as a
/// fraction of the width, vertical offsets from the centre as fractions of
/// the height, and marker depth.
struct Line {
    role: Role,
    x: f32,
    y_offsets: &'static [f32],
    z: f32,
}

/// Left-side formation. The right side mirrors it around the halfway line.
const LINES: [Line; 4] = [
    Line { role: Role::Goalkeeper, x: 0.08, y_offsets: &[0.0], z: 0.0 },
    Line { role: Role::Defender, x: 0.15, y_offsets: &[-0.15, 0.0, 0.15], z: 5.0 },
    Line { role: Role::Midfielder, x: 0.25, y_offsets: &[-0.2, -0.07, 0.07, 0.2], z: 10.0 },
    Line { role: Role::Forward, x: 0.38, y_offsets: &[-0.18, -0.06, 0.06, 0.18], z: 15.0 },
];

/// Players per side.
pub const SIDE_PLAYERS: usize = 12;
const FINAL_Z: f32 = 30.0;
const WAYPOINT_Z: f32 = 20.0;

/// Both formations in visiting order: left goalkeeper to left forwards, then
/// right goalkeeper to right forwards. Numbers restart at 1 on each side.
fn players(size: Vec2) -> Vec<MapPoint> {
    let center_y = size.y / 2.0;
    let mut out = Vec::with_capacity(SIDE_PLAYERS * 2);
    for side in [Side::Left, Side::Right] {
        let mut number = 1;
        for line in &LINES {
            let fx = match side {
                Side::Right => 1.0 - line.x,
                _ => line.x,
            };
            for &dy in line.y_offsets {
                let pos = Vec2::new(size.x * fx, center_y + size.y * dy);
                out.push(
                    MapPoint::new(pos, line.z, out.len())
                        .with_side(side)
                        .with_role(line.role)
                        .with_number(number),
                );
                number += 1;
            }
        }
    }
    out
}

/// Extra markers for quests longer than two formations plus the final,
/// split between a band above and a band below the centre spot.
fn waypoints(size: Vec2, count: usize) -> Vec<MapPoint> {
    let top = (count + 1) / 2;
    let bottom = count / 2;
    let band = |start: f32, k: usize, n: usize| size.y * (start + 0.27 * (k as f32 + 0.5) / n as f32);

    (0..top)
        .map(|k| band(0.08, k, top))
        .chain((0..bottom).map(|k| band(0.65, k, bottom)))
        .map(|y| {
            MapPoint::new(Vec2::new(size.x / 2.0, y), WAYPOINT_Z, 0)
                .with_side(Side::Center)
                .with_role(Role::Waypoint)
        })
        .collect()
}

/// Formation layout for `n` stages. The last stage is always the centre
/// spot; earlier stages take formation slots in order, overflowing onto the
/// halfway line.
pub fn points(size: Vec2, n: usize) -> Vec<MapPoint> {
    if n == 0 {
        return Vec::new();
    }

    let before_final = n - 1;
    let mut out: Vec<MapPoint> = players(size).into_iter().take(before_final).collect();
    let overflow = before_final - out.len();
    out.extend(waypoints(size, overflow));
    out.push(
        MapPoint::new(size / 2.0, FINAL_Z, 0)
            .with_side(Side::Center)
            .with_role(Role::Final),
    );

    for (i, p) in out.iter_mut().enumerate() {
        p.index = i;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_quest_is_two_formations_and_final() {
        let size = Vec2::new(1920.0, 1080.0);
        let pts = points(size, 25);
        assert_eq!(pts.len(), 25);

        assert_eq!(pts[0].role, Some(Role::Goalkeeper));
        assert_eq!(pts[0].side, Some(Side::Left));
        assert!((pts[0].x - 1920.0 * 0.08).abs() < 0.01);
        assert_eq!(pts[0].y, 540.0);

        assert_eq!(pts[12].role, Some(Role::Goalkeeper));
        assert_eq!(pts[12].side, Some(Side::Right));
        assert!((pts[12].x - 1920.0 * 0.92).abs() < 0.01);
        assert_eq!(pts[12].number, Some(1));
        assert_eq!(pts[23].number, Some(12));

        let last = pts[24];
        assert_eq!(last.role, Some(Role::Final));
        assert_eq!(last.pos(), Vec2::new(960.0, 540.0));
        assert_eq!(last.z, 30.0);
    }

    #[test]
    fn depth_follows_the_line() {
        let pts = points(Vec2::new(800.0, 600.0), 25);
        assert_eq!(pts[1].z, 5.0);
        assert_eq!(pts[4].z, 10.0);
        assert_eq!(pts[8].z, 15.0);
    }

    #[test]
    fn right_side_mirrors_left() {
        let size = Vec2::new(1000.0, 800.0);
        let pts = points(size, 25);
        for i in 0..SIDE_PLAYERS {
            let l = pts[i];
            let r = pts[i + SIDE_PLAYERS];
            assert!((l.x + r.x - size.x).abs() < 0.01);
            assert_eq!(l.y, r.y);
        }
    }

    #[test]
    fn short_quest_still_ends_at_centre() {
        let pts = points(Vec2::new(800.0, 600.0), 3);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[2].role, Some(Role::Final));
        assert_eq!(pts[1].role, Some(Role::Defender));
    }

    #[test]
    fn long_quest_overflows_to_halfway_line() {
        let pts = points(Vec2::new(800.0, 600.0), 30);
        assert_eq!(pts.len(), 30);
        let waypoints: Vec<_> = pts.iter().filter(|p| p.role == Some(Role::Waypoint)).collect();
        assert_eq!(waypoints.len(), 5);
        for w in waypoints {
            assert_eq!(w.x, 400.0);
            assert_ne!(w.y, 300.0);
        }
    }
}
