// layout/mod.rs
//
// Map layout: viewport size + stage count -> ordered marker positions.
// Pure arithmetic over percentages of the viewport; no DOM, no state.
//
// Usage:
//   let points = layout(Vec2::new(1920.0, 1080.0), 25, LayoutMode::Formation, 24.0);
//   camera.center_on(points[stage].pos());

pub mod buffer;
pub mod camera;
pub mod formation;
pub mod parity;
pub mod redraw;
pub mod zigzag;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use buffer::{PointBuffer, PointInstance, PointState};
pub use camera::MapCamera;
pub use redraw::{RedrawGuard, RedrawToken};

/// Viewport used when the page reports a non-positive size.
pub const FALLBACK_VIEWPORT: Vec2 = Vec2::new(1920.0, 1080.0);

/// Marker placement heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Two 12-player football formations facing each other, final at centre.
    #[default]
    Formation,
    /// Snake through a grid sized to the viewport's aspect ratio.
    ZigZag,
    /// Even stages on the left, odd stages on the right.
    Parity,
}

/// Which half of the pitch a marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Football role of a marker in the formation layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    /// Extra markers beyond the two formations, along the halfway line.
    Waypoint,
    Final,
}

/// One stage marker in screen space. Ephemeral: recomputed on every layout
/// pass and identified only by its position in the returned list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapPoint {
    pub x: f32,
    pub y: f32,
    /// Depth used for the 3D tilt of the marker.
    pub z: f32,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Jersey number shown on the marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl MapPoint {
    pub fn new(pos: Vec2, z: f32, index: usize) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z,
            index,
            side: None,
            role: None,
            number: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Side from the data, or inferred from which half the marker is in.
    pub fn side_in(&self, viewport_width: f32) -> Side {
        self.side.unwrap_or(if self.x < viewport_width / 2.0 {
            Side::Left
        } else {
            Side::Right
        })
    }

    /// Small per-marker yaw so the character does not look stamped out.
    pub fn facing_deg(&self) -> f32 {
        ((self.index * 15) % 360) as f32
    }
}

/// Replace a viewport that is not a finite positive size with `fallback`.
pub fn resolve_viewport(viewport: Vec2, fallback: Vec2) -> Vec2 {
    if viewport.is_finite() && viewport.x > 0.0 && viewport.y > 0.0 {
        viewport
    } else {
        log::warn!(
            "layout: invalid viewport {}x{}, using {}x{}",
            viewport.x,
            viewport.y,
            fallback.x,
            fallback.y
        );
        fallback
    }
}

/// Compute `total_stages` marker positions for a viewport.
///
/// Deterministic for a given input; every point lies within
/// `[padding, dimension - padding]` on both axes (padding is capped at half
/// the dimension on tiny viewports).
pub fn layout(viewport: Vec2, total_stages: usize, mode: LayoutMode, padding: f32) -> Vec<MapPoint> {
    let size = resolve_viewport(viewport, FALLBACK_VIEWPORT);
    let mut points = match mode {
        LayoutMode::Formation => formation::points(size, total_stages),
        LayoutMode::ZigZag => zigzag::points(size, total_stages, padding),
        LayoutMode::Parity => parity::points(size, total_stages, padding),
    };
    clamp_points(&mut points, size, padding);
    points
}

/// Pull every point into the padded viewport rectangle.
pub fn clamp_points(points: &mut [MapPoint], size: Vec2, padding: f32) {
    let pad = Vec2::splat(padding.max(0.0)).min(size * 0.5);
    let min = pad;
    let max = size - pad;
    for p in points.iter_mut() {
        let clamped = p.pos().clamp(min, max);
        p.x = clamped.x;
        p.y = clamped.y;
    }
}

/// Where the ball rests between tosses: bottom centre before the kickoff,
/// on the current marker afterwards.
pub fn ball_rest_position(viewport: Vec2, points: &[MapPoint], current_stage: usize) -> Vec2 {
    let size = resolve_viewport(viewport, FALLBACK_VIEWPORT);
    if current_stage == 0 {
        return kickoff_spot(size);
    }
    points
        .get(current_stage)
        .or_else(|| points.first())
        .map(MapPoint::pos)
        .unwrap_or_else(|| kickoff_spot(size))
}

/// Kickoff spot at the bottom centre of the pitch.
pub fn kickoff_spot(viewport: Vec2) -> Vec2 {
    Vec2::new(viewport.x / 2.0, viewport.y * 0.8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [(f32, f32); 3] = [(1920.0, 1080.0), (375.0, 667.0), (768.0, 1024.0)];
    const MODES: [LayoutMode; 3] = [LayoutMode::Formation, LayoutMode::ZigZag, LayoutMode::Parity];
    const PADDING: f32 = 24.0;

    #[test]
    fn every_mode_returns_n_points_inside_padding() {
        for &(w, h) in &SIZES {
            for &mode in &MODES {
                for n in [1usize, 7, 24, 25, 40] {
                    let points = layout(Vec2::new(w, h), n, mode, PADDING);
                    assert_eq!(points.len(), n, "{:?} {}x{} n={}", mode, w, h, n);
                    for p in &points {
                        assert!(
                            p.x >= PADDING && p.x <= w - PADDING && p.y >= PADDING && p.y <= h - PADDING,
                            "{:?} {}x{} point {} at ({}, {}) escapes padding",
                            mode, w, h, p.index, p.x, p.y
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn indices_are_sequential() {
        for &mode in &MODES {
            let points = layout(Vec2::new(1920.0, 1080.0), 25, mode, PADDING);
            for (i, p) in points.iter().enumerate() {
                assert_eq!(p.index, i);
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        for &mode in &MODES {
            let a = layout(Vec2::new(375.0, 667.0), 25, mode, PADDING);
            let b = layout(Vec2::new(375.0, 667.0), 25, mode, PADDING);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn zero_stages_is_empty() {
        assert!(layout(Vec2::new(800.0, 600.0), 0, LayoutMode::Formation, PADDING).is_empty());
    }

    #[test]
    fn invalid_viewport_uses_fallback() {
        let a = layout(Vec2::new(0.0, -5.0), 25, LayoutMode::Formation, PADDING);
        let b = layout(FALLBACK_VIEWPORT, 25, LayoutMode::Formation, PADDING);
        assert_eq!(a, b);
    }

    #[test]
    fn non_finite_viewport_uses_fallback() {
        for bad in [Vec2::new(f32::NAN, 800.0), Vec2::new(1024.0, f32::INFINITY)] {
            let points = layout(bad, 25, LayoutMode::ZigZag, PADDING);
            assert_eq!(points, layout(FALLBACK_VIEWPORT, 25, LayoutMode::ZigZag, PADDING));
            for p in &points {
                assert!(p.x.is_finite() && p.y.is_finite());
            }
        }
        let custom = Vec2::new(800.0, 600.0);
        assert_eq!(resolve_viewport(Vec2::new(f32::NAN, 1.0), custom), custom);
    }

    #[test]
    fn huge_padding_does_not_panic() {
        let points = layout(Vec2::new(40.0, 40.0), 5, LayoutMode::ZigZag, 100.0);
        for p in &points {
            assert_eq!(p.pos(), Vec2::new(20.0, 20.0));
        }
    }

    #[test]
    fn ball_starts_at_kickoff_spot() {
        let size = Vec2::new(1000.0, 500.0);
        let points = layout(size, 25, LayoutMode::Formation, PADDING);
        assert_eq!(ball_rest_position(size, &points, 0), Vec2::new(500.0, 400.0));
        assert_eq!(ball_rest_position(size, &points, 3), points[3].pos());
    }

    #[test]
    fn side_is_inferred_when_missing() {
        let p = MapPoint::new(Vec2::new(100.0, 10.0), 0.0, 0);
        assert_eq!(p.side_in(800.0), Side::Left);
        let p = MapPoint::new(Vec2::new(700.0, 10.0), 0.0, 0);
        assert_eq!(p.side_in(800.0), Side::Right);
    }
}
