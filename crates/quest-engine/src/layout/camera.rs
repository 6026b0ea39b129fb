use glam::Vec2;
use serde::Serialize;

/// Pan for the map container so that a marker sits in the middle of the
/// viewport. The map is the same size as the viewport; the camera only
/// translates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    /// Visible area in pixels.
    pub viewport: Vec2,
    /// Current container translation in pixels.
    pub offset: Vec2,
}

/// A camera move for the page: translate the map container to `offset`,
/// either with a transition or in one jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraMove {
    pub x: f32,
    pub y: f32,
    pub instant: bool,
}

impl MapCamera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            offset: Vec2::ZERO,
        }
    }

    /// Translation that puts `target` at the viewport centre.
    pub fn offset_for(&self, target: Vec2) -> Vec2 {
        self.viewport * 0.5 - target
    }

    /// Centre the camera on `target` and describe the move.
    pub fn center_on(&mut self, target: Vec2, instant: bool) -> CameraMove {
        self.offset = self.offset_for(target);
        CameraMove {
            x: self.offset.x,
            y: self.offset.y,
            instant,
        }
    }

    /// New viewport size. The stale translation is dropped so the next
    /// redraw starts from an untransformed map.
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.offset = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centering_on_viewport_centre_is_identity() {
        let mut cam = MapCamera::new(Vec2::new(800.0, 600.0));
        let mv = cam.center_on(Vec2::new(400.0, 300.0), true);
        assert_eq!(Vec2::new(mv.x, mv.y), Vec2::ZERO);
        assert!(mv.instant);
    }

    #[test]
    fn target_lands_at_centre() {
        let mut cam = MapCamera::new(Vec2::new(375.0, 667.0));
        let target = Vec2::new(30.0, 500.0);
        cam.center_on(target, false);
        assert_eq!(target + cam.offset, Vec2::new(187.5, 333.5));
    }

    #[test]
    fn resize_resets_pan() {
        let mut cam = MapCamera::new(Vec2::new(800.0, 600.0));
        cam.center_on(Vec2::new(10.0, 10.0), false);
        cam.resize(Vec2::new(1024.0, 768.0));
        assert_eq!(cam.offset, Vec2::ZERO);
        assert_eq!(cam.offset_for(Vec2::new(512.0, 384.0)), Vec2::ZERO);
    }
}
