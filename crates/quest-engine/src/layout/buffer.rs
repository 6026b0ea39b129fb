use bytemuck::{Pod, Zeroable};

use super::{MapPoint, Side};

/// Visit status of a marker relative to the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointState {
    Visited = 0,
    Active = 1,
    /// The one marker the player may tap.
    Next = 2,
    Upcoming = 3,
}

impl PointState {
    pub fn of(index: usize, current_stage: usize) -> Self {
        if index < current_stage {
            PointState::Visited
        } else if index == current_stage {
            PointState::Active
        } else if index == current_stage + 1 {
            PointState::Next
        } else {
            PointState::Upcoming
        }
    }
}

/// Per-marker data read by the page straight out of wasm memory.
/// Must match the page script: 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Zero-based stage index.
    pub index: f32,
    /// 0 = left, 1 = right, 2 = centre.
    pub side: f32,
    /// [`PointState`] as a float.
    pub state: f32,
    /// Jersey number, 0 when the marker has none.
    pub number: f32,
    /// Character yaw in degrees when standing on this marker.
    pub facing: f32,
}

impl PointInstance {
    pub fn from_point(point: &MapPoint, viewport_width: f32, current_stage: usize) -> Self {
        let side = match point.side_in(viewport_width) {
            Side::Left => 0.0,
            Side::Right => 1.0,
            Side::Center => 2.0,
        };
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
            index: point.index as f32,
            side,
            state: PointState::of(point.index, current_stage) as u8 as f32,
            number: point.number.unwrap_or(0) as f32,
            facing: point.facing_deg(),
        }
    }
}

/// Flat marker buffer rebuilt on every map redraw.
pub struct PointBuffer {
    pub instances: Vec<PointInstance>,
}

impl PointBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(32),
        }
    }

    pub fn rebuild(&mut self, points: &[MapPoint], viewport_width: f32, current_stage: usize) {
        self.instances.clear();
        self.instances.extend(
            points
                .iter()
                .map(|p| PointInstance::from_point(p, viewport_width, current_stage)),
        );
    }

    pub fn point_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw pointer to point data for reads from the page.
    pub fn points_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances[..])
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::new()
    }
}
