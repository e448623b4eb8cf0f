use glam::Vec3;

use crate::pointer::PointerState;

/// Maps the pointer onto a sphere around the origin.
///
/// While the primary button is held, the pointer offset from the window center
/// becomes the direction `(offset.x, offset.y, 1)`, normalized and scaled by
/// the configured radius. Target and up vector are never touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionController {
    radius: f32,
}

impl InteractionController {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Candidate camera position for this frame, or `None` when the button is
    /// released and the pose must stay as it is.
    pub fn candidate_position(&self, pointer: &PointerState) -> Option<Vec3> {
        if !pointer.primary_pressed {
            return None;
        }
        let offset = pointer.center_offset();
        let position = Vec3::new(offset.x, offset.y, 1.0).normalize() * self.radius;
        tracing::trace!(?position, "pointer orbit candidate");
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_pointer_yields_nothing() {
        let ctrl = InteractionController::new(3.0);
        let p = PointerState::idle(1024, 512).pressed_at(10.0, 10.0).released();
        assert_eq!(ctrl.candidate_position(&p), None);
    }

    #[test]
    fn centered_press_looks_down_z() {
        let ctrl = InteractionController::new(3.0);
        let p = PointerState::idle(1024, 512).pressed_at(512.0, 256.0);
        let pos = ctrl.candidate_position(&p).unwrap();
        assert!(pos.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-6));
    }

    #[test]
    fn candidates_stay_on_the_sphere() {
        let ctrl = InteractionController::new(3.0);
        let base = PointerState::idle(1024, 512);
        for (x, y) in [(0.0, 0.0), (1024.0, 0.0), (300.0, 400.0), (1024.0, 512.0)] {
            let pos = ctrl.candidate_position(&base.pressed_at(x, y)).unwrap();
            assert!((pos.length() - 3.0).abs() < 1e-5, "{pos:?} off sphere");
        }
    }

    #[test]
    fn dragging_right_moves_camera_left() {
        let ctrl = InteractionController::new(3.0);
        let p = PointerState::idle(1024, 512).pressed_at(900.0, 256.0);
        let pos = ctrl.candidate_position(&p).unwrap();
        assert!(pos.x < 0.0);
        assert!(pos.y.abs() < 1e-6);
    }
}
