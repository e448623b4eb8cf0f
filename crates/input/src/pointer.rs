use glam::Vec2;

/// Snapshot of the pointer device taken once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Cursor position in window pixels, origin top-left.
    pub position: Vec2,
    /// Window size in pixels.
    pub window_size: Vec2,
    /// Whether the primary (left) button is held.
    pub primary_pressed: bool,
}

impl PointerState {
    /// A released pointer resting at the window center.
    pub fn idle(window_width: u32, window_height: u32) -> Self {
        let window_size = Vec2::new(window_width as f32, window_height as f32);
        Self {
            position: window_size * 0.5,
            window_size,
            primary_pressed: false,
        }
    }

    pub fn pressed_at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self.primary_pressed = true;
        self
    }

    pub fn released(mut self) -> Self {
        self.primary_pressed = false;
        self
    }

    /// Offset from the window center relative to the window size.
    ///
    /// X grows to the left and Y grows downward, so dragging right swings the
    /// camera towards -X and dragging down raises it.
    pub fn center_offset(&self) -> Vec2 {
        let w = self.window_size.x.max(1.0);
        let h = self.window_size.y.max(1.0);
        Vec2::new((w / 2.0 - self.position.x) / w, (self.position.y - h / 2.0) / h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_pointer_sits_at_center() {
        let p = PointerState::idle(1024, 512);
        assert!(!p.primary_pressed);
        assert_eq!(p.center_offset(), Vec2::ZERO);
    }

    #[test]
    fn corner_offsets_are_half_unit() {
        let p = PointerState::idle(1024, 512).pressed_at(0.0, 0.0);
        assert_eq!(p.center_offset(), Vec2::new(0.5, -0.5));
        let p = p.pressed_at(1024.0, 512.0);
        assert_eq!(p.center_offset(), Vec2::new(-0.5, 0.5));
    }

    #[test]
    fn zero_sized_window_does_not_divide_by_zero() {
        let p = PointerState {
            position: Vec2::ZERO,
            window_size: Vec2::ZERO,
            primary_pressed: true,
        };
        assert!(p.center_offset().is_finite());
    }
}
