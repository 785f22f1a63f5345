use winit::dpi::{PhysicalPosition, PhysicalSize};

/// How the cursor position reaches `iMouse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMapping {
    /// Window pixels, origin in the top-left corner.
    #[default]
    Pixels,
    /// Both axes mapped to `[-1, 1]` across the window.
    Normalized,
}

impl MouseMapping {
    pub fn apply(self, [x, y]: [f32; 2], [width, height]: [f32; 2]) -> [f32; 2] {
        match self {
            MouseMapping::Pixels => [x, y],
            MouseMapping::Normalized => [
                (1.0 / width * x) * 2.0 - 1.0,
                (1.0 / height * y) * 2.0 - 1.0,
            ],
        }
    }
}

#[derive(Debug, Default)]
pub struct Input {
    pub cursor: [f32; 2],
    pub size: [f32; 2],
}

impl Input {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cursor: [0.0; 2],
            size: [width as f32, height as f32],
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = [position.x as f32, position.y as f32];
    }

    pub fn resized(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.size = [size.width as f32, size.height as f32];
    }

    pub fn mouse(&self, mapping: MouseMapping) -> [f32; 2] {
        mapping.apply(self.cursor, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
        for (a, e) in actual.into_iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn pixels_pass_through() {
        let mut input = Input::new(800, 600);
        input.cursor_moved(PhysicalPosition::new(123.0, 45.0));
        assert_eq!(input.mouse(MouseMapping::Pixels), [123.0, 45.0]);
    }

    #[test]
    fn normalized_spans_window() {
        let mut input = Input::new(800, 600);
        assert_close(input.mouse(MouseMapping::Normalized), [-1.0, -1.0]);

        input.cursor_moved(PhysicalPosition::new(400.0, 300.0));
        assert_close(input.mouse(MouseMapping::Normalized), [0.0, 0.0]);

        input.cursor_moved(PhysicalPosition::new(800.0, 600.0));
        assert_close(input.mouse(MouseMapping::Normalized), [1.0, 1.0]);
    }

    #[test]
    fn normalization_follows_resize() {
        let mut input = Input::new(800, 600);
        input.resized(PhysicalSize::new(400, 200));
        input.cursor_moved(PhysicalPosition::new(400.0, 200.0));
        assert_close(input.mouse(MouseMapping::Normalized), [1.0, 1.0]);
    }

    #[test]
    fn minimized_window_keeps_size() {
        let mut input = Input::new(800, 600);
        input.resized(PhysicalSize::new(0, 0));
        assert_eq!(input.size, [800.0, 600.0]);
    }
}
