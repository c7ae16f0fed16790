//! Where the pointer is relative to a dock.

use serde::Serialize;

use super::{Dock, InputState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MousePosition {
    /// Over the icons.
    Inside,
    /// In the dock's band but beside the icons.
    OnEdge,
    Outside,
}

/// Classifies a pointer given in window coordinates.
///
/// `x_abs` is the pointer on the flat row; both ends of the row count as
/// inside. `mouse_y` is measured from the screen edge the dock sits on.
pub fn classify(
    x_abs: f64,
    flat_width: f64,
    mouse_x: i32,
    mouse_y: i32,
    window_width: i32,
    active_height: i32,
) -> MousePosition {
    let inside_x = x_abs >= 0.0 && x_abs <= flat_width && mouse_x > 0 && mouse_x < window_width;
    if mouse_y >= 0 && mouse_y < active_height {
        if inside_x {
            MousePosition::Inside
        } else {
            MousePosition::OnEdge
        }
    } else {
        MousePosition::Outside
    }
}

impl Dock {
    /// Left end of the flat row in window coordinates.
    pub fn flat_row_offset(&self) -> f64 {
        let width = f64::from(self.window.width);
        let active_width = f64::from(self.layout.active_width);
        (width - active_width) * self.align + (active_width - self.layout.flat_width) / 2.0
    }

    /// Pointer position on the flat row.
    pub fn mouse_x_abs(&self) -> f64 {
        f64::from(self.mouse_x) - self.flat_row_offset()
    }

    pub fn classify_mouse(&self) -> MousePosition {
        let mouse_y = if self.orientation.direction_up {
            self.window.height - self.mouse_y
        } else {
            self.mouse_y
        };
        classify(
            self.mouse_x_abs(),
            self.layout.flat_width,
            self.mouse_x,
            mouse_y,
            self.window.width,
            self.layout.active_height,
        )
    }

    /// Whether the pointer left the part of the window that takes input.
    /// Window managers send spurious leave events on clicks and desktop
    /// switches; those are told apart here.
    pub fn is_really_outside(&self) -> bool {
        let width = f64::from(self.window.width);
        let height = f64::from(self.window.height);
        let min_width = f64::from(self.layout.min_width);
        let min_height = f64::from(self.layout.min_height);
        let up = self.orientation.direction_up;
        let ((x1, x2), (y1, y2)) = match self.input {
            InputState::Active => {
                let zoomed = self.layout.magnitude_max != 0.0;
                let y_range = match (up, zoomed) {
                    (true, true) => (0.0, height),
                    (true, false) => (height - min_height, height),
                    (false, true) => (0.0, height),
                    (false, false) => (0.0, min_height),
                };
                ((0.0, width), y_range)
            }
            InputState::AtRest => {
                let y_range = if up {
                    (height - min_height, height)
                } else {
                    (0.0, min_height)
                };
                (((width - min_width) / 2.0, (width + min_width) / 2.0), y_range)
            }
            InputState::Hidden => return false,
        };
        let x = f64::from(self.mouse_x);
        let y = f64::from(self.mouse_y);
        x <= x1 || x >= x2 || y <= y1 || y >= y2
    }

    /// Records a pointer position given in window coordinates along the
    /// dock axis.
    pub fn set_mouse(&mut self, x: i32, y: i32) {
        self.mouse_x = x;
        self.mouse_y = y;
    }
}
