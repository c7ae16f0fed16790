//! Ratio solver and window placement.
//!
//! [`Dock::update_size`] finds the ratio that lets the fully zoomed row fit
//! the authorized width and the screen height. The bounded loop reports
//! whether it converged; a capped run keeps the last ratio it found.

use bitflags::bitflags;
use serde::Serialize;
use tracing::{debug, warn};

use super::{wave, Dock, Rect, WaveStyle};
use crate::config::{Config, VisibilityMode};

/// Part of a root dock kept on screen when its gaps push it away.
pub const VISIBILITY_MARGIN: i32 = 20;
/// Height given to a dock with no sized icon.
const DEFAULT_ICON_HEIGHT: f64 = 10.0;
/// A shrunk dock narrower than the authorized width by more than this is
/// grown back.
const UNDERFLOW_TOLERANCE: i32 = 5;

bitflags! {
    /// Work left to the window layer after a size update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SizeEffects: u8 {
        const MOVE_RESIZE   = 1 << 0;
        const INPUT_SHAPE   = 1 << 1;
        const ICON_GEOMETRY = 1 << 2;
        const RESERVE_SPACE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingOutcome {
    pub ratio: f64,
    pub iterations: u32,
    /// The ratio stopped changing before the iteration cap.
    pub converged: bool,
    /// The final size is within the authorized width and screen height.
    pub fits: bool,
    pub max_width: i32,
    pub max_height: i32,
    pub effects: SizeEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenEdge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Screen strip reserved by a dock, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Strut {
    pub edge: ScreenEdge,
    /// Thickness from the screen edge.
    pub size: i32,
    pub start: i32,
    pub end: i32,
}

impl Dock {
    // === Getters ===

    /// Widest the dock may get along its edge.
    pub fn max_authorized_width(&self, config: &Config) -> i32 {
        let screen = self.screen_width();
        match i32::try_from(config.dock.max_authorized_width) {
            Ok(limit) if limit > 0 => limit.min(screen),
            _ => screen,
        }
    }

    /// Window position, along the dock axis, that keeps a window of the
    /// given size balanced on its edge.
    pub fn window_position_at_balance(&self, width: i32, height: i32) -> (i32, i32) {
        let screen_width = self.screen_width();
        let screen_height = self.screen_height();

        let mut x = (f64::from(screen_width - width) * self.align + f64::from(self.gap_x)) as i32;
        if self.is_root() && self.align != 0.5 {
            x = (f64::from(x) + (0.5 - self.align) * f64::from(self.layout.max_width - width)) as i32;
        }
        let mut y = if self.orientation.direction_up {
            screen_height - height - self.gap_y
        } else {
            self.gap_y
        };

        if self.is_root() {
            if x + width < VISIBILITY_MARGIN {
                x = VISIBILITY_MARGIN - width;
            } else if x > screen_width - VISIBILITY_MARGIN {
                x = screen_width - VISIBILITY_MARGIN;
            }
        } else {
            let left = self.layout.min_left_margin as i32;
            let right = self.layout.min_right_margin as i32;
            if x < -left {
                x = -left;
            } else if x > screen_width - width + right {
                x = screen_width - width + right;
            }
        }

        let icon_height = self.scaled_max_icon_height() as i32;
        if y < -icon_height {
            y = -icon_height;
        } else if y > screen_height - height + icon_height {
            y = screen_height - height + icon_height;
        }

        (x + self.screen_offset_x(), y + self.screen_offset_y())
    }

    /// Strip to reserve for a root dock in `reserve` mode.
    pub fn reserve_space(&self) -> Option<Strut> {
        if !self.is_root() || self.visibility != VisibilityMode::Reserve {
            return None;
        }
        let width = self.layout.min_width;
        let height = self.layout.min_height;
        let (x, _) = self.window_position_at_balance(width, height);
        let edge = match (self.orientation.direction_up, self.orientation.horizontal) {
            (true, true) => ScreenEdge::Bottom,
            (true, false) => ScreenEdge::Right,
            (false, true) => ScreenEdge::Top,
            (false, false) => ScreenEdge::Left,
        };
        Some(Strut {
            edge,
            size: height + self.gap_y,
            start: x,
            end: x + width,
        })
    }

    /// Area a window manager animates a minimized window towards, in screen
    /// coordinates.
    pub fn icon_geometry(&self, index: usize, config: &Config) -> Option<Rect> {
        let icon = self.icons().get(index)?;
        let width = f64::from(self.window.width);
        let active_width = f64::from(self.layout.active_width);
        let x = f64::from(self.window.x)
            + icon.x_at_rest
            + (width - active_width) * self.align
            + (active_width - self.layout.flat_width) / 2.0;
        let y = f64::from(self.window.y) + icon.y_draw;
        let dh = icon.height * config.icons.amplitude * self.layout.magnitude_max;
        let rect = Rect::new(
            x as i32,
            (y - dh) as i32,
            icon.width as i32,
            (icon.height + 2.0 * dh) as i32,
        );
        Some(self.orientation.to_screen(rect))
    }

    // === State Mutations ===

    fn recompute_flat_width(&mut self, gap: f64) {
        self.layout.flat_width = self
            .icons()
            .iter()
            .map(|icon| icon.width + gap)
            .sum::<f64>()
            - gap;
    }

    /// Brings every icon back to its requested size.
    fn reset_ratio(&mut self, config: &Config) {
        for icon in self.icons_mut().iter_mut() {
            icon.apply_ratio(1.0);
        }
        let max_height = self
            .icons()
            .iter()
            .filter(|icon| !icon.is_separator())
            .map(|icon| icon.height)
            .fold(0.0, f64::max);
        self.layout.max_icon_height = if max_height > 0.0 {
            max_height
        } else {
            DEFAULT_ICON_HEIGHT
        };
        self.layout.ratio = 1.0;
        self.recompute_flat_width(config.icons.icon_gap);
    }

    fn apply_ratio(&mut self, ratio: f64, config: &Config) {
        self.layout.ratio = ratio;
        for icon in self.icons_mut().iter_mut() {
            icon.apply_ratio(ratio);
        }
        self.recompute_flat_width(config.icons.icon_gap);
    }

    /// Rest positions, extrema and every size derived from them at the
    /// current ratio.
    pub fn compute_size(&mut self, config: &Config) {
        let mut style = WaveStyle::from_config(config);
        let flat_width = self.layout.flat_width;
        let magnitude_max = self.layout.magnitude_max;
        let direction_up = self.orientation.direction_up;
        wave::positions_at_rest(self.icons_mut(), flat_width, style.gap);

        let icon_height = self.scaled_max_icon_height();
        let frame_margin = style.frame_margin;
        let line_width = style.line_width;
        self.layout.decorations_height = icon_height + 2.0 * frame_margin;
        if self.layout.decorations_height + line_width - 2.0 * style.radius < 0.0 {
            style.radius = (self.layout.decorations_height + line_width) / 2.0 - 1.0;
        }
        let mut extra_width = line_width + 2.0 * (style.radius + frame_margin);

        let natural_width = wave::max_dock_width(
            self.icons_mut(),
            &style,
            flat_width,
            magnitude_max,
            extra_width,
            direction_up,
        )
        .ceil() as i32;
        self.layout.offset_for_extend = 0.0;
        self.layout.max_width = natural_width;

        let authorized = self.max_authorized_width(config);
        if self.is_root() && config.dock.extended && natural_width < authorized {
            if self.align != 0.5 {
                self.layout.offset_for_extend = f64::from((authorized - natural_width) / 2);
            }
            extra_width += f64::from(authorized - natural_width);
            self.layout.max_width = wave::max_dock_width(
                self.icons_mut(),
                &style,
                flat_width,
                magnitude_max,
                extra_width,
                direction_up,
            )
            .ceil() as i32;
        }

        let label = if self.orientation.horizontal {
            config.icons.label_size
        } else {
            0.0
        };
        self.layout.max_height = ((1.0 + config.icons.amplitude) * icon_height).ceil() as i32
            + (line_width + frame_margin + label) as i32;
        self.layout.min_height = (icon_height + 2.0 * frame_margin + 2.0 * line_width) as i32;

        self.layout.min_left_margin = extra_width / 2.0;
        self.layout.min_right_margin = extra_width / 2.0;
        let max_width = f64::from(self.layout.max_width);
        let margins = match (self.icons().first(), self.icons().last()) {
            (Some(first), Some(last)) => Some((first.x_max, max_width - (last.x_min + last.width))),
            _ => None,
        };
        if let Some((left, right)) = margins {
            self.layout.max_left_margin = left;
            self.layout.max_right_margin = right;
        }
        self.layout.min_width = (self.layout.flat_width as i32).max(1);

        self.layout.active_width = natural_width;
        self.layout.active_height = self.layout.max_height;
        if !self.orientation.horizontal {
            self.layout.max_height += (8.0 * config.icons.label_size) as i32;
        }
    }

    /// Solves the ratio, lays the icons out and reports what the window
    /// layer has to refresh.
    pub fn update_size(&mut self, config: &Config) -> SizingOutcome {
        let previous = (self.layout.max_width, self.layout.max_height);

        self.layout.magnitude_max = if self.is_root() {
            1.0
        } else {
            config.system.sub_dock_magnitude_max
        };
        self.reset_ratio(config);
        self.compute_size(config);

        let authorized = self.max_authorized_width(config);
        let screen_height = self.screen_height();
        let ratio_ceiling = if self.is_root() {
            1.0
        } else {
            config.system.sub_dock_size_ratio
        };
        let cap = config.system.max_sizing_iterations.max(1);

        let mut iterations = 0;
        let mut converged = false;
        while iterations < cap {
            iterations += 1;
            let previous_ratio = self.layout.ratio;
            let max_width = f64::from(self.layout.max_width.max(1));
            let mut ratio = previous_ratio;
            if self.layout.max_width > authorized {
                ratio *= f64::from(authorized) / max_width;
            } else if ratio < ratio_ceiling {
                ratio = (ratio * f64::from(authorized) / max_width).min(ratio_ceiling);
            } else {
                ratio = ratio_ceiling;
            }
            if self.layout.max_height > screen_height {
                let max_height = f64::from(self.layout.max_height);
                ratio = ratio.min(previous_ratio * f64::from(screen_height) / max_height);
            }

            if ratio == previous_ratio {
                converged = true;
                break;
            }
            self.apply_ratio(ratio, config);
            self.compute_size(config);

            let overflows = self.layout.max_width > authorized
                || self.layout.max_height > screen_height;
            let underflows = self.layout.ratio < 1.0
                && self.layout.max_width < authorized - UNDERFLOW_TOLERANCE;
            if !overflows && !underflows {
                converged = true;
                break;
            }
        }

        self.calculate_icons(config);

        let fits = self.layout.max_width <= authorized && self.layout.max_height <= screen_height;
        if !converged {
            warn!(
                "dock {}: sizing capped after {iterations} iterations (ratio {:.3})",
                self.name(),
                self.layout.ratio
            );
        }
        if !fits {
            warn!(
                "dock {}: {}x{} overflows {authorized}x{screen_height}",
                self.name(),
                self.layout.max_width,
                self.layout.max_height
            );
        }

        let mut effects = SizeEffects::empty();
        let resized = previous != (self.layout.max_width, self.layout.max_height);
        if resized {
            if self.visible {
                effects |= SizeEffects::MOVE_RESIZE;
            }
        } else {
            effects |= SizeEffects::INPUT_SHAPE | SizeEffects::ICON_GEOMETRY;
        }
        if resized && self.is_root() && self.visibility == VisibilityMode::Reserve {
            effects |= SizeEffects::RESERVE_SPACE;
        }

        debug!(
            "dock {}: ratio {:.3}, {}x{} after {iterations} iterations",
            self.name(),
            self.layout.ratio,
            self.layout.max_width,
            self.layout.max_height
        );
        SizingOutcome {
            ratio: self.layout.ratio,
            iterations,
            converged,
            fits,
            max_width: self.layout.max_width,
            max_height: self.layout.max_height,
            effects,
        }
    }

    /// Gives the window its full size at its balance position. Returns the
    /// new geometry in screen coordinates.
    pub fn move_resize(&mut self) -> Rect {
        let width = self.layout.max_width;
        let height = self.layout.max_height;
        let (x, y) = self.window_position_at_balance(width, height);
        self.window = Rect::new(x, y, width, height);
        self.window_on_screen()
    }

    /// Derives the gaps back from where the window currently is, keeping
    /// the dock on its screen.
    pub fn prevent_out_of_screen(&mut self) {
        let screen_width = self.screen_width();
        let screen_height = self.screen_height();
        let x = self.window.x - self.screen_offset_x()
            + (f64::from(self.window.width) * self.align) as i32;
        let top = self.window.y - self.screen_offset_y();
        let y = if self.orientation.direction_up {
            top + self.window.height
        } else {
            top
        };

        self.gap_x = (f64::from(x) - f64::from(screen_width) * self.align) as i32;
        self.gap_y = if self.orientation.direction_up {
            screen_height - y
        } else {
            y
        };
        self.gap_x = self.gap_x.clamp(-screen_width / 2, screen_width / 2);
        self.gap_y = self.gap_y.clamp(0, screen_height);
    }

    /// Anchors `sub_dock` on the icon at `pointed` in this dock.
    pub fn place_sub_dock(&self, pointed: usize, sub_dock: &mut Dock) {
        let Some(icon) = self.icons().get(pointed) else {
            return;
        };
        let icon_x = (icon.x_draw + icon.width * icon.scale / 2.0) as i32;
        let anchor = icon_x + self.window.x - self.screen_offset_x();
        let up = self.orientation.direction_up;

        if sub_dock.orientation.horizontal == self.orientation.horizontal {
            sub_dock.align = 0.5;
            sub_dock.gap_x = anchor - self.screen_width() / 2;
            sub_dock.gap_y = self.gap_y + self.layout.active_height;
        } else {
            sub_dock.align = if up { 1.0 } else { 0.0 };
            let across = self.gap_y + self.layout.active_height;
            sub_dock.gap_x = if up { -across } else { across };
            sub_dock.gap_y = if up {
                self.screen_width() - anchor - sub_dock.layout.max_height / 2
            } else {
                anchor - sub_dock.layout.max_height / 2
            };
        }
        debug!(
            "dock {}: sub-dock {} anchored at gap ({}, {})",
            self.name(),
            sub_dock.name(),
            sub_dock.gap_x,
            sub_dock.gap_y
        );
    }
}
