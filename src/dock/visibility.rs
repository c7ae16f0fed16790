//! Show/hide state machine of a dock.
//!
//! Two independent motions live here: the zoom ([`ZoomMotion`]) that grows
//! the icons under the pointer, and the slide ([`SlideMotion`]) that moves
//! an auto-hidden dock in and out of the screen. The per-frame stepping is
//! in [`super::animation`]; this module only decides when each motion
//! starts.

use serde::Serialize;
use tracing::debug;

use super::{Dock, MousePosition, Rect};
use crate::config::{Config, VisibilityMode, MAX_MAGNITUDE_INDEX};
use crate::timer::Millis;

/// Floor of the delay before a dock left by the pointer reacts.
pub const MIN_LEAVE_DELAY_MS: Millis = 300;
/// Floor of the delay before a sub-dock hides when its icon is left.
pub const MIN_SUB_DOCK_LEAVE_DELAY_MS: Millis = 330;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMotion {
    Idle,
    Growing,
    Shrinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideMotion {
    Idle,
    Hiding,
    Showing,
}

/// Which part of the window accepts pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputState {
    /// The whole window.
    Active,
    /// The icons at rest only.
    AtRest,
    /// A thin strip on the screen edge.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    Resting,
    Growing,
    Shrinking,
    /// A keep-below dock raised above the other windows.
    PoppedUp,
}

/// Reaction to the pointer position computed on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    None,
    /// The enter event was missed; replay it.
    EmitEnter,
    Grow { show: bool },
    Shrink,
    /// Leave the dock after this delay unless the pointer comes back.
    ScheduleLeave(Millis),
}

impl Dock {
    // === Getters ===

    pub fn visibility_state(&self) -> VisibilityState {
        match self.zoom {
            ZoomMotion::Growing => VisibilityState::Growing,
            ZoomMotion::Shrinking => VisibilityState::Shrinking,
            ZoomMotion::Idle
                if self.visibility == VisibilityMode::KeepBelow && !self.is_below =>
            {
                VisibilityState::PoppedUp
            }
            ZoomMotion::Idle => VisibilityState::Resting,
        }
    }

    pub fn is_growing(&self) -> bool {
        self.zoom == ZoomMotion::Growing
    }

    pub fn is_shrinking(&self) -> bool {
        self.zoom == ZoomMotion::Shrinking
    }

    pub fn is_hiding(&self) -> bool {
        self.slide == SlideMotion::Hiding
    }

    pub fn is_showing(&self) -> bool {
        self.slide == SlideMotion::Showing
    }

    /// Fully slid out of the screen.
    pub fn is_hidden(&self) -> bool {
        self.is_root() && self.auto_hide && self.layout.hide_offset == 1.0
    }

    pub fn entrance_allowed(&self) -> bool {
        !self.entrance_disabled
    }

    /// Whether any motion still needs animation frames.
    pub fn is_animating(&self) -> bool {
        self.zoom != ZoomMotion::Idle
            || self.slide != SlideMotion::Idle
            || self.icons().iter().any(|icon| icon.is_animating_insert_remove())
    }

    /// Decides how to react to the pointer classification of this frame.
    ///
    /// `leave_pending` tells whether a delayed leave is already scheduled;
    /// `pointing_icon_pointed` whether the icon owning this sub-dock is
    /// under the pointer in its own dock.
    pub fn decide_mouse_action(
        &self,
        config: &Config,
        leave_pending: bool,
        pointing_icon_pointed: bool,
    ) -> MouseAction {
        let index = self.layout.magnitude_index;
        match self.mouse_position {
            MousePosition::Inside => {
                let wants_zoom = (index < MAX_MAGNITUDE_INDEX && !self.is_growing())
                    || self.is_shrinking();
                let accepts_input = self.input != InputState::Hidden
                    && (self.input != InputState::AtRest || self.drag.is_some());
                if !(self.entrance_allowed() && wants_zoom && accepts_input) {
                    return MouseAction::None;
                }
                if !self.is_root() && !self.inside {
                    return MouseAction::None;
                }
                let resting_root =
                    index == 0 && self.is_root() && !self.auto_hide && !self.is_growing();
                if resting_root || !self.inside {
                    MouseAction::EmitEnter
                } else {
                    MouseAction::Grow {
                        show: self.auto_hide && self.is_root(),
                    }
                }
            }
            MousePosition::OnEdge => {
                if index > 0 && !self.is_growing() {
                    MouseAction::Shrink
                } else {
                    MouseAction::None
                }
            }
            MousePosition::Outside => {
                if self.is_growing() || self.is_shrinking() || leave_pending || index == 0 {
                    return MouseAction::None;
                }
                if !self.is_root() && pointing_icon_pointed {
                    return MouseAction::None;
                }
                MouseAction::ScheduleLeave(
                    config.dock.leave_sub_dock_delay_ms.max(MIN_LEAVE_DELAY_MS),
                )
            }
        }
    }

    /// Input region in window coordinates along the dock axis.
    pub fn input_shape(&self) -> Rect {
        let width = self.window.width;
        let height = self.window.height;
        match self.input {
            InputState::Active => Rect::new(0, 0, width, height),
            InputState::AtRest => {
                let min_width = self.layout.min_width;
                let min_height = self.layout.min_height;
                let active_width = self.layout.active_width;
                let x = f64::from(width - active_width) * self.align
                    + f64::from(active_width - min_width) / 2.0;
                let y = if self.orientation.direction_up {
                    height - min_height
                } else {
                    0
                };
                Rect::new(x as i32, y, min_width, min_height)
            }
            InputState::Hidden => {
                let y = if self.orientation.direction_up {
                    height - 1
                } else {
                    0
                };
                Rect::new(0, y, width, 1)
            }
        }
    }

    // === State Mutations ===

    /// Returns true when the zoom motion changed and frames must run.
    pub fn start_growing(&mut self) -> bool {
        if self.is_growing() {
            return false;
        }
        debug!("dock {}: start growing", self.name());
        self.zoom = ZoomMotion::Growing;
        true
    }

    pub fn start_shrinking(&mut self) -> bool {
        if self.is_shrinking() {
            return false;
        }
        debug!("dock {}: start shrinking", self.name());
        self.zoom = ZoomMotion::Shrinking;
        true
    }

    /// Starts sliding out, unless the pointer is inside.
    pub fn start_hiding(&mut self) -> bool {
        if self.is_hiding() || self.inside {
            return false;
        }
        debug!("dock {}: start hiding", self.name());
        self.slide = SlideMotion::Hiding;
        if self.input != InputState::Hidden {
            self.input = InputState::Hidden;
        }
        true
    }

    pub fn start_showing(&mut self) -> bool {
        if self.is_showing() {
            return false;
        }
        debug!("dock {}: start showing", self.name());
        self.slide = SlideMotion::Showing;
        if self.input == InputState::Hidden {
            self.input = InputState::AtRest;
        }
        true
    }

    /// Raises a dock kept below. Returns true when the window layer must
    /// be told.
    pub fn pop_up(&mut self) -> bool {
        if !self.is_below {
            return false;
        }
        debug!("dock {}: pop up", self.name());
        self.is_below = false;
        true
    }

    pub fn pop_down(&mut self) -> bool {
        if self.is_below || self.visibility != VisibilityMode::KeepBelow || self.inside {
            return false;
        }
        debug!("dock {}: pop down", self.name());
        self.is_below = true;
        true
    }

    pub fn allow_entrance(&mut self) {
        self.entrance_disabled = false;
    }

    pub fn disable_entrance(&mut self) {
        self.entrance_disabled = true;
    }

    /// Applies a new visibility mode. Returns the slide to launch, if any.
    pub fn set_visibility(&mut self, mode: VisibilityMode) -> Option<SlideMotion> {
        debug!("dock {}: visibility {:?} -> {:?}", self.name(), self.visibility, mode);
        let was_auto_hide = self.auto_hide;
        self.visibility = mode;
        self.auto_hide = mode == VisibilityMode::AutoHide;
        if mode == VisibilityMode::KeepBelow {
            if !self.inside {
                self.pop_down();
            }
        } else {
            self.pop_up();
        }
        match (was_auto_hide, self.auto_hide) {
            (false, true) if self.start_hiding() => Some(SlideMotion::Hiding),
            (true, false) if self.start_showing() => Some(SlideMotion::Showing),
            _ => None,
        }
    }
}
