//! Timer dispatch and the per-dock animation frame.

use tracing::{debug, trace};

use super::{DockApp, TimerEvent, TimerKind};
use crate::backend::WindowBackend;
use crate::dock::{InputState, SlideMotion, ZoomMotion};
use crate::icon::IconId;
use crate::registry::DockId;
use crate::timer::{Millis, TimerHandle};

/// What a frame left to do once the dock borrow is released.
#[derive(Debug, Default)]
struct FrameFollowUp {
    changed_icon: Option<(Option<IconId>, Option<IconId>)>,
    removed: Vec<IconId>,
    input_changed: bool,
    popped_down: bool,
    hide_parent: bool,
    go_on: bool,
}

impl<B: WindowBackend> DockApp<B> {
    /// Fires every timer due up to `until` in deadline order, then moves the
    /// clock there.
    pub fn advance_to(&mut self, until: Millis) {
        while let Some((handle, event)) = self.timers.pop_due(until) {
            self.dispatch(handle, event);
        }
        self.timers.advance_clock(until);
    }

    pub fn advance_by(&mut self, delta: Millis) {
        let until = self.timers.now().saturating_add(delta);
        self.advance_to(until);
    }

    fn dispatch(&mut self, handle: TimerHandle, event: TimerEvent) {
        let id = event.dock;
        trace!("timer {:?} for dock {id} at {} ms", event.kind, self.timers.now());
        if let TimerKind::ShowSubDock(sub_dock) = event.kind {
            if self.show_sub_dock.fired(handle) {
                self.showing_sub_dock = None;
                self.show_sub_dock_delayed(id, sub_dock);
            }
            return;
        }

        // A destroyed dock no longer resolves and its stale timers die here.
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        let slot = match event.kind {
            TimerKind::Leave => &mut dock.timers.leave,
            TimerKind::HideBack => &mut dock.timers.hide_back,
            TimerKind::Unhide => &mut dock.timers.unhide,
            TimerKind::Frame => &mut dock.timers.frame,
            TimerKind::ShowSubDock(_) => return,
        };
        if !slot.fired(handle) {
            return;
        }
        match event.kind {
            TimerKind::Leave => self.emit_leave(id, false),
            TimerKind::HideBack => self.hide_back(id),
            TimerKind::Unhide => self.unhide_delayed(id),
            TimerKind::Frame => {
                if self.animation_frame(id) {
                    self.launch_animation(id);
                }
            }
            TimerKind::ShowSubDock(_) => {}
        }
    }

    fn show_sub_dock_delayed(&mut self, parent: DockId, sub_dock: DockId) {
        let icon = self
            .registry
            .get(parent)
            .and_then(|dock| dock.pointed_icon())
            .filter(|icon| icon.sub_dock == Some(sub_dock))
            .map(|icon| icon.id());
        if let Some(icon) = icon {
            self.show_subdock(parent, icon);
        }
    }

    /// Runs one frame of every motion of a dock. Returns true while more
    /// frames are needed.
    pub(crate) fn animation_frame(&mut self, id: DockId) -> bool {
        let dt = self.config.system.frame_interval_ms();
        let Some(dock) = self.registry.get_mut(id) else {
            return false;
        };
        let config = &self.config;
        let mut follow = FrameFollowUp::default();

        if dock.is_shrinking() {
            dock.shrink_tick(config, dt);
            dock.calculate_icons(config);
            if dock.shrink_settled() {
                dock.zoom = ZoomMotion::Idle;
                if !dock.inside {
                    let root_auto_hide = dock.auto_hide && dock.is_root();
                    if !root_auto_hide && !dock.menu_visible {
                        follow.input_changed = dock.input != InputState::AtRest;
                        dock.input = InputState::AtRest;
                    } else if root_auto_hide && dock.layout.folding_factor != 0.0 {
                        follow.input_changed = dock.input != InputState::Hidden;
                        dock.input = InputState::Hidden;
                    }
                    follow.popped_down = dock.is_root() && dock.pop_down();
                    if !dock.is_root() {
                        debug!("dock {id}: sub-dock closed");
                        dock.visible = false;
                        follow.hide_parent = true;
                    }
                }
                follow.go_on = dock.folding_in_progress();
            } else {
                follow.go_on = true;
            }
        } else if dock.is_growing() {
            let before = dock.pointed_icon().map(|icon| icon.id());
            dock.grow_tick(config, dt);
            let pointed = dock
                .calculate_icons(config)
                .map(|index| dock.icons()[index].id());
            if pointed != before && dock.inside {
                follow.changed_icon = Some((before, pointed));
            }
            if dock.growth_finished() {
                dock.zoom = ZoomMotion::Idle;
            } else {
                follow.go_on = true;
            }
        }

        if dock.is_hiding() && !dock.hide_step(config) {
            debug!("dock {id}: hidden");
            dock.slide = SlideMotion::Idle;
        } else if dock.is_showing() && !dock.show_step(config) {
            debug!("dock {id}: shown");
            dock.slide = SlideMotion::Idle;
        }

        let report = dock.step_insert_remove();
        follow.removed = report.removed;
        if report.needs_layout && follow.removed.is_empty() {
            dock.calculate_icons(config);
        }
        follow.go_on |= dock.is_animating();

        self.finish_frame(id, follow)
    }

    fn finish_frame(&mut self, id: DockId, follow: FrameFollowUp) -> bool {
        for icon in &follow.removed {
            self.take_icon_out(id, *icon);
        }
        if follow.input_changed {
            self.sync_input_shape(id);
        }
        if follow.popped_down {
            self.backend.set_keep_below(id, true);
        }
        if follow.hide_parent {
            self.backend.set_visible(id, false);
            self.hide_parent_dock(id);
        }
        if let Some((before, pointed)) = follow.changed_icon {
            self.on_change_icon(before, pointed, id);
        }
        self.manage_mouse_position(id);
        self.redraw(id);

        let animating = self.registry.get(id).is_some_and(|dock| dock.is_animating());
        follow.go_on || animating
    }

    /// Hands the current frame of a visible dock to the backend.
    pub(crate) fn redraw(&mut self, id: DockId) {
        if let Some(dock) = self.registry.get(id).filter(|dock| dock.visible) {
            let frame = dock.snapshot();
            self.backend.redraw(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::app_with;
    use crate::config::Config;
    use crate::icon::Icon;

    #[test]
    fn test_frames_stop_once_settled() {
        let mut app = app_with(Config::default(), 3);
        let main = app.main_dock();
        app.insert_icon(main, Icon::launcher("new", "new", 48.0), true);
        app.advance_by(5000);
        assert_eq!(app.pending_timers(), 0);
        let drawn = app.backend().frames_drawn();
        assert!(drawn > 0);
        app.advance_by(5000);
        assert_eq!(app.backend().frames_drawn(), drawn);
    }

    #[test]
    fn test_clock_reaches_target_without_timers() {
        let mut app = app_with(Config::default(), 1);
        app.advance_to(1234);
        assert_eq!(app.now(), 1234);
        app.advance_to(1000);
        assert_eq!(app.now(), 1234);
    }

    #[test]
    fn test_last_frame_reaches_backend() {
        let mut app = app_with(Config::default(), 2);
        let main = app.main_dock();
        app.insert_icon(main, Icon::launcher("new", "new", 48.0), true);
        app.advance_by(2000);
        let frame = app.backend().last_frame(main).unwrap();
        assert_eq!(frame.icons.len(), 3);
        assert_eq!(frame.dock, main);
    }
}
