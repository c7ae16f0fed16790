//! Pointer and visibility handlers.
//!
//! Every handler that schedules a delayed action first cancels the pending
//! one in the same slot, so a leave followed by a quick re-entry never
//! fires a stale hide.

use tracing::{debug, trace};

use super::{DockApp, TimerEvent, TimerKind};
use crate::backend::WindowBackend;
use crate::config::VisibilityMode;
use crate::dock::visibility::MIN_SUB_DOCK_LEAVE_DELAY_MS;
use crate::dock::{DragTarget, InputState, MouseAction, MousePosition};
use crate::icon::{IconId, IconKind};
use crate::registry::DockId;

impl<B: WindowBackend> DockApp<B> {
    /// Pointer moved over a dock window, in window coordinates along the
    /// dock axis.
    pub fn pointer_motion(&mut self, id: DockId, x: i32, y: i32) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        let before = dock.pointed_icon().map(|icon| icon.id());
        dock.set_mouse(x, y);
        let pointed = dock
            .calculate_icons(&self.config)
            .map(|index| dock.icons()[index].id());
        trace!("dock {id}: pointer at ({x}, {y}), {:?}", dock.mouse_position);

        self.manage_mouse_position(id);
        if pointed != before || self.last_pointed_dock.is_none() {
            self.on_change_icon(before, pointed, id);
        }
        self.redraw(id);
    }

    /// Reacts to the pointer classification computed on the last layout.
    pub(crate) fn manage_mouse_position(&mut self, id: DockId) {
        let pointing_icon_pointed = self
            .registry
            .icon_pointing_on_dock(id)
            .is_some_and(|(_, icon)| icon.is_pointed);
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        let leave_pending = dock.timers.leave.is_pending(&self.timers);
        match dock.decide_mouse_action(&self.config, leave_pending, pointing_icon_pointed) {
            MouseAction::None => {}
            MouseAction::EmitEnter => {
                debug!("dock {id}: replaying a missed enter");
                self.pointer_enter(id);
            }
            MouseAction::Grow { show } => {
                dock.start_growing();
                if show {
                    dock.start_showing();
                }
                self.launch_animation(id);
            }
            MouseAction::Shrink => {
                dock.start_shrinking();
                self.launch_animation(id);
            }
            MouseAction::ScheduleLeave(delay) => {
                debug!("dock {id}: pointer outside, leaving in {delay} ms");
                dock.timers
                    .leave
                    .schedule(&mut self.timers, delay, TimerEvent::new(id, TimerKind::Leave));
            }
        }
    }

    /// Pointer entered a dock window.
    pub fn pointer_enter(&mut self, id: DockId) {
        self.last_pointed_dock = None;
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if !dock.entrance_allowed() {
            debug!("dock {id}: entrance refused");
            return;
        }
        dock.timers.leave.cancel(&mut self.timers);
        dock.timers.hide_back.cancel(&mut self.timers);
        self.show_sub_dock.cancel(&mut self.timers);
        self.showing_sub_dock = None;
        dock.input = InputState::Active;

        if dock.inside || dock.is_hiding() {
            dock.inside = true;
            dock.start_growing();
            if dock.is_hiding() || dock.is_hidden() {
                dock.start_showing();
            }
        } else {
            debug!("dock {id}: entered");
            dock.inside = true;
            let root = dock.is_root();
            let pop_up = root
                && dock.visibility == VisibilityMode::KeepBelow
                && dock.is_below
                && dock.pop_up();
            if root && dock.layout.hide_offset != 0.0 {
                dock.start_showing();
            }
            dock.start_growing();
            if pop_up {
                self.backend.set_keep_below(id, false);
            }
            self.stop_quick_hide();
        }
        self.sync_input_shape(id);
        self.launch_animation(id);
    }

    /// Pointer left a dock window at the given position.
    pub fn pointer_leave(&mut self, id: DockId, x: i32, y: i32) {
        if let Some(dock) = self.registry.get_mut(id) {
            dock.set_mouse(x, y);
            self.emit_leave(id, true);
        }
    }

    /// Leave handling. A `natural` leave comes from the pointer and may be
    /// delayed; a forced one comes from the engine and applies at once.
    pub(crate) fn emit_leave(&mut self, id: DockId, natural: bool) {
        let pointed_sub_dock_visible = self
            .registry
            .get(id)
            .and_then(|dock| dock.pointed_icon())
            .and_then(|icon| icon.sub_dock)
            .and_then(|sub_dock| self.registry.get(sub_dock))
            .is_some_and(|sub_dock| sub_dock.visible);
        let leave_delay = self.config.dock.leave_sub_dock_delay_ms;
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if !dock.is_really_outside() {
            trace!("dock {id}: leave ignored, pointer still over the dock");
            return;
        }

        if natural {
            if dock.timers.leave.is_pending(&self.timers) {
                return;
            }
            let delay = if dock.is_root() {
                (pointed_sub_dock_visible || dock.auto_hide)
                    .then(|| leave_delay.max(MIN_SUB_DOCK_LEAVE_DELAY_MS))
            } else {
                (leave_delay != 0).then_some(leave_delay)
            };
            if let Some(delay) = delay {
                debug!("dock {id}: leave delayed by {delay} ms");
                dock.timers
                    .leave
                    .schedule(&mut self.timers, delay, TimerEvent::new(id, TimerKind::Leave));
                return;
            }
        }
        dock.timers.leave.cancel(&mut self.timers);
        self.leave_dock(id);
    }

    /// The pointer is gone: fold back, shrink and hide what must hide.
    pub(crate) fn leave_dock(&mut self, id: DockId) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        debug!("dock {id}: left");
        dock.inside = false;
        dock.stop_drag();

        if !self.hide_child_docks(id) {
            return;
        }

        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        let showing_this = self
            .showing_sub_dock
            .is_some_and(|(_, sub_dock)| sub_dock == id);
        if dock.is_root() || showing_this {
            self.show_sub_dock.cancel(&mut self.timers);
            self.showing_sub_dock = None;
        }
        if dock.menu_visible {
            return;
        }

        if dock.is_root() {
            if dock.auto_hide && dock.start_hiding() {
                self.sync_input_shape(id);
            }
        } else if !dock.is_empty() {
            dock.layout.folding_factor = if self.config.dock.animate_sub_dock {
                0.001
            } else {
                0.0
            };
        }
        if let Some(dock) = self.registry.get_mut(id) {
            dock.start_shrinking();
        }
        self.launch_animation(id);
    }

    /// Hides the visible sub-docks of a dock the pointer left. Returns
    /// false when the pointer went into one of them, which keeps the dock
    /// up.
    fn hide_child_docks(&mut self, id: DockId) -> bool {
        let Some(dock) = self.registry.get(id) else {
            return true;
        };
        let children: Vec<DockId> = dock.icons().iter().filter_map(|icon| icon.sub_dock).collect();
        let fold = if self.config.dock.animate_sub_dock {
            1.0
        } else {
            0.0
        };
        for child in children {
            let Some(sub_dock) = self.registry.get_mut(child) else {
                continue;
            };
            if !sub_dock.visible {
                continue;
            }
            if sub_dock.inside {
                if let Some(dock) = self.registry.get_mut(id) {
                    dock.inside = false;
                }
                return false;
            }
            if !sub_dock.timers.leave.is_pending(&self.timers) {
                debug!("dock {child}: hidden with its parent");
                sub_dock.layout.folding_factor = fold;
                sub_dock.visible = false;
                self.backend.set_visible(child, false);
            }
        }
        true
    }

    /// Walks up from a sub-dock that just closed, closing the parents the
    /// pointer is not in.
    pub(crate) fn hide_parent_dock(&mut self, child: DockId) {
        let Some(parent) = self.registry.parent_of(child) else {
            return;
        };
        let Some(dock) = self.registry.get_mut(parent) else {
            return;
        };
        if dock.inside {
            return;
        }
        if dock.is_root() {
            self.emit_leave(parent, false);
        } else {
            debug!("dock {parent}: hidden after its sub-dock");
            dock.visible = false;
            self.backend.set_visible(parent, false);
            self.hide_parent_dock(parent);
        }
    }

    /// The pointed icon of a dock changed from `last` to `new`.
    pub(crate) fn on_change_icon(&mut self, last: Option<IconId>, new: Option<IconId>, id: DockId) {
        if self.showing_sub_dock.is_some_and(|(parent, _)| parent == id) {
            self.show_sub_dock.cancel(&mut self.timers);
            self.showing_sub_dock = None;
        }
        let Some(dock) = self.registry.get(id) else {
            return;
        };
        let last_sub_dock = last.and_then(|icon| dock.icon(icon)).and_then(|icon| icon.sub_dock);
        let new_icon = new.and_then(|icon| dock.icon(icon));
        let new_sub_dock = new_icon.and_then(|icon| icon.sub_dock);
        let new_is_window = new_icon.is_some_and(|icon| matches!(icon.kind(), IconKind::RunningWindow { .. }));
        let dragging = dock.drag.is_some();

        if self.last_pointed_dock.is_none_or(|last_dock| last_dock == id) {
            if let Some(sub_dock) = last_sub_dock.and_then(|sub_dock| self.registry.get_mut(sub_dock)) {
                if sub_dock.visible && !sub_dock.timers.leave.is_pending(&self.timers) {
                    let delay = self
                        .config
                        .dock
                        .leave_sub_dock_delay_ms
                        .max(MIN_SUB_DOCK_LEAVE_DELAY_MS);
                    let sub_id = sub_dock.id();
                    debug!("dock {sub_id}: its icon was left, leaving in {delay} ms");
                    sub_dock
                        .timers
                        .leave
                        .schedule(&mut self.timers, delay, TimerEvent::new(sub_id, TimerKind::Leave));
                }
            }
        }

        if let (Some(sub_id), Some(icon)) = (new_sub_dock, new) {
            let opens = !self.config.dock.show_sub_dock_on_click || new_is_window || dragging;
            if Some(sub_id) != self.last_pointed_dock && opens {
                if let Some(sub_dock) = self.registry.get_mut(sub_id) {
                    sub_dock.timers.leave.cancel(&mut self.timers);
                }
                let delay = self.config.dock.show_sub_dock_delay_ms;
                if delay > 0 {
                    self.show_sub_dock.schedule(
                        &mut self.timers,
                        delay,
                        TimerEvent::new(id, TimerKind::ShowSubDock(sub_id)),
                    );
                    self.showing_sub_dock = Some((id, sub_id));
                } else {
                    self.show_subdock(id, icon);
                }
                self.last_pointed_dock = Some(id);
            }
        }

        if self.last_pointed_dock.is_none() {
            self.last_pointed_dock = Some(id);
        }
    }

    /// Opens the sub-dock of an icon of `parent`, anchored on that icon.
    pub fn show_subdock(&mut self, parent: DockId, icon: IconId) {
        let Some(parent_dock) = self.registry.get(parent) else {
            return;
        };
        let Some(sub_id) = parent_dock.icon(icon).and_then(|icon| icon.sub_dock) else {
            return;
        };
        let Some(index) = parent_dock.icon_index(icon) else {
            return;
        };
        let animate = self.config.dock.animate_sub_dock;
        let Some((parent_dock, sub_dock)) = self.registry.get_pair_mut(parent, sub_id) else {
            return;
        };
        if sub_dock.visible {
            if sub_dock.is_shrinking() {
                sub_dock.start_growing();
                self.launch_animation(sub_id);
            }
            return;
        }

        debug!("dock {parent}: showing sub-dock {sub_id}");
        sub_dock.set_mouse(-1, -1);
        sub_dock.mouse_position = MousePosition::Outside;
        parent_dock.place_sub_dock(index, sub_dock);
        let geometry = sub_dock.move_resize();
        sub_dock.visible = true;
        if animate && !sub_dock.is_empty() {
            sub_dock.layout.folding_factor = 0.99;
            sub_dock.start_growing();
        } else {
            sub_dock.layout.folding_factor = 0.0;
        }
        sub_dock.calculate_icons(&self.config);

        self.backend.move_resize(sub_id, geometry);
        self.backend.set_visible(sub_id, true);
        self.sync_input_shape(sub_id);
        self.launch_animation(sub_id);
    }

    pub fn start_drag(&mut self, id: DockId, target: DragTarget) {
        if let Some(dock) = self.registry.get_mut(id) {
            dock.start_drag(target);
            dock.calculate_icons(&self.config);
        }
    }

    pub fn stop_drag(&mut self, id: DockId) {
        if let Some(dock) = self.registry.get_mut(id) {
            dock.stop_drag();
            dock.calculate_icons(&self.config);
        }
    }

    /// Hides every root dock until the pointer enters one of them.
    pub fn quick_hide_all(&mut self) {
        if self.quick_hide {
            return;
        }
        debug!("quick-hiding all docks");
        self.quick_hide = true;
        for id in self.root_ids() {
            if let Some(dock) = self.registry.get_mut(id) {
                dock.auto_hide = true;
            }
            self.emit_leave(id, false);
        }
    }

    /// Gives back the docks their own visibility after a quick-hide.
    pub fn stop_quick_hide(&mut self) {
        if !self.quick_hide {
            return;
        }
        debug!("quick-hide over");
        self.quick_hide = false;
        for id in self.root_ids() {
            let Some(dock) = self.registry.get_mut(id) else {
                continue;
            };
            if !dock.temporarily_hidden
                && dock.auto_hide
                && dock.visibility != VisibilityMode::AutoHide
            {
                dock.auto_hide = false;
                if !dock.inside && dock.start_showing() {
                    self.sync_input_shape(id);
                    self.launch_animation(id);
                }
            }
        }
    }

    /// Hides a root dock for a while, e.g. when a window overlaps it.
    pub fn activate_temporary_auto_hide(&mut self, id: DockId) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if !dock.is_root()
            || dock.temporarily_hidden
            || dock.visibility == VisibilityMode::AutoHide
        {
            return;
        }
        debug!("dock {id}: temporarily hidden");
        dock.auto_hide = true;
        dock.temporarily_hidden = true;
        if !dock.inside {
            self.emit_leave(id, false);
        }
    }

    pub fn deactivate_temporary_auto_hide(&mut self, id: DockId) {
        if self.quick_hide {
            return;
        }
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if !dock.is_root() || !dock.temporarily_hidden {
            return;
        }
        debug!("dock {id}: back from temporary hiding");
        dock.auto_hide = false;
        dock.temporarily_hidden = false;
        if !dock.inside && dock.start_showing() {
            self.sync_input_shape(id);
            self.launch_animation(id);
        }
    }

    /// The pointer touched (or left) the screen edge of a root dock that
    /// auto-hides or stays below.
    pub fn on_screen_edge_hit(&mut self, id: DockId, hit: bool) {
        let delay = self.config.dock.unhide_delay_ms;
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if !hit {
            dock.timers.unhide.cancel(&mut self.timers);
            return;
        }
        let concerned = dock.is_root()
            && (dock.auto_hide || dock.visibility == VisibilityMode::KeepBelow);
        if !concerned {
            return;
        }
        if delay == 0 {
            self.unhide_delayed(id);
        } else if !dock.timers.unhide.is_pending(&self.timers) {
            dock.timers
                .unhide
                .schedule(&mut self.timers, delay, TimerEvent::new(id, TimerKind::Unhide));
        }
    }

    /// Brings a dock back after a screen-edge hit, and plans to send it back
    /// if the pointer does not come in.
    pub(crate) fn unhide_delayed(&mut self, id: DockId) {
        let hide_back_delay = self.config.dock.hide_back_delay_ms;
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if dock.inside && dock.input != InputState::Hidden && !dock.is_below {
            return;
        }
        let mut launch = false;
        if dock.auto_hide && dock.start_showing() {
            launch = true;
        }
        let popped = dock.visibility == VisibilityMode::KeepBelow && dock.pop_up();
        if !dock.timers.hide_back.is_pending(&self.timers) {
            dock.timers.hide_back.schedule(
                &mut self.timers,
                hide_back_delay,
                TimerEvent::new(id, TimerKind::HideBack),
            );
        }
        if popped {
            self.backend.set_keep_below(id, false);
        }
        if launch {
            self.sync_input_shape(id);
            self.launch_animation(id);
        }
    }

    /// Sends back a dock unhidden by a screen-edge hit.
    pub(crate) fn hide_back(&mut self, id: DockId) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if dock.visibility == VisibilityMode::KeepBelow && !dock.inside {
            if dock.pop_down() {
                self.backend.set_keep_below(id, true);
            }
        } else if dock.auto_hide && dock.start_hiding() {
            self.sync_input_shape(id);
            self.launch_animation(id);
        }
    }

    fn root_ids(&self) -> Vec<DockId> {
        self.registry.roots().map(|dock| dock.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::app_with;
    use crate::backend::BackendCall;
    use crate::config::{Config, VisibilityMode};
    use crate::dock::{InputState, SlideMotion, ZoomMotion};
    use crate::icon::Icon;

    /// Pointer position over the middle of the icon at `index`.
    fn over_icon(app: &crate::app::DockApp<crate::backend::RecordingBackend>, index: usize) -> (i32, i32) {
        let dock = app.dock(app.main_dock()).unwrap();
        let icon = &dock.icons()[index];
        let x = dock.flat_row_offset() + icon.x_at_rest + icon.width / 2.0;
        (x as i32, dock.window.height - 5)
    }

    #[test]
    fn test_enter_grows_and_leave_shrinks() {
        let mut app = app_with(Config::default(), 4);
        let main = app.main_dock();
        app.pointer_enter(main);
        let (x, y) = over_icon(&app, 1);
        app.pointer_motion(main, x, y);
        let dock = app.dock(main).unwrap();
        assert!(dock.inside);
        assert_eq!(dock.zoom, ZoomMotion::Growing);
        assert_eq!(dock.input, InputState::Active);

        app.advance_by(1000);
        assert_eq!(app.dock(main).unwrap().zoom, ZoomMotion::Idle);
        assert!(app.dock(main).unwrap().icons()[1].is_pointed);

        app.pointer_leave(main, x, -20);
        assert!(!app.dock(main).unwrap().inside);
        assert_eq!(app.dock(main).unwrap().zoom, ZoomMotion::Shrinking);
        app.advance_by(1000);
        let dock = app.dock(main).unwrap();
        assert_eq!(dock.layout.magnitude_index, 0);
        assert_eq!(dock.input, InputState::AtRest);
    }

    #[test]
    fn test_leave_ignored_while_really_inside() {
        let mut app = app_with(Config::default(), 4);
        let main = app.main_dock();
        app.pointer_enter(main);
        let (x, y) = over_icon(&app, 0);
        app.pointer_leave(main, x, y);
        assert!(app.dock(main).unwrap().inside);
    }

    #[test]
    fn test_auto_hide_leave_is_delayed() {
        let mut config = Config::default();
        config.dock.visibility = VisibilityMode::AutoHide;
        let mut app = app_with(config, 3);
        let main = app.main_dock();
        assert!(app.dock(main).unwrap().is_hidden());

        app.pointer_enter(main);
        let (x, y) = over_icon(&app, 1);
        app.pointer_motion(main, x, y);
        assert_eq!(app.dock(main).unwrap().slide, SlideMotion::Showing);
        app.advance_by(1000);
        assert_eq!(app.dock(main).unwrap().layout.hide_offset, 0.0);

        app.pointer_leave(main, 10, -30);
        assert!(app.leave_pending(main));
        assert!(app.dock(main).unwrap().inside);
        app.advance_by(2000);
        let dock = app.dock(main).unwrap();
        assert!(!dock.inside);
        assert!(dock.is_hidden());
    }

    #[test]
    fn test_reentry_cancels_pending_leave() {
        let mut config = Config::default();
        config.dock.visibility = VisibilityMode::AutoHide;
        let mut app = app_with(config, 3);
        let main = app.main_dock();
        app.pointer_enter(main);
        let (x, y) = over_icon(&app, 1);
        app.pointer_motion(main, x, y);
        app.advance_by(1000);

        app.pointer_leave(main, 10, -30);
        assert!(app.leave_pending(main));
        app.advance_by(100);
        app.pointer_enter(main);
        app.pointer_motion(main, x, y);
        assert!(!app.leave_pending(main));

        app.advance_by(3000);
        let dock = app.dock(main).unwrap();
        assert!(dock.inside);
        assert_eq!(dock.layout.hide_offset, 0.0);
        assert_eq!(dock.slide, SlideMotion::Idle);
    }

    #[test]
    fn test_quick_hide_round_trip() {
        let mut app = app_with(Config::default(), 3);
        let main = app.main_dock();
        app.quick_hide_all();
        assert!(app.is_quick_hidden());
        app.advance_by(2000);
        assert_eq!(app.dock(main).unwrap().layout.hide_offset, 1.0);

        app.pointer_enter(main);
        assert!(!app.is_quick_hidden());
        app.pointer_leave(main, 10, -30);
        app.advance_by(2000);
        let dock = app.dock(main).unwrap();
        assert!(!dock.auto_hide);
    }

    #[test]
    fn test_temporary_auto_hide() {
        let mut app = app_with(Config::default(), 3);
        let main = app.main_dock();
        app.activate_temporary_auto_hide(main);
        app.advance_by(2000);
        assert!(app.dock(main).unwrap().is_hidden());

        app.deactivate_temporary_auto_hide(main);
        app.advance_by(2000);
        let dock = app.dock(main).unwrap();
        assert!(!dock.temporarily_hidden);
        assert_eq!(dock.layout.hide_offset, 0.0);
    }

    #[test]
    fn test_screen_edge_hit_unhides_then_hides_back() {
        let mut config = Config::default();
        config.dock.visibility = VisibilityMode::AutoHide;
        config.dock.unhide_delay_ms = 200;
        let mut app = app_with(config, 3);
        let main = app.main_dock();

        app.on_screen_edge_hit(main, true);
        assert!(app.unhide_pending(main));
        app.on_screen_edge_hit(main, false);
        assert!(!app.unhide_pending(main));

        app.on_screen_edge_hit(main, true);
        app.advance_by(300);
        assert!(app.hide_back_pending(main));
        assert_eq!(app.dock(main).unwrap().slide, SlideMotion::Showing);
        app.advance_by(3000);
        assert!(app.dock(main).unwrap().is_hidden());
    }

    #[test]
    fn test_keep_below_pops_up_on_edge_hit() {
        let mut config = Config::default();
        config.dock.visibility = VisibilityMode::KeepBelow;
        let mut app = app_with(config, 3);
        let main = app.main_dock();
        app.backend_mut().take_calls();

        app.on_screen_edge_hit(main, true);
        assert!(!app.dock(main).unwrap().is_below);
        assert!(app.backend().calls().contains(&BackendCall::SetKeepBelow(main, false)));
        app.advance_by(2500);
        assert!(app.dock(main).unwrap().is_below);
    }

    #[test]
    fn test_sub_dock_opens_on_hover_and_closes() {
        let mut config = Config::default();
        config.dock.show_sub_dock_delay_ms = 100;
        let mut app = app_with(config, 2);
        let main = app.main_dock();
        let folder = app
            .insert_icon(main, Icon::launcher("folder", "", 48.0).with_order(10.0), false)
            .unwrap();
        let sub = app.create_sub_dock(main, folder, "folder").unwrap();
        app.insert_icon(sub, Icon::launcher("inner", "inner", 48.0), false);

        app.pointer_enter(main);
        let index = app.dock(main).unwrap().icon_index(folder).unwrap();
        let (x, y) = over_icon(&app, index);
        app.pointer_motion(main, x, y);
        assert_eq!(app.show_sub_dock_pending(), Some(sub));
        app.advance_by(150);
        assert!(app.dock(sub).unwrap().visible);
        assert_eq!(app.last_pointed_dock(), Some(main));

        let (x, y) = over_icon(&app, 0);
        app.pointer_motion(main, x, y);
        assert!(app.leave_pending(sub));
        app.advance_by(1000);
        assert!(!app.dock(sub).unwrap().visible);
        assert!(app.dock(main).unwrap().inside);
    }

    #[test]
    fn test_sub_dock_on_click_only() {
        let mut config = Config::default();
        config.dock.show_sub_dock_on_click = true;
        let mut app = app_with(config, 1);
        let main = app.main_dock();
        let folder = app
            .insert_icon(main, Icon::launcher("folder", "", 48.0).with_order(10.0), false)
            .unwrap();
        let sub = app.create_sub_dock(main, folder, "folder").unwrap();
        app.insert_icon(sub, Icon::launcher("inner", "inner", 48.0), false);

        app.pointer_enter(main);
        let index = app.dock(main).unwrap().icon_index(folder).unwrap();
        let (x, y) = over_icon(&app, index);
        app.pointer_motion(main, x, y);
        app.advance_by(1000);
        assert!(!app.dock(sub).unwrap().visible);

        app.show_subdock(main, folder);
        assert!(app.dock(sub).unwrap().visible);
    }
}
