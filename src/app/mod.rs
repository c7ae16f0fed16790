//! Application context: the docks, their timers and the window backend.
//!
//! Everything runs on one thread. Pointer events and timer expiries enter
//! through [`DockApp`] methods; the handlers live in [`interactions`] and
//! the frame loop in [`animation`].

pub mod animation;
pub mod interactions;

use tracing::{debug, info};

use crate::backend::WindowBackend;
use crate::config::{Config, VisibilityMode};
use crate::dock::{Dock, FrameSnapshot, SizeEffects, SizingOutcome, SlideMotion};
use crate::icon::{Icon, IconId};
use crate::registry::{DockId, DockRegistry, RegistryError, MAIN_DOCK_NAME};
use crate::timer::{Millis, TimerQueue, TimerSlot};

/// What a pending timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Delayed leave of the dock.
    Leave,
    /// Re-hide a dock shown by a screen-edge hit.
    HideBack,
    /// Delayed unhide after a screen-edge hit.
    Unhide,
    /// Delayed show of this sub-dock from its parent.
    ShowSubDock(DockId),
    /// Next animation frame.
    Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub dock: DockId,
    pub kind: TimerKind,
}

impl TimerEvent {
    pub fn new(dock: DockId, kind: TimerKind) -> Self {
        Self { dock, kind }
    }
}

pub struct DockApp<B: WindowBackend> {
    config: Config,
    registry: DockRegistry,
    timers: TimerQueue<TimerEvent>,
    backend: B,
    main: DockId,

    quick_hide: bool,
    /// Dock the pointer last moved over; sub-docks opened from it are not
    /// reopened while it stays there.
    last_pointed_dock: Option<DockId>,
    show_sub_dock: TimerSlot,
    /// Parent dock and sub-dock of the pending delayed show.
    showing_sub_dock: Option<(DockId, DockId)>,
}

impl<B: WindowBackend> DockApp<B> {
    /// Builds the context and its main dock.
    pub fn new(config: Config, backend: B) -> Result<Self, RegistryError> {
        let mut registry = DockRegistry::new();
        let main = registry.create(MAIN_DOCK_NAME, &config, backend.screen())?;
        let mut app = Self {
            config,
            registry,
            timers: TimerQueue::new(),
            backend,
            main,
            quick_hide: false,
            last_pointed_dock: None,
            show_sub_dock: TimerSlot::default(),
            showing_sub_dock: None,
        };
        app.update_dock_size(main);
        app.sync_input_shape(main);
        info!("main dock ready ({main})");
        Ok(app)
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &DockRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Timers still waiting, in no particular order.
    pub fn pending_events(&self) -> impl Iterator<Item = &TimerEvent> {
        self.timers.payloads()
    }

    pub fn main_dock(&self) -> DockId {
        self.main
    }

    pub fn dock(&self, id: DockId) -> Option<&Dock> {
        self.registry.get(id)
    }

    pub fn is_quick_hidden(&self) -> bool {
        self.quick_hide
    }

    pub fn last_pointed_dock(&self) -> Option<DockId> {
        self.last_pointed_dock
    }

    pub fn leave_pending(&self, id: DockId) -> bool {
        self.dock(id)
            .is_some_and(|dock| dock.timers.leave.is_pending(&self.timers))
    }

    pub fn unhide_pending(&self, id: DockId) -> bool {
        self.dock(id)
            .is_some_and(|dock| dock.timers.unhide.is_pending(&self.timers))
    }

    pub fn hide_back_pending(&self, id: DockId) -> bool {
        self.dock(id)
            .is_some_and(|dock| dock.timers.hide_back.is_pending(&self.timers))
    }

    pub fn show_sub_dock_pending(&self) -> Option<DockId> {
        self.showing_sub_dock
            .filter(|_| self.show_sub_dock.is_pending(&self.timers))
            .map(|(_, sub_dock)| sub_dock)
    }

    pub fn snapshot(&self, id: DockId) -> Option<FrameSnapshot> {
        self.dock(id).map(Dock::snapshot)
    }

    /// One snapshot per visible dock, in creation order.
    pub fn snapshots(&self) -> Vec<FrameSnapshot> {
        self.registry
            .iter()
            .filter(|dock| dock.visible)
            .map(Dock::snapshot)
            .collect()
    }

    // === State Mutations ===

    /// Creates a root dock named after `prefix`, made unique if needed.
    pub fn create_dock(&mut self, prefix: &str) -> Result<DockId, RegistryError> {
        let name = self.registry.unique_name(prefix);
        let screen = self.backend.screen();
        let id = self.registry.create(&name, &self.config, screen)?;
        self.update_dock_size(id);
        if let Some(dock) = self.registry.get(id) {
            if dock.auto_hide {
                self.sync_input_shape(id);
            }
        }
        Ok(id)
    }

    /// Creates a sub-dock opened by `icon` of `parent`.
    pub fn create_sub_dock(
        &mut self,
        parent: DockId,
        icon: IconId,
        prefix: &str,
    ) -> Result<DockId, RegistryError> {
        let name = self.registry.unique_name(prefix);
        let screen = self.backend.screen();
        let id = self.registry.create(&name, &self.config, screen)?;
        if let Err(err) = self.registry.link_sub_dock(parent, icon, id, &self.config) {
            self.destroy_dock(id, None)?;
            return Err(err);
        }
        self.backend.set_visible(id, false);
        Ok(id)
    }

    /// Removes a dock and its sub-docks; their icons move to `receiving`
    /// or are dropped.
    pub fn destroy_dock(
        &mut self,
        id: DockId,
        receiving: Option<DockId>,
    ) -> Result<(), RegistryError> {
        let destroyed = self.registry.destroy(id, receiving, &self.config)?;
        for mut dock in destroyed {
            let gone = dock.id();
            dock.timers.leave.cancel(&mut self.timers);
            dock.timers.hide_back.cancel(&mut self.timers);
            dock.timers.unhide.cancel(&mut self.timers);
            dock.timers.frame.cancel(&mut self.timers);
            self.timers.cancel_where(|event| {
                event.dock == gone || event.kind == TimerKind::ShowSubDock(gone)
            });
            if self
                .showing_sub_dock
                .is_some_and(|(parent, sub_dock)| parent == gone || sub_dock == gone)
            {
                self.show_sub_dock.cancel(&mut self.timers);
                self.showing_sub_dock = None;
            }
            if self.last_pointed_dock == Some(gone) {
                self.last_pointed_dock = None;
            }
            self.backend.set_visible(gone, false);
            if dock.visibility == VisibilityMode::Reserve {
                self.backend.reserve_space(gone, None);
            }
        }
        if let Some(receiving) = receiving {
            self.apply_size_effects(receiving, SizeEffects::MOVE_RESIZE);
            self.launch_animation(receiving);
        }
        Ok(())
    }

    pub fn rename_dock(&mut self, id: DockId, name: &str) -> Result<(), RegistryError> {
        self.registry.rename(id, name)
    }

    /// Inserts an icon, growing it in when `animate` is set.
    pub fn insert_icon(&mut self, id: DockId, mut icon: Icon, animate: bool) -> Option<IconId> {
        let id = self.registry.resolve(Some(id))?;
        if animate {
            icon.begin_insertion();
        }
        let icon_id = self.registry.insert_icon(id, icon, &self.config)?;
        self.update_dock_size(id);
        if animate {
            self.launch_animation(id);
        }
        Some(icon_id)
    }

    /// Removes an icon; with `animate` it shrinks away first and leaves the
    /// dock on the frame its animation ends. A sub-dock it opened is
    /// destroyed with it.
    pub fn remove_icon(&mut self, id: DockId, icon: IconId, animate: bool) -> bool {
        let Some(dock) = self.registry.get_mut(id) else {
            return false;
        };
        if animate {
            let Some(found) = dock.icon_mut(icon) else {
                return false;
            };
            found.begin_removal();
            self.launch_animation(id);
            return true;
        }
        self.take_icon_out(id, icon).is_some()
    }

    fn take_icon_out(&mut self, id: DockId, icon: IconId) -> Option<Icon> {
        let dock = self.registry.get_mut(id)?;
        let removed = dock.remove_icon(icon, &self.config)?;
        if let Some(sub_dock) = removed.sub_dock {
            if let Err(err) = self.destroy_dock(sub_dock, None) {
                debug!("sub-dock of {} not destroyed: {err}", removed.name());
            }
        }
        self.update_dock_size(id);
        Some(removed)
    }

    /// Moves an icon from one dock to another, keeping its id.
    pub fn move_icon_to_dock(&mut self, icon: IconId, target: DockId) -> bool {
        let Some((source, _)) = self.registry.find_icon(icon) else {
            return false;
        };
        if source == target || !self.registry.contains(target) {
            return false;
        }
        let Some(dock) = self.registry.get_mut(source) else {
            return false;
        };
        let Some(mut moved) = dock.remove_icon(icon, &self.config) else {
            return false;
        };
        self.update_dock_size(source);
        moved.order = self
            .registry
            .get(target)
            .map_or(1.0, |dock| dock.next_order(moved.group()));
        self.insert_icon(target, moved, true).is_some()
    }

    /// Solves the dock size and hands the result to the backend.
    pub fn update_dock_size(&mut self, id: DockId) -> Option<SizingOutcome> {
        let dock = self.registry.get_mut(id)?;
        let outcome = dock.update_size(&self.config);
        self.apply_size_effects(id, outcome.effects);
        Some(outcome)
    }

    fn apply_size_effects(&mut self, id: DockId, effects: SizeEffects) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        if effects.contains(SizeEffects::MOVE_RESIZE) && dock.visible {
            let geometry = dock.move_resize();
            dock.calculate_icons(&self.config);
            self.backend.move_resize(id, geometry);
        }
        if effects.intersects(SizeEffects::MOVE_RESIZE | SizeEffects::INPUT_SHAPE) {
            self.sync_input_shape(id);
        }
        if effects.intersects(SizeEffects::MOVE_RESIZE | SizeEffects::ICON_GEOMETRY) {
            self.sync_icon_geometry(id);
        }
        if effects.contains(SizeEffects::RESERVE_SPACE) {
            if let Some(dock) = self.registry.get(id) {
                self.backend.reserve_space(id, dock.reserve_space());
            }
        }
    }

    fn sync_input_shape(&mut self, id: DockId) {
        if let Some(dock) = self.registry.get(id) {
            let shape = dock.orientation.to_screen(dock.input_shape());
            self.backend.set_input_shape(id, shape);
        }
    }

    /// Minimize targets of the window icons of a dock.
    fn sync_icon_geometry(&mut self, id: DockId) {
        let Some(dock) = self.registry.get(id) else {
            return;
        };
        for (index, icon) in dock.icons().iter().enumerate() {
            if !matches!(icon.kind(), crate::icon::IconKind::RunningWindow { .. }) {
                continue;
            }
            if let Some(area) = dock.icon_geometry(index, &self.config) {
                self.backend.set_icon_geometry(id, icon.id(), area);
            }
        }
    }

    /// Switches the visibility mode of a root dock.
    pub fn set_visibility(&mut self, id: DockId, mode: VisibilityMode) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        let was_reserving = dock.visibility == VisibilityMode::Reserve;
        let was_below = dock.is_below;
        let slide = dock.set_visibility(mode);
        let is_below = dock.is_below;
        let strut = dock.reserve_space();
        dock.temporarily_hidden = false;

        if was_reserving != (mode == VisibilityMode::Reserve) {
            self.backend.reserve_space(id, strut);
        }
        if was_below != is_below {
            self.backend.set_keep_below(id, is_below);
        }
        if let Some(motion) = slide {
            debug!("dock {id}: visibility change starts {motion:?}");
            if motion == SlideMotion::Hiding {
                self.sync_input_shape(id);
            }
            self.launch_animation(id);
        }
    }

    /// Records whether a menu is open on the dock; a closing menu lets the
    /// dock go if the pointer is gone.
    pub fn set_menu_visible(&mut self, id: DockId, visible: bool) {
        let Some(dock) = self.registry.get_mut(id) else {
            return;
        };
        dock.menu_visible = visible;
        if !visible && !dock.inside {
            self.emit_leave(id, false);
        }
    }

    /// Requests animation frames for a dock until it settles.
    pub fn launch_animation(&mut self, id: DockId) {
        let interval = self.config.system.frame_interval_ms();
        if let Some(dock) = self.registry.get_mut(id) {
            if !dock.timers.frame.is_pending(&self.timers) {
                dock.timers
                    .frame
                    .schedule(&mut self.timers, interval, TimerEvent::new(id, TimerKind::Frame));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};
    use crate::dock::Rect;

    pub(crate) fn app_with(config: Config, icons: usize) -> DockApp<RecordingBackend> {
        let screen = Rect::new(0, 0, config.screen.width as i32, config.screen.height as i32);
        let mut app = DockApp::new(config, RecordingBackend::new(screen)).unwrap();
        let main = app.main_dock();
        for i in 0..icons {
            app.insert_icon(main, Icon::launcher(format!("l{i}"), "cmd", 48.0), false);
        }
        app
    }

    #[test]
    fn test_inserted_icons_get_distinct_orders() {
        let mut app = app_with(Config::default(), 3);
        let main = app.main_dock();
        app.insert_icon(main, Icon::launcher("same", "same", 48.0).with_order(2.0), false);

        let dock = app.dock(main).unwrap();
        let orders: Vec<f64> = dock.icons().iter().map(|icon| icon.order).collect();
        assert_eq!(orders, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(dock.icons()[3].name(), "same");

        let mut ids: Vec<IconId> = dock.icons().iter().map(Icon::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_main_dock_is_placed() {
        let app = app_with(Config::default(), 3);
        let main = app.main_dock();
        let window = app.backend().window_of(main).unwrap();
        let dock = app.dock(main).unwrap();
        assert_eq!(window, dock.window_on_screen());
        assert_eq!(window.y + window.height, 1080);
        assert!(app
            .backend()
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::SetInputShape(id, _) if *id == main)));
    }

    #[test]
    fn test_animated_insert_then_remove() {
        let mut app = app_with(Config::default(), 2);
        let main = app.main_dock();
        let icon = app
            .insert_icon(main, Icon::launcher("new", "new", 48.0), true)
            .unwrap();
        assert!(app.dock(main).unwrap().is_animating());
        app.advance_by(2000);
        assert!(!app.dock(main).unwrap().is_animating());
        assert_eq!(app.dock(main).unwrap().icons().len(), 3);

        assert!(app.remove_icon(main, icon, true));
        app.advance_by(2000);
        let dock = app.dock(main).unwrap();
        assert_eq!(dock.icons().len(), 2);
        assert!(dock.icon(icon).is_none());
    }

    #[test]
    fn test_destroy_cancels_timers() {
        let mut app = app_with(Config::default(), 1);
        let side = app.create_dock("side").unwrap();
        app.insert_icon(side, Icon::launcher("a", "a", 48.0), true);
        assert!(app.pending_events().any(|event| event.dock == side));

        app.destroy_dock(side, Some(app.main_dock())).unwrap();
        assert!(!app.pending_events().any(|event| event.dock == side));
        assert_eq!(app.dock(app.main_dock()).unwrap().icons().len(), 2);
        app.advance_by(2000);
    }

    #[test]
    fn test_sub_dock_removed_with_its_icon() {
        let mut app = app_with(Config::default(), 0);
        let main = app.main_dock();
        let folder = app
            .insert_icon(main, Icon::launcher("folder", "", 48.0), false)
            .unwrap();
        let sub = app.create_sub_dock(main, folder, "folder").unwrap();
        assert!(!app.dock(sub).unwrap().is_root());

        assert!(app.remove_icon(main, folder, false));
        assert!(app.dock(sub).is_none());
    }

    #[test]
    fn test_move_icon_between_docks() {
        let mut app = app_with(Config::default(), 2);
        let main = app.main_dock();
        let side = app.create_dock("side").unwrap();
        let icon = app.dock(main).unwrap().icons()[0].id();
        assert!(app.move_icon_to_dock(icon, side));
        assert_eq!(app.registry().find_icon(icon).map(|(dock, _)| dock), Some(side));
        assert!(!app.move_icon_to_dock(icon, side));
    }

    #[test]
    fn test_reserve_visibility_reserves_space() {
        let mut app = app_with(Config::default(), 3);
        let main = app.main_dock();
        app.backend_mut().take_calls();
        app.set_visibility(main, VisibilityMode::Reserve);
        let calls = app.backend_mut().take_calls();
        assert!(calls
            .iter()
            .any(|call| matches!(call, BackendCall::ReserveSpace(id, Some(_)) if *id == main)));

        app.set_visibility(main, VisibilityMode::KeepBelow);
        let calls = app.backend_mut().take_calls();
        assert!(calls.contains(&BackendCall::ReserveSpace(main, None)));
        assert!(calls.contains(&BackendCall::SetKeepBelow(main, true)));
    }
}
