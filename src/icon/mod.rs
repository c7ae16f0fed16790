//! Data record of a single dock item.

use std::cmp::Ordering;

use serde::Serialize;

use crate::registry::DockId;

/// Insertion factor given to an icon entering a dock; it grows from a
/// sliver to full size.
pub const INSERT_FACTOR: f64 = -0.95;
/// Removal factor given to an icon leaving a dock.
pub const REMOVE_FACTOR: f64 = 1.0;
/// End point of the insert/remove decay.
pub const INSERT_REMOVE_LIMIT: f64 = 0.05;
const INSERT_REMOVE_DECAY: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IconId(u64);

impl IconId {
    /// Id of an icon not yet placed in any dock.
    pub const UNSET: IconId = IconId(0);

    const SEPARATOR_BIT: u64 = 1 << 63;

    /// A dock holds at most one automatic separator per group, so the pair
    /// names it.
    fn automatic_separator(dock: DockId, group: IconGroup) -> Self {
        Self(Self::SEPARATOR_BIT | (u64::from(dock.index()) << 8) | group as u64)
    }
}

/// Hands out icon ids. One allocator serves every dock of a registry, so an
/// icon keeps its id when it moves to another dock.
#[derive(Debug)]
pub struct IconIds {
    next: u64,
}

impl Default for IconIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IconIds {
    #[cfg(test)]
    pub(crate) fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// Gives the icon a fresh id unless it already has one.
    pub fn assign(&mut self, icon: &mut Icon) -> IconId {
        if icon.id == IconId::UNSET {
            icon.id = IconId(self.next);
            self.next += 1;
        }
        icon.id
    }
}

/// What an icon stands for, with the data each kind needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconKind {
    Launcher { command: String },
    RunningWindow { window_id: u64, class: String },
    Applet { module: String },
    Separator { automatic: bool },
}

impl IconKind {
    pub fn is_separator(&self) -> bool {
        matches!(self, IconKind::Separator { .. })
    }

    pub fn is_automatic_separator(&self) -> bool {
        matches!(self, IconKind::Separator { automatic: true })
    }
}

/// Sort rank of an icon. Separators sit between the groups they split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconGroup {
    Launcher = 0,
    LauncherSeparator = 1,
    Application = 2,
    ApplicationSeparator = 3,
    Applet = 4,
    AppletSeparator = 5,
}

impl IconGroup {
    pub fn order(self) -> u32 {
        self as u32
    }

    pub fn is_separator(self) -> bool {
        self.order() % 2 == 1
    }

    /// The separator group placed right after this group.
    pub fn separator_after(self) -> IconGroup {
        match self {
            IconGroup::Launcher | IconGroup::LauncherSeparator => IconGroup::LauncherSeparator,
            IconGroup::Application | IconGroup::ApplicationSeparator => {
                IconGroup::ApplicationSeparator
            }
            IconGroup::Applet | IconGroup::AppletSeparator => IconGroup::AppletSeparator,
        }
    }
}

/// Progress of the insert/remove animation after one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertRemoveStep {
    Idle,
    Running,
    /// The icon reached full size.
    Inserted,
    /// The icon vanished and must now leave its dock.
    Removed,
}

#[derive(Debug, Clone)]
pub struct Icon {
    id: IconId,
    name: String,
    kind: IconKind,
    group: IconGroup,
    /// Insertion order, unique within the group.
    pub order: f64,

    requested_width: f64,
    requested_height: f64,
    /// Current size: the requested size times the dock ratio.
    pub width: f64,
    pub height: f64,

    pub x_at_rest: f64,
    pub x_draw: f64,
    pub y_draw: f64,
    pub scale: f64,
    pub phase: f64,
    pub x_min: f64,
    pub x_max: f64,

    pub is_pointed: bool,
    pub avoids_mouse: bool,
    /// Negative while being inserted, positive while being removed.
    pub personal_scale: f64,

    pub sub_dock: Option<DockId>,
    pub parent: Option<DockId>,
}

impl Icon {
    fn new(name: impl Into<String>, kind: IconKind, group: IconGroup, size: f64) -> Self {
        Self {
            id: IconId::UNSET,
            name: name.into(),
            kind,
            group,
            order: 0.0,
            requested_width: size,
            requested_height: size,
            width: size,
            height: size,
            x_at_rest: 0.0,
            x_draw: 0.0,
            y_draw: 0.0,
            scale: 1.0,
            phase: 0.0,
            x_min: 0.0,
            x_max: 0.0,
            is_pointed: false,
            avoids_mouse: false,
            personal_scale: 0.0,
            sub_dock: None,
            parent: None,
        }
    }

    pub fn launcher(name: impl Into<String>, command: impl Into<String>, size: f64) -> Self {
        let command = command.into();
        Self::new(name, IconKind::Launcher { command }, IconGroup::Launcher, size)
    }

    pub fn running_window(
        name: impl Into<String>,
        window_id: u64,
        class: impl Into<String>,
        size: f64,
    ) -> Self {
        let class = class.into();
        Self::new(
            name,
            IconKind::RunningWindow { window_id, class },
            IconGroup::Application,
            size,
        )
    }

    pub fn applet(name: impl Into<String>, module: impl Into<String>, size: f64) -> Self {
        let module = module.into();
        Self::new(name, IconKind::Applet { module }, IconGroup::Applet, size)
    }

    /// A user separator, kept among the launchers.
    pub fn separator(size: f64) -> Self {
        Self::new(
            "",
            IconKind::Separator { automatic: false },
            IconGroup::Launcher,
            size,
        )
    }

    pub(crate) fn automatic_separator(dock: DockId, after: IconGroup, size: f64) -> Self {
        let group = after.separator_after();
        let mut separator = Self::new("", IconKind::Separator { automatic: true }, group, size);
        separator.id = IconId::automatic_separator(dock, group);
        separator
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.requested_width = width;
        self.requested_height = height;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    pub fn with_sub_dock(mut self, dock: DockId) -> Self {
        self.sub_dock = Some(dock);
        self
    }

    // === Getters ===

    pub fn id(&self) -> IconId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &IconKind {
        &self.kind
    }

    pub fn group(&self) -> IconGroup {
        self.group
    }

    pub fn is_separator(&self) -> bool {
        self.kind.is_separator()
    }

    pub fn requested_size(&self) -> (f64, f64) {
        (self.requested_width, self.requested_height)
    }

    pub fn is_animating_insert_remove(&self) -> bool {
        self.personal_scale != 0.0
    }

    // === State Mutations ===

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_requested_size(&mut self, width: f64, height: f64) {
        self.requested_width = width;
        self.requested_height = height;
    }

    /// Applies the dock ratio to the requested size.
    pub fn apply_ratio(&mut self, ratio: f64) {
        self.width = self.requested_width * ratio;
        self.height = self.requested_height * ratio;
    }

    /// Puts the icon back at its resting place with no zoom.
    pub fn reset_to_rest(&mut self) {
        self.x_draw = self.x_at_rest;
        self.scale = 1.0;
    }

    pub fn begin_insertion(&mut self) {
        self.personal_scale = INSERT_FACTOR;
    }

    pub fn begin_removal(&mut self) {
        self.personal_scale = REMOVE_FACTOR;
    }

    /// Jumps the insert/remove animation to its last frame.
    pub fn finish_insert_remove(&mut self) {
        if self.personal_scale > 0.0 {
            self.personal_scale = INSERT_REMOVE_LIMIT;
        } else if self.personal_scale < 0.0 {
            self.personal_scale = -INSERT_REMOVE_LIMIT;
        }
    }

    /// Advances the insert/remove animation by one frame.
    pub fn step_insert_remove(&mut self) -> InsertRemoveStep {
        if self.personal_scale == 0.0 {
            return InsertRemoveStep::Idle;
        }
        if self.personal_scale == INSERT_REMOVE_LIMIT {
            return InsertRemoveStep::Removed;
        }
        if self.personal_scale == -INSERT_REMOVE_LIMIT {
            self.personal_scale = 0.0;
            return InsertRemoveStep::Inserted;
        }

        self.personal_scale *= INSERT_REMOVE_DECAY;
        if self.personal_scale > 0.0 && self.personal_scale < INSERT_REMOVE_LIMIT {
            self.personal_scale = INSERT_REMOVE_LIMIT;
        } else if self.personal_scale < 0.0 && self.personal_scale > -INSERT_REMOVE_LIMIT {
            self.personal_scale = -INSERT_REMOVE_LIMIT;
        }
        InsertRemoveStep::Running
    }
}

/// Dock ordering: group rank first, then insertion order.
pub fn compare_order(a: &Icon, b: &Icon) -> Ordering {
    a.group
        .cmp(&b.group)
        .then_with(|| a.order.total_cmp(&b.order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_assigned_once() {
        let mut ids = IconIds::default();
        let mut a = Icon::launcher("a", "a", 48.0);
        let mut b = Icon::launcher("b", "b", 48.0);
        assert_eq!(a.id(), IconId::UNSET);

        let first = ids.assign(&mut a);
        assert_ne!(first, IconId::UNSET);
        assert_ne!(ids.assign(&mut b), first);
        assert_eq!(ids.assign(&mut a), first);
    }

    #[test]
    fn test_separator_ids_follow_dock_and_group() {
        let dock = DockId::detached(3);
        let a = Icon::automatic_separator(dock, IconGroup::Launcher, 12.0);
        let b = Icon::automatic_separator(dock, IconGroup::Launcher, 12.0);
        let c = Icon::automatic_separator(dock, IconGroup::Application, 12.0);
        let other = Icon::automatic_separator(DockId::detached(4), IconGroup::Launcher, 12.0);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), other.id());
        assert_ne!(a.id(), IconId::UNSET);
    }

    #[test]
    fn test_kind_groups() {
        assert_eq!(Icon::launcher("t", "term", 48.0).group(), IconGroup::Launcher);
        assert_eq!(
            Icon::running_window("t", 7, "Term", 48.0).group(),
            IconGroup::Application
        );
        assert_eq!(Icon::applet("c", "clock", 48.0).group(), IconGroup::Applet);
        let separator = Icon::separator(12.0);
        assert!(separator.is_separator());
        assert_eq!(separator.group(), IconGroup::Launcher);
        assert_eq!(
            Icon::automatic_separator(DockId::detached(0), IconGroup::Application, 12.0).group(),
            IconGroup::ApplicationSeparator
        );
    }

    #[test]
    fn test_compare_order() {
        let applet = Icon::applet("clock", "clock", 48.0).with_order(0.0);
        let first = Icon::launcher("a", "a", 48.0).with_order(1.0);
        let second = Icon::launcher("b", "b", 48.0).with_order(2.0);

        let mut icons = vec![applet, second, first];
        icons.sort_by(compare_order);
        let names: Vec<_> = icons.iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "clock"]);
    }

    #[test]
    fn test_apply_ratio_uses_requested_size() {
        let mut icon = Icon::launcher("a", "a", 48.0).with_size(48.0, 40.0);
        icon.apply_ratio(0.5);
        icon.apply_ratio(0.5);
        assert_eq!((icon.width, icon.height), (24.0, 20.0));
    }

    #[test]
    fn test_removal_runs_down_to_limit() {
        let mut icon = Icon::launcher("a", "a", 48.0);
        icon.begin_removal();
        let mut frames = 0;
        while icon.step_insert_remove() == InsertRemoveStep::Running {
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(icon.personal_scale, INSERT_REMOVE_LIMIT);
        assert_eq!(icon.step_insert_remove(), InsertRemoveStep::Removed);
    }

    #[test]
    fn test_insertion_settles_at_zero() {
        let mut icon = Icon::launcher("a", "a", 48.0);
        icon.begin_insertion();
        let mut last = InsertRemoveStep::Running;
        for _ in 0..100 {
            last = icon.step_insert_remove();
            if last != InsertRemoveStep::Running {
                break;
            }
        }
        assert_eq!(last, InsertRemoveStep::Inserted);
        assert_eq!(icon.personal_scale, 0.0);
        assert_eq!(icon.step_insert_remove(), InsertRemoveStep::Idle);
    }

    #[test]
    fn test_finish_insert_remove() {
        let mut icon = Icon::launcher("a", "a", 48.0);
        icon.begin_removal();
        icon.finish_insert_remove();
        assert_eq!(icon.step_insert_remove(), InsertRemoveStep::Removed);
    }
}
