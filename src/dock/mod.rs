//! A dock: an ordered row of icons with its layout and visibility state.
//!
//! The geometry lives in the submodules: [`wave`] places the icons,
//! [`sizing`] finds the ratio and window size, [`mouse`] classifies the
//! pointer, [`visibility`] and [`animation`] drive the show/hide motions.
//! Coordinates are expressed along the dock axis: `x` runs along the row and
//! `y` across it, whatever the screen edge.

pub mod animation;
pub mod mouse;
pub mod sizing;
pub mod visibility;
pub mod wave;

use serde::Serialize;
use tracing::debug;

use crate::config::{Config, VisibilityMode};
use crate::icon::{compare_order, Icon, IconGroup, IconId, IconIds};
use crate::registry::DockId;
use crate::timer::TimerSlot;

pub use mouse::MousePosition;
pub use sizing::{ScreenEdge, SizeEffects, SizingOutcome, Strut};
pub use visibility::{InputState, MouseAction, SlideMotion, VisibilityState, ZoomMotion};
pub use wave::{DragTarget, WaveInput, WaveStyle};

/// Orders closer than this are renumbered before inserting between them.
const MIN_ORDER_GAP: f64 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Orientation {
    pub horizontal: bool,
    pub direction_up: bool,
}

impl Orientation {
    pub fn from_config(config: &Config) -> Self {
        Self {
            horizontal: config.dock.horizontal,
            direction_up: config.dock.direction_up,
        }
    }

    /// Converts a rectangle expressed along the dock axis to screen
    /// coordinates.
    pub fn to_screen(self, rect: Rect) -> Rect {
        if self.horizontal {
            rect
        } else {
            rect.transposed()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn transposed(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
            width: self.height,
            height: self.width,
        }
    }
}

/// Sizes computed by the layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockLayout {
    /// Width of the row with no zoom: icon widths plus gaps.
    pub flat_width: f64,
    /// Tallest non-separator icon at ratio 1.
    pub max_icon_height: f64,
    pub ratio: f64,
    pub magnitude_max: f64,
    pub magnitude_index: u32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Size of the zone that reacts to the pointer.
    pub active_width: i32,
    pub active_height: i32,
    pub decorations_height: f64,
    pub offset_for_extend: f64,
    pub min_left_margin: f64,
    pub min_right_margin: f64,
    pub max_left_margin: f64,
    pub max_right_margin: f64,
    /// 0 unfolded, 1 all icons stacked on the alignment point.
    pub folding_factor: f64,
    /// 0 shown, 1 fully slid out of the screen.
    pub hide_offset: f64,
}

impl Default for DockLayout {
    fn default() -> Self {
        Self {
            flat_width: 0.0,
            max_icon_height: 0.0,
            ratio: 1.0,
            magnitude_max: 1.0,
            magnitude_index: 0,
            min_width: 0,
            min_height: 0,
            max_width: 0,
            max_height: 0,
            active_width: 0,
            active_height: 0,
            decorations_height: 0.0,
            offset_for_extend: 0.0,
            min_left_margin: 0.0,
            min_right_margin: 0.0,
            max_left_margin: 0.0,
            max_right_margin: 0.0,
            folding_factor: 0.0,
            hide_offset: 0.0,
        }
    }
}

/// Logical timers owned by a dock. Each slot holds at most one pending
/// callback.
#[derive(Debug, Default)]
pub struct DockTimers {
    pub leave: TimerSlot,
    pub hide_back: TimerSlot,
    pub unhide: TimerSlot,
    pub frame: TimerSlot,
}

#[derive(Debug)]
pub struct Dock {
    id: DockId,
    name: String,
    /// Number of icons pointing to this dock; 0 for a root dock.
    pub ref_count: u32,
    icons: Vec<Icon>,
    pub layout: DockLayout,
    pub orientation: Orientation,

    pub align: f64,
    pub gap_x: i32,
    pub gap_y: i32,
    /// Window geometry along the dock axis, screen offset included.
    pub window: Rect,
    /// The screen the dock lives on, in screen coordinates.
    pub screen: Rect,
    pub visible: bool,

    pub visibility: VisibilityMode,
    pub auto_hide: bool,
    pub temporarily_hidden: bool,
    pub is_below: bool,
    pub menu_visible: bool,
    pub entrance_disabled: bool,
    pub inside: bool,
    pub zoom: ZoomMotion,
    pub slide: SlideMotion,
    pub input: InputState,

    /// Pointer position in window coordinates along the dock axis.
    pub mouse_x: i32,
    pub mouse_y: i32,
    pub mouse_position: MousePosition,
    pub drag: Option<DragTarget>,
    pub can_drop: bool,

    pub timers: DockTimers,
}

impl Dock {
    pub fn new(id: DockId, name: impl Into<String>, config: &Config, screen: Rect) -> Self {
        let visibility = config.dock.visibility;
        let auto_hide = visibility == VisibilityMode::AutoHide;
        let mut layout = DockLayout::default();
        if auto_hide {
            layout.hide_offset = 1.0;
        }
        Self {
            id,
            name: name.into(),
            ref_count: 0,
            icons: Vec::new(),
            layout,
            orientation: Orientation::from_config(config),
            align: config.dock.align,
            gap_x: config.dock.gap_x,
            gap_y: config.dock.gap_y,
            window: Rect::default(),
            screen,
            visible: true,
            visibility,
            auto_hide,
            temporarily_hidden: false,
            is_below: visibility == VisibilityMode::KeepBelow,
            menu_visible: false,
            entrance_disabled: false,
            inside: false,
            zoom: ZoomMotion::Idle,
            slide: SlideMotion::Idle,
            input: if auto_hide {
                InputState::Hidden
            } else {
                InputState::AtRest
            },
            mouse_x: -1,
            mouse_y: -1,
            mouse_position: MousePosition::Outside,
            drag: None,
            can_drop: false,
            timers: DockTimers::default(),
        }
    }

    // === Getters ===

    pub fn id(&self) -> DockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.ref_count == 0
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn icon(&self, id: IconId) -> Option<&Icon> {
        self.icons.iter().find(|icon| icon.id() == id)
    }

    pub fn icon_mut(&mut self, id: IconId) -> Option<&mut Icon> {
        self.icons.iter_mut().find(|icon| icon.id() == id)
    }

    pub fn icon_index(&self, id: IconId) -> Option<usize> {
        self.icons.iter().position(|icon| icon.id() == id)
    }

    pub fn pointed_index(&self) -> Option<usize> {
        wave::pointed_index(&self.icons)
    }

    pub fn pointed_icon(&self) -> Option<&Icon> {
        self.pointed_index().map(|index| &self.icons[index])
    }

    pub fn first_drawn_index(&self) -> usize {
        wave::first_drawn_index(&self.icons)
    }

    /// Icons in drawing order, the pointed one last.
    pub fn icons_in_draw_order(&self) -> impl Iterator<Item = &Icon> {
        let start = self.first_drawn_index();
        self.icons[start..].iter().chain(self.icons[..start].iter())
    }

    /// Screen size along the dock axis.
    pub fn screen_width(&self) -> i32 {
        if self.orientation.horizontal {
            self.screen.width
        } else {
            self.screen.height
        }
    }

    pub fn screen_height(&self) -> i32 {
        if self.orientation.horizontal {
            self.screen.height
        } else {
            self.screen.width
        }
    }

    pub fn screen_offset_x(&self) -> i32 {
        if self.orientation.horizontal {
            self.screen.x
        } else {
            self.screen.y
        }
    }

    pub fn screen_offset_y(&self) -> i32 {
        if self.orientation.horizontal {
            self.screen.y
        } else {
            self.screen.x
        }
    }

    /// Tallest icon at the current ratio.
    pub fn scaled_max_icon_height(&self) -> f64 {
        self.layout.max_icon_height * self.layout.ratio
    }

    pub fn current_width(&self, config: &Config) -> f64 {
        wave::current_dock_width(&self.icons, config.dock.frame_margin)
    }

    pub fn window_on_screen(&self) -> Rect {
        self.orientation.to_screen(self.window)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            dock: self.id,
            name: self.name.clone(),
            window: self.window_on_screen(),
            visible: self.visible,
            ratio: self.layout.ratio,
            magnitude: animation::magnitude(self.layout.magnitude_index),
            state: self.visibility_state(),
            mouse_position: self.mouse_position,
            hide_offset: self.layout.hide_offset,
            folding_factor: self.layout.folding_factor,
            can_drop: self.can_drop,
            icons: self
                .icons
                .iter()
                .map(|icon| IconFrame {
                    id: icon.id(),
                    name: icon.name().to_string(),
                    x_draw: icon.x_draw,
                    y_draw: icon.y_draw,
                    scale: icon.scale,
                    is_pointed: icon.is_pointed,
                    avoids_mouse: icon.avoids_mouse,
                })
                .collect(),
        }
    }

    // === State Mutations ===

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn icons_mut(&mut self) -> &mut [Icon] {
        &mut self.icons
    }

    /// Order for an icon appended at the end of its group.
    pub fn next_order(&self, group: IconGroup) -> f64 {
        self.icons
            .iter()
            .filter(|icon| icon.group() == group)
            .map(|icon| icon.order)
            .fold(None, |max: Option<f64>, order| Some(max.map_or(order, |m| m.max(order))))
            .map_or(1.0, |max| max + 1.0)
    }

    /// Inserts an icon at its sorted place and takes ownership of it. An
    /// icon without an order, or whose order is already taken in its group,
    /// goes to the end of the group.
    pub fn insert_icon(&mut self, mut icon: Icon, ids: &mut IconIds, config: &Config) -> IconId {
        let id = ids.assign(&mut icon);
        let group = icon.group();
        let taken = self
            .icons
            .iter()
            .any(|other| other.group() == group && other.order == icon.order);
        if icon.order <= 0.0 || taken {
            icon.order = self.next_order(group);
        }
        icon.parent = Some(self.id);
        icon.apply_ratio(self.layout.ratio);
        let index = self
            .icons
            .partition_point(|other| compare_order(other, &icon).is_le());
        debug!("dock {}: insert {} at {index}", self.name, icon.name());
        self.icons.insert(index, icon);
        self.update_automatic_separators(config);
        id
    }

    pub fn remove_icon(&mut self, id: IconId, config: &Config) -> Option<Icon> {
        let index = self.icon_index(id)?;
        let mut icon = self.icons.remove(index);
        icon.parent = None;
        icon.is_pointed = false;
        debug!("dock {}: remove {}", self.name, icon.name());
        self.update_automatic_separators(config);
        Some(icon)
    }

    /// Takes every icon out of the dock, automatic separators dropped.
    pub(crate) fn drain_icons(&mut self) -> Vec<Icon> {
        self.icons
            .drain(..)
            .filter(|icon| !icon.kind().is_automatic_separator())
            .map(|mut icon| {
                icon.parent = None;
                icon.is_pointed = false;
                icon
            })
            .collect()
    }

    /// Keeps one automatic separator between two neighbouring groups, and
    /// none elsewhere. Returns true when the row changed.
    pub fn update_automatic_separators(&mut self, config: &Config) -> bool {
        let mut wanted: Vec<IconGroup> = Vec::new();
        if config.dock.mixed_groups_separators {
            let mut previous: Option<IconGroup> = None;
            for icon in self.icons.iter().filter(|icon| !icon.is_separator()) {
                if let Some(prev_group) = previous {
                    if prev_group != icon.group() {
                        wanted.push(prev_group.separator_after());
                    }
                }
                previous = Some(icon.group());
            }
        }

        let before = self.icons.len();
        self.icons.retain(|icon| {
            !icon.kind().is_automatic_separator() || wanted.contains(&icon.group())
        });
        let mut changed = before != self.icons.len();

        for group in wanted {
            let present = self
                .icons
                .iter()
                .any(|icon| icon.kind().is_automatic_separator() && icon.group() == group);
            if present {
                continue;
            }
            let mut separator = Icon::automatic_separator(self.id, group, config.icons.separator_size)
                .with_size(config.icons.separator_size, config.icons.icon_size);
            separator.parent = Some(self.id);
            separator.apply_ratio(self.layout.ratio);
            let index = self
                .icons
                .partition_point(|other| compare_order(other, &separator).is_le());
            self.icons.insert(index, separator);
            changed = true;
        }
        changed
    }

    /// Moves an icon right after `after` within its group, or to the front
    /// of the group when `after` is None. Returns false when the two icons
    /// are not in the same group.
    pub fn move_icon_after(&mut self, id: IconId, after: Option<IconId>) -> bool {
        let Some(index) = self.icon_index(id) else {
            return false;
        };
        let group = self.icons[index].group();
        if let Some(after) = after {
            match self.icon(after) {
                Some(prev) if prev.group() == group && after != id => {}
                _ => return false,
            }
        }

        let mut icon = self.icons.remove(index);
        let order = match after {
            Some(after) => {
                let Some(prev_index) = self.icon_index(after) else {
                    self.icons.insert(index, icon);
                    return false;
                };
                let next_order = self
                    .icons
                    .get(prev_index + 1)
                    .filter(|next| next.group() == group)
                    .map(|next| next.order);
                match next_order {
                    None => self.icons[prev_index].order + 1.0,
                    Some(next) => {
                        if next - self.icons[prev_index].order < MIN_ORDER_GAP {
                            self.normalize_group_orders(group);
                        }
                        let prev = self.icons[prev_index].order;
                        let next = self.icons[prev_index + 1].order;
                        (prev + next) / 2.0
                    }
                }
            }
            None => self
                .icons
                .iter()
                .find(|other| other.group() == group)
                .map_or(1.0, |first| first.order - 1.0),
        };

        icon.order = order;
        let index = self
            .icons
            .partition_point(|other| compare_order(other, &icon).is_le());
        self.icons.insert(index, icon);
        true
    }

    /// Renumbers a group 1, 2, 3... in its current order.
    pub fn normalize_group_orders(&mut self, group: IconGroup) {
        let mut order = 1.0;
        for icon in self.icons.iter_mut().filter(|icon| icon.group() == group) {
            icon.order = order;
            order += 1.0;
        }
    }

    /// Per-frame pass: wave placement, pointer classification and drop
    /// check. Returns the pointed icon.
    pub fn calculate_icons(&mut self, config: &Config) -> Option<usize> {
        let style = WaveStyle::from_config(config);
        let input = WaveInput {
            x_abs: self.mouse_x_abs(),
            magnitude: animation::magnitude(self.layout.magnitude_index) * self.layout.magnitude_max,
            flat_width: self.layout.flat_width,
            width: f64::from(self.window.width),
            height: f64::from(self.window.height),
            align: self.align,
            folding: self.layout.folding_factor,
            direction_up: self.orientation.direction_up,
        };
        let pointed = wave::wave_with_position(&mut self.icons, &style, &input);

        let extend = self.layout.offset_for_extend * (self.align - 0.5) * 2.0;
        if extend != 0.0 {
            for icon in self.icons.iter_mut() {
                icon.x_draw += extend;
            }
        }

        self.mouse_position = self.classify_mouse();
        self.can_drop = wave::check_can_drop(
            &mut self.icons,
            f64::from(self.mouse_x),
            self.drag.as_ref(),
            style.amplitude,
        );
        pointed
    }

    pub fn start_drag(&mut self, target: DragTarget) {
        self.drag = Some(target);
    }

    pub fn stop_drag(&mut self) {
        self.drag = None;
        self.can_drop = false;
        wave::stop_marking(&mut self.icons);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IconFrame {
    pub id: IconId,
    pub name: String,
    pub x_draw: f64,
    pub y_draw: f64,
    pub scale: f64,
    pub is_pointed: bool,
    pub avoids_mouse: bool,
}

/// What a renderer needs to draw one frame of a dock.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub dock: DockId,
    pub name: String,
    pub window: Rect,
    pub visible: bool,
    pub ratio: f64,
    pub magnitude: f64,
    pub state: VisibilityState,
    pub mouse_position: MousePosition,
    pub hide_offset: f64,
    pub folding_factor: f64,
    pub can_drop: bool,
    pub icons: Vec<IconFrame>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::icon::IconKind;

    pub(crate) fn dock_with(config: &Config, icons: Vec<Icon>) -> Dock {
        let mut dock = Dock::new(
            DockId::detached(0),
            "dock",
            config,
            Rect::new(0, 0, config.screen.width as i32, config.screen.height as i32),
        );
        let mut ids = IconIds::default();
        for icon in icons {
            dock.insert_icon(icon, &mut ids, config);
        }
        dock
    }

    fn names(dock: &Dock) -> Vec<String> {
        dock.icons()
            .iter()
            .map(|icon| match icon.kind() {
                IconKind::Separator { .. } => "|".to_string(),
                _ => icon.name().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_insert_keeps_sort_order() {
        let config = Config::default();
        let dock = dock_with(
            &config,
            vec![
                Icon::applet("clock", "clock", 48.0).with_order(1.0),
                Icon::launcher("b", "b", 48.0).with_order(2.0),
                Icon::running_window("term", 3, "Term", 48.0).with_order(1.0),
                Icon::launcher("a", "a", 48.0).with_order(1.0),
            ],
        );
        assert_eq!(names(&dock), vec!["a", "b", "|", "term", "|", "clock"]);
        assert!(dock.icons().iter().all(|icon| icon.parent == Some(dock.id())));
    }

    #[test]
    fn test_separators_follow_group_changes() {
        let config = Config::default();
        let mut dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0).with_order(1.0),
                Icon::applet("clock", "clock", 48.0).with_order(1.0),
            ],
        );
        assert_eq!(names(&dock), vec!["a", "|", "clock"]);
        let separator_id = dock.icons()[1].id();

        let mut ids = IconIds::starting_at(100);
        let term = dock.insert_icon(Icon::running_window("term", 3, "Term", 48.0), &mut ids, &config);
        assert_eq!(names(&dock), vec!["a", "|", "term", "|", "clock"]);
        assert_eq!(dock.icons()[1].id(), separator_id);

        dock.remove_icon(term, &config);
        assert_eq!(names(&dock), vec!["a", "|", "clock"]);

        let clock = dock.icons()[2].id();
        dock.remove_icon(clock, &config);
        assert_eq!(names(&dock), vec!["a"]);
    }

    #[test]
    fn test_no_separators_when_disabled() {
        let mut config = Config::default();
        config.dock.mixed_groups_separators = false;
        let dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0),
                Icon::applet("clock", "clock", 48.0),
            ],
        );
        assert_eq!(names(&dock), vec!["a", "clock"]);
    }

    #[test]
    fn test_user_separator_sorts_among_launchers() {
        let config = Config::default();
        let dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0).with_order(1.0),
                Icon::separator(12.0).with_order(1.5),
                Icon::launcher("b", "b", 48.0).with_order(2.0),
            ],
        );
        assert_eq!(names(&dock), vec!["a", "|", "b"]);
    }

    #[test]
    fn test_move_icon_after() {
        let config = Config::default();
        let mut dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0).with_order(1.0),
                Icon::launcher("b", "b", 48.0).with_order(2.0),
                Icon::launcher("c", "c", 48.0).with_order(3.0),
            ],
        );
        let a = dock.icons()[0].id();
        let b = dock.icons()[1].id();
        let c = dock.icons()[2].id();

        assert!(dock.move_icon_after(a, Some(b)));
        assert_eq!(names(&dock), vec!["b", "a", "c"]);
        assert!(dock.move_icon_after(a, Some(c)));
        assert_eq!(names(&dock), vec!["b", "c", "a"]);
        assert!(dock.move_icon_after(a, None));
        assert_eq!(names(&dock), vec!["a", "b", "c"]);
        assert!(!dock.move_icon_after(a, Some(a)));
    }

    #[test]
    fn test_move_renumbers_crowded_group() {
        let config = Config::default();
        let mut dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0).with_order(1.0),
                Icon::launcher("b", "b", 48.0).with_order(1.001),
                Icon::launcher("c", "c", 48.0).with_order(3.0),
            ],
        );
        let a = dock.icons()[0].id();
        let c = dock.icons()[2].id();
        assert!(dock.move_icon_after(c, Some(a)));
        assert_eq!(names(&dock), vec!["a", "c", "b"]);
        let orders: Vec<f64> = dock.icons().iter().map(|icon| icon.order).collect();
        assert_eq!(orders, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_move_refuses_other_group() {
        let config = Config::default();
        let mut dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0),
                Icon::applet("clock", "clock", 48.0),
            ],
        );
        let a = dock.icons()[0].id();
        let clock = dock.icons()[2].id();
        assert!(!dock.move_icon_after(a, Some(clock)));
    }

    #[test]
    fn test_next_order() {
        let config = Config::default();
        let dock = dock_with(
            &config,
            vec![
                Icon::launcher("a", "a", 48.0).with_order(4.0),
                Icon::launcher("b", "b", 48.0).with_order(2.0),
            ],
        );
        assert_eq!(dock.next_order(IconGroup::Launcher), 5.0);
        assert_eq!(dock.next_order(IconGroup::Applet), 1.0);
    }

    #[test]
    fn test_vertical_screen_axes() {
        let mut config = Config::default();
        config.dock.horizontal = false;
        let dock = Dock::new(DockId::detached(0), "side", &config, Rect::new(10, 20, 1920, 1080));
        assert_eq!(dock.screen_width(), 1080);
        assert_eq!(dock.screen_height(), 1920);
        assert_eq!(dock.screen_offset_x(), 20);
        assert_eq!(dock.screen_offset_y(), 10);
        assert_eq!(
            dock.orientation.to_screen(Rect::new(1, 2, 3, 4)),
            Rect::new(2, 1, 4, 3)
        );
    }

    #[test]
    fn test_snapshot_serializes_for_renderers() {
        let config = Config::default();
        let mut dock = dock_with(&config, vec![Icon::launcher("a", "a", 48.0)]);
        dock.update_size(&config);
        dock.calculate_icons(&config);

        let value = serde_json::to_value(dock.snapshot()).unwrap();
        assert_eq!(value["name"], "dock");
        assert!(value["mouse_position"].is_string());
        assert_eq!(value["icons"][0]["name"], "a");
        assert_eq!(value["icons"].as_array().unwrap().len(), 1);
    }
}
