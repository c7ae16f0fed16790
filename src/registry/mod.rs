//! Owner of every dock.
//!
//! Docks live in an arena of generation-checked slots; a [`DockId`] whose
//! dock was destroyed stops resolving instead of pointing at a reused slot.
//! The name index only serves lookups coming from configuration, icons and
//! docks refer to each other by id.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dock::{Dock, Rect};
use crate::icon::{Icon, IconId, IconIds};

/// Name given to the first dock when no other name is asked for.
pub const MAIN_DOCK_NAME: &str = "dock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DockId {
    index: u32,
    generation: u32,
}

impl DockId {
    pub(crate) fn index(self) -> u32 {
        self.index
    }

    /// Id not backed by any registry, for docks built in isolation.
    #[cfg(test)]
    pub(crate) fn detached(index: u32) -> Self {
        Self {
            index,
            generation: u32::MAX,
        }
    }
}

impl fmt::Display for DockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a dock named {0:?} already exists")]
    NameTaken(String),
    #[error("no dock {0}")]
    UnknownDock(DockId),
    #[error("dock {child} cannot be placed under {parent}: it is one of its ancestors")]
    WouldCreateCycle { parent: DockId, child: DockId },
    #[error("no icon {0:?} in that dock")]
    UnknownIcon(IconId),
    #[error("the main dock cannot be destroyed")]
    MainDock,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    dock: Option<Dock>,
}

#[derive(Debug, Default)]
pub struct DockRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, DockId>,
    /// Live docks in creation order.
    order: Vec<DockId>,
    main: Option<DockId>,
    icon_ids: IconIds,
}

impl DockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // === Getters ===

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn main_dock(&self) -> Option<DockId> {
        self.main
    }

    pub fn contains(&self, id: DockId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: DockId) -> Option<&Dock> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.dock.as_ref())
    }

    pub fn get_mut(&mut self, id: DockId) -> Option<&mut Dock> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.dock.as_mut())
    }

    /// Two distinct docks borrowed mutably at once.
    pub fn get_pair_mut(&mut self, a: DockId, b: DockId) -> Option<(&mut Dock, &mut Dock)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (low, high) = if a.index < b.index { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(high.index as usize);
        let low_dock = head[low.index as usize].dock.as_mut()?;
        let high_dock = tail[0].dock.as_mut()?;
        if a.index < b.index {
            Some((low_dock, high_dock))
        } else {
            Some((high_dock, low_dock))
        }
    }

    pub fn id_by_name(&self, name: &str) -> Option<DockId> {
        self.names.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Dock> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    /// Live dock ids in creation order.
    pub fn ids(&self) -> Vec<DockId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dock> {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Docks anchored on a screen edge, main dock first.
    pub fn roots(&self) -> impl Iterator<Item = &Dock> {
        self.iter().filter(|dock| dock.is_root())
    }

    /// Resolves a stored dock reference; a dangling or missing one falls
    /// back to the main dock.
    pub fn resolve(&self, id: Option<DockId>) -> Option<DockId> {
        match id {
            Some(id) if self.contains(id) => Some(id),
            Some(id) => {
                warn!("dock {id} no longer exists, using the main dock");
                self.main
            }
            None => self.main,
        }
    }

    /// Same as [`resolve`](Self::resolve) for a dock stored by name.
    pub fn resolve_name(&self, name: &str) -> Option<DockId> {
        match self.id_by_name(name) {
            Some(id) => Some(id),
            None => {
                warn!("no dock named {name:?}, using the main dock");
                self.main
            }
        }
    }

    /// First free name built on `prefix`: `prefix`, `prefix-2`, `prefix-3`...
    pub fn unique_name(&self, prefix: &str) -> String {
        let prefix = if prefix.is_empty() || prefix == "cairo-dock" {
            MAIN_DOCK_NAME
        } else {
            prefix
        };
        if !self.names.contains_key(prefix) {
            return prefix.to_string();
        }
        (2..)
            .map(|n| format!("{prefix}-{n}"))
            .find(|name| !self.names.contains_key(name))
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Name shown to the user for a root dock, e.g. "Bottom dock (2)".
    /// Sub-docks have none.
    pub fn readable_name(&self, id: DockId) -> Option<String> {
        let dock = self.get(id)?;
        if !dock.is_root() {
            return None;
        }
        let position = match (dock.orientation.horizontal, dock.orientation.direction_up) {
            (true, true) => "Bottom dock",
            (true, false) => "Top dock",
            (false, true) => "Right dock",
            (false, false) => "Left dock",
        };
        let similar = self
            .roots()
            .take_while(|other| other.id() != id)
            .filter(|other| other.orientation == dock.orientation)
            .count();
        if similar > 0 {
            Some(format!("{position} ({})", similar + 1))
        } else {
            Some(position.to_string())
        }
    }

    /// The icon owning `id` as its sub-dock, with the dock it sits in.
    pub fn icon_pointing_on_dock(&self, id: DockId) -> Option<(DockId, &Icon)> {
        if self.main == Some(id) {
            return None;
        }
        self.iter()
            .filter(|dock| dock.id() != id)
            .find_map(|dock| {
                dock.icons()
                    .iter()
                    .find(|icon| icon.sub_dock == Some(id))
                    .map(|icon| (dock.id(), icon))
            })
    }

    /// Dock holding the icon that points on `id`.
    pub fn parent_of(&self, id: DockId) -> Option<DockId> {
        self.icon_pointing_on_dock(id).map(|(parent, _)| parent)
    }

    /// Finds the dock currently holding an icon.
    pub fn find_icon(&self, icon: IconId) -> Option<(DockId, &Icon)> {
        self.iter()
            .find_map(|dock| dock.icon(icon).map(|found| (dock.id(), found)))
    }

    /// Whether `ancestor` is `id` or one of the docks it hangs from.
    pub fn is_ancestor(&self, ancestor: DockId, id: DockId) -> bool {
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(dock) = current {
            if dock == ancestor {
                return true;
            }
            depth += 1;
            if depth > self.len() {
                break;
            }
            current = self.parent_of(dock);
        }
        false
    }

    // === State Mutations ===

    /// Creates a dock. The first dock created becomes the main dock.
    pub fn create(
        &mut self,
        name: &str,
        config: &Config,
        screen: Rect,
    ) -> Result<DockId, RegistryError> {
        if self.names.contains_key(name) {
            return Err(RegistryError::NameTaken(name.to_string()));
        }
        let id = match self.free.pop() {
            Some(index) => DockId {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    dock: None,
                });
                DockId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.slots[id.index as usize].dock = Some(Dock::new(id, name, config, screen));
        self.names.insert(name.to_string(), id);
        self.order.push(id);
        if self.main.is_none() {
            self.main = Some(id);
        }
        info!("dock {name} created ({id})");
        Ok(id)
    }

    pub fn rename(&mut self, id: DockId, new_name: &str) -> Result<(), RegistryError> {
        if self.names.contains_key(new_name) {
            return Err(RegistryError::NameTaken(new_name.to_string()));
        }
        let dock = self.get_mut(id).ok_or(RegistryError::UnknownDock(id))?;
        let old_name = dock.name().to_string();
        dock.set_name(new_name);
        self.names.remove(&old_name);
        self.names.insert(new_name.to_string(), id);
        debug!("dock {old_name} renamed to {new_name}");
        Ok(())
    }

    /// Turns a root dock into a sub-dock of `parent`: it takes the parent's
    /// orientation, a smaller ratio, and stays hidden until shown. Returns
    /// false when the dock already was a sub-dock.
    pub fn make_sub_dock(
        &mut self,
        id: DockId,
        parent: DockId,
        config: &Config,
    ) -> Result<bool, RegistryError> {
        if self.is_ancestor(id, parent) {
            return Err(RegistryError::WouldCreateCycle { parent, child: id });
        }
        let orientation = self
            .get(parent)
            .ok_or(RegistryError::UnknownDock(parent))?
            .orientation;
        let dock = self.get_mut(id).ok_or(RegistryError::UnknownDock(id))?;
        if !dock.is_root() {
            return Ok(false);
        }
        dock.ref_count = 1;
        dock.orientation = orientation;
        let ratio = dock.layout.ratio.min(config.system.sub_dock_size_ratio);
        dock.layout.ratio = ratio;
        for icon in dock.icons_mut() {
            icon.apply_ratio(ratio);
        }
        dock.auto_hide = false;
        dock.temporarily_hidden = false;
        dock.layout.hide_offset = 0.0;
        dock.input = crate::dock::InputState::Active;
        dock.visible = false;
        dock.update_size(config);
        dock.visibility = crate::config::VisibilityMode::KeepAbove;
        dock.is_below = false;
        debug!("dock {} is now a sub-dock", dock.name());
        Ok(true)
    }

    /// Points an icon of `parent` on `sub_dock`, making it a sub-dock if it
    /// was a root dock.
    pub fn link_sub_dock(
        &mut self,
        parent: DockId,
        icon: IconId,
        sub_dock: DockId,
        config: &Config,
    ) -> Result<(), RegistryError> {
        if !self.contains(sub_dock) {
            return Err(RegistryError::UnknownDock(sub_dock));
        }
        if !self.make_sub_dock(sub_dock, parent, config)? {
            if let Some(dock) = self.get_mut(sub_dock) {
                dock.ref_count += 1;
            }
        }
        let linked = self
            .get_mut(parent)
            .and_then(|dock| dock.icon_mut(icon))
            .map(|icon| icon.sub_dock.replace(sub_dock));
        match linked {
            Some(previous) => {
                if let Some(previous) = previous.filter(|previous| *previous != sub_dock) {
                    self.unref(previous);
                }
                Ok(())
            }
            None => {
                self.unref(sub_dock);
                Err(RegistryError::UnknownIcon(icon))
            }
        }
    }

    fn unref(&mut self, id: DockId) {
        if let Some(dock) = self.get_mut(id) {
            dock.ref_count = dock.ref_count.saturating_sub(1);
        }
    }

    /// A dock together with the icon id allocator.
    fn dock_and_ids(&mut self, id: DockId) -> Option<(&mut Dock, &mut IconIds)> {
        let Self {
            slots, icon_ids, ..
        } = self;
        let dock = slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.dock.as_mut())?;
        Some((dock, icon_ids))
    }

    /// Inserts an icon into a dock, giving it an id if it has none yet.
    pub fn insert_icon(&mut self, id: DockId, icon: Icon, config: &Config) -> Option<IconId> {
        let (dock, ids) = self.dock_and_ids(id)?;
        Some(dock.insert_icon(icon, ids, config))
    }

    /// Inserts an icon into the dock named in its configuration; an unknown
    /// name lands it in the main dock.
    pub fn insert_icon_in(
        &mut self,
        dock_name: &str,
        icon: Icon,
        config: &Config,
    ) -> Option<(DockId, IconId)> {
        let id = self.resolve_name(dock_name)?;
        Some((id, self.insert_icon(id, icon, config)?))
    }

    /// Destroys a dock and its sub-docks. Their icons move into `receiving`
    /// when given, and are dropped otherwise. Returns the destroyed docks so
    /// the caller can release what they still hold.
    pub fn destroy(
        &mut self,
        id: DockId,
        receiving: Option<DockId>,
        config: &Config,
    ) -> Result<Vec<Dock>, RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownDock(id));
        }
        if self.main == Some(id) {
            return Err(RegistryError::MainDock);
        }
        if let Some(receiving) = receiving {
            if !self.contains(receiving) {
                return Err(RegistryError::UnknownDock(receiving));
            }
            if self.is_ancestor(id, receiving) {
                return Err(RegistryError::WouldCreateCycle {
                    parent: receiving,
                    child: id,
                });
            }
        }

        if let Some((parent, pointing)) = self
            .icon_pointing_on_dock(id)
            .map(|(parent, icon)| (parent, icon.id()))
        {
            if let Some(icon) = self.get_mut(parent).and_then(|dock| dock.icon_mut(pointing)) {
                icon.sub_dock = None;
            }
        }

        let mut destroyed = Vec::new();
        self.take_recursively(id, receiving, config, &mut destroyed);
        if let Some(receiving) = receiving.and_then(|receiving| self.get_mut(receiving)) {
            receiving.update_size(config);
        }
        Ok(destroyed)
    }

    fn take_recursively(
        &mut self,
        id: DockId,
        receiving: Option<DockId>,
        config: &Config,
        destroyed: &mut Vec<Dock>,
    ) {
        let Some(mut dock) = self.remove_slot(id) else {
            return;
        };
        for mut icon in dock.drain_icons() {
            if let Some(sub_dock) = icon.sub_dock.take() {
                self.take_recursively(sub_dock, receiving, config, destroyed);
            }
            match receiving.and_then(|receiving| self.dock_and_ids(receiving)) {
                Some((target, ids)) => {
                    debug!("icon {} moved to dock {}", icon.name(), target.name());
                    icon.order = target.next_order(icon.group());
                    icon.begin_insertion();
                    target.insert_icon(icon, ids, config);
                }
                None => debug!("icon {} dropped with dock {}", icon.name(), dock.name()),
            }
        }
        info!("dock {} destroyed", dock.name());
        destroyed.push(dock);
    }

    fn remove_slot(&mut self, id: DockId) -> Option<Dock> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let dock = slot.dock.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.names.remove(dock.name());
        self.order.retain(|other| *other != id);
        Some(dock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dock::Orientation;

    fn screen() -> Rect {
        Rect::new(0, 0, 1920, 1080)
    }

    fn registry_with_main(config: &Config) -> (DockRegistry, DockId) {
        let mut registry = DockRegistry::new();
        let main = registry
            .create(MAIN_DOCK_NAME, config, screen())
            .expect("main dock");
        (registry, main)
    }

    #[test]
    fn test_first_dock_is_main() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let other = registry.create("other", &config, screen()).unwrap();
        assert_eq!(registry.main_dock(), Some(main));
        assert_ne!(main, other);
        assert_eq!(registry.by_name("other").map(Dock::id), Some(other));
        assert_eq!(
            registry.create("other", &config, screen()),
            Err(RegistryError::NameTaken("other".to_string()))
        );
    }

    #[test]
    fn test_unique_name() {
        let config = Config::default();
        let (mut registry, _) = registry_with_main(&config);
        assert_eq!(registry.unique_name(""), "dock-2");
        assert_eq!(registry.unique_name("cairo-dock"), "dock-2");
        assert_eq!(registry.unique_name("apps"), "apps");
        registry.create("apps", &config, screen()).unwrap();
        registry.create("apps-2", &config, screen()).unwrap();
        assert_eq!(registry.unique_name("apps"), "apps-3");
    }

    #[test]
    fn test_rename_keeps_icons_attached() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let (_, icon) = registry
            .insert_icon_in(MAIN_DOCK_NAME, Icon::launcher("a", "a", 48.0), &config)
            .unwrap();
        registry.create("taken", &config, screen()).unwrap();
        assert!(registry.rename(main, "taken").is_err());
        registry.rename(main, "bottom").unwrap();
        assert_eq!(registry.id_by_name("bottom"), Some(main));
        assert!(registry.id_by_name(MAIN_DOCK_NAME).is_none());
        assert_eq!(registry.find_icon(icon).map(|(dock, _)| dock), Some(main));
    }

    #[test]
    fn test_readable_names() {
        let mut config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let second = registry.create("second", &config, screen()).unwrap();
        config.dock.horizontal = false;
        config.dock.direction_up = false;
        let left = registry.create("left", &config, screen()).unwrap();

        assert_eq!(registry.readable_name(main).as_deref(), Some("Bottom dock"));
        assert_eq!(registry.readable_name(second).as_deref(), Some("Bottom dock (2)"));
        assert_eq!(registry.readable_name(left).as_deref(), Some("Left dock"));
    }

    #[test]
    fn test_sub_dock_link() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let (_, folder) = registry
            .insert_icon_in(MAIN_DOCK_NAME, Icon::launcher("folder", "", 48.0), &config)
            .unwrap();
        let sub = registry.create("folder", &config, screen()).unwrap();
        registry.link_sub_dock(main, folder, sub, &config).unwrap();

        let dock = registry.get(sub).unwrap();
        assert!(!dock.is_root());
        assert!(!dock.visible);
        assert!(dock.layout.ratio <= config.system.sub_dock_size_ratio);
        assert_eq!(dock.orientation, Orientation::from_config(&config));
        assert_eq!(registry.readable_name(sub), None);
        assert_eq!(registry.roots().count(), 1);

        let (parent, icon) = registry.icon_pointing_on_dock(sub).unwrap();
        assert_eq!(parent, main);
        assert_eq!(icon.id(), folder);
        assert!(registry.icon_pointing_on_dock(main).is_none());
    }

    #[test]
    fn test_cycles_are_refused() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let (_, folder) = registry
            .insert_icon_in(MAIN_DOCK_NAME, Icon::launcher("folder", "", 48.0), &config)
            .unwrap();
        let sub = registry.create("sub", &config, screen()).unwrap();
        registry.link_sub_dock(main, folder, sub, &config).unwrap();

        let (_, inner) = registry
            .insert_icon_in("sub", Icon::launcher("inner", "", 48.0), &config)
            .unwrap();
        assert_eq!(
            registry.link_sub_dock(sub, inner, sub, &config),
            Err(RegistryError::WouldCreateCycle {
                parent: sub,
                child: sub
            })
        );
    }

    #[test]
    fn test_dangling_reference_falls_back_to_main() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let gone = registry.create("gone", &config, screen()).unwrap();
        registry.destroy(gone, None, &config).unwrap();

        assert!(registry.get(gone).is_none());
        assert_eq!(registry.resolve(Some(gone)), Some(main));
        assert_eq!(registry.resolve_name("gone"), Some(main));

        let reused = registry.create("new", &config, screen()).unwrap();
        assert_ne!(reused, gone);
        assert!(registry.get(gone).is_none());
    }

    #[test]
    fn test_destroy_migrates_icons_through_sub_docks() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let side = registry.create("side", &config, screen()).unwrap();
        let (_, folder) = registry
            .insert_icon_in("side", Icon::launcher("folder", "", 48.0), &config)
            .unwrap();
        registry
            .insert_icon_in("side", Icon::launcher("a", "a", 48.0), &config)
            .unwrap();
        let sub = registry.create("sub", &config, screen()).unwrap();
        registry.link_sub_dock(side, folder, sub, &config).unwrap();
        registry
            .insert_icon_in("sub", Icon::launcher("b", "b", 48.0), &config)
            .unwrap();

        let destroyed = registry.destroy(side, Some(main), &config).unwrap();
        assert_eq!(destroyed.len(), 2);
        assert!(registry.get(sub).is_none());

        let names: Vec<&str> = registry
            .get(main)
            .unwrap()
            .icons()
            .iter()
            .map(Icon::name)
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"b"));
        assert!(registry
            .get(main)
            .unwrap()
            .icons()
            .iter()
            .all(|icon| icon.sub_dock.is_none()));
    }

    #[test]
    fn test_destroy_sub_dock_unlinks_icon() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        let (_, folder) = registry
            .insert_icon_in(MAIN_DOCK_NAME, Icon::launcher("folder", "", 48.0), &config)
            .unwrap();
        let sub = registry.create("sub", &config, screen()).unwrap();
        registry.link_sub_dock(main, folder, sub, &config).unwrap();
        registry.destroy(sub, None, &config).unwrap();

        let icon = registry.get(main).unwrap().icon(folder).unwrap();
        assert_eq!(icon.sub_dock, None);
        assert_eq!(
            registry.destroy(main, None, &config).unwrap_err(),
            RegistryError::MainDock
        );
    }

    #[test]
    fn test_migrated_icons_follow_receiving_icons() {
        let config = Config::default();
        let (mut registry, main) = registry_with_main(&config);
        for name in ["x", "y"] {
            registry
                .insert_icon_in(MAIN_DOCK_NAME, Icon::launcher(name, name, 48.0), &config)
                .unwrap();
        }
        let side = registry.create("side", &config, screen()).unwrap();
        let (_, a) = registry
            .insert_icon_in("side", Icon::launcher("a", "a", 48.0), &config)
            .unwrap();
        registry
            .insert_icon_in("side", Icon::launcher("b", "b", 48.0), &config)
            .unwrap();

        registry.destroy(side, Some(main), &config).unwrap();

        let dock = registry.get(main).unwrap();
        let names: Vec<&str> = dock.icons().iter().map(Icon::name).collect();
        assert_eq!(names, vec!["x", "y", "a", "b"]);
        let mut orders: Vec<f64> = dock.icons().iter().map(|icon| icon.order).collect();
        orders.dedup();
        assert_eq!(orders.len(), 4);
        assert_eq!(registry.find_icon(a).map(|(dock, _)| dock), Some(main));
    }
}
