//! Per-frame steps of the zoom, fold and slide animations.

use tracing::trace;

use super::Dock;
use crate::config::{Config, MAX_MAGNITUDE_INDEX};
use crate::icon::{Icon, InsertRemoveStep};

/// Eased zoom magnitude in [0, 1] for a ramp index in [0, 1000].
pub fn magnitude(index: u32) -> f64 {
    let t = f64::from(index) / f64::from(MAX_MAGNITUDE_INDEX);
    let eased = if t > 0.5 {
        1.0 - (1.0 - t).powi(3) * 4.0
    } else {
        t.powi(3) * 4.0
    };
    eased.clamp(0.0, 1.0)
}

fn is_settled_fold(folding: f64) -> bool {
    folding == 0.0 || folding == 1.0
}

/// Icons that finished their insert/remove animation during a frame.
#[derive(Debug, Default, PartialEq)]
pub struct InsertRemoveReport {
    /// Icons whose removal ended; they must now leave the dock.
    pub removed: Vec<crate::icon::IconId>,
    /// Whether any icon is still animating or just settled.
    pub needs_layout: bool,
}

impl Dock {
    /// Advances the zoom ramp and the unfolding by one growth frame.
    pub fn grow_tick(&mut self, config: &Config, dt_ms: u64) {
        let step = config.system.grow_interval();
        self.layout.magnitude_index = (self.layout.magnitude_index + step).min(MAX_MAGNITUDE_INDEX);
        if self.layout.folding_factor != 0.0 {
            let unfold = config.system.unfold_duration_ms.max(1) as f64;
            self.layout.folding_factor = (self.layout.folding_factor - dt_ms as f64 / unfold).max(0.0);
        }
        trace!(
            "dock {}: grow to {} (folding {:.2})",
            self.name(),
            self.layout.magnitude_index,
            self.layout.folding_factor
        );
    }

    pub fn growth_finished(&self) -> bool {
        self.layout.magnitude_index == MAX_MAGNITUDE_INDEX && self.layout.folding_factor == 0.0
    }

    /// Lowers the zoom ramp by one shrink frame; a dock that started folding
    /// keeps folding until it is fully folded.
    pub fn shrink_tick(&mut self, config: &Config, dt_ms: u64) {
        let step = config.system.shrink_interval();
        self.layout.magnitude_index = self.layout.magnitude_index.saturating_sub(step);
        if !is_settled_fold(self.layout.folding_factor) {
            let unfold = config.system.unfold_duration_ms.max(1) as f64;
            self.layout.folding_factor = (self.layout.folding_factor + dt_ms as f64 / unfold).min(1.0);
        }
        trace!(
            "dock {}: shrink to {} (folding {:.2})",
            self.name(),
            self.layout.magnitude_index,
            self.layout.folding_factor
        );
    }

    /// The dock is back at rest: no zoom and no fold in progress.
    pub fn shrink_settled(&self) -> bool {
        self.layout.magnitude_index == 0 && is_settled_fold(self.layout.folding_factor)
    }

    pub fn folding_in_progress(&self) -> bool {
        !is_settled_fold(self.layout.folding_factor)
    }

    /// One frame of the slide-out. Returns true while it must go on; the
    /// slide waits for the zoom to fall back first.
    pub fn hide_step(&mut self, config: &Config) -> bool {
        if self.layout.magnitude_index > 0 {
            return true;
        }
        if self.layout.hide_offset < 1.0 {
            self.layout.hide_offset += 1.0 / f64::from(config.system.hide_nb_steps.max(1));
            if self.layout.hide_offset > 0.99 {
                self.layout.hide_offset = 1.0;
                self.icons_mut().iter_mut().for_each(Icon::finish_insert_remove);
                self.allow_entrance();
                return false;
            }
            return true;
        }
        false
    }

    /// One frame of the slide-in. Returns true while it must go on.
    pub fn show_step(&mut self, config: &Config) -> bool {
        self.layout.hide_offset -= 1.0 / f64::from(config.system.unhide_nb_steps.max(1));
        if self.layout.hide_offset < 0.01 {
            self.layout.hide_offset = 0.0;
            self.allow_entrance();
            return false;
        }
        true
    }

    /// Advances the insert/remove animation of every icon.
    pub fn step_insert_remove(&mut self) -> InsertRemoveReport {
        let mut report = InsertRemoveReport::default();
        for icon in self.icons_mut().iter_mut() {
            match icon.step_insert_remove() {
                InsertRemoveStep::Idle => {}
                InsertRemoveStep::Removed => report.removed.push(icon.id()),
                InsertRemoveStep::Running | InsertRemoveStep::Inserted => {
                    report.needs_layout = true;
                }
            }
        }
        report
    }
}
