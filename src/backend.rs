//! Boundary with the windowing layer.
//!
//! The engine never talks to a display server itself; it tells a
//! [`WindowBackend`] where dock windows go and which part of them takes
//! input. [`RecordingBackend`] keeps those requests in memory and is what
//! the headless driver and the tests run against.

use std::collections::HashMap;

use tracing::trace;

use crate::dock::{FrameSnapshot, Rect, Strut};
use crate::icon::IconId;
use crate::registry::DockId;

/// Requests sent to the windowing layer. Every geometry is in screen
/// coordinates.
pub trait WindowBackend {
    /// Area docks are laid out in.
    fn screen(&self) -> Rect;

    /// Moves and resizes a dock window.
    fn move_resize(&mut self, dock: DockId, geometry: Rect);

    /// Maps or unmaps a dock window.
    fn set_visible(&mut self, dock: DockId, visible: bool);

    /// Keeps a dock window below the other windows, or raises it back.
    fn set_keep_below(&mut self, dock: DockId, below: bool);

    /// Restricts pointer input to part of a dock window.
    fn set_input_shape(&mut self, dock: DockId, shape: Rect);

    /// Reserves a screen strip for a dock, or releases it.
    fn reserve_space(&mut self, _dock: DockId, _strut: Option<Strut>) {}

    /// Tells the window manager where a window icon sits, for minimize
    /// animations.
    fn set_icon_geometry(&mut self, _dock: DockId, _icon: IconId, _area: Rect) {}

    /// A new frame of a dock is ready to draw.
    fn redraw(&mut self, _frame: &FrameSnapshot) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    MoveResize(DockId, Rect),
    SetVisible(DockId, bool),
    SetKeepBelow(DockId, bool),
    SetInputShape(DockId, Rect),
    ReserveSpace(DockId, Option<Strut>),
    SetIconGeometry(DockId, IconId, Rect),
}

/// In-memory backend: records every request and the last frame of each
/// dock.
#[derive(Debug)]
pub struct RecordingBackend {
    screen: Rect,
    calls: Vec<BackendCall>,
    frames: HashMap<DockId, FrameSnapshot>,
    frames_drawn: u64,
}

impl RecordingBackend {
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            calls: Vec::new(),
            frames: HashMap::new(),
            frames_drawn: 0,
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_frame(&self, dock: DockId) -> Option<&FrameSnapshot> {
        self.frames.get(&dock)
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Last geometry requested for a dock window.
    pub fn window_of(&self, dock: DockId) -> Option<Rect> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::MoveResize(id, rect) if *id == dock => Some(*rect),
            _ => None,
        })
    }

    fn record(&mut self, call: BackendCall) {
        trace!("backend: {call:?}");
        self.calls.push(call);
    }
}

impl WindowBackend for RecordingBackend {
    fn screen(&self) -> Rect {
        self.screen
    }

    fn move_resize(&mut self, dock: DockId, geometry: Rect) {
        self.record(BackendCall::MoveResize(dock, geometry));
    }

    fn set_visible(&mut self, dock: DockId, visible: bool) {
        self.record(BackendCall::SetVisible(dock, visible));
    }

    fn set_keep_below(&mut self, dock: DockId, below: bool) {
        self.record(BackendCall::SetKeepBelow(dock, below));
    }

    fn set_input_shape(&mut self, dock: DockId, shape: Rect) {
        self.record(BackendCall::SetInputShape(dock, shape));
    }

    fn reserve_space(&mut self, dock: DockId, strut: Option<Strut>) {
        self.record(BackendCall::ReserveSpace(dock, strut));
    }

    fn set_icon_geometry(&mut self, dock: DockId, icon: IconId, area: Rect) {
        self.record(BackendCall::SetIconGeometry(dock, icon, area));
    }

    fn redraw(&mut self, frame: &FrameSnapshot) {
        self.frames_drawn += 1;
        self.frames.insert(frame.dock, frame.clone());
    }
}
