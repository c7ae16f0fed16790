pub mod app;
pub mod backend;
pub mod config;
pub mod dock;
pub mod icon;
pub mod registry;
pub mod timer;

pub use app::DockApp;
pub use backend::{RecordingBackend, WindowBackend};
pub use config::Config;
pub use dock::{Dock, FrameSnapshot};
pub use icon::Icon;
pub use registry::{DockId, DockRegistry};
