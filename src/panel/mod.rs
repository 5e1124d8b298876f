//! Run panels
//!
//! Each panel pairs the shared editor with its own interpreter session. The
//! registry fans a run out over all of them.

pub mod autorun;
pub mod controller;
pub mod diagnostics;
pub mod registry;
pub mod view;

pub use autorun::{AutoRunStats, AutoRunner};
pub use controller::{PanelController, PanelState, RunOutcome, SkipReason};
pub use diagnostics::locate_error;
pub use registry::PanelRegistry;
pub use view::{OutputPane, PanelView, RunTrigger};
