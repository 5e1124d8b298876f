//! Editor abstraction
//!
//! Two editor widget families with incompatible native APIs sit behind one
//! [`EditorAdapter`]. The adapter can be hot-swapped between them without losing
//! the text, and falls back to a plain text area when a widget cannot be built.

pub mod adapter;
pub mod codemirror;
pub mod monaco;
pub mod mount;
pub mod status;

pub use adapter::{BackendLoader, DefaultLoader, EditorAdapter, EditorHandle};
pub use mount::{MountPoint, MountedElement};
pub use status::StatusBar;

use std::sync::Arc;

/// 1-based cursor position, whatever the backend counts from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

/// Change notification routed to the status bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorUpdate {
    Cursor(CursorPosition),
    /// Content length in bytes
    Size(usize),
}

pub type UpdateHook = Arc<dyn Fn(EditorUpdate) + Send + Sync>;

/// One editor shared by the panels of a page
pub type SharedEditor = Arc<tokio::sync::Mutex<EditorAdapter>>;
