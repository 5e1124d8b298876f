use super::{CursorPosition, EditorUpdate, UpdateHook};
use std::sync::{Arc, Mutex, PoisonError};

/// Cursor and size readout under the editor
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusBar {
    cursor: Option<CursorPosition>,
    size: Option<usize>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status bar plus a hook feeding it, for [`super::EditorAdapter::set_update_hook`]
    pub fn shared() -> (Arc<Mutex<StatusBar>>, UpdateHook) {
        let bar = Arc::new(Mutex::new(StatusBar::new()));
        let target = Arc::clone(&bar);
        let hook: UpdateHook = Arc::new(move |update| {
            target
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .update(update);
        });
        (bar, hook)
    }

    pub fn update(&mut self, update: EditorUpdate) {
        match update {
            EditorUpdate::Cursor(position) => self.cursor = Some(position),
            EditorUpdate::Size(bytes) => self.size = Some(bytes),
        }
    }

    pub fn cursor_text(&self) -> String {
        let position = self.cursor.unwrap_or(CursorPosition { line: 1, column: 1 });
        format!("Ln: {}, Col: {}", position.line, position.column)
    }

    pub fn size_text(&self) -> String {
        format!("Size: {} bytes", self.size.unwrap_or(0))
    }
}
