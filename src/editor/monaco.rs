//! Monaco-style widget: renders into a container, 1-based positions,
//! option updates and decoration deltas.

use super::mount::{MountPoint, MountedElement};
use std::sync::Arc;

/// 1-based cursor position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonacoPosition {
    pub line_number: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonacoOptions {
    pub value: String,
    pub language: String,
    pub theme: String,
    pub font_size: u8,
    pub automatic_layout: bool,
    pub minimap: bool,
}

impl Default for MonacoOptions {
    fn default() -> Self {
        Self {
            value: String::new(),
            language: "php".to_string(),
            theme: "vs-dark".to_string(),
            font_size: crate::config::types::DEFAULT_FONT_SIZE,
            automatic_layout: true,
            minimap: false,
        }
    }
}

/// Whole-line decoration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelDecoration {
    pub line_number: u32,
    pub class_name: String,
    pub glyph_margin_class_name: Option<String>,
    pub hover_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MonacoEvent {
    ModelContentChanged { length: usize },
    CursorPositionChanged { position: MonacoPosition },
}

pub type MonacoListener = Arc<dyn Fn(&MonacoEvent) + Send + Sync>;

pub struct MonacoEditor {
    value: String,
    position: MonacoPosition,
    options: MonacoOptions,
    decorations: Vec<(u64, ModelDecoration)>,
    next_decoration_id: u64,
    listeners: Vec<MonacoListener>,
    disposed: bool,
}

impl MonacoEditor {
    /// Render into `mount`, replacing whatever element it holds
    pub fn create(mount: &mut MountPoint, options: MonacoOptions) -> Self {
        mount.replace(MountedElement::Container);
        Self {
            value: options.value.clone(),
            position: MonacoPosition {
                line_number: 1,
                column: 1,
            },
            options,
            decorations: Vec::new(),
            next_decoration_id: 1,
            listeners: Vec::new(),
            disposed: false,
        }
    }

    pub fn get_value(&self) -> String {
        self.value.clone()
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.position = MonacoPosition {
            line_number: 1,
            column: 1,
        };
        self.fire(MonacoEvent::ModelContentChanged {
            length: self.value.len(),
        });
    }

    pub fn get_position(&self) -> MonacoPosition {
        self.position
    }

    pub fn set_position(&mut self, position: MonacoPosition) {
        self.position = position;
        self.fire(MonacoEvent::CursorPositionChanged { position });
    }

    pub fn update_options(&mut self, font_size: u8) {
        self.options.font_size = font_size;
    }

    pub fn options(&self) -> &MonacoOptions {
        &self.options
    }

    /// Remove `old_ids` and add `new`, returning the ids of the added decorations
    pub fn delta_decorations(&mut self, old_ids: &[u64], new: Vec<ModelDecoration>) -> Vec<u64> {
        self.decorations.retain(|(id, _)| !old_ids.contains(id));
        new.into_iter()
            .map(|decoration| {
                let id = self.next_decoration_id;
                self.next_decoration_id += 1;
                self.decorations.push((id, decoration));
                id
            })
            .collect()
    }

    pub fn decorations(&self) -> impl Iterator<Item = &ModelDecoration> {
        self.decorations.iter().map(|(_, d)| d)
    }

    pub fn on_did_change_model_content(&mut self, listener: MonacoListener) {
        self.listeners.push(listener);
    }

    pub fn on_did_change_cursor_position(&mut self, listener: MonacoListener) {
        self.listeners.push(listener);
    }

    /// Tear down; the container is left empty
    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.decorations.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn fire(&self, event: MonacoEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoration(line: u32) -> ModelDecoration {
        ModelDecoration {
            line_number: line,
            class_name: "error-line".to_string(),
            glyph_margin_class_name: None,
            hover_message: None,
        }
    }

    #[test]
    fn create_replaces_mounted_text_area() {
        let mut mount = MountPoint::new("editor", "<?php");
        let editor = MonacoEditor::create(
            &mut mount,
            MonacoOptions {
                value: "<?php".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(mount.element(), &MountedElement::Container);
        assert_eq!(editor.get_value(), "<?php");
    }

    #[test]
    fn delta_decorations_replaces_only_old_ids() {
        let mut mount = MountPoint::new("editor", "");
        let mut editor = MonacoEditor::create(&mut mount, MonacoOptions::default());

        let first = editor.delta_decorations(&[], vec![decoration(2), decoration(4)]);
        let second = editor.delta_decorations(&first[..1], vec![decoration(5)]);

        let lines: Vec<u32> = editor.decorations().map(|d| d.line_number).collect();
        assert_eq!(lines, [4, 5]);
        assert_eq!(second, [3]);
    }
}
