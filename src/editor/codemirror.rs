//! CodeMirror-style widget: wraps an existing text area, 0-based positions,
//! per-line classes and gutter markers.

use super::mount::{MountPoint, MountedElement};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Gutter holding lint markers
pub const LINT_GUTTER: &str = "CodeMirror-lint-markers";

/// 0-based cursor position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CmPosition {
    pub line: u32,
    pub ch: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeMirrorOptions {
    pub mode: String,
    pub line_numbers: bool,
    pub indent_unit: u8,
    pub indent_with_tabs: bool,
    pub theme: String,
    pub gutters: Vec<String>,
}

impl Default for CodeMirrorOptions {
    fn default() -> Self {
        Self {
            mode: "text/x-php".to_string(),
            line_numbers: true,
            indent_unit: 4,
            indent_with_tabs: true,
            theme: "monokai".to_string(),
            gutters: vec![LINT_GUTTER.to_string(), "CodeMirror-linenumbers".to_string()],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmEvent {
    Change,
    CursorActivity,
}

pub type CmHandler = Arc<dyn Fn(&CodeMirrorEditor) + Send + Sync>;

pub struct CodeMirrorEditor {
    doc: String,
    cursor: CmPosition,
    options: CodeMirrorOptions,
    line_classes: BTreeMap<u32, String>,
    gutter_markers: BTreeMap<(String, u32), String>,
    wrapper_font_size: Option<u8>,
    refreshes: usize,
    handlers: Vec<(CmEvent, CmHandler)>,
}

impl CodeMirrorEditor {
    /// Wrap the text area on `mount`. Anything else on the mount is an error.
    pub fn from_text_area(
        mount: &mut MountPoint,
        options: CodeMirrorOptions,
    ) -> Result<Self, String> {
        let doc = mount
            .text_area_value()
            .map(str::to_string)
            .ok_or_else(|| format!("#{} is not a text area", mount.id()))?;
        mount.replace(MountedElement::WrappedTextArea);
        Ok(Self {
            doc,
            cursor: CmPosition::default(),
            options,
            line_classes: BTreeMap::new(),
            gutter_markers: BTreeMap::new(),
            wrapper_font_size: None,
            refreshes: 0,
            handlers: Vec::new(),
        })
    }

    pub fn get_value(&self) -> String {
        self.doc.clone()
    }

    pub fn set_value(&mut self, value: &str) {
        self.doc = value.to_string();
        self.cursor = CmPosition::default();
        self.signal(CmEvent::Change);
        self.signal(CmEvent::CursorActivity);
    }

    pub fn get_cursor(&self) -> CmPosition {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: CmPosition) {
        self.cursor = cursor;
        self.signal(CmEvent::CursorActivity);
    }

    pub fn options(&self) -> &CodeMirrorOptions {
        &self.options
    }

    pub fn add_line_class(&mut self, line: u32, class: &str) {
        self.line_classes.insert(line, class.to_string());
    }

    pub fn remove_line_class(&mut self, line: u32) {
        self.line_classes.remove(&line);
    }

    pub fn line_class(&self, line: u32) -> Option<&str> {
        self.line_classes.get(&line).map(String::as_str)
    }

    pub fn set_gutter_marker(&mut self, line: u32, gutter: &str, marker: Option<String>) {
        let key = (gutter.to_string(), line);
        match marker {
            Some(marker) => {
                self.gutter_markers.insert(key, marker);
            }
            None => {
                self.gutter_markers.remove(&key);
            }
        }
    }

    pub fn clear_gutter(&mut self, gutter: &str) {
        self.gutter_markers.retain(|(g, _), _| g != gutter);
    }

    pub fn gutter_marker(&self, line: u32, gutter: &str) -> Option<&str> {
        self.gutter_markers
            .get(&(gutter.to_string(), line))
            .map(String::as_str)
    }

    /// Font size lives on the wrapper element's style
    pub fn set_wrapper_font_size(&mut self, px: u8) {
        self.wrapper_font_size = Some(px);
    }

    pub fn wrapper_font_size(&self) -> Option<u8> {
        self.wrapper_font_size
    }

    pub fn refresh(&mut self) {
        self.refreshes += 1;
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn on(&mut self, event: CmEvent, handler: CmHandler) {
        self.handlers.push((event, handler));
    }

    /// Unwrap: the text area comes back holding the current document
    pub fn to_text_area(self, mount: &mut MountPoint) {
        mount.replace(MountedElement::TextArea(self.doc));
    }

    fn signal(&self, event: CmEvent) {
        for (_, handler) in self.handlers.iter().filter(|(e, _)| *e == event) {
            handler(self);
        }
    }
}
