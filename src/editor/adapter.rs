//! Backend-neutral editor: fixed capability set over a tagged widget variant.

use super::codemirror::{CmEvent, CodeMirrorEditor, CodeMirrorOptions, LINT_GUTTER};
use super::monaco::{ModelDecoration, MonacoEditor, MonacoEvent, MonacoOptions, MonacoPosition};
use super::mount::{MountPoint, MountedElement};
use super::{CursorPosition, EditorUpdate, UpdateHook};
use crate::config::settings::EditorSettings;
use crate::config::types::{
    BackendKind, ErrorMarker, PlaygroundError, Result, MAX_FONT_SIZE, MIN_FONT_SIZE,
};
use crate::observability::audit::{self, RunEvent, RunEventKind};
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const ERROR_LINE_CLASS: &str = "error-line";
const ERROR_GLYPH_CLASS: &str = "error-glyph";

/// Loads a widget library before it can be constructed
pub trait BackendLoader: Send + Sync {
    fn load(&self, kind: BackendKind) -> BoxFuture<'static, std::result::Result<(), String>>;
}

/// Both widget families are linked in; loading always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLoader;

impl BackendLoader for DefaultLoader {
    fn load(&self, _kind: BackendKind) -> BoxFuture<'static, std::result::Result<(), String>> {
        future::ready(Ok(())).boxed()
    }
}

/// The live widget
pub enum EditorHandle {
    Monaco(MonacoEditor),
    CodeMirror(CodeMirrorEditor),
    /// Text area left on the mount point when no widget is attached
    Plain,
}

/// Lowers the switching flag on every exit path
struct SwitchingGuard(Arc<AtomicBool>);

impl SwitchingGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for SwitchingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct EditorAdapter {
    kind: BackendKind,
    handle: EditorHandle,
    mount: MountPoint,
    font_size: u8,
    marker: Option<ErrorMarker>,
    decoration_ids: Vec<u64>,
    loader: Arc<dyn BackendLoader>,
    switching: Arc<AtomicBool>,
    update_hook: Option<UpdateHook>,
}

impl EditorAdapter {
    /// Adapter over a plain text area; call [`Self::switch_backend`] to attach `kind`
    pub fn new(mount: MountPoint, kind: BackendKind) -> Self {
        Self {
            kind,
            handle: EditorHandle::Plain,
            mount,
            font_size: crate::config::types::DEFAULT_FONT_SIZE,
            marker: None,
            decoration_ids: Vec::new(),
            loader: Arc::new(DefaultLoader),
            switching: Arc::new(AtomicBool::new(false)),
            update_hook: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn BackendLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Build an adapter with `settings` and attach its backend
    pub async fn open(settings: &EditorSettings, content: &str) -> Result<Self> {
        let mut adapter = Self::new(MountPoint::new("editor", content), settings.backend);
        adapter.set_font_size(u32::from(settings.font_size));
        adapter.switch_backend(settings.backend).await?;
        Ok(adapter)
    }

    /// Backend the adapter was last switched to
    pub fn backend(&self) -> BackendKind {
        self.kind
    }

    pub fn handle(&self) -> &EditorHandle {
        &self.handle
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn is_plain(&self) -> bool {
        matches!(self.handle, EditorHandle::Plain)
    }

    pub fn content(&self) -> String {
        match &self.handle {
            EditorHandle::Monaco(editor) => editor.get_value(),
            EditorHandle::CodeMirror(editor) => editor.get_value(),
            EditorHandle::Plain => self.mount.text_area_value().unwrap_or_default().to_string(),
        }
    }

    pub fn set_content(&mut self, content: &str) {
        match &mut self.handle {
            EditorHandle::Monaco(editor) => editor.set_value(content),
            EditorHandle::CodeMirror(editor) => editor.set_value(content),
            EditorHandle::Plain => {
                if !self.mount.set_text_area_value(content) {
                    self.mount.replace(MountedElement::TextArea(content.to_string()));
                }
                if let Some(hook) = &self.update_hook {
                    hook(EditorUpdate::Size(content.len()));
                }
            }
        }
    }

    pub fn position(&self) -> CursorPosition {
        match &self.handle {
            EditorHandle::Monaco(editor) => {
                let p = editor.get_position();
                CursorPosition {
                    line: p.line_number,
                    column: p.column,
                }
            }
            EditorHandle::CodeMirror(editor) => {
                let c = editor.get_cursor();
                CursorPosition {
                    line: c.line + 1,
                    column: c.ch + 1,
                }
            }
            EditorHandle::Plain => CursorPosition { line: 1, column: 1 },
        }
    }

    /// Move the cursor; positions are 1-based and below 1 snaps to 1
    pub fn set_position(&mut self, position: CursorPosition) {
        let line = position.line.max(1);
        let column = position.column.max(1);
        match &mut self.handle {
            EditorHandle::Monaco(editor) => editor.set_position(MonacoPosition {
                line_number: line,
                column,
            }),
            EditorHandle::CodeMirror(editor) => {
                editor.set_cursor(super::codemirror::CmPosition {
                    line: line - 1,
                    ch: column - 1,
                })
            }
            EditorHandle::Plain => {}
        }
    }

    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    /// Clamp into the supported range and apply; returns the applied size
    pub fn set_font_size(&mut self, size: u32) -> u8 {
        let clamped = size.clamp(u32::from(MIN_FONT_SIZE), u32::from(MAX_FONT_SIZE));
        self.font_size = u8::try_from(clamped).unwrap_or(MAX_FONT_SIZE);
        self.apply_font_size();
        self.font_size
    }

    /// Keyboard zoom: step the font size by `delta`
    pub fn adjust_font_size(&mut self, delta: i32) -> u8 {
        let target = (i32::from(self.font_size) + delta).max(0);
        self.set_font_size(target.unsigned_abs())
    }

    fn apply_font_size(&mut self) {
        let size = self.font_size;
        match &mut self.handle {
            EditorHandle::Monaco(editor) => editor.update_options(size),
            EditorHandle::CodeMirror(editor) => {
                editor.set_wrapper_font_size(size);
                editor.refresh();
            }
            EditorHandle::Plain => {}
        }
    }

    pub fn error_marker(&self) -> Option<&ErrorMarker> {
        self.marker.as_ref()
    }

    /// Highlight one line, or clear the highlight with `None`
    pub fn set_error_marker(&mut self, marker: Option<&ErrorMarker>) {
        self.clear_marker();
        let Some(marker) = marker else {
            return;
        };
        let line = marker.line.max(1);
        match &mut self.handle {
            EditorHandle::Monaco(editor) => {
                self.decoration_ids = editor.delta_decorations(
                    &[],
                    vec![ModelDecoration {
                        line_number: line,
                        class_name: ERROR_LINE_CLASS.to_string(),
                        glyph_margin_class_name: Some(ERROR_GLYPH_CLASS.to_string()),
                        hover_message: Some(marker.message.clone()),
                    }],
                );
            }
            EditorHandle::CodeMirror(editor) => {
                editor.add_line_class(line - 1, ERROR_LINE_CLASS);
                editor.set_gutter_marker(line - 1, LINT_GUTTER, Some(marker.message.clone()));
            }
            EditorHandle::Plain => {}
        }
        self.marker = Some(marker.clone());
    }

    fn clear_marker(&mut self) {
        let previous = self.marker.take();
        let ids = std::mem::take(&mut self.decoration_ids);
        match &mut self.handle {
            EditorHandle::Monaco(editor) => {
                editor.delta_decorations(&ids, Vec::new());
            }
            EditorHandle::CodeMirror(editor) => {
                if let Some(previous) = previous {
                    editor.remove_line_class(previous.line.max(1) - 1);
                }
                editor.clear_gutter(LINT_GUTTER);
            }
            EditorHandle::Plain => {}
        }
    }

    /// Flag raised for the duration of a backend switch
    pub fn switching_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.switching)
    }

    pub fn is_switching(&self) -> bool {
        self.switching.load(Ordering::SeqCst)
    }

    /// Route cursor and size changes to `hook`, now and after every switch
    pub fn set_update_hook(&mut self, hook: UpdateHook) {
        self.update_hook = Some(hook);
        self.wire_observers();
        self.notify();
    }

    fn wire_observers(&mut self) {
        let Some(hook) = self.update_hook.clone() else {
            return;
        };
        match &mut self.handle {
            EditorHandle::Monaco(editor) => {
                let on_content = Arc::clone(&hook);
                editor.on_did_change_model_content(Arc::new(move |event| {
                    if let MonacoEvent::ModelContentChanged { length } = event {
                        on_content(EditorUpdate::Size(*length));
                    }
                }));
                editor.on_did_change_cursor_position(Arc::new(move |event| {
                    if let MonacoEvent::CursorPositionChanged { position } = event {
                        hook(EditorUpdate::Cursor(CursorPosition {
                            line: position.line_number,
                            column: position.column,
                        }));
                    }
                }));
            }
            EditorHandle::CodeMirror(editor) => {
                let on_change = Arc::clone(&hook);
                editor.on(
                    CmEvent::Change,
                    Arc::new(move |cm| on_change(EditorUpdate::Size(cm.get_value().len()))),
                );
                editor.on(
                    CmEvent::CursorActivity,
                    Arc::new(move |cm| {
                        let cursor = cm.get_cursor();
                        hook(EditorUpdate::Cursor(CursorPosition {
                            line: cursor.line + 1,
                            column: cursor.ch + 1,
                        }));
                    }),
                );
            }
            EditorHandle::Plain => {}
        }
    }

    fn notify(&self) {
        if let Some(hook) = &self.update_hook {
            hook(EditorUpdate::Cursor(self.position()));
            hook(EditorUpdate::Size(self.content().len()));
        }
    }

    /// Tear down the widget, leaving a plain text area with the content
    pub fn dispose(&mut self) {
        let content = self.content();
        self.clear_marker();
        match std::mem::replace(&mut self.handle, EditorHandle::Plain) {
            EditorHandle::Monaco(mut editor) => {
                editor.dispose();
                self.mount.replace(MountedElement::TextArea(content));
            }
            EditorHandle::CodeMirror(editor) => editor.to_text_area(&mut self.mount),
            EditorHandle::Plain => {
                if self.mount.text_area_value().is_none() {
                    self.mount.replace(MountedElement::TextArea(content));
                }
            }
        }
    }

    fn construct(&mut self, kind: BackendKind) -> std::result::Result<EditorHandle, String> {
        match kind {
            BackendKind::Monaco => {
                let options = MonacoOptions {
                    value: self.content(),
                    font_size: self.font_size,
                    ..Default::default()
                };
                Ok(EditorHandle::Monaco(MonacoEditor::create(
                    &mut self.mount,
                    options,
                )))
            }
            BackendKind::CodeMirror => {
                CodeMirrorEditor::from_text_area(&mut self.mount, CodeMirrorOptions::default())
                    .map(EditorHandle::CodeMirror)
            }
        }
    }

    /// Replace the widget with one of `kind`, carrying the content over.
    ///
    /// On failure the mount keeps a plain text area with the content and the
    /// backend marker is left unchanged.
    pub async fn switch_backend(&mut self, kind: BackendKind) -> Result<()> {
        if kind == self.kind && !self.is_plain() {
            return Ok(());
        }

        let _switching = SwitchingGuard::raise(&self.switching);
        let content = self.content();
        self.dispose();

        let constructed = match self.loader.load(kind).await {
            Ok(()) => self.construct(kind),
            Err(message) => Err(message),
        };

        match constructed {
            Ok(handle) => {
                let previous = self.kind;
                self.handle = handle;
                self.set_content(&content);
                self.kind = kind;
                self.apply_font_size();
                self.wire_observers();
                self.notify();
                log::info!("Editor switched from {} to {}", previous, kind);
                audit::emit(RunEvent::new(RunEventKind::BackendSwitched).detail(kind.as_str()));
                Ok(())
            }
            Err(message) => {
                self.handle = EditorHandle::Plain;
                if !self.mount.set_text_area_value(&content) {
                    self.mount.replace(MountedElement::TextArea(content));
                }
                log::error!("Failed to switch editor to {}: {}", kind, message);
                audit::emit(
                    RunEvent::new(RunEventKind::BackendFallback)
                        .detail(format!("{kind}: {message}")),
                );
                Err(PlaygroundError::AdapterSwitch {
                    backend: kind,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::StatusBar;

    struct RefusingLoader;

    impl BackendLoader for RefusingLoader {
        fn load(&self, kind: BackendKind) -> BoxFuture<'static, std::result::Result<(), String>> {
            future::ready(match kind {
                BackendKind::CodeMirror => Err("script failed to load".to_string()),
                BackendKind::Monaco => Ok(()),
            })
            .boxed()
        }
    }

    async fn monaco(content: &str) -> EditorAdapter {
        let mut adapter = EditorAdapter::new(MountPoint::new("editor", content), BackendKind::Monaco);
        adapter.switch_backend(BackendKind::Monaco).await.unwrap();
        adapter
    }

    #[tokio::test]
    async fn switch_preserves_content_both_ways() {
        let mut adapter = monaco("<?php echo 'hi';").await;
        adapter.switch_backend(BackendKind::CodeMirror).await.unwrap();
        assert!(matches!(adapter.handle(), EditorHandle::CodeMirror(_)));
        assert_eq!(adapter.content(), "<?php echo 'hi';");

        adapter.set_content("<?php echo 'changed';");
        adapter.switch_backend(BackendKind::Monaco).await.unwrap();
        assert_eq!(adapter.content(), "<?php echo 'changed';");
        assert_eq!(adapter.mount().element(), &MountedElement::Container);
        assert!(!adapter.is_switching());
    }

    #[tokio::test]
    async fn switching_to_current_backend_is_a_no_op() {
        let mut adapter = monaco("x").await;
        adapter.set_error_marker(Some(&ErrorMarker {
            line: 1,
            message: "boom".to_string(),
        }));
        adapter.switch_backend(BackendKind::Monaco).await.unwrap();
        assert!(adapter.error_marker().is_some());
    }

    #[tokio::test]
    async fn failed_construction_falls_back_to_text_area() {
        let mut adapter = EditorAdapter::new(MountPoint::new("editor", "keep me"), BackendKind::Monaco)
            .with_loader(Arc::new(RefusingLoader));
        adapter.switch_backend(BackendKind::Monaco).await.unwrap();

        let err = adapter.switch_backend(BackendKind::CodeMirror).await.unwrap_err();
        assert!(matches!(
            err,
            PlaygroundError::AdapterSwitch { backend: BackendKind::CodeMirror, .. }
        ));
        assert!(adapter.is_plain());
        assert_eq!(adapter.backend(), BackendKind::Monaco);
        assert_eq!(adapter.mount().text_area_value(), Some("keep me"));
        assert_eq!(adapter.content(), "keep me");
        assert!(!adapter.is_switching());

        adapter.switch_backend(BackendKind::Monaco).await.unwrap();
        assert_eq!(adapter.content(), "keep me");
    }

    #[tokio::test]
    async fn font_size_is_clamped_and_applied() {
        let mut adapter = monaco("").await;
        assert_eq!(adapter.set_font_size(5), MIN_FONT_SIZE);
        assert_eq!(adapter.set_font_size(99), MAX_FONT_SIZE);
        if let EditorHandle::Monaco(editor) = adapter.handle() {
            assert_eq!(editor.options().font_size, MAX_FONT_SIZE);
        }

        adapter.switch_backend(BackendKind::CodeMirror).await.unwrap();
        match adapter.handle() {
            EditorHandle::CodeMirror(editor) => {
                assert_eq!(editor.wrapper_font_size(), Some(MAX_FONT_SIZE));
                assert!(editor.refresh_count() > 0);
            }
            _ => panic!("expected codemirror"),
        }
        assert_eq!(adapter.adjust_font_size(-40), MIN_FONT_SIZE);
    }

    #[tokio::test]
    async fn positions_are_one_based_on_both_backends() {
        let mut adapter = monaco("a\nb\nc").await;
        let target = CursorPosition { line: 2, column: 3 };
        adapter.set_position(target);
        assert_eq!(adapter.position(), target);

        adapter.switch_backend(BackendKind::CodeMirror).await.unwrap();
        adapter.set_position(target);
        assert_eq!(adapter.position(), target);
        if let EditorHandle::CodeMirror(editor) = adapter.handle() {
            assert_eq!(editor.get_cursor().line, 1);
        }
    }

    #[tokio::test]
    async fn error_marker_set_and_cleared_on_codemirror() {
        let mut adapter = monaco("a\nb\nc").await;
        adapter.switch_backend(BackendKind::CodeMirror).await.unwrap();
        adapter.set_error_marker(Some(&ErrorMarker {
            line: 3,
            message: "unexpected token".to_string(),
        }));
        if let EditorHandle::CodeMirror(editor) = adapter.handle() {
            assert_eq!(editor.line_class(2), Some(ERROR_LINE_CLASS));
            assert_eq!(editor.gutter_marker(2, LINT_GUTTER), Some("unexpected token"));
        }

        adapter.set_error_marker(None);
        adapter.set_error_marker(None);
        if let EditorHandle::CodeMirror(editor) = adapter.handle() {
            assert_eq!(editor.line_class(2), None);
            assert_eq!(editor.gutter_marker(2, LINT_GUTTER), None);
        }
    }

    #[tokio::test]
    async fn error_marker_on_monaco_uses_one_decoration() {
        let mut adapter = monaco("a\nb").await;
        let marker = ErrorMarker {
            line: 2,
            message: "oops".to_string(),
        };
        adapter.set_error_marker(Some(&marker));
        adapter.set_error_marker(Some(&marker));
        if let EditorHandle::Monaco(editor) = adapter.handle() {
            assert_eq!(editor.decorations().count(), 1);
        }
        adapter.set_error_marker(None);
        if let EditorHandle::Monaco(editor) = adapter.handle() {
            assert_eq!(editor.decorations().count(), 0);
        }
    }

    #[tokio::test]
    async fn update_hook_survives_switches() {
        let (bar, hook) = StatusBar::shared();
        let mut adapter = monaco("abc").await;
        adapter.set_update_hook(hook);
        assert_eq!(bar.lock().unwrap().size_text(), "Size: 3 bytes");

        adapter.switch_backend(BackendKind::CodeMirror).await.unwrap();
        adapter.set_content("abcdef");
        adapter.set_position(CursorPosition { line: 1, column: 4 });

        let bar = bar.lock().unwrap();
        assert_eq!(bar.size_text(), "Size: 6 bytes");
        assert_eq!(bar.cursor_text(), "Ln: 1, Col: 4");
    }
}
