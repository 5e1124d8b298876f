//! Panel controller: binds the shared editor to one interpreter session.
//!
//! A panel is `Idle` or `Running`. Run requests while running are dropped, not
//! queued, and every exit from `Running` goes back through [`RunGuard`].

use crate::config::types::{ExecutionResult, PanelId, PlaygroundError};
use crate::editor::SharedEditor;
use crate::observability::audit::{self, RunEvent, RunEventKind};
use crate::panel::diagnostics::locate_error;
use crate::panel::view::{PanelView, NO_ERRORS_TEXT, NO_VERSION_TEXT};
use crate::runtime::InterpreterSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelState {
    Idle { last_error: Option<String> },
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A run is already in progress on this panel
    Busy,
    /// The panel was torn down
    Detached,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(ExecutionResult),
    Failed(PlaygroundError),
    Skipped(SkipReason),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }
}

pub struct PanelController {
    id: PanelId,
    editor: SharedEditor,
    session: tokio::sync::Mutex<InterpreterSession>,
    view: Mutex<PanelView>,
    state: Mutex<PanelState>,
    running: AtomicBool,
}

/// Restores `Idle` and the trigger however a run ends
struct RunGuard<'a> {
    controller: &'a PanelController,
}

impl<'a> RunGuard<'a> {
    fn enter(controller: &'a PanelController) -> Option<Self> {
        controller
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        controller.view().trigger.disable();
        *controller.state() = PanelState::Running;
        Some(Self { controller })
    }

    fn finish(self, last_error: Option<String>) {
        *self.controller.state() = PanelState::Idle { last_error };
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.controller.state();
            if *state == PanelState::Running {
                *state = PanelState::Idle {
                    last_error: Some("run interrupted".to_string()),
                };
            }
        }
        self.controller.view().trigger.enable();
        self.controller.running.store(false, Ordering::SeqCst);
    }
}

impl PanelController {
    pub fn new(
        id: PanelId,
        editor: SharedEditor,
        session: InterpreterSession,
        default_version: Option<&str>,
    ) -> Self {
        Self {
            id,
            editor,
            session: tokio::sync::Mutex::new(session),
            view: Mutex::new(PanelView::new(id, default_version)),
            state: Mutex::new(PanelState::Idle { last_error: None }),
            running: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    fn view(&self) -> MutexGuard<'_, PanelView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the view
    pub fn view_snapshot(&self) -> PanelView {
        self.view().clone()
    }

    pub fn panel_state(&self) -> PanelState {
        self.state().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn selected_version(&self) -> Option<String> {
        self.view().selected_version.clone()
    }

    /// Run `code`, or the editor content when `None`
    pub async fn run_code(&self, code: Option<String>) -> RunOutcome {
        if !self.view().is_attached() {
            return RunOutcome::Skipped(SkipReason::Detached);
        }
        let Some(guard) = RunGuard::enter(self) else {
            log::debug!("Panel {} busy, run request ignored", self.id);
            return RunOutcome::Skipped(SkipReason::Busy);
        };

        let code = match code {
            Some(code) => code,
            None => self.editor.lock().await.content(),
        };
        let version = self.selected_version().unwrap_or_default();
        audit::emit(
            RunEvent::new(RunEventKind::RunStarted)
                .panel(self.id)
                .version(&version),
        );

        let outcome = self.session.lock().await.execute(&code, &version).await;

        match outcome {
            Ok(result) => {
                let marker = locate_error(&result.stderr);
                {
                    let mut view = self.view();
                    view.output.set_raw(result.stdout.clone());
                    view.errors = if result.stderr.is_empty() {
                        NO_ERRORS_TEXT.to_string()
                    } else {
                        result.stderr.clone()
                    };
                    view.version_display = result.version.clone();
                    view.perf_display = result.elapsed_display.clone();
                }
                self.editor.lock().await.set_error_marker(marker.as_ref());
                audit::emit(
                    RunEvent::new(RunEventKind::RunCompleted)
                        .run_id(result.run_id)
                        .panel(self.id)
                        .version(&result.version)
                        .elapsed(result.elapsed),
                );
                guard.finish(None);
                RunOutcome::Completed(result)
            }
            Err(err) => {
                let message = err.to_string();
                log::warn!("Panel {} run failed: {}", self.id, message);
                self.view().errors = message.clone();
                self.editor.lock().await.set_error_marker(None);
                audit::emit(
                    RunEvent::new(RunEventKind::RunFailed)
                        .panel(self.id)
                        .version(&version)
                        .detail(message.clone()),
                );
                guard.finish(Some(message));
                RunOutcome::Failed(err)
            }
        }
    }

    /// Choose the version for later runs without running
    pub fn set_version(&self, version: &str) {
        let mut view = self.view();
        view.selected_version = Some(version.to_string());
        view.version_display = if version.is_empty() {
            NO_VERSION_TEXT.to_string()
        } else {
            version.to_string()
        };
    }

    /// Choose the version for later runs and run with it
    pub async fn select_version(&self, version: &str) -> RunOutcome {
        self.set_version(version);
        self.run_code(None).await
    }

    /// Switch the output pane between raw text and rendered HTML
    pub fn set_html_output(&self, html: bool) {
        self.view().output.set_html_mode(html);
    }

    /// Detach the view and release the interpreter
    pub async fn teardown(&self) {
        self.view().detach();
        self.session.lock().await.unload();
        log::debug!("Panel {} torn down", self.id);
    }

    /// Whether the session still holds a module
    pub async fn has_loaded_module(&self) -> bool {
        self.session.lock().await.loaded_version().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::BackendKind;
    use crate::editor::{EditorAdapter, MountPoint};
    use crate::runtime::mock::{MockFetcher, MockModuleFactory};
    use crate::runtime::ModuleCache;
    use std::sync::Arc;
    use std::time::Duration;

    async fn editor(content: &str) -> SharedEditor {
        let mut adapter = EditorAdapter::new(MountPoint::new("editor", content), BackendKind::Monaco);
        adapter.switch_backend(BackendKind::Monaco).await.unwrap();
        Arc::new(tokio::sync::Mutex::new(adapter))
    }

    fn controller(
        editor: SharedEditor,
        fetcher: Arc<MockFetcher>,
        factory: Arc<MockModuleFactory>,
    ) -> PanelController {
        let session = InterpreterSession::new(Arc::new(ModuleCache::new(fetcher)), factory);
        PanelController::new(PanelId(1), editor, session, Some("8.4.3"))
    }

    #[tokio::test]
    async fn successful_run_renders_result() {
        let factory = Arc::new(MockModuleFactory::new());
        let panel = controller(
            editor("echo 'hello';").await,
            Arc::new(MockFetcher::new()),
            factory,
        );

        let outcome = panel.run_code(None).await;
        assert!(matches!(outcome, RunOutcome::Completed(_)));

        let view = panel.view_snapshot();
        assert_eq!(view.output.raw(), "hello");
        assert_eq!(view.errors, NO_ERRORS_TEXT);
        assert_eq!(view.version_display, "8.4.3");
        assert!(view.trigger.is_enabled());
        assert_eq!(panel.panel_state(), PanelState::Idle { last_error: None });
    }

    #[tokio::test]
    async fn stderr_places_error_marker() {
        let shared = editor("error 'Parse error: unexpected token on line 2';").await;
        let panel = controller(
            Arc::clone(&shared),
            Arc::new(MockFetcher::new()),
            Arc::new(MockModuleFactory::new()),
        );

        panel.run_code(None).await;
        let marker = shared.lock().await.error_marker().cloned().unwrap();
        assert_eq!(marker.line, 2);

        panel.run_code(Some("echo 'ok';".to_string())).await;
        assert!(shared.lock().await.error_marker().is_none());
    }

    #[tokio::test]
    async fn failure_goes_to_error_pane_and_restores_idle() {
        let panel = controller(
            editor("echo 1;").await,
            Arc::new(MockFetcher::new().failing("8.4.3")),
            Arc::new(MockModuleFactory::new()),
        );

        let outcome = panel.run_code(None).await;
        assert!(outcome.is_failure());

        let view = panel.view_snapshot();
        assert!(view.errors.contains("Failed to fetch module"));
        assert!(view.trigger.is_enabled());
        assert!(!panel.is_running());
        assert!(matches!(
            panel.panel_state(),
            PanelState::Idle { last_error: Some(_) }
        ));
    }

    #[tokio::test]
    async fn run_while_running_is_ignored() {
        let fetcher = Arc::new(MockFetcher::new().with_delay(Duration::from_millis(30)));
        let factory = Arc::new(MockModuleFactory::new());
        let panel = controller(editor("echo 'x';").await, fetcher, factory.clone());

        let (first, second) = tokio::join!(panel.run_code(None), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let busy = panel.is_running();
            let label = panel.view_snapshot().trigger.label();
            (busy, label, panel.run_code(None).await)
        });

        assert!(matches!(first, RunOutcome::Completed(_)));
        let (busy, label, second) = second;
        assert!(busy);
        assert_eq!(label, "Running...");
        assert!(matches!(second, RunOutcome::Skipped(SkipReason::Busy)));
        assert_eq!(factory.run_count(), 1);
    }

    #[tokio::test]
    async fn selecting_a_version_runs_with_it() {
        let factory = Arc::new(MockModuleFactory::new());
        let panel = controller(editor("echo 1;").await, Arc::new(MockFetcher::new()), factory.clone());

        panel.select_version("8.2.27").await;
        assert_eq!(factory.instantiations(), ["8.2.27"]);
        assert_eq!(panel.view_snapshot().version_display, "8.2.27");
    }

    #[tokio::test]
    async fn missing_version_is_reported_in_error_pane() {
        let editor = editor("echo 1;").await;
        let session = InterpreterSession::new(
            Arc::new(ModuleCache::new(Arc::new(MockFetcher::new()))),
            Arc::new(MockModuleFactory::new()),
        );
        let panel = PanelController::new(PanelId(4), editor, session, None);

        let outcome = panel.run_code(None).await;
        assert!(matches!(
            outcome,
            RunOutcome::Failed(PlaygroundError::InvalidVersion(_))
        ));
        assert!(panel.view_snapshot().errors.contains("Invalid interpreter version"));
    }

    #[tokio::test]
    async fn html_toggle_rerenders_stored_output() {
        let panel = controller(
            editor("echo '<b>hi</b>';").await,
            Arc::new(MockFetcher::new()),
            Arc::new(MockModuleFactory::new()),
        );
        panel.run_code(None).await;

        panel.set_html_output(true);
        assert_eq!(panel.view_snapshot().output.displayed(), "hi");
        panel.set_html_output(false);
        assert_eq!(panel.view_snapshot().output.displayed(), "<b>hi</b>");
    }

    #[tokio::test]
    async fn teardown_detaches_and_unloads() {
        let panel = controller(
            editor("echo 1;").await,
            Arc::new(MockFetcher::new()),
            Arc::new(MockModuleFactory::new()),
        );
        panel.run_code(None).await;
        assert!(panel.has_loaded_module().await);

        panel.teardown().await;
        assert!(!panel.has_loaded_module().await);
        assert!(matches!(
            panel.run_code(None).await,
            RunOutcome::Skipped(SkipReason::Detached)
        ));
    }
}
