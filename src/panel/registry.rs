//! Ordered set of live panels sharing one editor and one module cache.

use crate::config::presets::VersionCatalog;
use crate::config::types::{PanelId, PlaygroundError, Result};
use crate::editor::SharedEditor;
use crate::observability::audit::{self, RunEvent, RunEventKind};
use crate::panel::autorun::AutoRunner;
use crate::panel::controller::{PanelController, RunOutcome};
use crate::runtime::{InterpreterSession, ModuleCache, ModuleFactory};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

pub struct PanelRegistry {
    cache: Arc<ModuleCache>,
    factory: Arc<dyn ModuleFactory>,
    editor: SharedEditor,
    catalog: VersionCatalog,
    panels: Vec<Arc<PanelController>>,
    next_id: u32,
}

impl PanelRegistry {
    pub fn new(
        cache: Arc<ModuleCache>,
        factory: Arc<dyn ModuleFactory>,
        editor: SharedEditor,
        catalog: VersionCatalog,
    ) -> Self {
        Self {
            cache,
            factory,
            editor,
            catalog,
            panels: Vec::new(),
            next_id: 1,
        }
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn editor(&self) -> &SharedEditor {
        &self.editor
    }

    /// New panel on the newest catalog version, appended last
    pub fn add_panel(&mut self) -> Arc<PanelController> {
        let id = PanelId(self.next_id);
        self.next_id += 1;

        let session = InterpreterSession::new(Arc::clone(&self.cache), Arc::clone(&self.factory));
        let default_version = self.catalog.newest().map(|v| v.as_str());
        let panel = Arc::new(PanelController::new(
            id,
            Arc::clone(&self.editor),
            session,
            default_version,
        ));
        self.panels.push(Arc::clone(&panel));

        log::info!("Added panel {}", id);
        let mut event = RunEvent::new(RunEventKind::PanelAdded).panel(id);
        if let Some(version) = default_version {
            event = event.version(version);
        }
        audit::emit(event);
        panel
    }

    /// Tear down and forget panel `id`
    pub async fn remove_panel(&mut self, id: PanelId) -> Result<()> {
        let index = self
            .panels
            .iter()
            .position(|p| p.id() == id)
            .ok_or(PlaygroundError::PanelNotFound(id))?;
        let panel = self.panels.remove(index);
        panel.teardown().await;

        log::info!("Removed panel {}", id);
        audit::emit(RunEvent::new(RunEventKind::PanelRemoved).panel(id));
        Ok(())
    }

    /// Run every panel concurrently on the same source.
    ///
    /// `None` reads the editor once. Outcomes come back in registry order.
    pub async fn run_all(&self, code: Option<String>) -> Vec<(PanelId, RunOutcome)> {
        let code = match code {
            Some(code) => code,
            None => self.editor.lock().await.content(),
        };
        let runs = self.panels.iter().map(|panel| {
            let code = code.clone();
            async move { (panel.id(), panel.run_code(Some(code)).await) }
        });
        join_all(runs).await
    }

    /// Start one auto-runner per panel, each skipping ticks during editor switches
    pub async fn start_auto_run(&self, interval: Duration) -> Result<Vec<AutoRunner>> {
        let switching = self.editor.lock().await.switching_flag();
        let mut runners = Vec::with_capacity(self.panels.len());
        for panel in &self.panels {
            let mut runner = AutoRunner::new(Arc::clone(panel), Arc::clone(&switching), interval);
            runner.start()?;
            runners.push(runner);
        }
        Ok(runners)
    }

    pub fn get(&self, id: PanelId) -> Option<&Arc<PanelController>> {
        self.panels.iter().find(|p| p.id() == id)
    }

    pub fn ids(&self) -> Vec<PanelId> {
        self.panels.iter().map(|p| p.id()).collect()
    }

    pub fn panels(&self) -> &[Arc<PanelController>] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::BackendKind;
    use crate::editor::{EditorAdapter, MountPoint};
    use crate::runtime::mock::{MockFetcher, MockModuleFactory};

    fn registry(factory: Arc<MockModuleFactory>) -> PanelRegistry {
        let editor = EditorAdapter::new(MountPoint::new("editor", "echo 'all';"), BackendKind::Monaco);
        PanelRegistry::new(
            Arc::new(ModuleCache::new(Arc::new(MockFetcher::new()))),
            factory,
            Arc::new(tokio::sync::Mutex::new(editor)),
            VersionCatalog::from_labels(["8.2.27", "8.4.3", "8.3.16"]).unwrap(),
        )
    }

    #[test]
    fn ids_are_assigned_from_one_and_never_reused() {
        let mut registry = registry(Arc::new(MockModuleFactory::new()));
        registry.add_panel();
        registry.add_panel();
        assert_eq!(registry.ids(), [PanelId(1), PanelId(2)]);
    }

    #[test]
    fn new_panels_default_to_newest_version() {
        let mut registry = registry(Arc::new(MockModuleFactory::new()));
        let panel = registry.add_panel();
        assert_eq!(panel.selected_version().as_deref(), Some("8.4.3"));
    }

    #[tokio::test]
    async fn remove_unknown_panel_fails() {
        let mut registry = registry(Arc::new(MockModuleFactory::new()));
        registry.add_panel();
        let err = registry.remove_panel(PanelId(9)).await.unwrap_err();
        assert!(matches!(err, PlaygroundError::PanelNotFound(PanelId(9))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_run_drives_every_panel() {
        let factory = Arc::new(MockModuleFactory::new());
        let mut registry = registry(factory.clone());
        registry.add_panel();
        registry.add_panel().set_version("8.2.27");

        let mut runners = registry.start_auto_run(Duration::from_millis(100)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        for runner in &mut runners {
            runner.stop();
        }

        assert_eq!(factory.run_count(), 2);
        for panel in registry.panels() {
            assert_eq!(panel.view_snapshot().output.displayed(), "all");
        }
    }

    #[tokio::test]
    async fn zero_auto_run_interval_is_rejected() {
        let mut registry = registry(Arc::new(MockModuleFactory::new()));
        registry.add_panel();
        assert!(registry.start_auto_run(Duration::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn run_all_reports_in_registry_order() {
        let factory = Arc::new(MockModuleFactory::new());
        let mut registry = registry(factory.clone());
        registry.add_panel();
        registry.add_panel().select_version("8.2.27").await;
        registry.add_panel();

        let outcomes = registry.run_all(None).await;
        let ids: Vec<_> = outcomes.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [PanelId(1), PanelId(2), PanelId(3)]);
        for (_, outcome) in &outcomes {
            assert_eq!(outcome.result().unwrap().stdout, "all");
        }
    }
}
