//! Integration tests for interpreter sessions
//!
//! These tests verify how sessions share the module cache and what a run captures.

use playbox::runtime::mock::{MockFetcher, MockModuleFactory};
use playbox::runtime::module::SCRIPT_ESCAPE;
use playbox::runtime::{InterpreterSession, ModuleCache};
use playbox::PlaygroundError;
use std::sync::Arc;
use std::time::Duration;

fn shared(fetcher: MockFetcher) -> (Arc<MockFetcher>, Arc<ModuleCache>) {
    let fetcher = Arc::new(fetcher);
    let cache = Arc::new(ModuleCache::new(fetcher.clone()));
    (fetcher, cache)
}

#[tokio::test]
async fn test_concurrent_sessions_fetch_once() {
    let (fetcher, cache) = shared(MockFetcher::new().with_delay(Duration::from_millis(20)));
    let factory = Arc::new(MockModuleFactory::new());

    let mut first = InterpreterSession::new(cache.clone(), factory.clone());
    let mut second = InterpreterSession::new(cache.clone(), factory.clone());

    let (a, b) = tokio::join!(
        first.execute("echo 'one';", "8.3.16"),
        second.execute("echo 'two';", "8.3.16"),
    );

    assert_eq!(a.unwrap().stdout, "one");
    assert_eq!(b.unwrap().stdout, "two");
    assert_eq!(fetcher.fetch_count("8.3.16"), 1);
    // each session still instantiates its own module
    assert_eq!(factory.instantiation_count("8.3.16"), 2);
    assert!(cache.is_ready("8.3.16"));
}

#[tokio::test]
async fn test_failed_fetch_is_retried_by_next_request() {
    let (fetcher, cache) = shared(MockFetcher::new().failing("8.1.31"));
    let mut session = InterpreterSession::new(cache.clone(), Arc::new(MockModuleFactory::new()));

    let err = session.execute("echo 'x';", "8.1.31").await.unwrap_err();
    assert!(matches!(err, PlaygroundError::Load { ref version, .. } if version == "8.1.31"));
    assert!(cache.is_empty(), "failed fetch must not stay cached");

    fetcher.recover("8.1.31");
    let result = session.execute("echo 'x';", "8.1.31").await.unwrap();
    assert_eq!(result.stdout, "x");
    assert_eq!(fetcher.fetch_count("8.1.31"), 2);
}

#[tokio::test]
async fn test_switching_versions_reloads_module() {
    let (fetcher, cache) = shared(MockFetcher::new());
    let factory = Arc::new(MockModuleFactory::new());
    let mut session = InterpreterSession::new(cache, factory.clone());

    session.execute("echo 'a';", "8.4.3").await.unwrap();
    session.execute("echo 'b';", "8.4.3").await.unwrap();
    assert_eq!(factory.instantiation_count("8.4.3"), 1);

    session.execute("echo 'c';", "8.2.27").await.unwrap();
    assert_eq!(session.loaded_version(), Some("8.2.27"));

    session.execute("echo 'd';", "8.4.3").await.unwrap();
    assert_eq!(factory.instantiation_count("8.4.3"), 2);
    assert_eq!(fetcher.fetch_count("8.4.3"), 1);
}

#[tokio::test]
async fn test_result_carries_reported_version() {
    let (_, cache) = shared(MockFetcher::new());
    let factory = Arc::new(MockModuleFactory::new().reporting("8.3", "8.3.16"));
    let mut session = InterpreterSession::new(cache.clone(), factory);

    let result = session.execute("echo 'v';", "8.3").await.unwrap();
    assert_eq!(result.version, "8.3.16");
    assert_eq!(session.loaded_version(), Some("8.3"));
    assert!(cache.is_ready("8.3"));
}

#[tokio::test]
async fn test_output_chunks_and_channels() {
    let (_, cache) = shared(MockFetcher::new());
    let factory = Arc::new(MockModuleFactory::new());
    let mut session = InterpreterSession::new(cache, factory.clone());

    let code = "echo 'first';\nerror 'Warning: careful';\necho 'second';";
    let result = session.execute(code, "8.4.3").await.unwrap();

    assert_eq!(result.stdout, "first\nsecond");
    assert_eq!(result.stderr, "Warning: careful");
    assert!(result.elapsed_display.ends_with("ms"));
    assert_eq!(factory.scripts(), [format!("{SCRIPT_ESCAPE}{code}")]);

    // buffers start empty on every run
    let result = session.execute("echo 'again';", "8.4.3").await.unwrap();
    assert_eq!(result.stdout, "again");
    assert_eq!(result.stderr, "");
}

#[tokio::test]
async fn test_interpreter_fault_is_execution_error() {
    let (_, cache) = shared(MockFetcher::new());
    let mut session = InterpreterSession::new(cache, Arc::new(MockModuleFactory::new()));

    let err = session
        .execute("echo 'partial';\nthrow 'memory exhausted';", "8.4.3")
        .await
        .unwrap_err();
    assert!(matches!(err, PlaygroundError::Execution(ref msg) if msg == "memory exhausted"));
    assert_eq!(session.stdout(), "partial");
}

#[tokio::test]
async fn test_blank_version_is_rejected_without_fetching() {
    let (fetcher, cache) = shared(MockFetcher::new());
    let mut session = InterpreterSession::new(cache, Arc::new(MockModuleFactory::new()));

    let err = session.execute("echo 'x';", "  ").await.unwrap_err();
    assert!(matches!(err, PlaygroundError::InvalidVersion(_)));
    assert_eq!(fetcher.total_fetches(), 0);
}

#[tokio::test]
async fn test_unload_keeps_cached_artifact() {
    let (fetcher, cache) = shared(MockFetcher::new());
    let mut session = InterpreterSession::new(cache.clone(), Arc::new(MockModuleFactory::new()));

    session.execute("echo 'x';", "8.4.3").await.unwrap();
    session.unload();
    assert_eq!(session.loaded_version(), None);
    assert_eq!(session.stdout(), "");
    assert!(cache.is_ready("8.4.3"));

    session.execute("echo 'y';", "8.4.3").await.unwrap();
    assert_eq!(fetcher.fetch_count("8.4.3"), 1);
}
