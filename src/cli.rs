use crate::config::presets::VersionCatalog;
use crate::config::settings::PlaygroundConfig;
use crate::config::types::BackendKind;
use crate::config::validator::validate_config;
use crate::editor::{EditorAdapter, StatusBar};
use crate::panel::{PanelRegistry, PanelView, RunOutcome};
use crate::runtime::{ExecutableResolver, ModuleCache, ProcessModuleFactory};
use crate::samples::files::{load_source_file, save_snapshot, DEFAULT_SNAPSHOT_PREFIX};
use crate::samples::{reset_content, source_from_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./playbox.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append run events as JSON lines to this file
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script on one or more interpreter versions side by side
    Run {
        /// Script file to run
        #[arg(long, conflicts_with_all = ["code", "example"])]
        file: Option<PathBuf>,
        /// Inline source to run
        #[arg(long, conflicts_with = "example")]
        code: Option<String>,
        /// Example identifier to run
        #[arg(long)]
        example: Option<String>,
        /// Interpreter version; repeat for one panel per version (default: newest)
        #[arg(long = "php", value_name = "VERSION")]
        versions: Vec<String>,
        /// One panel per catalog version
        #[arg(long, conflicts_with = "versions")]
        all_versions: bool,
        /// Editor backend holding the source
        #[arg(long)]
        editor: Option<BackendKind>,
        /// Render standard output as HTML text
        #[arg(long)]
        html: bool,
        /// Print results as JSON
        #[arg(long, conflicts_with = "watch")]
        json: bool,
        /// Keep re-running on an interval until interrupted, reloading --file between runs
        #[arg(long)]
        watch: bool,
        /// Auto-run interval in milliseconds (defaults to auto_run_interval_ms)
        #[arg(long, requires = "watch")]
        interval_ms: Option<u64>,
        /// Also save the source as a timestamped snapshot in this directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// List available interpreter versions, newest first
    Versions {
        #[arg(long)]
        json: bool,
    },
    /// Print an example script, or the example list
    Example {
        /// Example identifier (omit to list)
        id: Option<String>,
        /// Print the reset script instead
        #[arg(long, conflicts_with = "id")]
        reset: bool,
    },
    /// Serve example sources over HTTP as plain text
    ServeExamples {
        /// TCP address to bind
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Examples directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PlaygroundConfig> {
    let config = match path {
        Some(path) => PlaygroundConfig::load_from_file(path)?,
        None => PlaygroundConfig::load_default()?,
    };

    // errors are fatal, warnings are logged
    validate_config(&config)?;
    Ok(config)
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if let Some(path) = &cli.audit_log {
        crate::observability::audit::init_audit_trail(path.clone())?;
    }

    let config = load_config(cli.config.as_deref())?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    match cli.command {
        Commands::Run {
            file,
            code,
            example,
            versions,
            all_versions,
            editor,
            html,
            json,
            watch,
            interval_ms,
            snapshot_dir,
        } => {
            let watch = match (watch, interval_ms) {
                (false, _) => None,
                (true, Some(ms)) => Some(Duration::from_millis(ms)),
                (true, None) => Some(config.auto_run_interval().context(
                    "--watch needs --interval-ms or auto_run_interval_ms in the config",
                )?),
            };
            let options = PanelOptions {
                versions,
                all_versions,
                editor,
                html,
                json,
                watch,
                file: file.clone(),
            };
            let all_ok = runtime.block_on(async {
                let source = match (file, code, example) {
                    (Some(path), _, _) => load_source_file(&path).await?,
                    (None, Some(code), _) => code,
                    (None, None, Some(id)) => source_from_config(&config).fetch(&id).await?,
                    (None, None, None) => reset_content(source_from_config(&config).as_ref()).await,
                };
                if let Some(dir) = snapshot_dir {
                    let path = save_snapshot(&dir, DEFAULT_SNAPSHOT_PREFIX, &source).await?;
                    eprintln!("Snapshot saved to {}", path.display());
                }
                run_panels(&config, source, options).await
            })?;
            if !all_ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Versions { json } => {
            let catalog = runtime.block_on(VersionCatalog::load(&config.versions_manifest))?;
            if json {
                let labels: Vec<&str> = catalog.versions().iter().map(|v| v.as_str()).collect();
                println!("{}", serde_json::to_string_pretty(&labels)?);
            } else {
                for version in catalog.versions() {
                    println!("{}", version);
                }
            }
            Ok(())
        }
        Commands::Example { id, reset } => {
            let source = source_from_config(&config);
            runtime.block_on(async {
                if reset {
                    print!("{}", reset_content(source.as_ref()).await);
                    return Ok(());
                }
                match id {
                    Some(id) => print!("{}", source.fetch(&id).await?),
                    None => {
                        for entry in source.catalog().await?.entries() {
                            println!("{:<24} {}", entry.value, entry.label);
                        }
                    }
                }
                Ok::<_, anyhow::Error>(())
            })
        }
        Commands::ServeExamples { bind, dir } => {
            let dir = dir.unwrap_or_else(|| config.examples_dir.clone());
            runtime.block_on(crate::samples::server::serve(bind, dir))?;
            Ok(())
        }
    }
}

struct PanelOptions {
    versions: Vec<String>,
    all_versions: bool,
    editor: Option<BackendKind>,
    html: bool,
    json: bool,
    watch: Option<Duration>,
    file: Option<PathBuf>,
}

async fn run_panels(config: &PlaygroundConfig, source: String, options: PanelOptions) -> Result<bool> {
    let catalog = VersionCatalog::load_or_empty(&config.versions_manifest).await;
    let versions: Vec<String> = if options.all_versions {
        catalog.versions().iter().map(|v| v.to_string()).collect()
    } else {
        options.versions
    };

    let mut settings = config.editor.clone();
    if let Some(backend) = options.editor {
        settings.backend = backend;
    }
    let mut adapter = EditorAdapter::open(&settings, &source).await?;
    let (status, hook) = StatusBar::shared();
    adapter.set_update_hook(hook);
    {
        let status = status.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        eprintln!(
            "Editor: {} | {} | {}",
            adapter.backend(),
            status.cursor_text(),
            status.size_text()
        );
    }

    let cache = Arc::new(ModuleCache::new(Arc::new(ExecutableResolver::from_config(config))));
    let mut registry = PanelRegistry::new(
        cache,
        Arc::new(ProcessModuleFactory::new()),
        Arc::new(tokio::sync::Mutex::new(adapter)),
        catalog,
    );

    if versions.is_empty() {
        registry.add_panel();
    }
    for version in &versions {
        registry.add_panel().set_version(version);
    }
    for panel in registry.panels() {
        panel.set_html_output(options.html);
    }

    let outcomes = registry.run_all(None).await;
    let all_ok = !outcomes.iter().any(|(_, outcome)| outcome.is_failure());

    if options.json {
        let report: Vec<_> = outcomes
            .iter()
            .map(|(id, outcome)| match outcome {
                RunOutcome::Completed(result) => serde_json::json!({
                    "panel": id.0,
                    "status": "completed",
                    "result": result,
                }),
                RunOutcome::Failed(err) => serde_json::json!({
                    "panel": id.0,
                    "status": "failed",
                    "error": err.to_string(),
                }),
                RunOutcome::Skipped(reason) => serde_json::json!({
                    "panel": id.0,
                    "status": "skipped",
                    "reason": format!("{:?}", reason),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(all_ok);
    }

    for panel in registry.panels() {
        print_view(&panel.view_snapshot());
    }

    match options.watch {
        Some(interval) => {
            watch_panels(&registry, interval, options.file.as_deref()).await?;
            Ok(true)
        }
        None => Ok(all_ok),
    }
}

fn print_view(view: &PanelView) {
    println!(
        "== {} {} ({}) ==",
        view.title(),
        view.version_display,
        view.perf_display
    );
    println!("{}", view.output.displayed());
    println!("-- Standard Error --");
    println!("{}", view.errors);
}

/// Auto-run every panel until Ctrl-C, printing each panel whose view changed
async fn watch_panels(registry: &PanelRegistry, interval: Duration, file: Option<&Path>) -> Result<()> {
    let mut runners = registry.start_auto_run(interval).await?;
    eprintln!("Watching every {:?}, press Ctrl-C to stop", interval);

    let mut last: Vec<PanelView> = registry.panels().iter().map(|p| p.view_snapshot()).collect();
    let mut poll = tokio::time::interval(interval);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            _ = poll.tick() => {}
        }

        if let Some(path) = file {
            match load_source_file(path).await {
                Ok(source) => {
                    let mut editor = registry.editor().lock().await;
                    if editor.content() != source {
                        editor.set_content(&source);
                    }
                }
                Err(e) => log::warn!("Failed to reload {}: {}", path.display(), e),
            }
        }

        for (panel, previous) in registry.panels().iter().zip(last.iter_mut()) {
            if panel.is_running() {
                continue;
            }
            let view = panel.view_snapshot();
            if view != *previous {
                print_view(&view);
                *previous = view;
            }
        }
    }

    for runner in &mut runners {
        runner.stop();
    }
    eprintln!("Stopped watching");
    Ok(())
}
