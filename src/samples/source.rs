//! Where example scripts come from: a local directory or a hosted playground.

use crate::config::settings::{PlaygroundConfig, SampleMode};
use crate::config::types::{PlaygroundError, Result};
use crate::samples::catalog::{SampleCatalog, CATALOG_FILE};
use crate::samples::validate::{resolve_sample, validate_sample_id, SAMPLE_EXTENSION};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;

/// Example loaded by the reset action
pub const HELLO_WORLD_ID: &str = "hello_world";

/// Used when the hello world example cannot be fetched
pub const FALLBACK_HELLO_WORLD: &str = "<?php\n\n// Hello World example\necho 'Hello World!';\n";

pub trait SampleSource: Send + Sync {
    /// Source text of example `id`
    fn fetch(&self, id: &str) -> BoxFuture<'_, Result<String>>;

    fn catalog(&self) -> BoxFuture<'_, Result<SampleCatalog>>;
}

/// Examples read straight from a directory
#[derive(Debug, Clone)]
pub struct DirSampleSource {
    dir: PathBuf,
}

impl DirSampleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SampleSource for DirSampleSource {
    fn fetch(&self, id: &str) -> BoxFuture<'_, Result<String>> {
        let id = id.to_string();
        async move {
            let path = resolve_sample(&self.dir, &id)?;
            Ok(tokio::fs::read_to_string(path).await?)
        }
        .boxed()
    }

    fn catalog(&self) -> BoxFuture<'_, Result<SampleCatalog>> {
        SampleCatalog::load(&self.dir).boxed()
    }
}

/// Examples served by a hosted playground
#[derive(Debug, Clone)]
pub struct HttpSampleSource {
    client: reqwest::Client,
    base_url: String,
    mode: SampleMode,
}

impl HttpSampleSource {
    pub fn new(base_url: impl Into<String>, mode: SampleMode) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mode,
        }
    }

    /// Raw file of the static variant, with the id percent-encoded as a path segment
    pub fn static_url(&self, id: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            PlaygroundError::Sample(format!("invalid examples url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                PlaygroundError::Sample(format!("examples url cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("examples")
            .push(&format!("{id}.{SAMPLE_EXTENSION}"));
        Ok(url)
    }

    /// Endpoint of the dynamic variant; the id travels as the `file` query parameter
    pub fn dynamic_endpoint(&self) -> String {
        format!("{}/examples/_get_file", self.base_url)
    }

    fn static_request(&self, id: &str) -> Result<reqwest::RequestBuilder> {
        Ok(self.client.get(self.static_url(id)?))
    }

    fn dynamic_request(&self, id: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.dynamic_endpoint())
            .query(&[("file", id)])
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, id: &str) -> Result<String> {
        let response = request.send().await?;
        let url = response.url().clone();
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PlaygroundError::SampleNotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(PlaygroundError::Sample(format!("{url}: {status}")));
        }
        Ok(response.text().await?)
    }
}

impl SampleSource for HttpSampleSource {
    fn fetch(&self, id: &str) -> BoxFuture<'_, Result<String>> {
        let id = id.to_string();
        async move {
            let id = validate_sample_id(&id)?;
            match self.mode {
                SampleMode::Static => self.get_text(self.static_request(id)?, id).await,
                SampleMode::Dynamic => match self.get_text(self.dynamic_request(id), id).await {
                    // endpoint unreachable: try the raw file
                    Err(PlaygroundError::Http(e)) => {
                        log::warn!("Dynamic example fetch failed ({}), trying static file", e);
                        self.get_text(self.static_request(id)?, id).await
                    }
                    other => other,
                },
            }
        }
        .boxed()
    }

    fn catalog(&self) -> BoxFuture<'_, Result<SampleCatalog>> {
        async move {
            let url = format!("{}/examples/{}", self.base_url, CATALOG_FILE);
            let text = self.get_text(self.client.get(url), CATALOG_FILE).await?;
            SampleCatalog::from_json(&text)
        }
        .boxed()
    }
}

/// Source configured by `examples_url`, else the local examples directory
pub fn source_from_config(config: &PlaygroundConfig) -> Box<dyn SampleSource> {
    match &config.examples_url {
        Some(url) => Box::new(HttpSampleSource::new(url.clone(), config.examples_mode)),
        None => Box::new(DirSampleSource::new(config.examples_dir.clone())),
    }
}

/// Content for the reset action; never fails
pub async fn reset_content(source: &dyn SampleSource) -> String {
    match source.fetch(HELLO_WORLD_ID).await {
        Ok(content) if !content.is_empty() => content,
        Ok(_) => FALLBACK_HELLO_WORLD.to_string(),
        Err(e) => {
            log::warn!("Falling back to built-in hello world: {}", e);
            FALLBACK_HELLO_WORLD.to_string()
        }
    }
}
