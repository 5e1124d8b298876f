//! Module resolution: a version label maps to a resource at a templated location.

use crate::config::settings::{render_template, PlaygroundConfig};
use crate::config::types::{PlaygroundError, Result};
use crate::runtime::module::{ArtifactPayload, ModuleArtifact, ModuleFetcher};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;

/// Reads module binaries from a local directory
#[derive(Debug, Clone)]
pub struct FileModuleFetcher {
    root: PathBuf,
    template: String,
}

impl FileModuleFetcher {
    pub fn new(root: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            template: template.into(),
        }
    }

    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Self::new(config.module_root.clone(), config.module_template.clone())
    }

    pub fn path_for(&self, version: &str) -> PathBuf {
        self.root.join(render_template(&self.template, version))
    }
}

impl ModuleFetcher for FileModuleFetcher {
    fn fetch(&self, version: &str) -> BoxFuture<'static, Result<ModuleArtifact>> {
        let path = self.path_for(version);
        let version = version.to_string();
        async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| PlaygroundError::load(&version, format!("{}: {}", path.display(), e)))?;
            if bytes.is_empty() {
                return Err(PlaygroundError::load(
                    &version,
                    format!("{} is empty", path.display()),
                ));
            }
            log::debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(ModuleArtifact {
                version,
                location: path.display().to_string(),
                payload: ArtifactPayload::Bytes(bytes),
            })
        }
        .boxed()
    }
}

/// Resolves a per-version interpreter executable, e.g. `/usr/local/bin/php-8.4.3`
#[derive(Debug, Clone)]
pub struct ExecutableResolver {
    root: PathBuf,
    template: String,
}

impl ExecutableResolver {
    pub fn new(root: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            template: template.into(),
        }
    }

    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Self::new(config.module_root.clone(), config.module_template.clone())
    }

    pub fn path_for(&self, version: &str) -> PathBuf {
        self.root.join(render_template(&self.template, version))
    }
}

impl ModuleFetcher for ExecutableResolver {
    fn fetch(&self, version: &str) -> BoxFuture<'static, Result<ModuleArtifact>> {
        let path = self.path_for(version);
        let version = version.to_string();
        async move {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|e| PlaygroundError::load(&version, format!("{}: {}", path.display(), e)))?;
            if !metadata.is_file() {
                return Err(PlaygroundError::load(
                    &version,
                    format!("{} is not an executable file", path.display()),
                ));
            }
            Ok(ModuleArtifact {
                version,
                location: path.display().to_string(),
                payload: ArtifactPayload::Executable(path),
            })
        }
        .boxed()
    }
}

/// Downloads module binaries from a hosted playground
#[derive(Debug, Clone)]
pub struct HttpModuleFetcher {
    client: reqwest::Client,
    base_url: String,
    template: String,
}

impl HttpModuleFetcher {
    pub fn new(base_url: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            template: template.into(),
        }
    }

    pub fn url_for(&self, version: &str) -> String {
        format!("{}/{}", self.base_url, render_template(&self.template, version))
    }
}

impl ModuleFetcher for HttpModuleFetcher {
    fn fetch(&self, version: &str) -> BoxFuture<'static, Result<ModuleArtifact>> {
        let client = self.client.clone();
        let url = self.url_for(version);
        let version = version.to_string();
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| PlaygroundError::load(&version, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(PlaygroundError::load(
                    &version,
                    format!("Failed to fetch module: {status}"),
                ));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlaygroundError::load(&version, e))?;
            Ok(ModuleArtifact {
                version,
                location: url,
                payload: ArtifactPayload::Bytes(bytes.to_vec()),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_fetcher_reads_templated_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("php-8.4.3-web.wasm"), b"\0asm").unwrap();
        let fetcher = FileModuleFetcher::new(dir.path(), "php-{version}-web.wasm");

        let artifact = fetcher.fetch("8.4.3").await.unwrap();
        assert_eq!(artifact.version, "8.4.3");
        assert_eq!(artifact.payload, ArtifactPayload::Bytes(b"\0asm".to_vec()));
    }

    #[tokio::test]
    async fn missing_module_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileModuleFetcher::new(dir.path(), "php-{version}-web.wasm");

        let err = fetcher.fetch("5.6.40").await.unwrap_err();
        assert!(matches!(err, PlaygroundError::Load { ref version, .. } if version == "5.6.40"));
    }

    #[tokio::test]
    async fn resolver_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("php-8.3.16")).unwrap();
        let resolver = ExecutableResolver::new(dir.path(), "php-{version}");

        assert!(resolver.fetch("8.3.16").await.is_err());
    }

    #[test]
    fn http_urls_are_templated() {
        let fetcher = HttpModuleFetcher::new("https://example.org/assets/wasm/", "php-{version}-web.wasm");
        assert_eq!(
            fetcher.url_for("8.4.3"),
            "https://example.org/assets/wasm/php-8.4.3-web.wasm"
        );
    }
}
