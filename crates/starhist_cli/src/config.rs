//! Configuration file support for starhist.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARHIST_`, e.g., `STARHIST_GITHUB_TOKEN`)
//! 3. Config file (~/.config/starhist/config.toml or ./starhist.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use STARHIST_GITHUB_TOKEN env var
//!
//! [collect]
//! page_size = 100
//! page_ceiling = 400
//! concurrency = 4
//! no_rate_limit = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use starhist::CollectOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Default collection options.
    pub collect: CollectConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via STARHIST_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
}

/// Default collection options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Stargazers requested per page (1..=100).
    pub page_size: u32,
    /// Refuse repositories needing more pages than this.
    pub page_ceiling: u32,
    /// Maximum concurrent page requests.
    pub concurrency: usize,
    /// Whether to disable proactive rate limiting.
    pub no_rate_limit: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        let defaults = CollectOptions::default();
        Self {
            page_size: defaults.page_size,
            page_ceiling: defaults.page_ceiling,
            concurrency: defaults.page_concurrency,
            no_rate_limit: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/starhist/config.toml)
    /// 3. Local config file (./starhist.toml)
    /// 4. Environment variables with STARHIST_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "starhist") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("starhist.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./starhist.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g. STARHIST_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("STARHIST")
                .separator("_")
                .try_parsing(true),
        );

        // The separator splits on every underscore, which garbles
        // multi-word field names (STARHIST_COLLECT_PAGE_SIZE would map
        // to collect.page.size), so those keys get explicit overrides.
        for (var, key) in [
            ("STARHIST_COLLECT_PAGE_SIZE", "collect.page_size"),
            ("STARHIST_COLLECT_PAGE_CEILING", "collect.page_ceiling"),
            ("STARHIST_COLLECT_NO_RATE_LIMIT", "collect.no_rate_limit"),
        ] {
            if let Ok(value) = std::env::var(var) {
                match builder.set_override(key, value) {
                    Ok(b) => builder = b,
                    Err(e) => {
                        tracing::warn!("Failed to apply {}: {}", var, e);
                        return Config::default();
                    }
                }
            }
        }

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the GitHub token.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    /// Collection options with optional CLI overrides applied.
    pub fn collect_options(
        &self,
        page_size: Option<u32>,
        concurrency: Option<usize>,
    ) -> CollectOptions {
        CollectOptions {
            page_size: page_size.unwrap_or(self.collect.page_size).clamp(1, 100),
            page_ceiling: self.collect.page_ceiling,
            page_concurrency: concurrency.unwrap_or(self.collect.concurrency).max(1),
        }
    }
}
