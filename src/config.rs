// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TOPOLENS__*` environment variables (`TOPOLENS__ANALYSIS__MAX_HOPS=6`).

use crate::analysis::Granularity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default hop bound for `paths`
pub const DEFAULT_MAX_HOPS: usize = 8;
/// Default result cap for `paths`
pub const DEFAULT_MAX_RESULTS: usize = 100;
/// Default number of ordered country pairs evaluated by aggregate analyses
pub const DEFAULT_TRANSIT_PAIR_CAP: usize = 10_000;

/// Analysis limits and defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum hops explored by the all-paths search
    pub max_hops: usize,
    /// Maximum paths returned by the all-paths search
    pub max_results: usize,
    /// Maximum ordered country pairs per aggregate run
    pub transit_pair_cap: usize,
    /// How a country is represented in pair computations
    pub granularity: Granularity,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            max_results: DEFAULT_MAX_RESULTS,
            transit_pair_cap: DEFAULT_TRANSIT_PAIR_CAP,
            granularity: Granularity::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Analysis settings
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Default location of the configuration file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "topolens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = Config::default();
    let mut builder = config::Config::builder()
        .set_default("log_level", defaults.log_level.clone())?
        .set_default("analysis.max_hops", to_i64(defaults.analysis.max_hops))?
        .set_default("analysis.max_results", to_i64(defaults.analysis.max_results))?
        .set_default("analysis.transit_pair_cap", to_i64(defaults.analysis.transit_pair_cap))?
        .set_default("analysis.granularity", "all-pairs")?;

    match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(path) = default_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(
            config::Environment::with_prefix("TOPOLENS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
