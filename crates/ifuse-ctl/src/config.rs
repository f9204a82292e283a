// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered settings: defaults < TOML file < `IFUSE_CTL_*` environment < CLI flags

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use ifuse_logging::{CliLogLevel, LogFormat};
use serde::Deserialize;

/// Prefix of the environment overlay, e.g. `IFUSE_CTL_TIMEOUT_MS=500`
pub const ENV_PREFIX: &str = "IFUSE_CTL";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "IFUSE_CTL_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// Abort the device-control call after this many milliseconds. Unset or
    /// 0 waits for the driver indefinitely.
    pub timeout_ms: Option<u64>,
    /// Print reports as JSON
    pub json: bool,
    pub log_level: Option<CliLogLevel>,
    pub log_format: Option<LogFormat>,
}

impl CtlConfig {
    /// Load the optional config file and overlay the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let built = builder
            .add_source(env.try_parsing(true))
            .build()
            .context("failed to read configuration")?;
        built.try_deserialize().context("invalid configuration")
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, timeout_ms: Option<u64>, json: bool) -> Self {
        if timeout_ms.is_some() {
            self.timeout_ms = timeout_ms;
        }
        self.json |= json;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}
