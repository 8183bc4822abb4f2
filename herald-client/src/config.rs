//! Loading client settings from a file and the environment.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{
    error::Result,
    options::{
        DEFAULT_KEEP_ALIVE, DEFAULT_MESSAGE_CAPACITY, DEFAULT_PARALLEL_PUBLISH_CAPACITY,
        DEFAULT_SESSION_EXPIRY_INTERVAL,
    },
};

/// Settings that can be supplied from outside the program.
///
/// Environment variables use the `HERALD_` prefix, e.g.
/// `HERALD_MESSAGE_CAPACITY=512`, and override values from the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub message_capacity: usize,
    pub parallel_publish_capacity: usize,
    pub session_expiry_secs: u64,
    pub keep_alive_secs: u64,
    pub client_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            parallel_publish_capacity: DEFAULT_PARALLEL_PUBLISH_CAPACITY,
            session_expiry_secs: DEFAULT_SESSION_EXPIRY_INTERVAL.as_secs(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE.as_secs(),
            client_id: None,
        }
    }
}

impl ClientConfig {
    /// Load from an optional TOML file layered under `HERALD_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("HERALD").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
