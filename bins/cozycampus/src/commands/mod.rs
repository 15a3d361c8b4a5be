//! CLI command implementations

pub mod clubs;
pub mod config;
pub mod events;
pub mod forum;
pub mod participants;

use anyhow::{Context as _, Result};
use cozycampus_api_client::{CampusClient, ClientConfig};
use std::path::PathBuf;

/// Options shared by every command
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub format: String,
}

impl Context {
    pub fn json(&self) -> bool {
        self.format == "json"
    }

    /// Configuration from the file (if any) and `COZYCAMPUS_*` variables
    pub fn client_config(&self) -> Result<ClientConfig> {
        ClientConfig::load(self.config_path.as_deref()).context("Failed to load configuration")
    }

    pub fn client(&self) -> Result<CampusClient> {
        let config = self.client_config()?;
        Ok(CampusClient::with_config(config)?)
    }
}
