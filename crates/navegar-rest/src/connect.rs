//! Process bootstrap: settings, logging and the HTTP collaborators.

use tracing::info;

use navegar_shared::config::{ConfigError, NavegarConfig};
use navegar_shared::{telemetry, LookupError, StoreError};

use crate::{RestStore, ViaCepClient};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("backend client: {0}")]
    Store(#[from] StoreError),
    #[error("address lookup client: {0}")]
    Lookup(#[from] LookupError),
}

/// The collaborators an intake session runs against
pub struct Backend {
    pub store: RestStore,
    pub address_lookup: ViaCepClient,
}

impl Backend {
    pub fn from_config(config: &NavegarConfig) -> Result<Self, ConnectError> {
        Ok(Self {
            store: RestStore::from_config(config)?,
            address_lookup: ViaCepClient::from_config(config)?,
        })
    }

    /// Install logging from `config`, then build the clients.
    pub fn start(config: &NavegarConfig) -> Result<Self, ConnectError> {
        telemetry::init(&config.logging);
        let backend = Self::from_config(config)?;
        info!(backend = %config.backend.url, lookup = %config.address_lookup.base_url, "backend ready");
        Ok(backend)
    }

    /// [`Backend::start`] with settings read from the environment.
    pub fn from_env() -> Result<Self, ConnectError> {
        Self::start(&NavegarConfig::from_env()?)
    }
}
