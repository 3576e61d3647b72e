//! ViaCEP postal-code lookup.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use navegar_shared::config::{AddressLookupConfig, NavegarConfig};
use navegar_shared::{AddressLookup, LookupError, PostalCode, ResolvedAddress};

pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

fn unavailable(error: reqwest::Error) -> LookupError {
    LookupError::Unavailable(error.to_string())
}

impl ViaCepClient {
    pub fn new(config: &AddressLookupConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(unavailable)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &NavegarConfig) -> Result<Self, LookupError> {
        Self::new(&config.address_lookup)
    }

    pub fn url(&self, postal_code: &PostalCode) -> String {
        format!("{}/ws/{}/json/", self.base_url, postal_code.as_str())
    }
}

fn field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Unknown codes come back as `{"erro": true}` (or `"true"`) with status 200.
pub fn parse_address(postal_code: &PostalCode, body: &Value) -> Result<ResolvedAddress, LookupError> {
    let not_found = match body.get("erro") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag == "true",
        _ => false,
    };
    if not_found {
        return Err(LookupError::NotFound(postal_code.clone()));
    }
    if !body.is_object() {
        return Err(LookupError::Unavailable("unexpected response body".to_string()));
    }

    Ok(ResolvedAddress {
        street: field(body, "logradouro"),
        neighborhood: field(body, "bairro"),
        city: field(body, "localidade"),
        state_code: field(body, "uf").to_uppercase(),
    })
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup(&self, postal_code: &PostalCode) -> Result<ResolvedAddress, LookupError> {
        let response = self
            .client
            .get(self.url(postal_code))
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: Value = response.json().await.map_err(unavailable)?;
        debug!(%postal_code, "address lookup answered");
        parse_address(postal_code, &body)
    }
}
