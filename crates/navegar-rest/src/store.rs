//! Record store and session provider over the hosted PostgREST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use navegar_shared::config::{BackendConfig, NavegarConfig};
use navegar_shared::{
    text_field, EntityId, Filter, OrderBy, RecordStore, Row, Session, SessionProvider, StoreError,
    Table,
};

use crate::query::{
    auth_error, filter_params, order_param, parse_content_range, parse_rows, single_row,
    status_error, PREFER_COUNT, PREFER_MINIMAL, PREFER_REPRESENTATION, PREFER_UPSERT,
};

/// PostgREST client. Requests carry the anon key, plus the signed-in
/// user's access token once one is set.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

fn network(error: reqwest::Error) -> StoreError {
    StoreError::Network(error.to_string())
}

fn decode(error: reqwest::Error) -> StoreError {
    StoreError::Decode(error.to_string())
}

impl RestStore {
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(network)?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &NavegarConfig) -> Result<Self, StoreError> {
        Self::new(&config.backend)
    }

    /// Set or clear the user's access token. Without one, reads run as
    /// the anonymous role and there is no session.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    pub fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    async fn request(&self, method: Method, url: String) -> RequestBuilder {
        let token = self.access_token.read().await.clone();
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.as_deref().unwrap_or(self.anon_key.as_str()))
    }

    async fn table_request(&self, method: Method, table: Table) -> RequestBuilder {
        self.request(method, self.table_url(table)).await
    }

    async fn check(table: Table, response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let error = status_error(table, status.as_u16(), &body);
        warn!(%table, status = status.as_u16(), %error, "backend request failed");
        Err(error)
    }

    async fn send(table: Table, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(network)?;
        Self::check(table, response).await
    }

    async fn rows(response: Response) -> Result<Vec<Row>, StoreError> {
        let body: Value = response.json().await.map_err(decode)?;
        parse_rows(body)
    }

    async fn row(response: Response) -> Result<Row, StoreError> {
        let body: Value = response.json().await.map_err(decode)?;
        single_row(body)
    }
}

fn id_param(id: &EntityId) -> [(String, String); 1] {
    [("id".to_string(), format!("eq.{}", id))]
}

#[async_trait]
impl RecordStore for RestStore {
    async fn get(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let mut params = filter_params(filter);
        params.push(("limit".to_string(), "1".to_string()));
        let request = self.table_request(Method::GET, table).await.query(&params);
        let rows = Self::rows(Self::send(table, request).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn list(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut params = filter_params(filter);
        params.extend(order.map(order_param));
        let request = self.table_request(Method::GET, table).await.query(&params);
        let rows = Self::rows(Self::send(table, request).await?).await?;
        debug!(%table, rows = rows.len(), "listed rows");
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let request = self
            .table_request(Method::POST, table)
            .await
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&row);
        Self::row(Self::send(table, request).await?).await
    }

    async fn update(&self, table: Table, id: &EntityId, patch: Row) -> Result<(), StoreError> {
        let request = self
            .table_request(Method::PATCH, table)
            .await
            .query(&id_param(id))
            .header("Prefer", PREFER_MINIMAL)
            .json(&patch);
        Self::send(table, request).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &EntityId) -> Result<(), StoreError> {
        let request = self
            .table_request(Method::DELETE, table)
            .await
            .query(&id_param(id));
        Self::send(table, request).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<Row, StoreError> {
        let request = self
            .table_request(Method::POST, table)
            .await
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", PREFER_UPSERT)
            .json(&row);
        Self::row(Self::send(table, request).await?).await
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        let request = self
            .table_request(Method::HEAD, table)
            .await
            .query(&filter_params(filter))
            .header("Prefer", PREFER_COUNT);
        let response = Self::send(table, request).await?;
        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Decode("missing or invalid Content-Range".to_string()))
    }
}

#[async_trait]
impl SessionProvider for RestStore {
    /// The token's user and the clinic on their profile. A missing or
    /// rejected token is no session.
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.access_token.read().await.clone() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.user_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(network)?;
        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            debug!("access token rejected");
            return Ok(None);
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = auth_error(status, &body);
            warn!(status, %error, "auth request failed");
            return Err(error);
        }
        let user: AuthUser = response.json().await.map_err(decode)?;
        let user_id = EntityId::from(user.id);

        let profile = self.get(Table::Profiles, &Filter::by_id(&user_id)).await?;
        let organization_id = profile
            .map(|row| text_field(&row, "clinic_id"))
            .filter(|clinic| !clinic.is_empty())
            .map(EntityId::from);

        Ok(Some(Session { user_id, organization_id }))
    }
}
