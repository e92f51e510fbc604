use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::IdMapping;

/// v2 REST surface: primary CRUD, numeric (legacy) id space.
pub const REST_BASE_URL: &str = "https://api.todoist.com/rest/v2";
/// Unified v1 surface: id-mapping lookups and task moves, opaque id space.
pub const API_BASE_URL: &str = "https://api.todoist.com/api/v1";

const TOKEN_ENV: &str = "TODOIST_API_TOKEN";

/// Which id space a mapping lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Tasks,
    Projects,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Tasks => "tasks",
            IdKind::Projects => "projects",
        }
    }
}

/// Bearer-authenticated client over both Todoist API surfaces. One
/// credential serves both; a blank token is accepted here and fails on the
/// first real call, matching how the credential has always been handled.
#[derive(Debug, Clone)]
pub struct TodoistClient {
    http: reqwest::Client,
    token: String,
    rest_base: String,
    api_base: String,
}

impl TodoistClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_urls(token, REST_BASE_URL, API_BASE_URL)
    }

    /// Test seam: point both surfaces at a mock server.
    pub fn with_base_urls(
        token: impl Into<String>,
        rest_base: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        TodoistClient {
            http: reqwest::Client::new(),
            token: token.into(),
            rest_base: rest_base.into(),
            api_base: api_base.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) => Ok(Self::new(token)),
            Err(_) => Err(Error::MissingCredential),
        }
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("Authorization", format!("Bearer {}", self.token))
    }

    async fn read_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T> {
        let resp = self.authed(rb).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn read_empty(&self, rb: RequestBuilder) -> Result<()> {
        let resp = self.authed(rb).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    pub async fn get_rest<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{path}", self.rest_base);
        self.read_json(self.http.get(&url).query(query)).await
    }

    pub async fn post_rest<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = format!("{}/{path}", self.rest_base);
        self.read_json(self.http.post(&url).json(body)).await
    }

    /// POST with no response body expected (close, reopen).
    pub async fn post_rest_empty(&self, path: &str) -> Result<()> {
        let url = format!("{}/{path}", self.rest_base);
        self.read_empty(self.http.post(&url)).await
    }

    pub async fn post_api_empty(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let url = format!("{}/{path}", self.api_base);
        self.read_empty(self.http.post(&url).json(body)).await
    }

    /// Translate a legacy numeric id into the unified-API id space. Moves
    /// only exist on the unified surface, so this runs before every move.
    pub async fn translate_id(&self, kind: IdKind, legacy_id: i64) -> Result<String> {
        self.translate_id_inner(kind, legacy_id)
            .await
            .map_err(Error::wrap("convert ID"))
    }

    async fn translate_id_inner(&self, kind: IdKind, legacy_id: i64) -> Result<String> {
        let url = format!("{}/id_mappings/{}/{legacy_id}", self.api_base, kind.as_str());
        let mappings: Vec<IdMapping> = self.read_json(self.http.get(&url)).await?;
        match mappings.into_iter().next() {
            Some(mapping) => Ok(mapping.new_id),
            None => Err(Error::NotFound(format!(
                "no mapping found for {} id {legacy_id}",
                kind.as_str()
            ))),
        }
    }
}
