use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Thin client for the PostgREST-style document store backing TreatWell.
///
/// The caller's bearer token is forwarded on every request so row-level
/// security stays with the end user, not a service account.
pub struct StoreClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl StoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            anon_key: config.store_anon_key.clone(),
        }
    }

    fn headers(&self, auth_token: Option<&str>, prefer: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        headers
    }

    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(auth_token, prefer));

        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("Store error ({}): {}", status, error_text),
            });
        }

        if status.as_u16() == 204 {
            return serde_json::from_value(Value::Array(vec![]))
                .map_err(|e| anyhow!("Unexpected empty-body response: {}", e));
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Fetch rows matching the filter query, e.g.
    /// `select("appointments", "patient_id=eq.X&order=created_at.desc", token)`.
    pub async fn select(
        &self,
        table: &str,
        filters: &str,
        auth_token: &str,
    ) -> Result<Vec<Value>> {
        let path = if filters.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, filters)
        };
        self.send(Method::GET, &path, Some(auth_token), None, None).await
    }

    /// Insert one row and return the stored representation.
    pub async fn insert(&self, table: &str, row: Value, auth_token: &str) -> Result<Vec<Value>> {
        let path = format!("/rest/v1/{}", table);
        self.send(
            Method::POST,
            &path,
            Some(auth_token),
            Some(row),
            Some("return=representation"),
        )
        .await
    }

    /// Conditional update: the filter is evaluated by the store together
    /// with the write, so a guard like `status=eq.pending` cannot race with
    /// a concurrent transition. Returns the updated rows; an empty vec means
    /// no row satisfied the filter.
    pub async fn update_where(
        &self,
        table: &str,
        filters: &str,
        patch: Value,
        auth_token: &str,
    ) -> Result<Vec<Value>> {
        let path = format!("/rest/v1/{}?{}", table, filters);
        self.send(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(patch),
            Some("return=representation"),
        )
        .await
    }

    /// Conditional delete with the same filter semantics as `update_where`.
    pub async fn delete_where(
        &self,
        table: &str,
        filters: &str,
        auth_token: &str,
    ) -> Result<Vec<Value>> {
        let path = format!("/rest/v1/{}?{}", table, filters);
        self.send(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some("return=representation"),
        )
        .await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
