//! Vault client: single-secret reads with response normalization and key
//! extraction.

use reqwest::Client;
use serde_json::{Map, Value};

use crate::auth;
use crate::config::{ApiVersion, ConnectionOptions, KeySelect, SecretRef};
use crate::error::{Error, Result};

/// Client for a Vault-shaped secret store.
///
/// Holds at most one token for its lifetime: either pre-supplied through the
/// connection options or obtained once by [`VaultClient::ensure_token`].
/// There is no refresh or expiry handling; a fresh client is expected per
/// resolution run.
#[derive(Debug)]
pub struct VaultClient {
    http: Client,
    options: ConnectionOptions,
    token: Option<String>,
}

impl VaultClient {
    /// Build a client for the given connection options.
    pub fn new(options: ConnectionOptions) -> Result<Self> {
        let http = Client::builder().build()?;
        let token = options.token.clone();
        Ok(Self {
            http,
            options,
            token,
        })
    }

    /// Ensure the client holds a token, logging in at most once.
    ///
    /// A token pre-supplied through the options is returned unchanged with
    /// zero network calls.
    pub async fn ensure_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let token = auth::ensure_token(&self.http, &self.options).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Read one secret reference and extract the selected keys.
    ///
    /// Issues `GET {endpoint}/{api_version}/{path}` with the held token and
    /// normalizes the response for the configured API version.
    pub async fn read(&self, reference: &SecretRef) -> Result<Value> {
        let token = self.token.as_deref().ok_or_else(|| {
            Error::Authentication("no token held; call ensure_token before reading".to_string())
        })?;

        let path = reference.secret_path();
        let url = format!("{}/{}", self.options.api_base(), path.trim_start_matches('/'));
        tracing::debug!(path, version = self.options.api_version.as_str(), "reading secret");

        let resp = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .header("Content-type", "application/json")
            .send()
            .await?;

        let body: Value = resp.json().await?;
        let payload = normalize(&body, self.options.api_version, path)?;
        extract(payload, reference.key_select())
    }
}

/// Normalize a read response into its key-value payload.
///
/// The body is inspected irrespective of HTTP status: an explicit `errors`
/// list wins, then a missing/empty `data` field means the secret does not
/// exist. For V2 the payload sits one level deeper (`data.data`); for V1,
/// `data` itself is the payload.
fn normalize<'a>(body: &'a Value, version: ApiVersion, path: &str) -> Result<&'a Map<String, Value>> {
    if let Some(message) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = message
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| message.to_string());
        return Err(Error::Store(message));
    }

    let data = body
        .get("data")
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::SecretNotFound(path.to_string()))?;

    let payload = match version {
        ApiVersion::V1 => data,
        ApiVersion::V2 => data.get("data").unwrap_or(&Value::Null),
    };

    payload
        .as_object()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| Error::SecretNotFound(path.to_string()))
}

/// Extract the selected keys from a normalized payload.
///
/// A key counts as present when it exists with a non-null value; legitimate
/// falsy values (empty string, `0`, `false`) resolve normally. List
/// selections keep exactly the requested keys in request order and
/// short-circuit on the first missing key.
fn extract(payload: &Map<String, Value>, select: Option<&KeySelect>) -> Result<Value> {
    match select {
        None => Ok(Value::Object(payload.clone())),
        Some(KeySelect::One(key)) => lookup(payload, key).cloned(),
        Some(KeySelect::Many(keys)) => {
            if keys.is_empty() {
                return Err(Error::Configuration(
                    "key list must not be empty".to_string(),
                ));
            }
            let mut selected = Map::new();
            for key in keys {
                let value = lookup(payload, key)?;
                selected.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(selected))
        }
    }
}

fn lookup<'a>(payload: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    payload
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| Error::KeyNotFound(key.to_string()))
}
