//! Token acquisition: pre-supplied tokens and credential-exchange logins.

use reqwest::Client;
use serde_json::Value;

use crate::config::{Authentication, ConnectionOptions};
use crate::error::{Error, Result};

/// Produce a usable access token for the given connection options.
///
/// A pre-supplied token is returned as-is with zero network calls. Otherwise
/// the configured authentication method is invoked: exactly one outbound
/// request, no retries. Missing both is a configuration error.
pub(crate) async fn ensure_token(client: &Client, options: &ConnectionOptions) -> Result<String> {
    if let Some(token) = &options.token {
        return Ok(token.clone());
    }

    let authentication = options.authentication.as_ref().ok_or_else(|| {
        Error::Configuration(
            "either a token or an authentication method is required".to_string(),
        )
    })?;

    tracing::debug!(method = authentication.method(), "logging in to vault");

    let base = options.api_base();
    match authentication {
        Authentication::Ldap { username, password } => {
            ldap_login(client, &base, username, password).await
        }
        Authentication::AppRole { role_id, secret_id } => {
            approle_login(client, &base, role_id, secret_id).await
        }
    }
}

async fn ldap_login(
    client: &Client,
    base: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let url = format!("{base}/auth/ldap/login/{username}");
    let body = serde_json::json!({ "password": password });
    let resp = client.post(&url).json(&body).send().await?;
    extract_client_token(resp, "ldap").await
}

async fn approle_login(
    client: &Client,
    base: &str,
    role_id: &str,
    secret_id: &str,
) -> Result<String> {
    let url = format!("{base}/auth/approle/login");
    let body = serde_json::json!({ "role_id": role_id, "secret_id": secret_id });
    let resp = client.post(&url).json(&body).send().await?;
    extract_client_token(resp, "approle").await
}

/// Pull `auth.client_token` out of a login response body.
///
/// The body is parsed regardless of HTTP status; a response without the
/// token field is an authentication failure.
async fn extract_client_token(resp: reqwest::Response, method: &str) -> Result<String> {
    let json: Value = resp.json().await?;
    json.pointer("/auth/client_token")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| {
            Error::Authentication(format!("missing auth.client_token in {method} login response"))
        })
}
