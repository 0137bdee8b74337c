//! Configuration for the Vault connection and for a resolution batch.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default Vault API base URL.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8200";

/// Default number of secret reads in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Vault secret-read API version.
///
/// The two versions differ in the response shape of a secret read: V2 nests
/// the key-value payload one level deeper (`data.data` instead of `data`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    /// URL path segment for this version (`"v1"` / `"v2"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

/// How the client obtains a Vault token when one is not supplied directly.
///
/// The set of supported methods is closed: configuration documents naming any
/// other method are rejected when parsed, before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "credentials", rename_all = "lowercase")]
pub enum Authentication {
    /// LDAP username/password login via `auth/ldap/login/{username}`.
    Ldap { username: String, password: String },
    /// AppRole login via `auth/approle/login`.
    AppRole { role_id: String, secret_id: String },
}

impl Authentication {
    /// Method tag, for logging. Never exposes credentials.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Ldap { .. } => "ldap",
            Self::AppRole { .. } => "approle",
        }
    }
}

/// Connection options for the Vault server.
///
/// Exactly one of `token` / `authentication` is used at resolution time: a
/// pre-supplied token always wins and the authentication method, if any, is
/// never invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Vault base URL. Default: `http://127.0.0.1:8200`.
    pub endpoint: String,
    /// Secret-read API version. Default: [`ApiVersion::V1`].
    pub api_version: ApiVersion,
    /// Pre-supplied access token.
    pub token: Option<String>,
    /// Credential exchange to perform when no token is supplied.
    pub authentication: Option<Authentication>,
}

impl ConnectionOptions {
    /// Options pointing at the given endpoint, with defaults for the rest.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Select the secret-read API version.
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Supply a token directly, skipping any credential exchange.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Supply an authentication method used to obtain a token.
    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// Base URL for API requests: `{endpoint}/{api_version}`.
    pub(crate) fn api_base(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.api_version.as_str()
        )
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: ApiVersion::default(),
            token: None,
            authentication: None,
        }
    }
}

/// Which part of a secret payload a [`SecretRef`] selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySelect {
    /// A single key; resolves to that key's scalar value.
    One(String),
    /// An ordered list of keys; resolves to an object restricted to exactly
    /// those keys, in this order. Must be non-empty.
    Many(Vec<String>),
}

/// Reference to a secret in the store.
///
/// Either a bare path (the entire secret body is returned) or a path plus a
/// key selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecretRef {
    /// Bare path: return the whole normalized payload.
    Path(String),
    /// Path plus optional key selection.
    Select {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<KeySelect>,
    },
}

impl SecretRef {
    /// Reference the entire secret body at `path`.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Reference a single key inside the secret at `path`.
    pub fn key(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Select {
            path: path.into(),
            key: Some(KeySelect::One(key.into())),
        }
    }

    /// Reference several keys inside the secret at `path`.
    pub fn keys<I, K>(path: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::Select {
            path: path.into(),
            key: Some(KeySelect::Many(keys.into_iter().map(Into::into).collect())),
        }
    }

    /// The store path this reference points at.
    pub fn secret_path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Select { path, .. } => path,
        }
    }

    /// The key selection, if any.
    pub fn key_select(&self) -> Option<&KeySelect> {
        match self {
            Self::Path(_) => None,
            Self::Select { key, .. } => key.as_ref(),
        }
    }
}

/// Map of logical secret name → store reference.
pub type SecretRequestMap = IndexMap<String, SecretRef>;

/// One resolution batch: which secrets to fetch and how to reach the store.
///
/// Mirrors the option object a host integration forwards at startup. The
/// `namespace` field is carried for the host layer (which attaches the
/// resolved mapping under it); the core itself does not interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Logical name → secret reference. Must be non-empty.
    pub secrets: SecretRequestMap,
    /// Host-layer namespace for the resolved mapping. Unused by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Maximum secret reads in flight at once. Default: `5`.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Vault connection options.
    #[serde(default)]
    pub vault: ConnectionOptions,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl ResolveConfig {
    /// A config for the given request map, with default connection options.
    pub fn new(secrets: SecretRequestMap) -> Self {
        Self {
            secrets,
            namespace: None,
            concurrency: DEFAULT_CONCURRENCY,
            vault: ConnectionOptions::default(),
        }
    }

    /// Parse a config from a host configuration document.
    ///
    /// Rejects unknown authentication method tags and malformed references
    /// before any network call is attempted.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| Error::Configuration(format!("invalid configuration: {err}")))
    }

    /// Set the Vault connection options.
    pub fn with_vault(mut self, vault: ConnectionOptions) -> Self {
        self.vault = vault;
        self
    }

    /// Override the concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the host-layer namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Check batch-level invariants: a non-empty request map, and no empty
    /// key lists.
    pub fn validate(&self) -> Result<()> {
        if self.secrets.is_empty() {
            return Err(Error::Configuration("no secrets requested".to_string()));
        }
        for (name, reference) in &self.secrets {
            if matches!(reference.key_select(), Some(KeySelect::Many(keys)) if keys.is_empty()) {
                return Err(Error::Configuration(format!(
                    "secret '{name}' requests an empty key list"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connection_defaults() {
        let options = ConnectionOptions::default();
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(options.api_version, ApiVersion::V1);
        assert!(options.token.is_none());
        assert!(options.authentication.is_none());
    }

    #[test]
    fn api_base_strips_trailing_slash() {
        let options = ConnectionOptions::new("http://vault:8200/");
        assert_eq!(options.api_base(), "http://vault:8200/v1");

        let options = options.with_api_version(ApiVersion::V2);
        assert_eq!(options.api_base(), "http://vault:8200/v2");
    }

    #[test]
    fn secret_ref_accessors() {
        let bare = SecretRef::path("secret/data/mongo");
        assert_eq!(bare.secret_path(), "secret/data/mongo");
        assert!(bare.key_select().is_none());

        let single = SecretRef::key("secret/data/mongo", "hello");
        assert_eq!(
            single.key_select(),
            Some(&KeySelect::One("hello".to_string()))
        );

        let many = SecretRef::keys("secret/data/redis", ["main", "secondary"]);
        assert_eq!(
            many.key_select(),
            Some(&KeySelect::Many(vec![
                "main".to_string(),
                "secondary".to_string()
            ]))
        );
    }

    #[test]
    fn parses_host_configuration_document() {
        let config = ResolveConfig::from_json(json!({
            "secrets": {
                "mongo_password": { "path": "secret/data/mongo", "key": "hello" },
                "redis_password": { "path": "secret/data/redis", "key": ["main", "secondary"] },
                "raw": "secret/data/raw"
            },
            "namespace": "db",
            "concurrency": 3,
            "vault": {
                "endpoint": "http://127.0.0.1:8200",
                "api_version": "v2",
                "authentication": {
                    "method": "ldap",
                    "credentials": { "username": "user", "password": "****" }
                }
            }
        }))
        .unwrap();

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.namespace.as_deref(), Some("db"));
        assert_eq!(config.vault.api_version, ApiVersion::V2);
        assert_eq!(
            config.secrets["raw"],
            SecretRef::Path("secret/data/raw".to_string())
        );
        assert_eq!(
            config.vault.authentication,
            Some(Authentication::Ldap {
                username: "user".to_string(),
                password: "****".to_string(),
            })
        );
    }

    #[test]
    fn concurrency_defaults_to_five() {
        let config = ResolveConfig::from_json(json!({
            "secrets": { "raw": "secret/data/raw" }
        }))
        .unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn unknown_authentication_method_is_rejected() {
        let err = ResolveConfig::from_json(json!({
            "secrets": { "raw": "secret/data/raw" },
            "vault": {
                "authentication": {
                    "method": "unknown",
                    "credentials": { "user": "x" }
                }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn empty_request_map_fails_validation() {
        let config = ResolveConfig::new(SecretRequestMap::new());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("no secrets requested"));
    }

    #[test]
    fn empty_key_list_fails_validation() {
        let mut secrets = SecretRequestMap::new();
        secrets.insert(
            "redis".to_string(),
            SecretRef::keys("secret/data/redis", Vec::<String>::new()),
        );
        let err = ResolveConfig::new(secrets).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn approle_credentials_round_trip() {
        let auth = Authentication::AppRole {
            role_id: "my-role".to_string(),
            secret_id: "my-secret".to_string(),
        };
        let value = serde_json::to_value(&auth).unwrap();
        assert_eq!(value["method"], "approle");
        let back: Authentication = serde_json::from_value(value).unwrap();
        assert_eq!(back, auth);
        assert_eq!(back.method(), "approle");
    }
}
