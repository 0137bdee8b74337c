//! Batch secret resolution against a HashiCorp Vault KV store.
//!
//! Given a map of logical secret names to Vault paths (optionally narrowed to
//! one or more keys inside a secret), this crate authenticates once, reads
//! every referenced secret with a bounded number of concurrent requests, and
//! returns a flat name → value mapping. Resolution is all-or-nothing: the
//! first failing read aborts the whole batch.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vault_secrets::{
//!     resolve, ConnectionOptions, ResolveConfig, SecretRef, SecretRequestMap,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> vault_secrets::Result<()> {
//! let mut secrets = SecretRequestMap::new();
//! secrets.insert(
//!     "db_password".into(),
//!     SecretRef::key("secret/data/postgres", "password"),
//! );
//! secrets.insert(
//!     "redis".into(),
//!     SecretRef::keys("secret/data/redis", ["main", "secondary"]),
//! );
//!
//! let config = ResolveConfig::new(secrets)
//!     .with_vault(ConnectionOptions::new("http://127.0.0.1:8200").with_token("s.abc123"));
//!
//! let resolved = resolve(config).await?;
//! println!("{}", resolved["db_password"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod resolve;

mod auth;

pub use client::VaultClient;
pub use config::{
    ApiVersion, Authentication, ConnectionOptions, KeySelect, ResolveConfig, SecretRef,
    SecretRequestMap,
};
pub use error::{Error, Result};
pub use resolve::{resolve, resolve_all, ResolvedSecrets};
