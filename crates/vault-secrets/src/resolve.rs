//! Bounded-concurrency batch resolution.

use std::future::Future;

use futures_util::{stream, StreamExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::client::VaultClient;
use crate::config::{ResolveConfig, SecretRef, SecretRequestMap};
use crate::error::Result;

/// Flat logical name → resolved value mapping, in request order.
///
/// A value is the full normalized payload, a single scalar, or (for list
/// selections) an object restricted to the requested keys.
pub type ResolvedSecrets = IndexMap<String, Value>;

/// Resolve one batch end to end: validate the config, authenticate, read.
///
/// This is the single entry point a host integration calls once at startup.
/// Attaching the result under a flat or namespaced key is the host's
/// concern, not this crate's.
pub async fn resolve(config: ResolveConfig) -> Result<ResolvedSecrets> {
    config.validate()?;

    let ResolveConfig {
        secrets,
        concurrency,
        vault,
        ..
    } = config;

    let mut client = VaultClient::new(vault)?;
    client.ensure_token().await?;

    tracing::info!(secrets = secrets.len(), concurrency, "resolving secrets");
    let resolved = resolve_all(&client, secrets, concurrency).await?;
    tracing::info!(resolved = resolved.len(), "secret batch resolved");
    Ok(resolved)
}

/// Resolve every entry of `secrets` against an authenticated client, with at
/// most `concurrency` reads in flight at once.
///
/// All-or-nothing: the first failing read aborts the batch, dropping the
/// remaining in-flight reads, and becomes the sole error surfaced. Repeated
/// paths are read repeatedly; there is no de-duplication or caching.
pub async fn resolve_all(
    client: &VaultClient,
    secrets: SecretRequestMap,
    concurrency: usize,
) -> Result<ResolvedSecrets> {
    resolve_with(secrets, concurrency, |name, reference| async move {
        let value = client.read(&reference).await?;
        Ok((name, value))
    })
    .await
}

/// Concurrency gate shared by [`resolve_all`] and its tests: run `read` for
/// every entry through `buffer_unordered(concurrency)` and fail fast.
async fn resolve_with<F, Fut>(
    secrets: SecretRequestMap,
    concurrency: usize,
    read: F,
) -> Result<ResolvedSecrets>
where
    F: Fn(String, SecretRef) -> Fut,
    Fut: Future<Output = Result<(String, Value)>>,
{
    let names: Vec<String> = secrets.keys().cloned().collect();

    let mut reads = stream::iter(secrets)
        .map(|(name, reference)| read(name, reference))
        .buffer_unordered(concurrency.max(1));

    let mut resolved = ResolvedSecrets::with_capacity(names.len());
    while let Some(entry) = reads.next().await {
        let (name, value) = entry?;
        resolved.insert(name, value);
    }
    drop(reads);

    // Completion order is non-deterministic; hand back request order.
    Ok(names
        .into_iter()
        .filter_map(|name| resolved.swap_remove_entry(&name))
        .collect())
}
