//! Print the role catalog and operation table as JSON.

use anyhow::Context;
use serde_json::json;

use leasehold_api::{EngineConfig, OperationRegistry};
use leasehold_auth::PermissionCatalog;

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;
    leasehold_observability::init(&config.log);

    let catalog = PermissionCatalog::standard();
    let roles: Vec<_> = catalog
        .entries()
        .filter_map(|(role, _)| catalog.describe(role))
        .collect();

    let registry = OperationRegistry::standard();
    let operations: serde_json::Map<String, serde_json::Value> = registry
        .operations()
        .map(|(name, policy)| serde_json::to_value(policy).map(|v| (name.to_string(), v)))
        .collect::<Result<_, serde_json::Error>>()
        .context("serialize operation table")?;

    let out = json!({ "roles": roles, "operations": operations });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("serialize catalog")?
    );
    Ok(())
}
