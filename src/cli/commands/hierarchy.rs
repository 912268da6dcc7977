use serde::Serialize;

use crate::authz::{AuthzEngine, Policy, ResourceKind};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
pub struct KindSummary {
    pub kind: ResourceKind,
    pub parent: Option<ResourceKind>,
    pub inherited: bool,
    pub policy: Policy,
}

/// One summary per registered kind, in declaration order.
pub fn summarize(engine: &AuthzEngine) -> anyhow::Result<Vec<KindSummary>> {
    let registry = engine.registry();
    registry
        .kinds()
        .map(|kind| {
            Ok(KindSummary {
                kind: kind.clone(),
                parent: registry.parent_of(kind).cloned(),
                inherited: registry.declared_policy(kind).is_none(),
                policy: engine.resolve_effective_policy(kind)?,
            })
        })
        .collect()
}

pub fn handle(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let engine = AuthzEngine::new(config.load_hierarchy()?);
    let summaries = summarize(&engine)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("{:<12} {:<12} {:<10} {:<10} {}", "KIND", "PARENT", "ANYONE", "OWNER", "SOURCE");
    for s in summaries {
        println!(
            "{:<12} {:<12} {:<10} {:<10} {}",
            s.kind.to_string(),
            s.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            s.policy.anyone_can.to_string(),
            s.policy.owner_can.to_string(),
            if s.inherited { "inherited" } else { "declared" }
        );
    }
    Ok(())
}
