//! Collaborator ports consumed by the session engine.
//!
//! Both traits are object-safe and used as `Arc<dyn ...>`. Errors cross the
//! boundary as `anyhow::Error`; the engine decides what they mean.

use async_trait::async_trait;

use crate::domain::{CheckContext, StructuralFinding, TrustDecision};

/// Runs structural checks over the memory graph of one stack.
///
/// Implementations must render `StructuralFinding::message` from structural
/// facts only (IDs, counts, scores), never from memory content.
#[async_trait]
pub trait StructuralChecker: Send + Sync {
    async fn run(&self, ctx: &CheckContext) -> anyhow::Result<Vec<StructuralFinding>>;
}

/// Trust subsystem query: may `entity` perform `action` on this stack?
#[async_trait]
pub trait TrustAuthority: Send + Sync {
    async fn authorize(&self, entity: &str, action: &str) -> anyhow::Result<TrustDecision>;
}
