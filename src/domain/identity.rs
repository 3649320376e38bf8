use {super::error::PipelineError, super::id::CreatorId, async_trait::async_trait};

/// External identity collaborator: verified-email lookups and custom claim
/// writes. Claim elevation is a trust escalation and callers must sequence
/// it strictly after the payout destination is persisted.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn email_verified(&self, user: &CreatorId) -> Result<bool, PipelineError>;

    async fn set_claims(
        &self,
        user: &CreatorId,
        claims: &serde_json::Value,
    ) -> Result<(), PipelineError>;
}

/// Capability flags granted once a creator has a linked payout destination.
pub fn creator_claims() -> serde_json::Value {
    serde_json::json!({ "creator": true, "publisher": true })
}
