use {
    crate::domain::diag::ErrorReporter,
    crate::domain::error::PipelineError,
    crate::domain::id::CreatorId,
    crate::domain::identity::{IdentityProvider, creator_claims},
    crate::domain::processor::PaymentProcessor,
    crate::domain::store::RecordStore,
    std::sync::Arc,
};

#[derive(Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// A destination was already on file; the existing one was kept.
    AlreadyLinked,
}

/// Completes the OAuth redirect from the processor's authorization page:
/// exchange the code, persist the payout destination, then — and only
/// then — elevate the creator's claims.
pub struct AccountLinker {
    store: Arc<dyn RecordStore>,
    processor: Arc<dyn PaymentProcessor>,
    identity: Arc<dyn IdentityProvider>,
    reporter: ErrorReporter,
}

impl AccountLinker {
    pub fn new(
        store: Arc<dyn RecordStore>,
        processor: Arc<dyn PaymentProcessor>,
        identity: Arc<dyn IdentityProvider>,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            store,
            processor,
            identity,
            reporter,
        }
    }

    /// Errors propagate raw to the caller (no money has moved yet) but are
    /// still reported to the diagnostic sink for operability.
    #[tracing::instrument(skip_all, fields(creator = %creator))]
    pub async fn link(&self, creator: &CreatorId, code: &str) -> Result<LinkOutcome, PipelineError> {
        match self.link_inner(creator, code).await {
            Ok(outcome) => {
                tracing::info!(?outcome, "payout account linked");
                Ok(outcome)
            }
            Err(error) => {
                self.reporter
                    .report(
                        "payout_account",
                        "link",
                        &error,
                        serde_json::json!({ "creator_id": creator.as_str() }),
                    )
                    .await;
                Err(error)
            }
        }
    }

    async fn link_inner(
        &self,
        creator: &CreatorId,
        code: &str,
    ) -> Result<LinkOutcome, PipelineError> {
        if !self.identity.email_verified(creator).await? {
            return Err(PipelineError::AccountLink(format!(
                "creator {creator} has no verified email"
            )));
        }

        let account = self.processor.exchange_oauth_code(code).await?;
        let newly_linked = self.store.link_payout_account(creator, &account).await?;
        if !newly_linked {
            tracing::warn!(account = %account, "payout destination already linked, kept existing");
        }

        // Trust escalation — strictly after the destination is persisted.
        self.identity
            .set_claims(creator, &creator_claims())
            .await?;

        Ok(if newly_linked {
            LinkOutcome::Linked
        } else {
            LinkOutcome::AlreadyLinked
        })
    }
}
