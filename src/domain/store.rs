use {
    super::account::{CustomerPaymentProfile, PayoutAccount},
    super::catalog::CatalogItem,
    super::error::PipelineError,
    super::id::{CreatorId, CustomerId, GameId, PayoutAccountId, PurchaseId},
    super::processor::IntentSnapshot,
    super::purchase::{NewPurchase, Purchase, PurchaseState},
    async_trait::async_trait,
};

/// The record store the pipeline coordinates through. All writes are
/// field-level merges — a mutation from one handler never erases fields
/// written by another, which is what makes duplicate deliveries convergent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn catalog_item(&self, game: &GameId) -> Result<Option<CatalogItem>, PipelineError>;

    async fn payout_account(
        &self,
        creator: &CreatorId,
    ) -> Result<Option<PayoutAccount>, PipelineError>;

    /// Populate-once merge of the payout destination. Returns `false` when
    /// a destination was already linked (the existing one wins).
    async fn link_payout_account(
        &self,
        creator: &CreatorId,
        account: &PayoutAccountId,
    ) -> Result<bool, PipelineError>;

    async fn payment_profile(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPaymentProfile>, PipelineError>;

    async fn purchase(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
    ) -> Result<Option<Purchase>, PipelineError>;

    /// Returns `false` when the purchase id already exists (checkout
    /// re-submission) — the existing record is left untouched.
    async fn create_purchase(&self, purchase: &NewPurchase) -> Result<bool, PipelineError>;

    async fn set_state(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        state: PurchaseState,
    ) -> Result<(), PipelineError>;

    /// Merge the processor response and resulting state onto the record.
    /// Never touches amount, tip, or a previously written error.
    async fn merge_payment(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        snapshot: &IntentSnapshot,
        state: PurchaseState,
    ) -> Result<(), PipelineError>;

    /// Merge a redacted error message and resulting state onto the record.
    /// Never touches amount, tip, or the payment sub-state.
    async fn merge_error(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        message: &str,
        state: PurchaseState,
    ) -> Result<(), PipelineError>;
}
