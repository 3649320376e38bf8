use super::id::{CreatorId, CustomerId, PayoutAccountId, ProcessorCustomerId};

/// One per creator. Created empty during onboarding; the account linker
/// populates the destination exactly once.
#[derive(Debug, Clone)]
pub struct PayoutAccount {
    pub creator_id: CreatorId,
    pub stripe_account_id: Option<PayoutAccountId>,
}

impl PayoutAccount {
    /// None means the creator cannot receive payouts and any purchase
    /// against them must short-circuit before charging.
    pub fn destination(&self) -> Option<&PayoutAccountId> {
        self.stripe_account_id.as_ref()
    }
}

/// Customer-side processor reference, looked up once per purchase.
#[derive(Debug, Clone)]
pub struct CustomerPaymentProfile {
    pub customer_id: CustomerId,
    pub processor_customer_id: ProcessorCustomerId,
}
