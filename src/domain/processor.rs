use {
    super::error::PipelineError,
    super::id::{IntentId, PaymentMethodId, PayoutAccountId, ProcessorCustomerId},
    super::money::{Currency, MoneyAmount},
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Processor-side lifecycle of a payment intent, validated at the boundary.
/// Business logic only ever reads this strict form, never the raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresConfirmation,
    RequiresAction,
    RequiresCapture,
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Canceled,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::RequiresCapture => "requires_capture",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled)
    }

    /// The one state the confirmation watcher acts on. Everything else —
    /// terminal states included — is a no-op for it.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::RequiresConfirmation)
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for IntentStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "requires_confirmation" => Ok(Self::RequiresConfirmation),
            "requires_action" => Ok(Self::RequiresAction),
            "requires_capture" => Ok(Self::RequiresCapture),
            "requires_payment_method" => Ok(Self::RequiresPaymentMethod),
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            "canceled" => Ok(Self::Canceled),
            other => Err(PipelineError::Validation(format!(
                "unknown intent status: {other}"
            ))),
        }
    }
}

/// What the pipeline gets back from the processor after create or confirm.
/// `raw` is the processor's response verbatim, kept for merge onto the
/// purchase record; `intent_id` and `status` are the validated projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSnapshot {
    pub intent_id: IntentId,
    pub status: IntentStatus,
    pub raw: serde_json::Value,
}

/// Everything the create-and-confirm call needs. Built once per purchase by
/// the orchestrator; the idempotency key is always the purchase id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount: MoneyAmount,
    pub currency: Currency,
    pub customer: ProcessorCustomerId,
    pub payment_method: PaymentMethodId,
    pub transfer_destination: PayoutAccountId,
    pub transfer_amount: MoneyAmount,
    pub idempotency_key: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent and attempt confirmation in one call
    /// (manual confirmation mode). May come back non-terminal.
    async fn create_and_confirm(
        &self,
        request: &ChargeRequest,
    ) -> Result<IntentSnapshot, PipelineError>;

    /// Second half of the two-phase create/confirm protocol.
    async fn confirm(&self, intent: &IntentId) -> Result<IntentSnapshot, PipelineError>;

    /// OAuth authorization-code exchange returning the creator's payout
    /// destination.
    async fn exchange_oauth_code(&self, code: &str) -> Result<PayoutAccountId, PipelineError>;
}
