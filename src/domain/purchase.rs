use {
    super::error::PipelineError,
    super::id::{CustomerId, GameId, IntentId, PaymentMethodId, PurchaseId},
    super::money::{Currency, MoneyAmount},
    super::processor::IntentStatus,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Purchase lifecycle. The pipeline drives this machine explicitly instead
/// of chaining off storage triggers, so every transition is a direct call
/// or a queued job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    Validating,
    Charging,
    NeedsConfirmation,
    Paid,
    Errored,
}

impl PurchaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Charging => "charging",
            Self::NeedsConfirmation => "needs_confirmation",
            Self::Paid => "paid",
            Self::Errored => "errored",
        }
    }

    /// Lifecycle rank — higher means further along. Used to prevent
    /// out-of-order deliveries from regressing state.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Validating => 0,
            Self::Charging => 1,
            Self::NeedsConfirmation => 2,
            Self::Paid | Self::Errored => 3,
        }
    }

    pub fn can_transition_to(&self, next: &PurchaseState) -> bool {
        matches!(
            (self, next),
            (Self::Validating, Self::Charging)
                | (Self::Charging, Self::NeedsConfirmation)
                | (Self::Charging, Self::Paid)
                | (Self::Charging, Self::Errored)
                | (Self::NeedsConfirmation, Self::Paid)
                | (Self::NeedsConfirmation, Self::Errored)
        )
    }

    /// Where an intent status lands the purchase. Anything non-terminal is
    /// still awaiting confirmation of some kind.
    pub fn from_intent(status: &IntentStatus) -> PurchaseState {
        match status {
            IntentStatus::Succeeded => Self::Paid,
            IntentStatus::Canceled => Self::Errored,
            _ => Self::NeedsConfirmation,
        }
    }
}

impl fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PurchaseState {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "validating" => Ok(Self::Validating),
            "charging" => Ok(Self::Charging),
            "needs_confirmation" => Ok(Self::NeedsConfirmation),
            "paid" => Ok(Self::Paid),
            "errored" => Ok(Self::Errored),
            other => Err(PipelineError::Validation(format!(
                "unknown purchase state: {other}"
            ))),
        }
    }
}

/// The processor's view of the charge, merged onto the purchase record.
/// Written only by the orchestrator and the confirmation watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubState {
    pub intent_id: IntentId,
    pub status: IntentStatus,
    pub raw: serde_json::Value,
}

/// For INSERT — built by the checkout collaborator's request. Amount and
/// tip are fixed here and never rewritten by the pipeline.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    customer_id: CustomerId,
    purchase_id: PurchaseId,
    game_id: GameId,
    amount: MoneyAmount,
    tip: MoneyAmount,
    currency: Currency,
    payment_method: PaymentMethodId,
}

pub struct NewPurchaseParams {
    pub customer_id: CustomerId,
    pub purchase_id: PurchaseId,
    pub game_id: GameId,
    pub amount: MoneyAmount,
    pub tip: MoneyAmount,
    pub currency: Currency,
    pub payment_method: PaymentMethodId,
}

impl NewPurchase {
    pub fn new(params: NewPurchaseParams) -> Self {
        Self {
            customer_id: params.customer_id,
            purchase_id: params.purchase_id,
            game_id: params.game_id,
            amount: params.amount,
            tip: params.tip,
            currency: params.currency,
            payment_method: params.payment_method,
        }
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn purchase_id(&self) -> &PurchaseId {
        &self.purchase_id
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn tip(&self) -> MoneyAmount {
        self.tip
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn payment_method(&self) -> &PaymentMethodId {
        &self.payment_method
    }
}

/// Full purchase record as read back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    customer_id: CustomerId,
    purchase_id: PurchaseId,
    game_id: GameId,
    amount: MoneyAmount,
    tip: MoneyAmount,
    currency: Currency,
    payment_method: PaymentMethodId,
    state: PurchaseState,
    payment: Option<PaymentSubState>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct PurchaseParts {
    pub customer_id: CustomerId,
    pub purchase_id: PurchaseId,
    pub game_id: GameId,
    pub amount: MoneyAmount,
    pub tip: MoneyAmount,
    pub currency: Currency,
    pub payment_method: PaymentMethodId,
    pub state: PurchaseState,
    pub payment: Option<PaymentSubState>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn from_parts(parts: PurchaseParts) -> Self {
        Self {
            customer_id: parts.customer_id,
            purchase_id: parts.purchase_id,
            game_id: parts.game_id,
            amount: parts.amount,
            tip: parts.tip,
            currency: parts.currency,
            payment_method: parts.payment_method,
            state: parts.state,
            payment: parts.payment,
            error: parts.error,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn purchase_id(&self) -> &PurchaseId {
        &self.purchase_id
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn tip(&self) -> MoneyAmount {
        self.tip
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn payment_method(&self) -> &PaymentMethodId {
        &self.payment_method
    }

    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    pub fn payment(&self) -> Option<&PaymentSubState> {
        self.payment.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
