use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

fn require_non_empty(id: &str, what: &str) -> Result<(), PipelineError> {
    if id.is_empty() {
        return Err(PipelineError::Validation(format!("{what} cannot be empty")));
    }
    Ok(())
}

fn require_prefix(id: &str, prefix: &str, what: &str) -> Result<(), PipelineError> {
    if !id.starts_with(prefix) {
        return Err(PipelineError::Validation(format!(
            "{what} must start with {prefix}, got: {id}"
        )));
    }
    Ok(())
}

/// Checkout-generated purchase identifier. Doubles as the idempotency key
/// sent to the processor, so it must never be re-derived or regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(String);

impl PurchaseId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_non_empty(&id, "PurchaseId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The purchase id verbatim. The processor dedups on this server-side;
    /// correctness depends on the key always being the stored id, never a
    /// fresh value.
    pub fn idempotency_key(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_non_empty(&id, "CustomerId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatorId(String);

impl CreatorId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_non_empty(&id, "CreatorId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Catalog item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_non_empty(&id, "GameId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Processor payment-intent identifier (`pi_xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(String);

impl IntentId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_prefix(&id, "pi_", "IntentId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Processor-side payment method reference (`pm_xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodId(String);

impl PaymentMethodId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_prefix(&id, "pm_", "PaymentMethodId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Processor-side customer reference (`cus_xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorCustomerId(String);

impl ProcessorCustomerId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_prefix(&id, "cus_", "ProcessorCustomerId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Connected payout destination (`acct_xxx`), obtained once per creator via
/// the OAuth exchange.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutAccountId(String);

impl PayoutAccountId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        require_prefix(&id, "acct_", "PayoutAccountId")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
