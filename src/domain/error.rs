use thiserror::Error;

/// Fallback shown to customers when a processor failure carries no message
/// of its own.
pub const GENERIC_PAYMENT_ERROR: &str = "Your payment could not be processed.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("processor: {detail}")]
    Processor {
        detail: String,
        /// Message the processor itself marked as safe to show, if any.
        user_message: Option<String>,
    },

    #[error("account link: {0}")]
    AccountLink(String),
}

impl PipelineError {
    pub fn processor(detail: impl Into<String>) -> Self {
        Self::Processor {
            detail: detail.into(),
            user_message: None,
        }
    }

    /// Redact to a string safe to persist on a customer-visible record.
    /// Only a processor-supplied message survives; everything else collapses
    /// to the generic fallback.
    pub fn user_safe_message(&self) -> String {
        match self {
            Self::Processor {
                user_message: Some(msg),
                ..
            } => msg.clone(),
            _ => GENERIC_PAYMENT_ERROR.to_string(),
        }
    }
}
