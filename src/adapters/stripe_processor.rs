use {
    crate::domain::{
        error::PipelineError,
        id::{IntentId, PayoutAccountId},
        money::Currency,
        processor::{ChargeRequest, IntentSnapshot, IntentStatus, PaymentProcessor},
    },
    async_trait::async_trait,
    serde::Deserialize,
};

const OAUTH_TOKEN_URL: &str = "https://connect.stripe.com/oauth/token";

pub struct StripeProcessor {
    client: stripe::Client,
    http: reqwest::Client,
    secret_key: String,
}

impl StripeProcessor {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: stripe::Client::new(secret_key),
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_and_confirm(
        &self,
        request: &ChargeRequest,
    ) -> Result<IntentSnapshot, PipelineError> {
        let mut create = stripe::CreatePaymentIntent::new(
            request.amount.cents(),
            convert_currency(&request.currency),
        );
        create.customer = Some(
            request
                .customer
                .as_str()
                .parse()
                .map_err(|e| PipelineError::processor(format!("invalid customer id: {e}")))?,
        );
        create.payment_method = Some(
            request
                .payment_method
                .as_str()
                .parse()
                .map_err(|e| PipelineError::processor(format!("invalid payment method id: {e}")))?,
        );
        create.confirm = Some(true);
        create.confirmation_method = Some(stripe::PaymentIntentConfirmationMethod::Manual);
        create.transfer_data = Some(stripe::CreatePaymentIntentTransferData {
            amount: Some(request.transfer_amount.cents()),
            destination: request.transfer_destination.as_str().to_string(),
        });

        // The processor dedups on this key server-side; a retried delivery
        // replays the original intent instead of charging twice.
        let client = self
            .client
            .clone()
            .with_strategy(stripe::RequestStrategy::Idempotent(
                request.idempotency_key.clone(),
            ));

        let intent = stripe::PaymentIntent::create(&client, create)
            .await
            .map_err(convert_stripe_error)?;
        snapshot_from_intent(&intent)
    }

    async fn confirm(&self, intent: &IntentId) -> Result<IntentSnapshot, PipelineError> {
        let intent_id = intent
            .as_str()
            .parse::<stripe::PaymentIntentId>()
            .map_err(|e| PipelineError::processor(format!("invalid PaymentIntent id: {e}")))?;

        let intent = stripe::PaymentIntent::confirm(
            &self.client,
            &intent_id,
            stripe::PaymentIntentConfirmParams::default(),
        )
        .await
        .map_err(convert_stripe_error)?;
        snapshot_from_intent(&intent)
    }

    async fn exchange_oauth_code(&self, code: &str) -> Result<PayoutAccountId, PipelineError> {
        let response = self
            .http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_secret", self.secret_key.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::AccountLink(format!("token exchange: {e}")))?;

        if !response.status().is_success() {
            let message = match response.json::<OAuthErrorResponse>().await {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => "token exchange failed".to_string(),
            };
            return Err(PipelineError::AccountLink(message));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::AccountLink(format!("token exchange response: {e}")))?;
        PayoutAccountId::new(token.stripe_user_id)
    }
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    stripe_user_id: String,
}

#[derive(Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

// ── Boundary conversions ────────────────────────────────────────────────────

fn snapshot_from_intent(intent: &stripe::PaymentIntent) -> Result<IntentSnapshot, PipelineError> {
    Ok(IntentSnapshot {
        intent_id: IntentId::new(intent.id.to_string())?,
        status: convert_intent_status(intent.status),
        raw: serde_json::to_value(intent)?,
    })
}

fn convert_currency(c: &Currency) -> stripe::Currency {
    match c {
        Currency::Usd => stripe::Currency::USD,
        Currency::Eur => stripe::Currency::EUR,
        Currency::Gbp => stripe::Currency::GBP,
        Currency::Jpy => stripe::Currency::JPY,
    }
}

fn convert_intent_status(status: stripe::PaymentIntentStatus) -> IntentStatus {
    match status {
        stripe::PaymentIntentStatus::Succeeded => IntentStatus::Succeeded,
        stripe::PaymentIntentStatus::Canceled => IntentStatus::Canceled,
        stripe::PaymentIntentStatus::Processing => IntentStatus::Processing,
        stripe::PaymentIntentStatus::RequiresAction => IntentStatus::RequiresAction,
        stripe::PaymentIntentStatus::RequiresCapture => IntentStatus::RequiresCapture,
        stripe::PaymentIntentStatus::RequiresConfirmation => IntentStatus::RequiresConfirmation,
        stripe::PaymentIntentStatus::RequiresPaymentMethod => IntentStatus::RequiresPaymentMethod,
    }
}

/// Only a message Stripe itself attached to a request error survives as a
/// customer-visible string; transport and client errors never do.
fn convert_stripe_error(error: stripe::StripeError) -> PipelineError {
    let user_message = match &error {
        stripe::StripeError::Stripe(request_error) => request_error.message.clone(),
        _ => None,
    };
    PipelineError::Processor {
        detail: error.to_string(),
        user_message,
    }
}
