use {
    crate::domain::diag::ErrorReporter,
    crate::domain::error::PipelineError,
    crate::domain::fees,
    crate::domain::id::{CustomerId, PurchaseId},
    crate::domain::money::MoneyAmount,
    crate::domain::processor::{ChargeRequest, IntentStatus, PaymentProcessor},
    crate::domain::purchase::PurchaseState,
    crate::domain::store::RecordStore,
    std::sync::Arc,
};

#[derive(Debug)]
pub enum ChargeOutcome {
    /// Eligibility check failed — no processor call, no record mutation.
    /// The purchase stays in `validating` until conditions change.
    Ineligible(&'static str),
    /// Record already carries a payment or error; duplicate delivery.
    AlreadyProcessed,
    /// Intent submitted and the processor's response merged onto the record.
    Charged(IntentStatus),
    /// Processor failure, recorded on the purchase as a redacted error.
    Failed,
}

#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Payment absent, awaiting customer action, or already terminal.
    Noop,
    /// Confirm ran and the new response was merged onto the record.
    Confirmed(IntentStatus),
    /// Confirm failed, recorded on the purchase as a redacted error.
    Failed,
}

/// Orchestrates a purchase from creation through processor confirmation.
/// Stateless between calls; all coordination goes through the record store
/// and the processor's own idempotency guarantees.
pub struct PaymentPipeline {
    store: Arc<dyn RecordStore>,
    processor: Arc<dyn PaymentProcessor>,
    reporter: ErrorReporter,
}

impl PaymentPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        processor: Arc<dyn PaymentProcessor>,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            store,
            processor,
            reporter,
        }
    }

    /// Charge a freshly created purchase: validate against the catalog,
    /// resolve payout destination and customer profile, then submit one
    /// create-and-confirm call keyed on the purchase id.
    #[tracing::instrument(skip_all, fields(customer = %customer, purchase = %purchase_id))]
    pub async fn process_charge(
        &self,
        customer: &CustomerId,
        purchase_id: &PurchaseId,
    ) -> Result<ChargeOutcome, PipelineError> {
        let Some(purchase) = self.store.purchase(customer, purchase_id).await? else {
            return Err(PipelineError::Validation(format!(
                "unknown purchase: {purchase_id}"
            )));
        };

        // `charging` is re-entered after a crash mid-flight; the idempotency
        // key makes the repeated submission converge on one intent.
        if !matches!(
            purchase.state(),
            PurchaseState::Validating | PurchaseState::Charging
        ) {
            tracing::info!(state = %purchase.state(), "purchase already processed");
            return Ok(ChargeOutcome::AlreadyProcessed);
        }

        let Some(item) = self.store.catalog_item(purchase.game_id()).await? else {
            tracing::warn!(game = %purchase.game_id(), "catalog item not found");
            return Ok(ChargeOutcome::Ineligible("unknown catalog item"));
        };
        if purchase.amount() < item.price {
            tracing::warn!(
                amount = %purchase.amount(),
                price = %item.price,
                "amount below catalog price"
            );
            return Ok(ChargeOutcome::Ineligible("amount below catalog price"));
        }

        // Cannot pay out => do not charge.
        let destination = match self.store.payout_account(&item.creator_id).await? {
            Some(account) => match account.destination() {
                Some(dest) => dest.clone(),
                None => {
                    tracing::warn!(creator = %item.creator_id, "payout account not linked");
                    return Ok(ChargeOutcome::Ineligible("creator has no payout destination"));
                }
            },
            None => {
                tracing::warn!(creator = %item.creator_id, "no payout account");
                return Ok(ChargeOutcome::Ineligible("creator has no payout destination"));
            }
        };

        let Some(profile) = self.store.payment_profile(customer).await? else {
            tracing::warn!("customer has no payment profile");
            return Ok(ChargeOutcome::Ineligible("customer has no payment profile"));
        };

        let split = fees::compute_split(purchase.amount(), purchase.tip());

        if *purchase.state() == PurchaseState::Validating {
            self.store
                .set_state(customer, purchase_id, PurchaseState::Charging)
                .await?;
        }

        let request = ChargeRequest {
            amount: MoneyAmount::new(split.full_amount)?,
            currency: purchase.currency().clone(),
            customer: profile.processor_customer_id,
            payment_method: purchase.payment_method().clone(),
            transfer_destination: destination,
            transfer_amount: MoneyAmount::new(split.creator_transfer)?,
            idempotency_key: purchase_id.idempotency_key(),
        };

        match self.processor.create_and_confirm(&request).await {
            Ok(snapshot) => {
                let next = PurchaseState::from_intent(&snapshot.status);
                self.store
                    .merge_payment(customer, purchase_id, &snapshot, next)
                    .await?;
                tracing::info!(
                    intent = %snapshot.intent_id,
                    status = %snapshot.status,
                    transfer = %request.transfer_amount,
                    "intent recorded"
                );
                Ok(ChargeOutcome::Charged(snapshot.status))
            }
            Err(error) => {
                self.record_failure(customer, purchase_id, "process_charge", error)
                    .await?;
                Ok(ChargeOutcome::Failed)
            }
        }
    }

    /// Second half of the create/confirm protocol. Acts only when the
    /// persisted payment sub-state says `requires_confirmation`; the intent
    /// id is read from that sub-state, never from a top-level field.
    #[tracing::instrument(skip_all, fields(customer = %customer, purchase = %purchase_id))]
    pub async fn process_confirmation(
        &self,
        customer: &CustomerId,
        purchase_id: &PurchaseId,
    ) -> Result<ConfirmOutcome, PipelineError> {
        let Some(purchase) = self.store.purchase(customer, purchase_id).await? else {
            return Err(PipelineError::Validation(format!(
                "unknown purchase: {purchase_id}"
            )));
        };

        let Some(payment) = purchase.payment() else {
            return Ok(ConfirmOutcome::Noop);
        };
        if !payment.status.needs_confirmation() {
            tracing::info!(status = %payment.status, "nothing to confirm");
            return Ok(ConfirmOutcome::Noop);
        }

        match self.processor.confirm(&payment.intent_id).await {
            Ok(snapshot) => {
                let next = PurchaseState::from_intent(&snapshot.status);
                // A confirm that comes back non-terminal keeps the record in
                // needs_confirmation; anything else must be a legal step.
                if next != *purchase.state() && !purchase.state().can_transition_to(&next) {
                    tracing::warn!(
                        from = %purchase.state(),
                        to = %next,
                        "invalid state transition after confirm, skipped"
                    );
                    return Ok(ConfirmOutcome::Noop);
                }
                self.store
                    .merge_payment(customer, purchase_id, &snapshot, next)
                    .await?;
                tracing::info!(intent = %snapshot.intent_id, status = %snapshot.status, "confirm recorded");
                Ok(ConfirmOutcome::Confirmed(snapshot.status))
            }
            Err(error) => {
                self.record_failure(customer, purchase_id, "process_confirmation", error)
                    .await?;
                Ok(ConfirmOutcome::Failed)
            }
        }
    }

    /// Two independent side effects: the redacted error lands on the record,
    /// the raw one goes to the diagnostic sink. The report is attempted even
    /// when the merge fails — they are not a transaction.
    async fn record_failure(
        &self,
        customer: &CustomerId,
        purchase_id: &PurchaseId,
        function: &str,
        error: PipelineError,
    ) -> Result<(), PipelineError> {
        let merged = self
            .store
            .merge_error(
                customer,
                purchase_id,
                &error.user_safe_message(),
                PurchaseState::Errored,
            )
            .await;

        self.reporter
            .report(
                "purchase",
                function,
                &error,
                serde_json::json!({
                    "customer_id": customer.as_str(),
                    "purchase_id": purchase_id.as_str(),
                }),
            )
            .await;

        merged
    }
}
