#![allow(dead_code)]

use arcade_pay::domain::account::{CustomerPaymentProfile, PayoutAccount};
use arcade_pay::domain::catalog::CatalogItem;
use arcade_pay::domain::diag::{DiagnosticEvent, DiagnosticSink, ErrorReporter};
use arcade_pay::domain::error::PipelineError;
use arcade_pay::domain::id::{
    CreatorId, CustomerId, GameId, IntentId, PaymentMethodId, PayoutAccountId,
    ProcessorCustomerId, PurchaseId,
};
use arcade_pay::domain::identity::IdentityProvider;
use arcade_pay::domain::money::{Currency, MoneyAmount};
use arcade_pay::domain::processor::{
    ChargeRequest, IntentSnapshot, IntentStatus, PaymentProcessor,
};
use arcade_pay::domain::purchase::{
    NewPurchase, NewPurchaseParams, PaymentSubState, Purchase, PurchaseParts, PurchaseState,
};
use arcade_pay::domain::store::RecordStore;
use arcade_pay::services::account_link::AccountLinker;
use arcade_pay::services::purchase_pipeline::PaymentPipeline;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared cross-double call log for asserting side-effect ordering
/// (e.g. payout persistence before claim elevation).
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

// ── In-memory record store ─────────────────────────────────────────────────

struct StoredPurchase {
    new: NewPurchase,
    state: PurchaseState,
    payment: Option<PaymentSubState>,
    error: Option<String>,
}

pub struct MemoryStore {
    items: Mutex<HashMap<String, CatalogItem>>,
    payouts: Mutex<HashMap<String, Option<PayoutAccountId>>>,
    profiles: Mutex<HashMap<String, ProcessorCustomerId>>,
    purchases: Mutex<HashMap<(String, String), StoredPurchase>>,
    log: CallLog,
}

impl MemoryStore {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(HashMap::new()),
            payouts: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            purchases: Mutex::new(HashMap::new()),
            log,
        })
    }

    pub fn seed_item(&self, game: &str, creator: &str, price: i64) {
        self.items.lock().unwrap().insert(
            game.to_string(),
            CatalogItem {
                game_id: GameId::new(game).unwrap(),
                creator_id: CreatorId::new(creator).unwrap(),
                price: MoneyAmount::new(price).unwrap(),
                config: serde_json::json!({}),
            },
        );
    }

    /// Seed an onboarding-created payout account row, linked or not.
    pub fn seed_payout(&self, creator: &str, account: Option<&str>) {
        self.payouts.lock().unwrap().insert(
            creator.to_string(),
            account.map(|a| PayoutAccountId::new(a).unwrap()),
        );
    }

    pub fn seed_profile(&self, customer: &str, processor_customer: &str) {
        self.profiles.lock().unwrap().insert(
            customer.to_string(),
            ProcessorCustomerId::new(processor_customer).unwrap(),
        );
    }

    /// Simulate a crash-recovery scenario by rewinding the state field only.
    pub fn force_state(&self, customer: &str, purchase: &str, state: PurchaseState) {
        let mut purchases = self.purchases.lock().unwrap();
        let row = purchases
            .get_mut(&(customer.to_string(), purchase.to_string()))
            .expect("purchase not found");
        row.state = state;
    }

    pub fn linked_account(&self, creator: &str) -> Option<PayoutAccountId> {
        self.payouts
            .lock()
            .unwrap()
            .get(creator)
            .cloned()
            .flatten()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn catalog_item(&self, game: &GameId) -> Result<Option<CatalogItem>, PipelineError> {
        Ok(self.items.lock().unwrap().get(game.as_str()).cloned())
    }

    async fn payout_account(
        &self,
        creator: &CreatorId,
    ) -> Result<Option<PayoutAccount>, PipelineError> {
        Ok(self
            .payouts
            .lock()
            .unwrap()
            .get(creator.as_str())
            .map(|account| PayoutAccount {
                creator_id: creator.clone(),
                stripe_account_id: account.clone(),
            }))
    }

    async fn link_payout_account(
        &self,
        creator: &CreatorId,
        account: &PayoutAccountId,
    ) -> Result<bool, PipelineError> {
        let mut payouts = self.payouts.lock().unwrap();
        let entry = payouts.entry(creator.as_str().to_string()).or_insert(None);
        if entry.is_some() {
            return Ok(false);
        }
        *entry = Some(account.clone());
        self.log
            .lock()
            .unwrap()
            .push(format!("persist:{}", creator.as_str()));
        Ok(true)
    }

    async fn payment_profile(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPaymentProfile>, PipelineError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(customer.as_str())
            .map(|id| CustomerPaymentProfile {
                customer_id: customer.clone(),
                processor_customer_id: id.clone(),
            }))
    }

    async fn purchase(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
    ) -> Result<Option<Purchase>, PipelineError> {
        let purchases = self.purchases.lock().unwrap();
        Ok(purchases
            .get(&(customer.as_str().to_string(), purchase.as_str().to_string()))
            .map(|row| {
                Purchase::from_parts(PurchaseParts {
                    customer_id: row.new.customer_id().clone(),
                    purchase_id: row.new.purchase_id().clone(),
                    game_id: row.new.game_id().clone(),
                    amount: row.new.amount(),
                    tip: row.new.tip(),
                    currency: row.new.currency().clone(),
                    payment_method: row.new.payment_method().clone(),
                    state: row.state.clone(),
                    payment: row.payment.clone(),
                    error: row.error.clone(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            }))
    }

    async fn create_purchase(&self, purchase: &NewPurchase) -> Result<bool, PipelineError> {
        let key = (
            purchase.customer_id().as_str().to_string(),
            purchase.purchase_id().as_str().to_string(),
        );
        let mut purchases = self.purchases.lock().unwrap();
        if purchases.contains_key(&key) {
            return Ok(false);
        }
        purchases.insert(
            key,
            StoredPurchase {
                new: purchase.clone(),
                state: PurchaseState::Validating,
                payment: None,
                error: None,
            },
        );
        Ok(true)
    }

    async fn set_state(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        self.force_state(customer.as_str(), purchase.as_str(), state);
        Ok(())
    }

    async fn merge_payment(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        snapshot: &IntentSnapshot,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        let mut purchases = self.purchases.lock().unwrap();
        let row = purchases
            .get_mut(&(customer.as_str().to_string(), purchase.as_str().to_string()))
            .expect("purchase not found");
        // Merge: payment and state only; amount/tip/error untouched.
        row.payment = Some(PaymentSubState {
            intent_id: snapshot.intent_id.clone(),
            status: snapshot.status.clone(),
            raw: snapshot.raw.clone(),
        });
        row.state = state;
        Ok(())
    }

    async fn merge_error(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        message: &str,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        let mut purchases = self.purchases.lock().unwrap();
        let row = purchases
            .get_mut(&(customer.as_str().to_string(), purchase.as_str().to_string()))
            .expect("purchase not found");
        row.error = Some(message.to_string());
        row.state = state;
        Ok(())
    }
}

// ── Processor double ───────────────────────────────────────────────────────

/// Test double for the payment processor. Replays the original snapshot for
/// a repeated idempotency key (real-processor semantics) unless constructed
/// strict, in which case a repeated key is rejected outright.
pub struct FakeProcessor {
    pub create_calls: Mutex<Vec<ChargeRequest>>,
    pub confirm_calls: Mutex<Vec<String>>,
    pub exchange_calls: Mutex<Vec<String>>,
    replay: Mutex<HashMap<String, IntentSnapshot>>,
    charges_created: Mutex<u32>,
    reject_duplicate_key: bool,
    create_status: Mutex<IntentStatus>,
    confirm_status: Mutex<IntentStatus>,
    fail_create: Mutex<Option<(String, Option<String>)>>,
    fail_confirm: Mutex<Option<(String, Option<String>)>>,
    fail_exchange: Mutex<Option<String>>,
    exchange_account: Mutex<String>,
}

impl FakeProcessor {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// Rejects any second create bearing an already-seen idempotency key.
    pub fn strict() -> Arc<Self> {
        Self::build(true)
    }

    fn build(reject_duplicate_key: bool) -> Arc<Self> {
        Arc::new(Self {
            create_calls: Mutex::new(Vec::new()),
            confirm_calls: Mutex::new(Vec::new()),
            exchange_calls: Mutex::new(Vec::new()),
            replay: Mutex::new(HashMap::new()),
            charges_created: Mutex::new(0),
            reject_duplicate_key,
            create_status: Mutex::new(IntentStatus::Succeeded),
            confirm_status: Mutex::new(IntentStatus::Succeeded),
            fail_create: Mutex::new(None),
            fail_confirm: Mutex::new(None),
            fail_exchange: Mutex::new(None),
            exchange_account: Mutex::new("acct_test_creator".to_string()),
        })
    }

    pub fn set_create_status(&self, status: IntentStatus) {
        *self.create_status.lock().unwrap() = status;
    }

    pub fn set_confirm_status(&self, status: IntentStatus) {
        *self.confirm_status.lock().unwrap() = status;
    }

    pub fn fail_next_create(&self, detail: &str, user_message: Option<&str>) {
        *self.fail_create.lock().unwrap() =
            Some((detail.to_string(), user_message.map(str::to_string)));
    }

    pub fn fail_next_confirm(&self, detail: &str, user_message: Option<&str>) {
        *self.fail_confirm.lock().unwrap() =
            Some((detail.to_string(), user_message.map(str::to_string)));
    }

    pub fn fail_exchange(&self, message: &str) {
        *self.fail_exchange.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_exchange_account(&self, account: &str) {
        *self.exchange_account.lock().unwrap() = account.to_string();
    }

    /// Distinct charges actually created — replays do not count.
    pub fn charges_created(&self) -> u32 {
        *self.charges_created.lock().unwrap()
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_and_confirm(
        &self,
        request: &ChargeRequest,
    ) -> Result<IntentSnapshot, PipelineError> {
        if let Some((detail, user_message)) = self.fail_create.lock().unwrap().take() {
            return Err(PipelineError::Processor {
                detail,
                user_message,
            });
        }

        self.create_calls.lock().unwrap().push(request.clone());

        let key = request.idempotency_key.clone();
        let mut replay = self.replay.lock().unwrap();
        if let Some(snapshot) = replay.get(&key) {
            if self.reject_duplicate_key {
                return Err(PipelineError::processor(format!(
                    "idempotency key reused: {key}"
                )));
            }
            return Ok(snapshot.clone());
        }

        *self.charges_created.lock().unwrap() += 1;
        let intent_id = IntentId::new(format!("pi_{key}")).unwrap();
        let snapshot = IntentSnapshot {
            intent_id: intent_id.clone(),
            status: self.create_status.lock().unwrap().clone(),
            raw: serde_json::json!({
                "id": intent_id.as_str(),
                "amount": request.amount.cents(),
                "transfer_amount": request.transfer_amount.cents(),
            }),
        };
        replay.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    async fn confirm(&self, intent: &IntentId) -> Result<IntentSnapshot, PipelineError> {
        if let Some((detail, user_message)) = self.fail_confirm.lock().unwrap().take() {
            return Err(PipelineError::Processor {
                detail,
                user_message,
            });
        }

        self.confirm_calls
            .lock()
            .unwrap()
            .push(intent.as_str().to_string());

        Ok(IntentSnapshot {
            intent_id: intent.clone(),
            status: self.confirm_status.lock().unwrap().clone(),
            raw: serde_json::json!({ "id": intent.as_str() }),
        })
    }

    async fn exchange_oauth_code(&self, code: &str) -> Result<PayoutAccountId, PipelineError> {
        self.exchange_calls.lock().unwrap().push(code.to_string());

        if let Some(message) = self.fail_exchange.lock().unwrap().take() {
            return Err(PipelineError::AccountLink(message));
        }
        PayoutAccountId::new(self.exchange_account.lock().unwrap().clone())
    }
}

// ── Identity and diagnostics doubles ───────────────────────────────────────

pub struct FakeIdentity {
    pub verified: AtomicBool,
    pub claims: Mutex<HashMap<String, serde_json::Value>>,
    log: CallLog,
}

impl FakeIdentity {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            verified: AtomicBool::new(true),
            claims: Mutex::new(HashMap::new()),
            log,
        })
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn email_verified(&self, _user: &CreatorId) -> Result<bool, PipelineError> {
        Ok(self.verified.load(Ordering::SeqCst))
    }

    async fn set_claims(
        &self,
        user: &CreatorId,
        claims: &serde_json::Value,
    ) -> Result<(), PipelineError> {
        self.claims
            .lock()
            .unwrap()
            .insert(user.as_str().to_string(), claims.clone());
        self.log
            .lock()
            .unwrap()
            .push(format!("claims:{}", user.as_str()));
        Ok(())
    }
}

pub struct CollectingSink {
    pub events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DiagnosticSink for CollectingSink {
    async fn record(&self, event: &DiagnosticEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Wiring ─────────────────────────────────────────────────────────────────

pub struct World {
    pub log: CallLog,
    pub store: Arc<MemoryStore>,
    pub processor: Arc<FakeProcessor>,
    pub identity: Arc<FakeIdentity>,
    pub sink: Arc<CollectingSink>,
    pub pipeline: PaymentPipeline,
    pub linker: AccountLinker,
}

pub fn world() -> World {
    build_world(FakeProcessor::new())
}

pub fn strict_world() -> World {
    build_world(FakeProcessor::strict())
}

fn build_world(processor: Arc<FakeProcessor>) -> World {
    let log = new_log();
    let store = MemoryStore::new(log.clone());
    let identity = FakeIdentity::new(log.clone());
    let sink = CollectingSink::new();
    let reporter = ErrorReporter::new(sink.clone());

    let pipeline = PaymentPipeline::new(store.clone(), processor.clone(), reporter.clone());
    let linker = AccountLinker::new(
        store.clone(),
        processor.clone(),
        identity.clone(),
        reporter,
    );

    World {
        log,
        store,
        processor,
        identity,
        sink,
        pipeline,
        linker,
    }
}

pub fn make_purchase(customer: &str, purchase: &str, game: &str, amount: i64, tip: i64) -> NewPurchase {
    NewPurchase::new(NewPurchaseParams {
        customer_id: CustomerId::new(customer).unwrap(),
        purchase_id: PurchaseId::new(purchase).unwrap(),
        game_id: GameId::new(game).unwrap(),
        amount: MoneyAmount::new(amount).unwrap(),
        tip: MoneyAmount::new(tip).unwrap(),
        currency: Currency::Usd,
        payment_method: PaymentMethodId::new("pm_test_card").unwrap(),
    })
}

/// Catalog item, linked payout account and payment profile for the default
/// actors used across tests.
pub async fn seed_ready(world: &World) {
    world.store.seed_item("game_1", "creator_1", 1000);
    world.store.seed_payout("creator_1", Some("acct_creator_1"));
    world.store.seed_profile("cust_1", "cus_test_1");
}

pub fn cust(id: &str) -> CustomerId {
    CustomerId::new(id).unwrap()
}

pub fn pid(id: &str) -> PurchaseId {
    PurchaseId::new(id).unwrap()
}

pub fn creator(id: &str) -> CreatorId {
    CreatorId::new(id).unwrap()
}
