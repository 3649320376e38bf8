use {
    crate::domain::account::{CustomerPaymentProfile, PayoutAccount},
    crate::domain::catalog::CatalogItem,
    crate::domain::error::PipelineError,
    crate::domain::id::{
        CreatorId, CustomerId, GameId, IntentId, PaymentMethodId, PayoutAccountId,
        ProcessorCustomerId, PurchaseId,
    },
    crate::domain::money::{Currency, MoneyAmount},
    crate::domain::processor::{IntentSnapshot, IntentStatus},
    crate::domain::purchase::{
        NewPurchase, PaymentSubState, Purchase, PurchaseParts, PurchaseState,
    },
    crate::domain::store::RecordStore,
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{PgPool, Row, postgres::PgRow},
};

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn purchase_from_row(row: &PgRow) -> Result<Purchase, PipelineError> {
    let intent_id: Option<String> = row.try_get("intent_id")?;
    let intent_status: Option<String> = row.try_get("intent_status")?;
    let intent_raw: Option<serde_json::Value> = row.try_get("intent_raw")?;

    let payment = match (intent_id, intent_status) {
        (Some(id), Some(status)) => Some(PaymentSubState {
            intent_id: IntentId::new(id)?,
            status: IntentStatus::try_from(status.as_str())?,
            raw: intent_raw.unwrap_or(serde_json::Value::Null),
        }),
        _ => None,
    };

    let state: String = row.try_get("state")?;
    let currency: String = row.try_get("currency")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Purchase::from_parts(PurchaseParts {
        customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?)?,
        purchase_id: PurchaseId::new(row.try_get::<String, _>("purchase_id")?)?,
        game_id: GameId::new(row.try_get::<String, _>("game_id")?)?,
        amount: MoneyAmount::new(row.try_get::<i64, _>("amount")?)?,
        tip: MoneyAmount::new(row.try_get::<i64, _>("tip")?)?,
        currency: Currency::try_from(currency.as_str())?,
        payment_method: PaymentMethodId::new(row.try_get::<String, _>("payment_method")?)?,
        state: PurchaseState::try_from(state.as_str())?,
        payment,
        error: row.try_get("error")?,
        created_at,
        updated_at,
    }))
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn catalog_item(&self, game: &GameId) -> Result<Option<CatalogItem>, PipelineError> {
        let row = sqlx::query(
            "SELECT game_id, creator_id, price, config FROM catalog_items WHERE game_id = $1",
        )
        .bind(game.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CatalogItem {
                game_id: GameId::new(row.try_get::<String, _>("game_id")?)?,
                creator_id: CreatorId::new(row.try_get::<String, _>("creator_id")?)?,
                price: MoneyAmount::new(row.try_get::<i64, _>("price")?)?,
                config: row.try_get("config")?,
            })
        })
        .transpose()
    }

    async fn payout_account(
        &self,
        creator: &CreatorId,
    ) -> Result<Option<PayoutAccount>, PipelineError> {
        let row = sqlx::query(
            "SELECT creator_id, stripe_account_id FROM payout_accounts WHERE creator_id = $1",
        )
        .bind(creator.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let stripe_account_id = row
                .try_get::<Option<String>, _>("stripe_account_id")?
                .map(PayoutAccountId::new)
                .transpose()?;
            Ok(PayoutAccount {
                creator_id: CreatorId::new(row.try_get::<String, _>("creator_id")?)?,
                stripe_account_id,
            })
        })
        .transpose()
    }

    async fn link_payout_account(
        &self,
        creator: &CreatorId,
        account: &PayoutAccountId,
    ) -> Result<bool, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Option<String>> = sqlx::query_scalar(
            "SELECT stripe_account_id FROM payout_accounts WHERE creator_id = $1 FOR UPDATE",
        )
        .bind(creator.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(Some(_)) = existing {
            tx.commit().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO payout_accounts (creator_id, stripe_account_id)
            VALUES ($1, $2)
            ON CONFLICT (creator_id)
                DO UPDATE SET stripe_account_id = EXCLUDED.stripe_account_id, updated_at = now()
            "#,
        )
        .bind(creator.as_str())
        .bind(account.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn payment_profile(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPaymentProfile>, PipelineError> {
        let row = sqlx::query(
            "SELECT customer_id, processor_customer_id FROM payment_profiles WHERE customer_id = $1",
        )
        .bind(customer.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CustomerPaymentProfile {
                customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?)?,
                processor_customer_id: ProcessorCustomerId::new(
                    row.try_get::<String, _>("processor_customer_id")?,
                )?,
            })
        })
        .transpose()
    }

    async fn purchase(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
    ) -> Result<Option<Purchase>, PipelineError> {
        let row = sqlx::query(
            r#"
            SELECT customer_id, purchase_id, game_id, amount, tip, currency, payment_method,
                   state, intent_id, intent_status, intent_raw, error, created_at, updated_at
            FROM purchases
            WHERE customer_id = $1 AND purchase_id = $2
            "#,
        )
        .bind(customer.as_str())
        .bind(purchase.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| purchase_from_row(&row)).transpose()
    }

    async fn create_purchase(&self, purchase: &NewPurchase) -> Result<bool, PipelineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases
                (customer_id, purchase_id, game_id, amount, tip, currency, payment_method, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (customer_id, purchase_id) DO NOTHING
            "#,
        )
        .bind(purchase.customer_id().as_str())
        .bind(purchase.purchase_id().as_str())
        .bind(purchase.game_id().as_str())
        .bind(purchase.amount().cents())
        .bind(purchase.tip().cents())
        .bind(purchase.currency().as_str())
        .bind(purchase.payment_method().as_str())
        .bind(PurchaseState::Validating.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_state(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            "UPDATE purchases SET state = $3, updated_at = now() WHERE customer_id = $1 AND purchase_id = $2",
        )
        .bind(customer.as_str())
        .bind(purchase.as_str())
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn merge_payment(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        snapshot: &IntentSnapshot,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        // Field-level merge: amount, tip and error are never listed here.
        sqlx::query(
            r#"
            UPDATE purchases
            SET intent_id = $3, intent_status = $4, intent_raw = $5, state = $6, updated_at = now()
            WHERE customer_id = $1 AND purchase_id = $2
            "#,
        )
        .bind(customer.as_str())
        .bind(purchase.as_str())
        .bind(snapshot.intent_id.as_str())
        .bind(snapshot.status.as_str())
        .bind(&snapshot.raw)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn merge_error(
        &self,
        customer: &CustomerId,
        purchase: &PurchaseId,
        message: &str,
        state: PurchaseState,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE purchases
            SET error = $3, state = $4, updated_at = now()
            WHERE customer_id = $1 AND purchase_id = $2
            "#,
        )
        .bind(customer.as_str())
        .bind(purchase.as_str())
        .bind(message)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
