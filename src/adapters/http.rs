use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            id::{CreatorId, CustomerId, GameId, PaymentMethodId, PurchaseId},
            money::{Currency, MoneyAmount},
            purchase::{NewPurchase, NewPurchaseParams},
        },
        infra::postgres::job_repo::{self, JobKind},
    },
    axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Redirect, Response},
    },
    serde::Deserialize,
};

#[derive(Deserialize)]
pub struct CreatePaymentBody {
    pub purchase_id: String,
    pub game_id: String,
    pub amount: i64,
    pub tip: i64,
    pub currency: String,
    pub payment_method: String,
}

/// Checkout integration point: persist the purchase record and enqueue the
/// charge job. The caller owns purchase_id generation — it is the
/// idempotency key for everything downstream.
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn create_payment(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreatePaymentBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let purchase = NewPurchase::new(NewPurchaseParams {
        customer_id: CustomerId::new(user_id)?,
        purchase_id: PurchaseId::new(body.purchase_id)?,
        game_id: GameId::new(body.game_id)?,
        amount: MoneyAmount::new(body.amount)?,
        tip: MoneyAmount::new(body.tip)?,
        currency: Currency::try_from(body.currency.as_str())?,
        payment_method: PaymentMethodId::new(body.payment_method)?,
    });

    let created = app.store.create_purchase(&purchase).await?;
    if !created {
        tracing::info!(purchase_id = %purchase.purchase_id(), "duplicate purchase, not re-enqueued");
        return Ok(Json(serde_json::json!({ "status": "duplicate" })));
    }

    job_repo::enqueue(
        &app.pool,
        JobKind::Charge,
        purchase.customer_id().as_str(),
        purchase.purchase_id().as_str(),
    )
    .await?;

    tracing::info!(purchase_id = %purchase.purchase_id(), "purchase accepted");
    Ok(Json(serde_json::json!({ "status": "accepted" })))
}

pub async fn get_payment(
    State(app): State<AppState>,
    Path((user_id, purchase_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let customer = CustomerId::new(user_id)?;
    let purchase_id = PurchaseId::new(purchase_id)?;

    match app.store.purchase(&customer, &purchase_id).await? {
        Some(purchase) => Ok(Json(purchase).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

#[derive(Deserialize)]
pub struct OAuthReturnParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Inbound redirect from the processor's authorization page. `state` carries
/// the creator's account id. Failures answer 200 with the raw message — no
/// money has moved on this path, and the creator needs to see what happened.
#[tracing::instrument(skip_all)]
pub async fn oauth_return(
    State(app): State<AppState>,
    Query(params): Query<OAuthReturnParams>,
) -> Response {
    let (Some(code), Some(creator)) = (params.code, params.state) else {
        return (StatusCode::OK, "Invalid Params").into_response();
    };
    let Ok(creator) = CreatorId::new(creator) else {
        return (StatusCode::OK, "Invalid Params").into_response();
    };

    match app.linker.link(&creator, &code).await {
        Ok(_) => Redirect::to(&app.landing_url).into_response(),
        Err(error) => (StatusCode::OK, error.to_string()).into_response(),
    }
}
