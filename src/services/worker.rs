use {
    crate::domain::error::PipelineError,
    crate::domain::id::{CustomerId, PurchaseId},
    crate::infra::postgres::job_repo::{self, JobKind},
    crate::services::purchase_pipeline::{ChargeOutcome, PaymentPipeline},
    sqlx::PgPool,
    std::sync::Arc,
    tokio::sync::watch,
};

/// Poll for pending purchase jobs and drive them through the pipeline.
/// Each job is an independent unit of work; a charge that comes back
/// `requires_confirmation` enqueues the follow-up confirm job here.
pub async fn run_worker(
    pool: PgPool,
    pipeline: Arc<PaymentPipeline>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("purchase job worker started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("purchase job worker shutting down");
                return;
            }
            _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
        }

        if let Err(e) = poll_once(&pool, &pipeline).await {
            tracing::error!(error = %e, "worker poll error");
        }
    }
}

async fn poll_once(pool: &PgPool, pipeline: &PaymentPipeline) -> Result<(), PipelineError> {
    let mut tx = pool.begin().await?;
    let jobs = job_repo::claim(&mut tx, 10).await?;
    tx.commit().await?;

    for job in jobs {
        let kind = match JobKind::try_from(job.kind.as_str()) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(kind = %job.kind, error = %e, "invalid job kind, completing as garbage");
                job_repo::complete(pool, job.id).await?;
                continue;
            }
        };

        let customer = match CustomerId::new(&job.customer_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(customer_id = %job.customer_id, error = %e, "invalid customer_id, completing as garbage");
                job_repo::complete(pool, job.id).await?;
                continue;
            }
        };

        let purchase = match PurchaseId::new(&job.purchase_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(purchase_id = %job.purchase_id, error = %e, "invalid purchase_id, completing as garbage");
                job_repo::complete(pool, job.id).await?;
                continue;
            }
        };

        let result = match kind {
            JobKind::Charge => run_charge(pool, pipeline, &customer, &purchase).await,
            JobKind::Confirm => run_confirm(pipeline, &customer, &purchase).await,
        };

        match result {
            Ok(()) => {
                job_repo::complete(pool, job.id).await?;
            }
            Err(PipelineError::Validation(msg)) => {
                tracing::warn!(job_id = %job.id, error = %msg, "validation error, completing (no retry)");
                job_repo::complete(pool, job.id).await?;
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "job failed, scheduling retry");
                job_repo::fail(pool, job.id, &e.to_string()).await?;
            }
        }
    }

    Ok(())
}

/// Processor failures complete the job: they are already recorded on the
/// purchase and must never trigger an automatic re-charge attempt. Only
/// infrastructure errors bubble up into the retry path.
async fn run_charge(
    pool: &PgPool,
    pipeline: &PaymentPipeline,
    customer: &CustomerId,
    purchase: &PurchaseId,
) -> Result<(), PipelineError> {
    match pipeline.process_charge(customer, purchase).await? {
        ChargeOutcome::Charged(status) if status.needs_confirmation() => {
            job_repo::enqueue(pool, JobKind::Confirm, customer.as_str(), purchase.as_str()).await?;
            tracing::info!(purchase = %purchase, "confirm job enqueued");
            Ok(())
        }
        outcome => {
            tracing::info!(purchase = %purchase, ?outcome, "charge job processed");
            Ok(())
        }
    }
}

async fn run_confirm(
    pipeline: &PaymentPipeline,
    customer: &CustomerId,
    purchase: &PurchaseId,
) -> Result<(), PipelineError> {
    let outcome = pipeline.process_confirmation(customer, purchase).await?;
    tracing::info!(purchase = %purchase, ?outcome, "confirm job processed");
    Ok(())
}

/// Periodically reset jobs stuck in 'processing' back to 'pending'.
pub async fn run_reaper(pool: PgPool, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("stale job reaper started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("stale job reaper shutting down");
                return;
            }
            _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => {}
        }

        match job_repo::reap_stale(&pool).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "reaped stale jobs"),
            Err(e) => tracing::error!(error = %e, "reaper error"),
        }
    }
}
