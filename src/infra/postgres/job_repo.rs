use {crate::domain::error::PipelineError, sqlx::Row, uuid::Uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Charge,
    Confirm,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Confirm => "confirm",
        }
    }
}

impl TryFrom<&str> for JobKind {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "charge" => Ok(Self::Charge),
            "confirm" => Ok(Self::Confirm),
            other => Err(PipelineError::Validation(format!(
                "unknown job kind: {other}"
            ))),
        }
    }
}

pub struct JobRow {
    pub id: Uuid,
    pub kind: String,
    pub customer_id: String,
    pub purchase_id: String,
    pub attempts: i32,
}

/// Enqueue a pipeline step for async processing.
/// Returns `true` if inserted, `false` if duplicate (already enqueued).
pub async fn enqueue(
    pool: &sqlx::PgPool,
    kind: JobKind,
    customer_id: &str,
    purchase_id: &str,
) -> Result<bool, PipelineError> {
    let result = sqlx::query(
        r#"
        INSERT INTO purchase_jobs (id, kind, customer_id, purchase_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (kind, customer_id, purchase_id) DO NOTHING
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(kind.as_str())
    .bind(customer_id)
    .bind(purchase_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Claim up to `limit` pending jobs for processing.
/// Uses SKIP LOCKED to avoid contention with other workers.
pub async fn claim(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    limit: i64,
) -> Result<Vec<JobRow>, PipelineError> {
    let rows = sqlx::query(
        r#"
        UPDATE purchase_jobs
        SET status = 'processing', updated_at = now()
        WHERE id IN (
            SELECT id FROM purchase_jobs
            WHERE status = 'pending' AND scheduled_at <= now()
            ORDER BY scheduled_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, kind, customer_id, purchase_id, attempts
        "#,
    )
    .bind(limit)
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(JobRow {
                id: row.try_get("id")?,
                kind: row.try_get("kind")?,
                customer_id: row.try_get("customer_id")?,
                purchase_id: row.try_get("purchase_id")?,
                attempts: row.try_get("attempts")?,
            })
        })
        .collect()
}

/// Mark a job as completed.
pub async fn complete(pool: &sqlx::PgPool, id: Uuid) -> Result<(), PipelineError> {
    sqlx::query("UPDATE purchase_jobs SET status = 'completed', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record a failure. Exponential backoff via scheduled_at.
/// If max attempts reached, mark as 'failed' permanently.
pub async fn fail(pool: &sqlx::PgPool, id: Uuid, error: &str) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        UPDATE purchase_jobs
        SET attempts = attempts + 1,
            last_error = $2,
            status = CASE
                WHEN attempts + 1 >= max_attempts THEN 'failed'
                ELSE 'pending'
            END,
            scheduled_at = CASE
                WHEN attempts + 1 >= max_attempts THEN scheduled_at
                ELSE now() + make_interval(secs => power(2, attempts + 1)::int)
            END,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

/// Reset jobs stuck in 'processing' for >2 minutes back to 'pending'.
/// Returns the number of reaped jobs.
pub async fn reap_stale(pool: &sqlx::PgPool) -> Result<u64, PipelineError> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_jobs
        SET status = 'pending', updated_at = now()
        WHERE status = 'processing' AND updated_at < now() - interval '2 minutes'
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
