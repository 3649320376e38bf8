use {
    crate::domain::diag::{DiagnosticEvent, DiagnosticSink},
    async_trait::async_trait,
    sqlx::PgPool,
};

/// Append-only diagnostic log. One write attempt; a failed write is logged
/// and swallowed so the primary control flow never depends on it.
pub struct PgDiagnosticSink {
    pool: PgPool,
}

impl PgDiagnosticSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiagnosticSink for PgDiagnosticSink {
    async fn record(&self, event: &DiagnosticEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO diagnostic_log (id, resource_type, function, message, detail, context)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.resource_type)
        .bind(&event.function)
        .bind(&event.message)
        .bind(&event.detail)
        .bind(&event.context)
        .execute(&self.pool)
        .await;

        if let Err(error) = result {
            tracing::error!(error = %error, function = %event.function, "diagnostic sink write failed");
        }
    }
}
