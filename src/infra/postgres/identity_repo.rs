use {
    crate::domain::error::PipelineError,
    crate::domain::id::CreatorId,
    crate::domain::identity::IdentityProvider,
    async_trait::async_trait,
    sqlx::PgPool,
};

/// Identity collaborator backed by the platform's user table. Claims are
/// merged (jsonb concatenation), never replaced wholesale.
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn email_verified(&self, user: &CreatorId) -> Result<bool, PipelineError> {
        let verified: Option<bool> =
            sqlx::query_scalar("SELECT email_verified FROM users WHERE user_id = $1")
                .bind(user.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(verified.unwrap_or(false))
    }

    async fn set_claims(
        &self,
        user: &CreatorId,
        claims: &serde_json::Value,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, claims)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET claims = users.claims || EXCLUDED.claims, updated_at = now()
            "#,
        )
        .bind(user.as_str())
        .bind(claims)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
