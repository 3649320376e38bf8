pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

use crate::{domain::store::RecordStore, services::account_link::AccountLinker};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub store: Arc<dyn RecordStore>,
    pub linker: Arc<AccountLinker>,
    /// Where the creator lands after a successful account link.
    pub landing_url: Arc<str>,
}
