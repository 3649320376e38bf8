pub mod account_link;
pub mod purchase_pipeline;
pub mod worker;
