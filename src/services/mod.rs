pub mod bounded_log;
pub mod ingestion_store;
pub mod query;
pub mod stats;
pub mod account_view;

pub mod token_manager;
pub mod broker_client;
