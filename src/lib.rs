//! Library entrypoint for the cTrader bridge.
//!
//! This file exists mainly to make controller tests easy (integration tests
//! under `tests/` can import the app state, routers, controllers, services).

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    broker_client::BrokerClient,
    ingestion_store::{IngestionStore, StoreLimits},
    token_manager::TokenManager,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<IngestionStore>,
    pub broker: BrokerClient,
}

impl AppState {
    /// Fresh state with an empty store sized from `settings`.
    pub fn new(settings: config::Settings) -> Self {
        let store = Arc::new(IngestionStore::new(StoreLimits::from(&settings)));
        let tokens = Arc::new(TokenManager::new(&settings));
        let broker = BrokerClient::new(&settings, tokens);

        Self {
            settings,
            store,
            broker,
        }
    }
}
