//! # Backend Module
//!
//! Contains all server-side logic for the loan tracker.
//!
//! This module brings together:
//! - **Domain**: the balance engine and the services built on it
//! - **Storage**: the data-source traits and the CSV/YAML file implementation
//! - **IO**: the REST interface exposed to clients
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (REST handlers, DTO mappers)
//!     ↓
//! Domain Layer (balance engine, services)
//!     ↓
//! Storage Layer (CSV/YAML data directory)
//! ```
//!
//! The data source is chosen once in [`initialize_backend`] and injected
//! into every service.

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::domain::{
    AllocationService, BalanceService, Clock, EntryService, GroupService, InstallmentService, PaymentService,
    PersonService, SystemClock,
};
use crate::backend::storage::CsvConnection;
use crate::config::AppConfig;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub person_service: PersonService<CsvConnection>,
    pub group_service: GroupService<CsvConnection>,
    pub entry_service: EntryService<CsvConnection>,
    pub payment_service: PaymentService<CsvConnection>,
    pub installment_service: InstallmentService<CsvConnection>,
    pub allocation_service: AllocationService<CsvConnection>,
}

impl AppState {
    /// Wire every service to one connection and one clock
    pub fn new(connection: Arc<CsvConnection>, clock: Arc<dyn Clock>) -> Self {
        let balance_service = BalanceService::new(connection.clone(), clock.clone());

        Self {
            person_service: PersonService::new(connection.clone(), clock.clone()),
            group_service: GroupService::new(connection.clone(), clock.clone()),
            entry_service: EntryService::new(connection.clone(), balance_service.clone(), clock.clone()),
            payment_service: PaymentService::new(connection.clone(), balance_service, clock.clone()),
            installment_service: InstallmentService::new(connection.clone(), clock),
            allocation_service: AllocationService::new(connection),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up data directory {}", config.data_dir.display());
    let connection = Arc::new(CsvConnection::new(&config.data_dir)?);

    info!("Setting up domain services");
    Ok(AppState::new(connection, Arc::new(SystemClock)))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::api_router())
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::backend::domain::entry_service::tests::{date, seed_parties};
    use crate::backend::domain::FixedClock;
    use crate::backend::storage::csv::test_utils::TestEnvironment;
    use axum::response::Response;
    use serde::de::DeserializeOwned;

    /// App state over a seeded temp directory, with the clock at 2024-02-15
    pub(crate) async fn test_app_state() -> (AppState, TestEnvironment) {
        let env = TestEnvironment::new().await.unwrap();
        seed_parties(&env.connection).await;

        let connection = Arc::new(env.connection.clone());
        let state = AppState::new(connection, Arc::new(FixedClock::on(date(2024, 2, 15))));
        (state, env)
    }

    pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
