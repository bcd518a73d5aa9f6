//! Real-time client state synchronization for survey data
//!
//! This crate keeps a client's view of sources, photometry, spectra and
//! derived plots in sync with a server through a push channel and a
//! request/response API, funnelling every change through a single
//! action/reducer store.

pub mod action;
pub mod api;
pub mod cache;
pub mod config;
pub mod connection;
pub mod errors;
pub mod model;
pub mod route;
pub mod session;
pub mod sharing;
pub mod state_machine;
pub mod store;
pub mod thunks;
pub mod transport;

// Re-export commonly used types
pub use action::{Action, ActionEnvelope};
pub use api::{ApiClient, ApiResponse};
pub use cache::{BoundedCache, Fingerprint};
pub use config::SyncConfig;
pub use connection::{ConnectionHandle, ConnectionManager, Frame};
pub use errors::{SyncError, SyncResult};
pub use route::{check_source_route, Coherency, RouteGuard};
pub use session::{Navigation, Session};
pub use sharing::{ShareRequest, SharingCoordinator};
pub use state_machine::ConnectionState;
pub use store::{AppState, Store};
pub use thunks::{FetchOutcome, Thunks};
