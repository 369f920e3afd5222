//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use intervu_core::auth::AuthService;
use intervu_core::interviews::InterviewQueries;

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub interviews: InterviewQueries,
    pub config: Arc<Config>,
}
