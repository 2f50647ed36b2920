use std::sync::Arc;

use crate::auth::AuthGateway;
use crate::config::Config;
use crate::store::{ApplicationStore, JobPostingStore};
use crate::submission::ApplicationAssembler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub applications: Arc<dyn ApplicationStore>,
    pub jobs: Arc<dyn JobPostingStore>,
    pub assembler: Arc<ApplicationAssembler>,
    pub auth: Arc<AuthGateway>,
    pub config: Config,
}
