use std::sync::Arc;

use domains::IdentityGate;
use services::Services;

use crate::metrics::Metrics;

/// Shared by every handler. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub gate: Arc<dyn IdentityGate>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(services: Services, gate: Arc<dyn IdentityGate>) -> Self {
        Self {
            services,
            gate,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
