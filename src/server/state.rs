use std::sync::Arc;
use std::time::Instant;

use crate::controller::Controller;
use crate::infrastructure::CircuitBreaker;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    /// Whether live sessions are kept (false in passive ticking mode)
    pub start_rtm: bool,
    pub api_key: Option<String>,
    /// Breaker guarding the storage backend, when it has one
    pub storage_breaker: Option<Arc<CircuitBreaker>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(controller: Arc<Controller>, start_rtm: bool) -> Self {
        Self {
            controller,
            start_rtm,
            api_key: None,
            storage_breaker: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_storage_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.storage_breaker = Some(breaker);
        self
    }
}
