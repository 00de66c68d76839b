use crate::auth::TokenAuth;
use crate::llm::ChatCompletion;
use crate::storage::HealthStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HealthStore>,
    pub assistant: Arc<dyn ChatCompletion>,
    pub auth: Arc<TokenAuth>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn HealthStore>,
        assistant: Arc<dyn ChatCompletion>,
        auth: TokenAuth,
    ) -> Self {
        Self {
            store,
            assistant,
            auth: Arc::new(auth),
        }
    }
}
