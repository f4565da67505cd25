//! Shared state handed to every handler.

use std::sync::Arc;

use crate::llm::LlmBackend;
use crate::store::JobStore;

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<JobStore>,
    pub llm: Arc<LlmBackend>,
}

impl ApiContext {
    pub fn new(store: JobStore, llm: LlmBackend) -> Self {
        Self {
            store: Arc::new(store),
            llm: Arc::new(llm),
        }
    }
}
