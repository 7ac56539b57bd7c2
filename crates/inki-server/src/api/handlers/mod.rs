//! API request handlers

pub mod keys;

use std::sync::Arc;

use crate::config::TrustAnchorResolver;
use crate::keys::KeyRegistry;
use crate::submission::SubmissionPipeline;

pub use keys::{add_keys, authorized_keys, list_keys, not_found, user_key, user_keys};

/// Shared state for all handlers
pub struct AppState {
    pub registry: Arc<KeyRegistry>,
    pub pipeline: SubmissionPipeline,
}

impl AppState {
    pub fn new(resolver: Arc<dyn TrustAnchorResolver>, registry: Arc<KeyRegistry>) -> Self {
        let pipeline = SubmissionPipeline::new(resolver, Arc::clone(&registry));
        Self { registry, pipeline }
    }
}
