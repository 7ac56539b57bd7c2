//! Inki Server
//!
//! Accepts SSH public keys submitted in signed envelopes and serves them
//! back to hosts until they expire. A key is only accepted when its
//! envelope was signed by an identity in the configured keyring of the user
//! it belongs to.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /api/v1/keys` - List all keys
//! - `POST /api/v1/keys` - Submit signed keys
//! - `GET /api/v1/user/{user}/keys` - List a user's keys
//! - `GET /api/v1/user/{user}/authorized_keys` - A user's valid keys as `authorized_keys` text
//! - `GET /api/v1/user/{user}/key/{fingerprint}` - Fetch one key by fingerprint

pub mod api;
pub mod config;
pub mod keys;
pub mod submission;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{ConfigResolver, ServerConfig, TrustAnchorResolver, UserConfig};
pub use keys::{spawn_expiry_sweeper, KeyPredicate, KeyRegistry};
pub use submission::{Stage, SubmissionError, SubmissionPipeline};
