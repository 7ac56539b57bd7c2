//! Inki Client
//!
//! Talks to an Inki key server on behalf of users and hosts:
//!
//! - **Users** sign their SSH public keys with a signing identity and submit
//!   them for an account, with an expiry.
//! - **Hosts** fetch the currently valid keys for an account in
//!   `authorized_keys` format, after running local pre-flight checks.
//!
//! ## Usage
//!
//! ```ignore
//! use inki_client::{KeyClient, Target};
//! use inki_core::SigningIdentity;
//!
//! let target: Target = "alice@keys.example.com:3000".parse()?;
//! let identity = SigningIdentity::from_armored(&std::fs::read_to_string("alice.key")?)?;
//!
//! let client = KeyClient::new(&target.server);
//! client
//!     .add_key(&target.user, &ssh_public_key, chrono::Utc::now() + chrono::Duration::hours(1), &identity)
//!     .await?;
//! ```

pub mod agent;
pub mod client;
pub mod error;

pub use agent::AgentConfig;
pub use client::{render_authorized_keys, signed_request, KeyClient, Target};
pub use error::{ClientError, Result};
