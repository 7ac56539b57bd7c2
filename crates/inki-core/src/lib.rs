//! # Inki Core
//!
//! Shared types for the Inki SSH key distribution service.
//!
//! ## Key Concepts
//!
//! - **Key**: an SSH public key bound to a user account until an expiry time
//! - **Signing identity**: an OpenPGP secret key a client signs submissions with
//! - **Keyring**: the armored OpenPGP public keys trusted to sign for a user
//! - **Envelope**: one clearsigned payload; a request body carries one or more
//!
//! The server only accepts a key when the envelope carrying it was signed by
//! a key in that user's keyring, and only serves keys until they expire.

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod key;
pub mod verify;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crypto::{PublicIdentity, SignatureBlock, SigningIdentity};
pub use envelope::{decode, encode, Envelope, EnvelopeError};
pub use error::{InkiError, Result};
pub use key::{Key, KeyValidationError};
pub use verify::{verify, TrustAnchor, VerifyError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
