//! Error types for the Inki core library

use thiserror::Error;

/// Result type alias using InkiError
pub type Result<T> = std::result::Result<T, InkiError>;

/// Errors raised while handling OpenPGP identities and signatures
#[derive(Error, Debug)]
pub enum InkiError {
    /// OpenPGP parsing, signing or self-signature failure
    #[error("OpenPGP error: {0}")]
    Pgp(#[from] pgp::errors::Error),

    /// A keyring contained no public keys
    #[error("Keyring does not contain any public keys")]
    EmptyKeyring,

    /// Armored text held a different number of keys than expected
    #[error("Expected exactly one key, found {0}")]
    KeyCount(usize),
}
