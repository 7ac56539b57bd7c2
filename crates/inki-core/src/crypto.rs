//! OpenPGP identities and signature blocks
//!
//! Key submissions are clearsigned with a user's OpenPGP key. Keys are
//! exchanged in ASCII armor so they can live in YAML configuration and in
//! users' home directories:
//!
//! - `SigningIdentity`: secret key used by clients to sign requests
//! - `PublicIdentity`: transferable public key, one or more of which form a
//!   user's keyring on the server
//! - `SignatureBlock`: the detached signatures carried by one envelope

use pgp::composed::{
    cleartext::CleartextSignedMessage, Deserializable, SignedPublicKey, SignedSecretKey, StandaloneSignature,
};
use rand::rngs::OsRng;

use crate::error::{InkiError, Result};

const PUBLIC_KEY_BEGIN: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";

/// OpenPGP secret key used to sign key submissions.
///
/// Only unprotected keys are supported; unlocking is left to the caller.
pub struct SigningIdentity {
    key: SignedSecretKey,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("key", &"[redacted]")
            .finish()
    }
}

impl SigningIdentity {
    /// Parse an armored `PGP PRIVATE KEY BLOCK`
    pub fn from_armored(text: &str) -> Result<Self> {
        let (key, _headers) = SignedSecretKey::from_string(text)?;
        key.verify()?;
        Ok(Self { key })
    }

    /// Produce a cleartext signed message over `text`
    pub fn clearsign(&self, text: &str) -> Result<CleartextSignedMessage> {
        let message = CleartextSignedMessage::sign(&mut OsRng, text, &self.key, String::new)?;
        Ok(message)
    }
}

/// OpenPGP public key trusted to sign for a user
#[derive(Debug, Clone)]
pub struct PublicIdentity {
    key: SignedPublicKey,
}

impl PublicIdentity {
    /// Parse armored text holding exactly one public key
    pub fn from_armored(text: &str) -> Result<Self> {
        let mut keys = Self::parse_keyring(text)?;
        match keys.len() {
            1 => Ok(keys.remove(0)),
            n => Err(InkiError::KeyCount(n)),
        }
    }

    /// Parse every public key in a keyring.
    ///
    /// A keyring is one or more `PGP PUBLIC KEY BLOCK`s, each holding one or
    /// more keys, as written by `gpg --armor --export`. Every key must carry
    /// valid self-signatures. A keyring without keys is an error.
    pub fn parse_keyring(text: &str) -> Result<Vec<Self>> {
        let starts: Vec<usize> = text
            .match_indices(PUBLIC_KEY_BEGIN)
            .map(|(index, _)| index)
            .collect();

        let mut identities = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let (keys, _headers) = SignedPublicKey::from_string_many(&text[start..end])?;
            for key in keys {
                let key = key?;
                key.verify()?;
                identities.push(Self { key });
            }
        }

        if identities.is_empty() {
            return Err(InkiError::EmptyKeyring);
        }

        Ok(identities)
    }

    /// Whether any signature in `block` covers `payload` and was made by
    /// this key or one of its subkeys
    pub fn verify(&self, payload: &[u8], block: &SignatureBlock) -> bool {
        block.signatures.iter().any(|signature| {
            signature.verify(&self.key, payload).is_ok()
                || self
                    .key
                    .public_subkeys
                    .iter()
                    .any(|subkey| signature.verify(&subkey.key, payload).is_ok())
        })
    }
}

/// Detached signatures over one envelope payload, with their armored text
#[derive(Debug, Clone)]
pub struct SignatureBlock {
    signatures: Vec<StandaloneSignature>,
    armored: String,
}

impl SignatureBlock {
    pub fn new(signatures: Vec<StandaloneSignature>, armored: impl Into<String>) -> Self {
        Self {
            signatures,
            armored: armored.into(),
        }
    }

    /// The `PGP SIGNATURE` block as it appeared on the wire
    pub fn armored(&self) -> &str {
        &self.armored
    }
}
