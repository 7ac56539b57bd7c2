//! Signed request envelopes
//!
//! A submission body is a stream of OpenPGP cleartext signed messages, each
//! an independently signed payload, as produced by `gpg --clearsign`:
//!
//! ```text
//! -----BEGIN PGP SIGNED MESSAGE-----
//! Hash: SHA256
//!
//! {"expire":"2030-01-01T00:00:00Z","key":"ssh-ed25519 AAAA...","user":"alice"}
//! -----BEGIN PGP SIGNATURE-----
//!
//! iHUEARYIAB0WIQ...
//! -----END PGP SIGNATURE-----
//! ```
//!
//! The envelope payload is the signed text with dash escaping removed and
//! line endings normalized to CRLF.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use pgp::composed::cleartext::CleartextSignedMessage;

use crate::crypto::{SignatureBlock, SigningIdentity};
use crate::error::Result;

/// First line of every signed message
pub const SIGNED_MESSAGE_BEGIN: &str = "-----BEGIN PGP SIGNED MESSAGE-----";

const SIGNATURE_BEGIN: &str = "-----BEGIN PGP SIGNATURE-----";

/// Always preceded by a line break; dash-escaped payload lines never match
const SIGNATURE_END: &str = "\n-----END PGP SIGNATURE-----";

/// Errors from envelope decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("couldn't find any valid signed envelopes in the data")]
    NoValidEnvelopes,
}

/// One signed payload
#[derive(Debug, Clone)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub signature: SignatureBlock,
}

impl Envelope {
    /// Clearsign `payload` with `identity`
    pub fn sign(payload: &str, identity: &SigningIdentity) -> Result<Self> {
        let armored = identity
            .clearsign(payload)?
            .to_armored_string(Default::default())?;
        Self::from_armored(&armored)
    }

    /// Deserialize the payload
    pub fn decode_json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    fn from_armored(text: &str) -> Result<Self> {
        let (message, _headers) = CleartextSignedMessage::from_string(text)?;
        let armored = text
            .find(SIGNATURE_BEGIN)
            .map(|start| text[start..].trim_end())
            .unwrap_or_default();

        Ok(Self {
            payload: message.signed_text().into_bytes(),
            signature: SignatureBlock::new(message.signatures().to_vec(), armored),
        })
    }
}

/// Clearsign every payload with `identity` and concatenate the messages.
///
/// Each message gets a fresh signature covering only its own payload.
pub fn encode<P: AsRef<str>>(payloads: &[P], identity: &SigningIdentity) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for payload in payloads {
        let armored = identity
            .clearsign(payload.as_ref())?
            .to_armored_string(Default::default())?;
        out.extend_from_slice(armored.as_bytes());
        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }
    }
    Ok(out)
}

/// Decode every signed message at the front of `data`.
///
/// Decoding stops at the first position that does not hold a well-formed
/// message. Empty input yields no envelopes; non-empty input that yields
/// none is an error.
pub fn decode(data: &[u8]) -> std::result::Result<Vec<Envelope>, EnvelopeError> {
    let text = String::from_utf8_lossy(data);
    let mut rest: &str = &text;
    let mut envelopes = Vec::new();

    while let Some((message, remaining)) = next_message(rest) {
        match Envelope::from_armored(message) {
            Ok(envelope) => {
                envelopes.push(envelope);
                rest = remaining;
            }
            Err(err) => {
                debug!(decoded = envelopes.len(), error = %err, "Malformed signed message");
                break;
            }
        }
    }

    if envelopes.is_empty() && !data.is_empty() {
        return Err(EnvelopeError::NoValidEnvelopes);
    }

    if !rest.trim().is_empty() {
        debug!(
            decoded = envelopes.len(),
            trailing_bytes = rest.len(),
            "Ignoring trailing data after signed envelopes"
        );
    }

    Ok(envelopes)
}

/// Split the signed message at the front of `input` from whatever follows
fn next_message(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if !input.starts_with(SIGNED_MESSAGE_BEGIN) {
        return None;
    }

    let mut end = input.find(SIGNATURE_END)? + SIGNATURE_END.len();
    if input[end..].starts_with("\r\n") {
        end += 2;
    } else if input[end..].starts_with('\n') {
        end += 1;
    }

    Some(input.split_at(end))
}
