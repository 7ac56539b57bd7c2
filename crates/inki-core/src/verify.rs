//! Signature verification against a trust anchor

use thiserror::Error;
use tracing::debug;

use crate::crypto::{PublicIdentity, SignatureBlock};

/// Verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Signature does not match any identity in the keyring")]
    Unauthorized,
}

/// Set of public identities allowed to sign for one user
#[derive(Debug, Clone, Default)]
pub struct TrustAnchor {
    identities: Vec<PublicIdentity>,
}

impl TrustAnchor {
    pub fn new(identities: Vec<PublicIdentity>) -> Self {
        Self { identities }
    }

    pub fn identities(&self) -> &[PublicIdentity] {
        &self.identities
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Find the identity whose key produced `signature` over `payload`.
    ///
    /// Every identity is tried; issuer ids in the signature are not trusted
    /// to pick one.
    pub fn verify(
        &self,
        payload: &[u8],
        signature: &SignatureBlock,
    ) -> Result<&PublicIdentity, VerifyError> {
        for (index, identity) in self.identities.iter().enumerate() {
            if identity.verify(payload, signature) {
                debug!(identity = index, "Signature verified");
                return Ok(identity);
            }
        }

        Err(VerifyError::Unauthorized)
    }
}

impl From<Vec<PublicIdentity>> for TrustAnchor {
    fn from(identities: Vec<PublicIdentity>) -> Self {
        Self::new(identities)
    }
}

/// Verify `payload` against every identity in `anchor`
pub fn verify<'a>(
    payload: &[u8],
    signature: &SignatureBlock,
    anchor: &'a TrustAnchor,
) -> Result<&'a PublicIdentity, VerifyError> {
    anchor.verify(payload, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::testing::{ALICE, ALICE_DESKTOP, MALLORY};

    fn signed_by(fixture: &crate::testing::Fixture) -> SignatureBlock {
        Envelope::sign("data", &fixture.signing_identity())
            .unwrap()
            .signature
    }

    #[test]
    fn test_verify_with_matching_identity() {
        let anchor = TrustAnchor::new(vec![ALICE.public_identity()]);
        let signer = verify(b"data", &signed_by(&ALICE), &anchor).unwrap();
        assert!(std::ptr::eq(signer, &anchor.identities()[0]));
    }

    #[test]
    fn test_verify_finds_second_identity() {
        let anchor: TrustAnchor = vec![ALICE.public_identity(), ALICE_DESKTOP.public_identity()].into();
        let signer = anchor.verify(b"data", &signed_by(&ALICE_DESKTOP)).unwrap();
        assert!(std::ptr::eq(signer, &anchor.identities()[1]));
    }

    #[test]
    fn test_verify_unknown_signer() {
        let anchor = TrustAnchor::new(vec![ALICE.public_identity()]);
        assert_eq!(
            anchor.verify(b"data", &signed_by(&MALLORY)).unwrap_err(),
            VerifyError::Unauthorized
        );
    }

    #[test]
    fn test_verify_with_empty_anchor() {
        let anchor = TrustAnchor::default();
        assert!(anchor.is_empty());
        assert_eq!(
            anchor.verify(b"data", &signed_by(&ALICE)).unwrap_err(),
            VerifyError::Unauthorized
        );
    }

    #[test]
    fn test_verify_modified_payload() {
        let anchor = TrustAnchor::new(vec![ALICE.public_identity()]);
        assert!(anchor.verify(b"datA", &signed_by(&ALICE)).is_err());
    }
}
