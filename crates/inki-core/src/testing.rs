//! Fixed OpenPGP identities for tests
//!
//! Unprotected Ed25519 signing keys exported from GnuPG, so every suite
//! exercises the same key format real users configure.

#![allow(clippy::expect_used)]

use crate::crypto::{PublicIdentity, SigningIdentity};

/// A test identity: armored public and secret key
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    /// Armored public key, usable directly as a keyring
    pub public: &'static str,
    /// Armored secret key
    pub secret: &'static str,
}

impl Fixture {
    pub fn signing_identity(&self) -> SigningIdentity {
        SigningIdentity::from_armored(self.secret).expect("fixture secret key parses")
    }

    pub fn public_identity(&self) -> PublicIdentity {
        PublicIdentity::from_armored(self.public).expect("fixture public key parses")
    }
}

pub const ALICE: Fixture = Fixture {
    public: include_str!("../testdata/alice.pub.asc"),
    secret: include_str!("../testdata/alice.sec.asc"),
};

/// A second key belonging to alice
pub const ALICE_DESKTOP: Fixture = Fixture {
    public: include_str!("../testdata/alice-desktop.pub.asc"),
    secret: include_str!("../testdata/alice-desktop.sec.asc"),
};

pub const BOB: Fixture = Fixture {
    public: include_str!("../testdata/bob.pub.asc"),
    secret: include_str!("../testdata/bob.sec.asc"),
};

/// Trusted by nobody
pub const MALLORY: Fixture = Fixture {
    public: include_str!("../testdata/mallory.pub.asc"),
    secret: include_str!("../testdata/mallory.sec.asc"),
};

/// SSH key carried by [`GPG_SIGNED_REQUEST`]
pub const GPG_SIGNED_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAILM+rvN+ot98qgEN796jTiQfZfG1KaT0PtFDJ/XFSqti foo@bar.com";

/// A request for [`GPG_SIGNED_KEY`] on alice's account, expiring
/// 2099-01-01, clearsigned by `gpg --clearsign` with [`ALICE`]'s key
pub const GPG_SIGNED_REQUEST: &str = include_str!("../testdata/alice-request.asc");
