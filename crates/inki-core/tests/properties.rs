//! Property-Based Tests for key and envelope invariants
//!
//! 1. FINGERPRINT: depends only on key material, never on comment or expiry
//! 2. IDENTITY: identity equality is an equivalence over (user, key)
//! 3. CODEC: decode(encode(payloads)) preserves every payload, in order

use chrono::{DateTime, Duration, TimeZone, Utc};
use inki_core::testing::ALICE;
use inki_core::{decode, encode, Key, TrustAnchor};
use proptest::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

/// OpenSSH line for an Ed25519 key with public bytes `point`
fn ssh_key_line(point: [u8; 32], comment: &str) -> String {
    let public = ssh_key::PublicKey::new(
        ssh_key::public::Ed25519PublicKey(point).into(),
        comment,
    );
    public.to_openssh().expect("ed25519 key encodes")
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

// =============================================================================
// FINGERPRINT
// =============================================================================

proptest! {
    #[test]
    fn prop_fingerprint_ignores_comment_and_expiry(
        point in any::<[u8; 32]>(),
        comment_a in "[a-z]{0,12}",
        comment_b in "[a-z@.]{0,12}",
        secs_a in 0i64..4_000_000_000,
        secs_b in 0i64..4_000_000_000,
    ) {
        let a = Key::new("alice", ssh_key_line(point, &comment_a), timestamp(secs_a));
        let b = Key::new("bob", ssh_key_line(point, &comment_b), timestamp(secs_b));

        prop_assert_eq!(a.fingerprint().len(), 64);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn prop_distinct_keys_have_distinct_fingerprints(
        point_a in any::<[u8; 32]>(),
        point_b in any::<[u8; 32]>(),
    ) {
        prop_assume!(point_a != point_b);
        let now = Utc::now();
        let a = Key::new("alice", ssh_key_line(point_a, ""), now);
        let b = Key::new("alice", ssh_key_line(point_b, ""), now);

        prop_assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn prop_appended_lines_invalidate_key(
        point in any::<[u8; 32]>(),
        extra in "[!-~][ -~]{0,39}",
        crlf in any::<bool>(),
    ) {
        let newline = if crlf { "\r\n" } else { "\n" };
        let line = format!("{}{}{}", ssh_key_line(point, "c"), newline, extra);

        let key = Key::new("alice", line, Utc::now() + Duration::hours(1));
        prop_assert!(key.validate().is_err());
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

proptest! {
    #[test]
    fn prop_identity_is_reflexive_and_symmetric(
        user_a in "[a-z]{1,3}",
        user_b in "[a-z]{1,3}",
        key_a in "[a-z]{1,3}",
        key_b in "[a-z]{1,3}",
        offset in -1000i64..1000,
    ) {
        let now = Utc::now();
        let a = Key::new(user_a.clone(), key_a.clone(), now);
        let b = Key::new(user_b.clone(), key_b.clone(), now + Duration::seconds(offset));

        prop_assert!(a.identity_equals(&a));
        prop_assert_eq!(a.identity_equals(&b), b.identity_equals(&a));
        prop_assert_eq!(a.identity_equals(&b), user_a == user_b && key_a == key_b);
    }

    #[test]
    fn prop_expiry_never_affects_identity(
        secs_a in 0i64..4_000_000_000,
        secs_b in 0i64..4_000_000_000,
    ) {
        let a = Key::new("alice", "ssh-ed25519 AAAA", timestamp(secs_a));
        let b = Key::new("alice", "ssh-ed25519 AAAA", timestamp(secs_b));
        prop_assert!(a.identity_equals(&b));
    }

    #[test]
    fn prop_canonical_payload_roundtrips(
        secs in 0i64..4_000_000_000,
        nanos in 0u32..1_000_000_000,
        user in "[a-zA-Z0-9_.-]{1,16}",
        key in "[ -~]{0,64}",
    ) {
        let expires = Utc.timestamp_opt(secs, nanos).single().expect("valid timestamp");
        let original = Key::new(user, key, expires);

        let payload = original.canonical_payload();
        prop_assert!(!payload.contains('\n'));

        let parsed: Key = serde_json::from_str(&payload).expect("payload parses");
        prop_assert_eq!(&parsed, &original);
        prop_assert_eq!(parsed.canonical_payload(), payload);
    }
}

// =============================================================================
// CODEC
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_encode_decode_preserves_payloads(
        payloads in prop::collection::vec("[!-~]([ -~]{0,60}[!-~])?", 1..5),
    ) {
        let identity = ALICE.signing_identity();
        let decoded = decode(&encode(&payloads, &identity).expect("encodes")).expect("decodes");
        prop_assert_eq!(decoded.len(), payloads.len());

        let anchor = TrustAnchor::new(vec![ALICE.public_identity()]);
        for (envelope, payload) in decoded.iter().zip(&payloads) {
            prop_assert_eq!(&envelope.payload, payload.as_bytes());
            prop_assert!(anchor.verify(&envelope.payload, &envelope.signature).is_ok());
        }
    }

    #[test]
    fn prop_text_payloads_with_dashes_survive(
        lines in prop::collection::vec("-{0,6}[!-~]{1,20}", 1..6),
    ) {
        let identity = ALICE.signing_identity();
        let payload = lines.join("\n");

        let decoded = decode(&encode(&[&payload], &identity).expect("encodes")).expect("decodes");
        prop_assert_eq!(decoded.len(), 1);

        let text = String::from_utf8(decoded[0].payload.clone()).expect("utf-8 payload");
        prop_assert_eq!(text.lines().collect::<Vec<_>>(), lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn prop_non_armor_input_is_rejected(data in "[^-\\s][ -~]{0,64}") {
        prop_assert!(decode(data.as_bytes()).is_err());
    }
}
