//! Keyed authentication of content digests: HMAC-SHA256 over the rendered
//! hex digest, compared in constant time.
//!
//! Signing is optional. An unsigned bundle is unauthenticated, not invalid;
//! integrity via the content hash holds either way. Key distribution is the
//! caller's concern.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::proof::digest::Hex64;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 signature of a content digest.
///
/// The MAC is taken over the digest's 64 ASCII hex bytes and rendered as
/// lowercase hex, so a signature is itself a [`Hex64`].
#[must_use]
pub fn sign_digest(digest: &Hex64, secret: &[u8]) -> Hex64 {
    Hex64::from_raw(&compute_tag(digest, secret))
}

/// Recompute the signature and compare in constant time.
///
/// Returns `false` on any mismatch. The comparison never branches on
/// secret-derived bytes before the full-length constant-time equality.
#[must_use]
pub fn verify_signature(digest: &Hex64, signature: &Hex64, secret: &[u8]) -> bool {
    let expected = match hex::decode(signature.as_str()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let computed = compute_tag(digest, secret);
    computed.ct_eq(&expected).into()
}

fn compute_tag(digest: &Hex64, secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .expect("HMAC can take key of any size");
    mac.update(digest.as_str().as_bytes());
    mac.finalize().into_bytes().to_vec()
}
