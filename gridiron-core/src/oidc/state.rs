//! Anti-forgery state and nonce generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use subtle::ConstantTimeEq;

/// Entropy per token, before encoding. 32 bytes = 256 bits.
const TOKEN_ENTROPY_BYTES: usize = 32;

/// Fresh anti-forgery state for one authorization attempt.
#[must_use]
pub fn generate_state() -> String {
    random_token()
}

/// Fresh nonce to bind the ID token to this attempt.
#[must_use]
pub fn generate_nonce() -> String {
    random_token()
}

fn random_token() -> String {
    let mut buf = [0u8; TOKEN_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Constant-time comparison of the stored state against the callback's
/// `state` parameter, so the check does not leak how much of a guessed
/// value matched.
#[must_use]
pub fn states_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}
