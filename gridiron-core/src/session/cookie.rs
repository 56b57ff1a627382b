use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::SessionId;

type HmacSha256 = Hmac<Sha256>;

/// Signs session ids for cookie transport.
///
/// The cookie value is `{id}.{hex(hmac_sha256(key, id))}`; a cookie whose
/// tag does not verify is treated as absent. The session payload itself
/// never leaves the server.
#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
}

impl CookieSigner {
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    #[must_use]
    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac();
        mac.update(id.as_str().as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{}.{}", id.as_str(), hex::encode(tag))
    }

    /// Recover the session id from a cookie value, or `None` when the
    /// value is malformed or its tag does not verify.
    #[must_use]
    pub fn verify(&self, cookie_value: &str) -> Option<SessionId> {
        let (id, tag_hex) = cookie_value.split_once('.')?;
        if id.is_empty() {
            return None;
        }
        let tag = hex::decode(tag_hex).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&tag).ok()?;

        Some(SessionId::from_string(id.to_string()))
    }
}
