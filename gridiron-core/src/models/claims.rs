use serde::{Deserialize, Serialize};

/// Verified identity extracted from a provider's ID token.
///
/// The subject is opaque and scoped to the issuing provider; email and
/// display name depend on the provider and the granted scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}
