//! OpenID Connect provider plumbing.
//!
//! A [`ProviderRegistry`] maps provider names to [`RegisteredProvider`]
//! entries built from discovery metadata at registration time. Request-time
//! code never mutates the registry; it takes shared-lock reads and rebuilds
//! the protocol client from the stored metadata on the fly (the client type
//! carries type-state generics that make storing it impractical).

pub mod http;
pub mod provider;
pub mod registry;
pub mod state;

pub use http::OidcHttpClient;
pub use provider::{ProviderConfig, RegisteredProvider};
pub use registry::ProviderRegistry;
