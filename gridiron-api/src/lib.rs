//! HTTP layer for the Gridiron dashboard backend: routing, session cookie
//! plumbing and the handlers driving the federated login flow in
//! `gridiron-core`.

pub mod http;
