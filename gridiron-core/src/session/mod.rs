//! Session persistence and cookie signing.
//!
//! One [`SessionStore`] capability interface, two backends: an in-process
//! map for single-instance deployments and a redis-backed store for
//! anything that needs sessions to outlive a process or be shared across
//! replicas. Selected by configuration; the auth core is oblivious to the
//! choice.

pub mod cookie;
pub mod store;

pub use cookie::CookieSigner;
pub use store::{MemorySessionStore, RedisSessionStore, SessionStore};
