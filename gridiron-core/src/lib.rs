//! Core library for the Gridiron fantasy-football dashboard backend.
//!
//! The interesting part lives in [`oidc`] and [`service`]: a multi-provider
//! OpenID Connect login subsystem (provider registry, authorization-code
//! flow, ID-token verification) plus the session model it feeds. Everything
//! HTTP-shaped stays in `gridiron-api`; this crate only deals in protocol
//! state and session records.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod oidc;
pub mod service;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
