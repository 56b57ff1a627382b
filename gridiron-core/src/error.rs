use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider initialization failed for '{provider}': {reason}")]
    ProviderInit { provider: String, reason: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The callback's anti-forgery state was missing, already consumed, or
    /// did not match the value stored for the session.
    #[error("Invalid or missing authorization state")]
    InvalidState,

    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error("Token response contained no identity token")]
    MissingIdentityToken,

    #[error("Identity token verification failed: {0}")]
    TokenVerification(String),

    #[error("Malformed identity claims: {0}")]
    MalformedClaims(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
