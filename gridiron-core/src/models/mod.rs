pub mod claims;
pub mod session;

pub use claims::IdentityClaims;
pub use session::{PendingAuth, Session, SessionData, SessionId};
