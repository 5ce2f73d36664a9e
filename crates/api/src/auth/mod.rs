//! Login sessions and credential checks.

pub mod gate;
pub mod session;

pub use gate::authenticate;
pub use session::SessionManager;
