pub mod guard;
pub mod session;

pub use guard::*;
pub use session::SessionManager;
