pub mod auth;
pub mod booking;
pub mod error;
pub mod queue;

pub use auth::*;
pub use booking::*;
pub use error::*;
pub use queue::*;
