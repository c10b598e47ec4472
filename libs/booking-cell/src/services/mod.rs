pub mod lifecycle;
pub mod recovery;

pub use lifecycle::*;
pub use recovery::*;
