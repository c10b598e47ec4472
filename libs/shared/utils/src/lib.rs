pub mod confirm;
pub mod notice;
pub mod test_utils;
pub mod validation;

pub use confirm::*;
pub use notice::*;
pub use validation::*;
