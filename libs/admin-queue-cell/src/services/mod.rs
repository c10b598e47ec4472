pub mod controller;
pub mod source;
pub mod tags;

pub use controller::*;
pub use source::*;
pub use tags::*;
