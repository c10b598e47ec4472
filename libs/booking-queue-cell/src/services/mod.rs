pub mod display;
pub mod patient;
pub mod poller;

pub use display::*;
pub use patient::*;
pub use poller::*;
