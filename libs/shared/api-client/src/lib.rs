pub mod queue_api;

pub use queue_api::QueueApiClient;
