pub mod engine;
pub mod error;
pub mod geo;

pub use engine::{DispatchEngine, RiderResponse, dispatch_channel};
pub use error::DispatchError;
