pub mod model;
pub mod store;

pub use model::{Rider, RiderStatus};
pub use store::RiderStore;
