pub mod model;
pub mod service;
pub mod store;

pub use model::{Message, SenderRole};
pub use service::ChatService;
pub use store::MessageStore;
