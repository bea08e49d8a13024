pub mod auth;
pub mod chat;
pub mod health;
pub mod order;
pub mod rider;
pub mod shop;
