//! Core identifier types shared across the order orchestration core.
//!
//! These are semantic aliases over `i64`/`Decimal`, matching the way the
//! underlying tables key their rows (bigserial primary keys).

use rust_decimal::Decimal;

/// User ID — primary key of the `users` table.
pub type UserId = i64;

/// Shop ID — primary key of the `shops` table.
pub type ShopId = i64;

/// Rider (courier) ID — primary key of the `riders` table.
pub type RiderId = i64;

/// Order ID — primary key of the `orders` table.
pub type OrderId = i64;

/// Product ID — primary key of the `products` table.
pub type ProductId = i64;

/// Chat group ID — primary key of the `groups` table.
pub type GroupId = i64;

/// Chat message ID — primary key of the `messages` table.
pub type MessageId = i64;

/// Monetary amount (order total, delivery fee, product price). Stored as
/// `NUMERIC` in Postgres and mapped via `rust_decimal` end to end so no
/// floating-point rounding ever touches money, matching the teacher's
/// `Money`/`Decimal`-based ledger types.
pub type Money = Decimal;
