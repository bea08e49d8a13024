use serde::{Deserialize, Serialize};

use crate::core_types::{Money, ProductId, ShopId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    pub price: Money,
    pub stock: i32,
    /// Whether this product's stock is shadowed in the cache as a
    /// flash-sale counter (spec.md §4.4); if false, reservation goes
    /// straight through the store's conditional update.
    pub is_flash_sale: bool,
}
