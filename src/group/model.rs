use serde::{Deserialize, Serialize};

use crate::core_types::{GroupId, OrderId, RiderId, ShopId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub rider_id: Option<RiderId>,
}
