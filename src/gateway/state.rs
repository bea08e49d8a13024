//! Shared application state handed to every handler, grounded on the
//! teacher's `AppState` (one `Arc`-wrapped struct threaded through
//! `Router::with_state`).

use std::sync::Arc;

use crate::auth::AuthService;
use crate::dispatch::DispatchEngine;
use crate::group::ChatGroupProvisioner;
use crate::message::ChatService;
use crate::order::OrderCoordinator;
use crate::product::ProductStore;
use crate::rider::RiderStore;
use crate::shop::ShopStore;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderCoordinator>,
    pub dispatch: Arc<DispatchEngine>,
    pub chat: Arc<ChatService>,
    pub groups: Arc<ChatGroupProvisioner>,
    pub auth: Arc<AuthService>,
    pub products: Arc<dyn ProductStore>,
    pub shops: Arc<dyn ShopStore>,
    pub riders: Arc<dyn RiderStore>,
}
