use std::sync::Arc;

use gather_core::hotels::HotelsDirectory;
use gather_core::reservation::ReservationManager;
use gather_core::tickets::TicketLifecycle;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationManager>,
    pub hotels: Arc<HotelsDirectory>,
    pub tickets: Arc<TicketLifecycle>,
    pub auth: AuthConfig,
}
