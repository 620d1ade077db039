use async_trait::async_trait;

use crate::domain::ticket::{Ticket, TicketRequest};
use crate::error::AppResult;

/// Client-side view of the analysis server.
#[async_trait]
pub trait TicketService: Send + Sync {
    async fn analyze(&self, request: &TicketRequest) -> AppResult<Ticket>;
    async fn check_models(&self) -> AppResult<Vec<String>>;
}
