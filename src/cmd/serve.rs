use tokio::net::TcpListener;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::server::run_server;

pub async fn run(ctx: AppContext, bind_override: Option<String>) -> AppResult<()> {
    let bind = bind_override.unwrap_or_else(|| ctx.config.bind_address.clone());
    let listener = TcpListener::bind(&bind).await?;
    run_server(listener, ctx).await
}
