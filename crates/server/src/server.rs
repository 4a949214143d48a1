use std::sync::Arc;

use axum::{Router, response::Html, routing::get};
use corpusmem_core::{Consolidator, Engine};
use corpusmem_shared::AppError;
use tokio::net::TcpListener;

use crate::{
  api,
  utils::{AppState, shutdown_signal},
};

#[axum::debug_handler]
async fn handler() -> Html<&'static str> {
  Html("<h1>Corpus Memory</h1>")
}

pub async fn server(engine: Arc<Engine>, consolidator: Arc<Consolidator>, bind_addr: &str) -> Result<(), AppError> {
  let app_state = AppState::new(engine, consolidator);

  let app = Router::new().route("/", get(handler)).merge(api::app()).with_state(app_state);

  let listener = TcpListener::bind(bind_addr).await?;

  tracing::info!(%bind_addr, "server started");

  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

  Ok(())
}
