use std::sync::Arc;

use corpusmem_core::{Consolidator, Engine};

#[derive(Clone)]
pub struct AppState {
  pub engine: Arc<Engine>,
  pub consolidator: Arc<Consolidator>,
}

impl AppState {
  #[must_use]
  pub const fn new(engine: Arc<Engine>, consolidator: Arc<Consolidator>) -> Self {
    Self { engine, consolidator }
  }
}
