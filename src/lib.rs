pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod routes;
pub mod telemetry;
pub mod ui;

pub use config::Config;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_client: Arc<llm::LlmClient>,
}
