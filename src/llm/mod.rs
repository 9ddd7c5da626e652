pub mod client;
pub mod gemini;
pub mod pricing;

pub use client::LlmClient;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub web_search: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub finish_reason: String,
    pub provider: String,
    pub citations: Vec<CitationChunk>,
}

/// Grounding metadata returned alongside the generated text. Either field
/// may be absent; a chunk with neither is useless and gets dropped during
/// extraction.
#[derive(Debug, Clone, Default)]
pub struct CitationChunk {
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
    fn name(&self) -> &str;
}
