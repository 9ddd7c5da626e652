use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{CitationChunk, GenerateRequest, GenerateResponse, Provider};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Harm categories configured on every request. The threshold is the most
/// permissive non-disabled level so financial text is not spuriously blocked.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "google_search")]
    google_search: serde_json::Value,
}

#[derive(Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| anyhow::anyhow!("invalid API key header: {e}"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = GeminiRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: req.prompt.clone(),
                }],
            }],
            system_instruction: (!req.system.is_empty()).then(|| SystemInstruction {
                parts: vec![Part {
                    text: req.system.clone(),
                }],
            }),
            tools: if req.web_search {
                vec![Tool {
                    google_search: serde_json::json!({}),
                }]
            } else {
                vec![]
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_ONLY_HIGH".to_string(),
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: req.temperature,
                max_output_tokens: req.max_tokens,
            },
        };

        let url = format!("{}/models/{}:generateContent", API_BASE, req.model);
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<GeminiError>(&error_body) {
                return Err(anyhow::anyhow!(
                    "Gemini API error ({}): {}",
                    status,
                    err.error.message
                ));
            }
            return Err(anyhow::anyhow!(
                "Gemini API error ({}): {}",
                status,
                error_body
            ));
        }

        let resp: GeminiResponse = response.json().await?;

        Ok(decode_response(resp, &req.model))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Flattens the candidate structure into the provider-neutral response.
/// A fully blocked prompt has no candidates; the block reason then stands
/// in for the finish reason so the caller can classify it.
pub(crate) fn decode_response(resp: GeminiResponse, requested_model: &str) -> GenerateResponse {
    let (input_tokens, output_tokens) = match &resp.usage_metadata {
        Some(usage) => (usage.prompt_token_count, usage.candidates_token_count),
        None => (0, 0),
    };

    let model = resp
        .model_version
        .unwrap_or_else(|| requested_model.to_string());

    let Some(candidate) = resp.candidates.into_iter().next() else {
        let finish_reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "NO_CANDIDATES".to_string());
        return GenerateResponse {
            content: String::new(),
            model,
            input_tokens,
            output_tokens,
            cost_usd: 0.0,
            finish_reason,
            provider: String::new(),
            citations: vec![],
        };
    };

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let citations = candidate
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .map(|web| CitationChunk {
                    title: web.title,
                    uri: web.uri,
                })
                .collect()
        })
        .unwrap_or_default();

    GenerateResponse {
        content,
        model,
        input_tokens,
        output_tokens,
        cost_usd: 0.0,
        finish_reason: candidate.finish_reason.unwrap_or_default(),
        provider: String::new(),
        citations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_normal_completion() {
        let resp = parse(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "{\"banner\""}, {"text": ": {}}"}], "role": "model"},
                    "finishReason": "STOP",
                    "groundingMetadata": {
                        "groundingChunks": [
                            {"web": {"uri": "https://example.com/a", "title": "Annual Report"}},
                            {"web": {"uri": "https://example.com/b"}}
                        ]
                    }
                }],
                "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 900},
                "modelVersion": "gemini-2.5-flash"
            }"#,
        );

        let out = decode_response(resp, "gemini-2.5-flash");
        assert_eq!(out.content, "{\"banner\": {}}");
        assert_eq!(out.finish_reason, "STOP");
        assert_eq!(out.input_tokens, 120);
        assert_eq!(out.output_tokens, 900);
        assert_eq!(out.model, "gemini-2.5-flash");
        assert_eq!(out.citations.len(), 2);
        assert_eq!(out.citations[0].title.as_deref(), Some("Annual Report"));
        assert_eq!(out.citations[1].title, None);
        assert_eq!(
            out.citations[1].uri.as_deref(),
            Some("https://example.com/b")
        );
    }

    #[test]
    fn test_decode_safety_stop() {
        let resp = parse(
            r#"{
                "candidates": [{"finishReason": "SAFETY"}],
                "usageMetadata": {"promptTokenCount": 80, "candidatesTokenCount": 0}
            }"#,
        );

        let out = decode_response(resp, "gemini-2.5-flash");
        assert_eq!(out.finish_reason, "SAFETY");
        assert_eq!(out.content, "");
        assert!(out.citations.is_empty());
    }

    #[test]
    fn test_decode_blocked_prompt_has_no_candidates() {
        let resp = parse(
            r#"{
                "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}
            }"#,
        );

        let out = decode_response(resp, "gemini-2.5-flash");
        assert_eq!(out.finish_reason, "PROHIBITED_CONTENT");
        assert_eq!(out.content, "");
        assert_eq!(out.input_tokens, 0);
    }

    #[test]
    fn test_decode_missing_usage_and_model() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "hi"}]}, "finishReason": "STOP"}]}"#,
        );

        let out = decode_response(resp, "gemini-2.5-flash");
        assert_eq!(out.model, "gemini-2.5-flash");
        assert_eq!(out.input_tokens, 0);
        assert_eq!(out.output_tokens, 0);
    }

    #[test]
    fn test_request_serialization_shape() {
        let body = GeminiRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: "prompt".to_string(),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "system".to_string(),
                }],
            }),
            tools: vec![Tool {
                google_search: serde_json::json!({}),
            }],
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_ONLY_HIGH".to_string(),
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 8192,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
        assert!(value["tools"][0]["google_search"].is_object());
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_ONLY_HIGH");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);
    }
}
