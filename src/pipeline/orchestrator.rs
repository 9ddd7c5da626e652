use chrono::Utc;
use opentelemetry::trace::TraceContextExt;
use serde::Deserialize;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::{GenerateRequest, LlmClient};
use crate::report::{GeneratedReport, HistoryPoint};
use crate::telemetry::metrics::{REPORT_GENERATION_DURATION, REPORT_SOURCES};

use super::{extract, prompt};

#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub company: String,
}

/// End-to-end report fetch: credential pre-flight, one generation attempt
/// with web search enabled, finish-reason inspection, extraction. No retry
/// and no fallback; a failed call surfaces to the user, who decides whether
/// to resubmit.
#[tracing::instrument(
    name = "pipeline report",
    skip(config, llm_client),
    fields(
        report.id,
        report.company = %request.company,
        report.sources_count,
        report.duration_ms,
    )
)]
pub async fn fetch_report(
    config: &Config,
    llm_client: &LlmClient,
    request: &ReportRequest,
) -> Result<GeneratedReport, AppError> {
    let start = std::time::Instant::now();

    let span = tracing::Span::current();
    let context = span.context();
    let otel_span = context.span();
    let trace_id = otel_span.span_context().trace_id().to_string();

    // Must fail before any network call is issued.
    if config.gemini_api_key.is_none() {
        return Err(AppError::Configuration("GEMINI_API_KEY is not set".into()));
    }

    let req = GenerateRequest {
        model: config.llm_model.clone(),
        system: prompt::SYSTEM_INSTRUCTION.to_string(),
        prompt: prompt::build(&request.company),
        temperature: config.default_temperature as f32,
        max_tokens: config.default_max_tokens,
        web_search: true,
    };

    let resp = llm_client.generate(&req).await.map_err(|e| {
        tracing::error!(company = %request.company, error = %e, "Generation call failed");
        AppError::Upstream(e.to_string())
    })?;

    // A non-normal finish reason means the text is not a report; extraction
    // is never attempted on it.
    if !resp.finish_reason.eq_ignore_ascii_case("STOP") {
        tracing::warn!(
            company = %request.company,
            finish_reason = %resp.finish_reason,
            "Generation did not complete normally"
        );
        return Err(AppError::ContentBlocked(format!(
            "generation finished with reason {:?}",
            resp.finish_reason
        )));
    }

    let mut report = extract::extract(&resp.content, &resp.citations).inspect_err(|e| {
        tracing::error!(company = %request.company, error = %e, "Report extraction failed");
    })?;
    ensure_chronological(&mut report.financials.history);

    let duration = start.elapsed();
    let generated = GeneratedReport {
        id: Uuid::new_v4(),
        company: request.company.clone(),
        report,
        model: resp.model,
        provider: resp.provider,
        input_tokens: resp.input_tokens,
        output_tokens: resp.output_tokens,
        cost_usd: resp.cost_usd,
        generation_duration_ms: duration.as_millis() as u64,
        trace_id,
        generated_at: Utc::now(),
    };

    REPORT_GENERATION_DURATION.record(duration.as_secs_f64(), &[]);
    REPORT_SOURCES.record(generated.report.sources.len() as f64, &[]);

    span.record("report.id", generated.id.to_string());
    span.record("report.sources_count", generated.report.sources.len());
    span.record("report.duration_ms", generated.generation_duration_ms);

    Ok(generated)
}

/// The chart consumer expects oldest-first. The model is asked for that but
/// frequently answers newest-first; flip when the endpoints say so.
fn ensure_chronological(history: &mut [HistoryPoint]) {
    if history.len() < 2 {
        return;
    }
    let first = year_ordinal(&history[0].year);
    let last = year_ordinal(&history[history.len() - 1].year);
    if let (Some(first), Some(last)) = (first, last)
        && first > last
    {
        history.reverse();
    }
}

fn year_ordinal(year: &str) -> Option<i64> {
    let digits: String = year.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::{CitationChunk, GenerateResponse, Provider};

    struct MockProvider {
        calls: Arc<AtomicUsize>,
        content: String,
        finish_reason: String,
        citations: Vec<CitationChunk>,
        fail: bool,
    }

    impl MockProvider {
        fn success(content: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    content: content.to_string(),
                    finish_reason: "STOP".to_string(),
                    citations: vec![],
                    fail: false,
                },
                calls,
            )
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection reset by peer");
            }
            Ok(GenerateResponse {
                content: self.content.clone(),
                model: req.model.clone(),
                input_tokens: 100,
                output_tokens: 400,
                cost_usd: 0.0,
                finish_reason: self.finish_reason.clone(),
                provider: String::new(),
                citations: self.citations.clone(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn test_config(api_key: Option<&str>) -> Config {
        Config {
            port: 0,
            environment: "test".to_string(),
            llm_model: "gemini-2.5-flash".to_string(),
            gemini_api_key: api_key.map(str::to_string),
            otel_service_name: "test".to_string(),
            otel_exporter_endpoint: String::new(),
            default_temperature: 0.3,
            default_max_tokens: 8192,
        }
    }

    fn request() -> ReportRequest {
        ReportRequest {
            company: "Acme Corp".to_string(),
        }
    }

    const VALID_BODY: &str = r#"{"banner": {"companyName": "Acme Corp"}, "financials": {}}"#;

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_call() {
        let (provider, calls) = MockProvider::success(VALID_BODY);
        let client = LlmClient::new(Arc::new(provider));

        let err = fetch_report(&test_config(None), &client, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_fetch_builds_envelope() {
        let (provider, calls) = MockProvider::success(VALID_BODY);
        let client = LlmClient::new(Arc::new(provider));

        let generated = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(generated.company, "Acme Corp");
        assert_eq!(generated.report.banner.company_name, "Acme Corp");
        assert_eq!(generated.model, "gemini-2.5-flash");
        assert_eq!(generated.provider, "mock");
        assert_eq!(generated.input_tokens, 100);
        assert_eq!(generated.output_tokens, 400);
    }

    #[tokio::test]
    async fn test_fenced_response_with_citations() {
        let body = r#"{"banner": {}, "financials": {}, "sources": ["A"]}"#;
        let (mut provider, _) = MockProvider::success(&format!("```json\n{body}\n```"));
        provider.citations = vec![
            CitationChunk {
                title: Some("A".to_string()),
                uri: None,
            },
            CitationChunk {
                title: Some("B".to_string()),
                uri: None,
            },
        ];
        let client = LlmClient::new(Arc::new(provider));

        let generated = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap();

        assert_eq!(generated.report.sources, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_safety_block_is_content_blocked() {
        let (mut provider, _) = MockProvider::success(VALID_BODY);
        provider.finish_reason = "SAFETY".to_string();
        let client = LlmClient::new(Arc::new(provider));

        let err = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ContentBlocked(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream() {
        let (mut provider, _) = MockProvider::success(VALID_BODY);
        provider.fail = true;
        let client = LlmClient::new(Arc::new(provider));

        let err = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unusable_response_propagates_extractor_error() {
        let (provider, _) = MockProvider::success("I could not find that company.");
        let client = LlmClient::new(Arc::new(provider));

        let err = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_descending_history_is_reversed() {
        let body = r#"{"banner": {}, "financials": {"history": [
            {"year": "FY2024", "revenue": 3.0, "netIncome": 1.0, "ebitdaMargin": 20.0},
            {"year": "FY2023", "revenue": 2.0, "netIncome": 0.8, "ebitdaMargin": 19.0},
            {"year": "FY2022", "revenue": 1.0, "netIncome": 0.5, "ebitdaMargin": 18.0}
        ]}}"#;
        let (provider, _) = MockProvider::success(body);
        let client = LlmClient::new(Arc::new(provider));

        let generated = fetch_report(&test_config(Some("key")), &client, &request())
            .await
            .unwrap();

        let years: Vec<&str> = generated
            .report
            .financials
            .history
            .iter()
            .map(|p| p.year.as_str())
            .collect();
        assert_eq!(years, vec!["FY2022", "FY2023", "FY2024"]);
    }

    #[test]
    fn test_ensure_chronological_keeps_ascending() {
        let mut history = vec![
            HistoryPoint {
                year: "2021".to_string(),
                ..Default::default()
            },
            HistoryPoint {
                year: "2022".to_string(),
                ..Default::default()
            },
        ];
        ensure_chronological(&mut history);
        assert_eq!(history[0].year, "2021");
    }

    #[test]
    fn test_ensure_chronological_ignores_unparseable_years() {
        let mut history = vec![
            HistoryPoint {
                year: "latest".to_string(),
                ..Default::default()
            },
            HistoryPoint {
                year: "prior".to_string(),
                ..Default::default()
            },
        ];
        ensure_chronological(&mut history);
        assert_eq!(history[0].year, "latest");
    }
}
