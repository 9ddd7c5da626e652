use std::collections::HashSet;

use crate::error::AppError;
use crate::llm::CitationChunk;
use crate::report::CompanyReport;

/// Turns the model's raw text plus grounding citations into a validated
/// report. Tolerant of formatting noise (fences, surrounding narration,
/// trailing commas), strict about structural completeness.
///
/// Repair is limited to an explicitly ordered list of punctuation-only
/// passes followed by a strict parse. There is no pass that inserts commas
/// between adjacent quoted strings: a quote boundary inside a multi-line
/// prose value is indistinguishable from a missing array separator, so the
/// prompt's comma rules carry that risk instead.
pub fn extract(raw: &str, citations: &[CitationChunk]) -> Result<CompanyReport, AppError> {
    let text = if raw.is_empty() { "{}" } else { raw };

    let defenced = strip_code_fences(text);
    let candidate = isolate_object(&defenced)?;
    let repaired = strip_trailing_commas(candidate);

    let mut value: serde_json::Value = serde_json::from_str(&repaired).map_err(|e| {
        AppError::MalformedResponse(format!(
            "model output is not valid JSON ({e}); offending text: {}",
            truncate_for_log(&repaired)
        ))
    })?;

    for section in ["banner", "financials"] {
        let present = value.get(section).is_some_and(|v| !v.is_null());
        if !present {
            return Err(AppError::IncompleteData(format!(
                "missing top-level section: {section}"
            )));
        }
    }

    let embedded: Vec<String> = value
        .get("sources")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|s| s.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let merged = merge_sources(embedded, citation_strings(citations));
    value["sources"] = serde_json::Value::from(merged);

    serde_json::from_value(value).map_err(|e| {
        AppError::IncompleteData(format!("report does not match the expected shape: {e}"))
    })
}

/// Pass 1: drop markdown fence tokens, language-tagged or bare.
pub(crate) fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

/// Pass 2: the substring from the first `{` to the last `}` is the
/// candidate object. Deliberately not depth-aware: leading and trailing
/// narration is tolerated at the cost of mis-extracting when the model
/// emits several top-level objects.
pub(crate) fn isolate_object(text: &str) -> Result<&str, AppError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(&text[start..=end]),
        _ => Err(AppError::MalformedResponse(format!(
            "no JSON object found in model output: {}",
            truncate_for_log(text)
        ))),
    }
}

/// Pass 3: remove any comma whose next non-whitespace character closes an
/// array or object. String contents are left untouched, so the pass is a
/// no-op on text without trailing commas.
pub(crate) fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in json.char_indices() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let rest = json[i + 1..].trim_start();
                if !(rest.starts_with(']') || rest.starts_with('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// A citation chunk contributes its title when present and non-empty,
/// otherwise its locator; chunks with neither are dropped.
pub(crate) fn citation_strings(chunks: &[CitationChunk]) -> Vec<String> {
    chunks
        .iter()
        .filter_map(|chunk| {
            chunk
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| chunk.uri.as_deref().filter(|u| !u.is_empty()))
                .map(str::to_string)
        })
        .collect()
}

/// Set union preserving first-seen order. De-duplication is exact-string
/// only; entries differing by case or whitespace stay distinct.
pub(crate) fn merge_sources(embedded: Vec<String>, cited: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    embedded
        .into_iter()
        .chain(cited)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn truncate_for_log(s: &str) -> String {
    const MAX: usize = 500;
    if s.len() <= MAX {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|&(i, _)| i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &s[..cut])
    }
}
