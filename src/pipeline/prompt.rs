/// The literal schema embedded in every prompt. Kept in lock-step with the
/// types in `crate::report`; the tests below pin the coupling.
const REPORT_SCHEMA: &str = r#"{
  "banner": {
    "companyName": "string",
    "ticker": "string",
    "exchange": "string",
    "industry": "string",
    "established": "string",
    "hq": "string",
    "employees": "string",
    "revenue": "string (e.g. $12.5B +5% YoY)",
    "cagr5Year": "string"
  },
  "overview": {
    "summary": "string",
    "keyFinancials": {
      "revenue": "string",
      "pat": "string",
      "patMargin": "string",
      "orderBook": "string (optional)"
    },
    "cxFootprint": "string",
    "geoSplit": [{ "region": "string", "percentage": number }]
  },
  "businessModel": {
    "segments": ["string"],
    "customers": ["string"],
    "revenueStreams": ["string"],
    "valueProposition": ["string"],
    "channels": ["string"],
    "keyActivities": ["string"],
    "ma": ["string"],
    "segmentTable": [{ "segment": "string", "revenueShare": "string", "products": "string" }]
  },
  "growthStrategy": [{ "title": "string", "points": ["string"] }],
  "financials": {
    "history": [{ "year": "string", "revenue": number, "netIncome": number, "ebitdaMargin": number }],
    "segmentGrowth": [{ "segment": "string", "currentRevenue": number, "prevRevenue": number, "growth": number }],
    "analysis": {
      "revenueGrowthFactors": "string",
      "trend5Year": "string",
      "cagrAnalysis": "string",
      "segmentYoYAnalysis": "string",
      "netIncomeEbitdaAnalysis": "string",
      "geoBifurcation": "string (optional)"
    },
    "projections": ["string"],
    "creditRatings": "string (optional)"
  },
  "sources": ["string"]
}"#;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a senior market research analyst producing equity research reports.";

/// Pure function of the company name; no validation beyond what the caller
/// already did (the name is interpolated verbatim).
pub fn build(company: &str) -> String {
    format!(
        "Analyze the company: \"{company}\".\n\n\
        You MUST use Google Search to find the latest available data \
        (current year / latest quarter).\n\n\
        STRICT INSTRUCTIONS:\n\
        1. Output ONLY valid, raw JSON.\n\
        2. Do NOT use markdown code blocks (no ```json).\n\
        3. Do NOT include citation markers (like [1], [2]) inside the JSON strings.\n\
        4. Ensure all arrays and objects are correctly comma-separated.\n\
        5. Double-check that there is a comma after every string in a list, \
        especially in the \"growthStrategy\" and \"projections\" arrays.\n\n\
        The JSON must match this structure exactly:\n{REPORT_SCHEMA}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build("Siemens AG"), build("Siemens AG"));
    }

    #[test]
    fn test_build_embeds_company_name() {
        let prompt = build("Larsen & Toubro");
        assert!(prompt.contains("Analyze the company: \"Larsen & Toubro\"."));
    }

    #[test]
    fn test_build_embeds_formatting_rules() {
        let prompt = build("Acme");
        assert!(prompt.contains("ONLY valid, raw JSON"));
        assert!(prompt.contains("Do NOT use markdown code blocks"));
        assert!(prompt.contains("citation markers"));
        assert!(prompt.contains("comma-separated"));
        assert!(prompt.contains("Google Search"));
    }

    #[test]
    fn test_build_embeds_full_schema() {
        let prompt = build("Acme");
        for key in [
            "\"banner\"",
            "\"overview\"",
            "\"businessModel\"",
            "\"growthStrategy\"",
            "\"financials\"",
            "\"sources\"",
        ] {
            assert!(prompt.contains(key), "schema is missing {key}");
        }
    }

    #[test]
    fn test_schema_matches_report_type() {
        // Every wire key the typed report serializes must be promised by the
        // embedded schema, so a schema drift breaks here first.
        let report: crate::report::CompanyReport = serde_json::from_str(
            r#"{
                "banner": {},
                "overview": {"geoSplit": [{"region": "NA", "percentage": 40}]},
                "businessModel": {"segmentTable": [{}]},
                "growthStrategy": [{"title": "t", "points": ["p"]}],
                "financials": {
                    "history": [{}],
                    "segmentGrowth": [{}],
                    "analysis": {}
                }
            }"#,
        )
        .unwrap();
        let value = serde_json::to_value(&report).unwrap();

        fn collect_keys(value: &serde_json::Value, keys: &mut Vec<String>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        keys.push(k.clone());
                        collect_keys(v, keys);
                    }
                }
                serde_json::Value::Array(items) => {
                    for item in items {
                        collect_keys(item, keys);
                    }
                }
                _ => {}
            }
        }

        let mut keys = Vec::new();
        collect_keys(&value, &mut keys);
        for key in keys {
            assert!(
                REPORT_SCHEMA.contains(&format!("\"{key}\"")),
                "schema is missing wire key {key}"
            );
        }
    }
}
