use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed form of the JSON contract the prompt asks the model to honor.
/// `banner` and `financials` must be present for extraction to succeed;
/// everything else defaults so a partially-populated report still renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyReport {
    pub banner: Banner,
    #[serde(default)]
    pub overview: Overview,
    #[serde(default)]
    pub business_model: BusinessModel,
    #[serde(default)]
    pub growth_strategy: Vec<GrowthCylinder>,
    pub financials: Financials,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub established: String,
    #[serde(default)]
    pub hq: String,
    #[serde(default)]
    pub employees: String,
    #[serde(default)]
    pub revenue: String,
    #[serde(default)]
    pub cagr5_year: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_financials: KeyFinancials,
    #[serde(default)]
    pub cx_footprint: String,
    #[serde(default)]
    pub geo_split: Vec<GeoSplit>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFinancials {
    #[serde(default)]
    pub revenue: String,
    #[serde(default)]
    pub pat: String,
    #[serde(default)]
    pub pat_margin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_book: Option<String>,
}

/// Model-sourced estimate; entries are not renormalized to sum to 100.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSplit {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessModel {
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub customers: Vec<String>,
    #[serde(default)]
    pub revenue_streams: Vec<String>,
    #[serde(default)]
    pub value_proposition: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub key_activities: Vec<String>,
    #[serde(default)]
    pub ma: Vec<String>,
    #[serde(default)]
    pub segment_table: Vec<SegmentRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRow {
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub revenue_share: String,
    #[serde(default)]
    pub products: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthCylinder {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
    #[serde(default)]
    pub segment_growth: Vec<SegmentGrowth>,
    #[serde(default)]
    pub analysis: FinancialAnalysis,
    #[serde(default)]
    pub projections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_ratings: Option<String>,
}

/// One fiscal year; the chart consumer expects chronological ascending order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub net_income: f64,
    #[serde(default)]
    pub ebitda_margin: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGrowth {
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub current_revenue: f64,
    #[serde(default)]
    pub prev_revenue: f64,
    #[serde(default)]
    pub growth: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    #[serde(default)]
    pub revenue_growth_factors: String,
    #[serde(default)]
    pub trend5_year: String,
    #[serde(default)]
    pub cagr_analysis: String,
    #[serde(default)]
    pub segment_yo_y_analysis: String,
    #[serde(default)]
    pub net_income_ebitda_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_bifurcation: Option<String>,
}

/// Service-side envelope returned by the report endpoint: the report itself
/// plus generation metadata for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub id: Uuid,
    pub company: String,
    pub report: CompanyReport,
    pub model: String,
    pub provider: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub generation_duration_ms: u64,
    pub trace_id: String,
    pub generated_at: DateTime<Utc>,
}
