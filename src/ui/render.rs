use crate::report::CompanyReport;

const RULE: &str =
    "================================================================================";

/// Plain-text rendering of a report for the console surface. Read-only over
/// the report; empty sections are skipped rather than padded.
pub fn render_report(report: &CompanyReport) -> String {
    let mut out = String::new();

    render_banner(report, &mut out);
    render_overview(report, &mut out);
    render_business_model(report, &mut out);
    render_growth_strategy(report, &mut out);
    render_financials(report, &mut out);
    render_sources(report, &mut out);

    out
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("\n--- {title} ---\n"));
}

fn bullet_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("{label}:\n"));
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
}

fn render_banner(report: &CompanyReport, out: &mut String) {
    let banner = &report.banner;
    out.push_str(&format!("{RULE}\n"));
    let mut title = banner.company_name.clone();
    if !banner.ticker.is_empty() {
        title.push_str(&format!(" ({}", banner.ticker));
        if !banner.exchange.is_empty() {
            title.push_str(&format!(" / {}", banner.exchange));
        }
        title.push(')');
    }
    out.push_str(&format!("{title}\n"));

    let facts: Vec<String> = [
        ("Industry", &banner.industry),
        ("Est.", &banner.established),
        ("HQ", &banner.hq),
        ("Employees", &banner.employees),
        ("Revenue", &banner.revenue),
        ("5Y CAGR", &banner.cagr5_year),
    ]
    .iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| format!("{k}: {v}"))
    .collect();
    if !facts.is_empty() {
        out.push_str(&format!("{}\n", facts.join(" | ")));
    }
    out.push_str(&format!("{RULE}\n"));
}

fn render_overview(report: &CompanyReport, out: &mut String) {
    let overview = &report.overview;
    if overview.summary.is_empty() && overview.geo_split.is_empty() {
        return;
    }
    heading(out, "Overview");
    if !overview.summary.is_empty() {
        out.push_str(&format!("{}\n", overview.summary));
    }

    let kf = &overview.key_financials;
    let mut figures: Vec<String> = [
        ("Revenue", &kf.revenue),
        ("PAT", &kf.pat),
        ("PAT margin", &kf.pat_margin),
    ]
    .iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| format!("{k} {v}"))
    .collect();
    if let Some(order_book) = &kf.order_book {
        figures.push(format!("Order book {order_book}"));
    }
    if !figures.is_empty() {
        out.push_str(&format!("Key financials: {}\n", figures.join(", ")));
    }

    if !overview.cx_footprint.is_empty() {
        out.push_str(&format!("Customer footprint: {}\n", overview.cx_footprint));
    }
    if !overview.geo_split.is_empty() {
        out.push_str("Geographic split:\n");
        for entry in &overview.geo_split {
            out.push_str(&format!("  {:<24} {:>5.1}%\n", entry.region, entry.percentage));
        }
    }
}

fn render_business_model(report: &CompanyReport, out: &mut String) {
    let model = &report.business_model;
    if model.segments.is_empty() && model.segment_table.is_empty() && model.customers.is_empty() {
        return;
    }
    heading(out, "Business model");
    bullet_list(out, "Segments", &model.segments);
    bullet_list(out, "Customers", &model.customers);
    bullet_list(out, "Revenue streams", &model.revenue_streams);
    bullet_list(out, "Value proposition", &model.value_proposition);
    bullet_list(out, "Channels", &model.channels);
    bullet_list(out, "Key activities", &model.key_activities);
    bullet_list(out, "M&A", &model.ma);

    if !model.segment_table.is_empty() {
        out.push_str("Segment breakdown:\n");
        for row in &model.segment_table {
            out.push_str(&format!(
                "  {:<28} {:>8}  {}\n",
                row.segment, row.revenue_share, row.products
            ));
        }
    }
}

fn render_growth_strategy(report: &CompanyReport, out: &mut String) {
    if report.growth_strategy.is_empty() {
        return;
    }
    heading(out, "Growth strategy");
    for cylinder in &report.growth_strategy {
        out.push_str(&format!("{}\n", cylinder.title));
        for point in &cylinder.points {
            out.push_str(&format!("  - {point}\n"));
        }
    }
}

fn render_financials(report: &CompanyReport, out: &mut String) {
    let financials = &report.financials;
    heading(out, "Financials");

    if !financials.history.is_empty() {
        out.push_str(&format!(
            "  {:<10} {:>12} {:>12} {:>14}\n",
            "Year", "Revenue", "Net income", "EBITDA margin"
        ));
        for point in &financials.history {
            out.push_str(&format!(
                "  {:<10} {:>12.2} {:>12.2} {:>13.1}%\n",
                point.year, point.revenue, point.net_income, point.ebitda_margin
            ));
        }
    }

    if !financials.segment_growth.is_empty() {
        out.push_str("Segment growth (current vs prior):\n");
        for entry in &financials.segment_growth {
            out.push_str(&format!(
                "  {:<28} {:>10.2} vs {:>10.2}  ({:+.1}%)\n",
                entry.segment, entry.current_revenue, entry.prev_revenue, entry.growth
            ));
        }
    }

    let analysis = &financials.analysis;
    for (label, text) in [
        ("Revenue growth factors", &analysis.revenue_growth_factors),
        ("5-year trend", &analysis.trend5_year),
        ("CAGR", &analysis.cagr_analysis),
        ("Segment YoY", &analysis.segment_yo_y_analysis),
        ("Net income / EBITDA", &analysis.net_income_ebitda_analysis),
    ] {
        if !text.is_empty() {
            out.push_str(&format!("{label}: {text}\n"));
        }
    }
    if let Some(geo) = &analysis.geo_bifurcation {
        out.push_str(&format!("Geographic bifurcation: {geo}\n"));
    }

    bullet_list(out, "Projections", &financials.projections);
    if let Some(ratings) = &financials.credit_ratings {
        out.push_str(&format!("Credit ratings: {ratings}\n"));
    }
}

fn render_sources(report: &CompanyReport, out: &mut String) {
    if report.sources.is_empty() {
        return;
    }
    heading(out, "Sources");
    for (i, source) in report.sources.iter().enumerate() {
        out.push_str(&format!("  [{}] {}\n", i + 1, source));
    }
}
