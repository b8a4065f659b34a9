//! Reporting utilities: per-competitor summaries and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;

use crate::app::pipeline::{UploadKind, UploadOutput};
use crate::domain::{DashboardConfig, PricePoint};

/// Per-competitor roll-up over a point set.
#[derive(Debug, Clone)]
pub struct CompetitorSummary {
    pub competitor: String,
    pub n: usize,
    pub min_price: f64,
    pub mean_price: f64,
    pub latest: NaiveDate,
}

/// Aggregate points per competitor, in competitor order.
///
/// The input is already sorted by (Competitor, Date), so one linear pass
/// suffices.
pub fn summarize_competitors(points: &[PricePoint]) -> Vec<CompetitorSummary> {
    let mut out: Vec<CompetitorSummary> = Vec::new();
    for p in points {
        match out.last_mut() {
            Some(s) if s.competitor == p.competitor => {
                s.n += 1;
                s.min_price = s.min_price.min(p.price);
                // Carry the running sum in mean_price until the final pass.
                s.mean_price += p.price;
                s.latest = s.latest.max(p.date);
            }
            _ => out.push(CompetitorSummary {
                competitor: p.competitor.clone(),
                n: 1,
                min_price: p.price,
                mean_price: p.price,
                latest: p.date,
            }),
        }
    }
    for s in &mut out {
        s.mean_price /= s.n as f64;
    }
    out
}

/// Format the upload summary (source + row accounting + filter state).
pub fn format_upload_summary(output: &UploadOutput, config: &DashboardConfig) -> String {
    let mut out = String::new();

    out.push_str("=== rbench - Competitor Pricing Bench ===\n");
    out.push_str(&format!("Source: {}\n", output.filename));
    out.push_str(&format!(
        "Mode: {}\n",
        match output.kind {
            UploadKind::Passthrough => "passthrough (delimited text)",
            UploadKind::Normalized => "normalized (bench sheet)",
        }
    ));
    out.push_str(&format!(
        "Rows: read={} used={} | points={}\n",
        output.rows_read,
        output.rows_used,
        output.points.len()
    ));
    if !output.row_errors.is_empty() {
        out.push_str(&format!("Row problems: {}\n", output.row_errors.len()));
        for e in output.row_errors.iter().take(5) {
            out.push_str(&format!("  row {}: {}\n", e.row, e.message));
        }
        if output.row_errors.len() > 5 {
            out.push_str(&format!("  ... and {} more\n", output.row_errors.len() - 5));
        }
    }
    if config.apply_filter {
        let days: Vec<String> = config.selection.days.iter().map(|d| d.to_string()).collect();
        let acriss: Vec<String> = config.selection.acriss.iter().cloned().collect();
        out.push_str(&format!(
            "Filter: days∈{{{}}} acriss∈{{{}}}\n",
            days.join(","),
            acriss.join(",")
        ));
    }

    out
}

/// Format the point set as a fixed-width table.
pub fn format_points_table(points: &[PricePoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:>5} {:>12} {:>7} {:>10}\n",
        "competitor", "days", "date", "acriss", "price"
    ));
    out.push_str(&format!(
        "{:-<20} {:-<5} {:-<12} {:-<7} {:-<10}\n",
        "", "", "", "", ""
    ));
    for p in points {
        out.push_str(&format!(
            "{:<20} {:>5} {:>12} {:>7} {:>10.2}\n",
            truncate(&p.competitor, 20),
            p.days,
            p.date.to_string(),
            p.acriss,
            p.price
        ));
    }
    out
}

/// Format the per-competitor roll-up table.
pub fn format_competitor_summary(summaries: &[CompetitorSummary]) -> String {
    let mut out = String::new();
    out.push_str("Per competitor:\n");
    out.push_str(&format!(
        "{:<20} {:>5} {:>10} {:>10} {:>12}\n",
        "competitor", "n", "min", "mean", "latest"
    ));
    out.push_str(&format!(
        "{:-<20} {:-<5} {:-<10} {:-<10} {:-<12}\n",
        "", "", "", "", ""
    ));
    for s in summaries {
        out.push_str(&format!(
            "{:<20} {:>5} {:>10.2} {:>10.2} {:>12}\n",
            truncate(&s.competitor, 20),
            s.n,
            s.min_price,
            s.mean_price,
            s.latest.to_string()
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(competitor: &str, day: u32, price: f64) -> PricePoint {
        PricePoint {
            competitor: competitor.to_string(),
            days: 7,
            date: NaiveDate::from_ymd_opt(2021, 1, day).unwrap(),
            acriss: "MBMR".to_string(),
            price,
        }
    }

    #[test]
    fn summaries_aggregate_per_competitor() {
        let points = vec![
            point("Avis", 1, 30.0),
            point("Avis", 3, 50.0),
            point("Hertz", 2, 45.0),
        ];
        let summaries = summarize_competitors(&points);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].competitor, "Avis");
        assert_eq!(summaries[0].n, 2);
        assert_eq!(summaries[0].min_price, 30.0);
        assert!((summaries[0].mean_price - 40.0).abs() < 1e-12);
        assert_eq!(summaries[0].latest, NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());

        assert_eq!(summaries[1].competitor, "Hertz");
        assert_eq!(summaries[1].n, 1);
    }

    #[test]
    fn points_table_lists_each_point() {
        let text = format_points_table(&[point("Hertz", 1, 42.0)]);
        assert!(text.contains("Hertz"));
        assert!(text.contains("2021-01-01"));
        assert!(text.contains("42.00"));
    }
}
