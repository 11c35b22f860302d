//! Terminal output for query and ingestion results.

use crate::ingest::IngestReport;
use crate::models::Measurement;
use colored::*;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

pub fn measurement_table(rows: &[Measurement]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Timestamp (UTC)", "Station", "Type", "Value", "Unit"]);
    for m in rows {
        table.add_row(vec![
            m.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            m.station.clone(),
            m.kind.to_string(),
            m.value.to_string(),
            m.unit.clone(),
        ]);
    }
    table
}

pub fn report_table(report: &IngestReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Window start",
        "Window end",
        "Readings",
        "Normalized",
        "Inserted",
        "Skipped stations",
    ]);
    table.add_row(vec![
        report.start.to_rfc3339(),
        report.end.to_rfc3339(),
        report.fetched.to_string(),
        report.normalized.to_string(),
        report.inserted.to_string(),
        report.skipped.len().to_string(),
    ]);
    table
}

pub fn print_list(title: &str, items: &[String]) {
    println!("{}", title.cyan().bold());
    if items.is_empty() {
        println!("  {}", "(none)".yellow());
    }
    for item in items {
        println!("  {}", item);
    }
}
