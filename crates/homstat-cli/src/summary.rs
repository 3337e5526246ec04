//! Human-readable result summaries.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use homstat_core::frame::{f64_at, str_at};
use homstat_model::SegmentKey;
use homstat_model::schema::{COUNTRY, MEAN_RATE, METHOD, REGION_GROUP};

use crate::types::{CoverageResult, PrepareResult, RankResult, SeriesResult};

pub fn print_prepare_summary(result: &PrepareResult) {
    if result.dry_run {
        println!("Dry run, nothing written.");
    }
    println!("Output: {}", result.output.display());
    println!(
        "Rows: {} across {} countries",
        result.rows, result.countries
    );
}

pub fn print_coverage_summary(result: &CoverageResult) {
    println!("Window: {}", result.report.window);
    println!("Threshold: {}", result.threshold);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Country"),
        header_cell("Coverage"),
        header_cell("Included"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    for entry in &result.report.entries {
        let included = entry.score >= result.threshold;
        table.add_row(vec![
            Cell::new(&entry.country),
            score_cell(entry.score, included),
            included_cell(included),
        ]);
    }
    println!("{table}");
    if result.segment.is_some() {
        let failing: Vec<&str> = result
            .report
            .entries
            .iter()
            .filter(|entry| entry.score < result.threshold)
            .map(|entry| entry.country.as_str())
            .collect();
        if !failing.is_empty() {
            println!("Scores are the minimum across segments; below threshold: {}", failing.join(", "));
        }
    }
}

pub fn print_rank_summary(result: &RankResult) {
    println!("Window: {}", result.window);
    if !result.excluded.is_empty() {
        println!("Excluded (insufficient coverage): {}", result.excluded.join(", "));
    }

    let segment_column = result.segment.map(SegmentKey::column);
    let mut table = Table::new();
    let mut header = vec![header_cell("#"), header_cell("Country")];
    if let Some(name) = segment_column {
        header.push(header_cell(name));
    }
    header.push(header_cell("Rate"));
    header.push(header_cell("Method"));
    header.push(header_cell("Region"));
    table.set_header(header);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for idx in 0..result.country_table.height() {
        let mut row = vec![
            Cell::new(idx + 1),
            Cell::new(str_at(&result.country_table, COUNTRY, idx)),
        ];
        if let Some(name) = segment_column {
            row.push(Cell::new(str_at(&result.country_table, name, idx)));
        }
        row.push(rate_cell(f64_at(&result.country_table, MEAN_RATE, idx)));
        row.push(method_cell(&str_at(&result.country_table, METHOD, idx)));
        row.push(Cell::new(str_at(&result.country_table, REGION_GROUP, idx)));
        table.add_row(row);
    }
    println!("{table}");

    let mut regions = Table::new();
    let mut header = vec![header_cell("Region")];
    if let Some(name) = segment_column {
        header.push(header_cell(name));
    }
    header.push(header_cell("Rate"));
    regions.set_header(header);
    apply_table_style(&mut regions);
    for idx in 0..result.region_table.height() {
        let mut row = vec![Cell::new(str_at(&result.region_table, REGION_GROUP, idx))];
        if let Some(name) = segment_column {
            row.push(Cell::new(str_at(&result.region_table, name, idx)));
        }
        row.push(rate_cell(f64_at(&result.region_table, MEAN_RATE, idx)));
        regions.add_row(row);
    }
    println!("{regions}");

    for path in &result.written {
        println!("Written: {}", path.display());
    }
}

pub fn print_series_summary(result: &SeriesResult) {
    println!("Mode: {}", result.mode_label);
    println!("Window: {}", result.window);
    println!(
        "Country rows: {}, region rows: {}",
        result.country_rows, result.region_rows
    );
    if !result.excluded.is_empty() {
        println!("Excluded (insufficient coverage): {}", result.excluded.join(", "));
    }
    for path in &result.written {
        println!("Written: {}", path.display());
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn score_cell(score: f64, included: bool) -> Cell {
    let cell = Cell::new(format!("{score:.2}"));
    if included {
        cell
    } else {
        cell.fg(Color::Red)
    }
}

fn included_cell(included: bool) -> Cell {
    if included {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(Color::Red)
    }
}

fn rate_cell(rate: Option<f64>) -> Cell {
    match rate {
        Some(value) => Cell::new(format!("{value:.2}")),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}

fn method_cell(method: &str) -> Cell {
    if method == "mean" {
        // Fallback aggregation is worth a glance.
        Cell::new(method).fg(Color::Yellow)
    } else {
        Cell::new(method)
    }
}
