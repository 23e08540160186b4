//! Plain-text rendering of records, facets and aggregates

use clap::ValueEnum;
use std::cmp::Ordering;
use world_kpi_core::{
    format_number, CountryAggregate, Dimension, Facets, GroupStats, KpiRecord, MinMax, ValueField,
    ValueStats,
};

/// Column a record table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortColumn {
    BattAlias,
    Country,
    Continent,
    Climate,
    Iso,
    ModelSeries,
    Variable,
    Value,
    Count,
}

/// Sort records in place; `NaN` numbers go last in ascending order
pub fn sort_records(records: &mut [KpiRecord], column: SortColumn, descending: bool) {
    records.sort_by(|a, b| {
        let ordering = compare_by(a, b, column);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_by(a: &KpiRecord, b: &KpiRecord, column: SortColumn) -> Ordering {
    match column {
        SortColumn::BattAlias => a.batt_alias.cmp(&b.batt_alias),
        SortColumn::Country => a.country.cmp(&b.country),
        SortColumn::Continent => a.continent.cmp(&b.continent),
        SortColumn::Climate => a.climate.cmp(&b.climate),
        SortColumn::Iso => a.iso_a3.cmp(&b.iso_a3),
        SortColumn::ModelSeries => a.model_series.cmp(&b.model_series),
        SortColumn::Variable => a.variable.cmp(&b.variable),
        SortColumn::Value => a.value.total_cmp(&b.value),
        SortColumn::Count => a.count.total_cmp(&b.count),
    }
}

const RECORD_HEADERS: [&str; 8] = [
    "Battery", "Country", "ISO", "Continent", "Climate", "Model", "Variable", "Value",
];

/// Render records as an aligned text table
pub fn render_records(records: &[KpiRecord]) -> String {
    let rows: Vec<[String; 8]> = records
        .iter()
        .map(|r| {
            [
                r.batt_alias.clone(),
                r.country.clone(),
                r.iso_a3.clone(),
                r.continent.clone(),
                r.climate.clone(),
                r.model_series.clone(),
                r.variable.clone(),
                format_number(r.value),
            ]
        })
        .collect();

    let mut widths = RECORD_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(RECORD_HEADERS.iter().copied(), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }

    lines.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Render facet lists, one dimension per block
pub fn render_facets(facets: &Facets) -> String {
    let mut lines = Vec::new();
    for dimension in Dimension::ALL {
        let values = facets.get(dimension);
        lines.push(format!("## {} ({})", dimension, values.len()));
        for value in values {
            lines.push(format!("- {}", value));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Render a country aggregate with its scale, largest value first
pub fn render_aggregate(aggregate: &CountryAggregate, scale: &MinMax) -> String {
    if aggregate.is_empty() {
        return "No data available for the current filters.".to_string();
    }

    let mut entries: Vec<(&String, &f64)> = aggregate.iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut lines = vec![format!(
        "Scale: min {} / max {}",
        format_number(scale.min),
        format_number(scale.max)
    )];
    for (iso, value) in entries {
        let bar = match scale.normalize(*value) {
            Some(position) => "#".repeat((position * 20.0).round() as usize),
            None => "?".to_string(),
        };
        lines.push(format!("{:<4} {:>14}  {}", iso, format_number(*value), bar));
    }
    lines.join("\n")
}

/// Render overall statistics of one field
pub fn render_value_stats(field: ValueField, stats: &ValueStats) -> String {
    [
        format!("## {} ({} finite values)", field, stats.count),
        format!("Sum:     {}", format_number(stats.sum)),
        format!("Average: {}", format_number(stats.avg)),
        format!("Min:     {}", format_number(stats.min)),
        format!("Max:     {}", format_number(stats.max)),
    ]
    .join("\n")
}

const GROUP_HEADERS: [&str; 6] = ["", "Records", "Sum", "Average", "Min", "Max"];

/// Render grouped statistics as an aligned text table
pub fn render_group_stats(dimension: Dimension, groups: &[GroupStats]) -> String {
    let rows: Vec<[String; 6]> = groups
        .iter()
        .map(|g| {
            [
                g.key.clone(),
                g.count.to_string(),
                format_number(g.sum),
                format_number(g.avg),
                format_number(g.min),
                format_number(g.max),
            ]
        })
        .collect();

    let mut headers = GROUP_HEADERS;
    headers[0] = dimension.as_str();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.iter().copied(), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }

    lines.join("\n")
}
