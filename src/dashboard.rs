//! ## HTML rendering
//!
//! Builds the single dashboard page with `maud` and embeds interactive bar charts made with `plotly`.
//! The page has two sections, each with a data table and a chart, and a caption naming the data source.
//! When the dataset could not be loaded, [`render_error`] produces the same page shell carrying only
//! the error message.

use crate::analysis::{EvSummary, MakeYearCount, TypeRange};
use crate::exceptions::DashboardError;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::common::{ColorScale, ColorScalePalette, HoverInfo, Marker, Orientation, Title};
use plotly::layout::Axis;
use plotly::{Bar, Layout, Plot};

const PAGE_TITLE: &str = "EV Data Analysis";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";
const CHART_HEIGHT: usize = 300;

/// Element id of the make/year chart container.
pub const COUNTS_CHART_ID: &str = "make-year-chart";
/// Element id of the vehicle type chart container.
pub const RANGE_CHART_ID: &str = "range-chart";

/// Categorical colors for vehicle types.
const TYPE_PALETTE: [&str; 10] = [
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b", "#eeca3b", "#b279a2", "#ff9da6",
    "#9d755d", "#bab0ac",
];

/// Renders the full dashboard for a computed summary.
pub fn render_dashboard(summary: &EvSummary, source_name: &str) -> String {
    page(
        html! {
            section id="make-year-section" {
                h2 { "Top " (summary.top_counts.len()) " EV Counts by Make and Model Year" }
                p class="info" { "Aggregated total number of EVs for each Make and Model Year." }
                div class="columns" {
                    div class="column" {
                        h3 { "Aggregated Data Table" }
                        (counts_table(&summary.top_counts))
                    }
                    div class="column" {
                        h3 { "Visualization: Top Counts" }
                        (PreEscaped(counts_chart(&summary.top_counts).to_inline_html(Some(COUNTS_CHART_ID))))
                    }
                }
            }
            hr;
            section id="range-section" {
                h2 { "Average Electric Range by EV Type" }
                p class="info" { "Calculated average Electric Range for each Electric Vehicle Type, sorted descending." }
                div class="columns" {
                    div class="column" {
                        h3 { "Average Range Data Table" }
                        (ranges_table(&summary.average_ranges))
                    }
                    div class="column" {
                        h3 { "Visualization: Average Range" }
                        (PreEscaped(range_chart(&summary.average_ranges).to_inline_html(Some(RANGE_CHART_ID))))
                    }
                }
            }
        },
        source_name,
    )
    .into_string()
}

/// Renders the page shell with only the load error in it.
pub fn render_error(error: &DashboardError, source_name: &str) -> String {
    page(
        html! {
            div class="error" role="alert" { "Error: " (error.to_string()) }
        },
        source_name,
    )
    .into_string()
}

fn page(content: Markup, source_name: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (PAGE_TITLE) }
                script src=(PLOTLY_CDN) {}
                style {
                    (PreEscaped("
                        body { font-family: Arial, sans-serif; margin: 0 2rem; }
                        .columns { display: flex; gap: 2rem; }
                        .column { flex: 1 1 0; min-width: 0; }
                        .info { background: #e8f1fb; border-radius: 6px; padding: 0.75rem; }
                        .error { background: #fdecea; color: #8a1c1c; border-radius: 6px; padding: 0.75rem; }
                        table { border-collapse: collapse; width: 100%; }
                        th, td { border-bottom: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }
                        td.number { text-align: right; }
                        .caption { color: #666; font-size: 0.85rem; }
                    "))
                }
            }
            body {
                h1 { "Electric Vehicle Population Dataset Analysis" }
                hr;
                (content)
                hr;
                p class="caption" { "Data Source: " strong { (source_name) } }
            }
        }
    }
}

fn counts_table(rows: &[MakeYearCount]) -> Markup {
    html! {
        table id="make-year-table" {
            thead { tr { th { "Make" } th { "Model Year" } th { "Total EVs" } } }
            tbody {
                @for row in rows {
                    tr {
                        td { (row.make) }
                        td { (row.model_year) }
                        td class="number" { (row.total_evs) }
                    }
                }
            }
        }
    }
}

fn ranges_table(rows: &[TypeRange]) -> Markup {
    html! {
        table id="range-table" {
            thead { tr { th { "Electric Vehicle Type" } th { "Average Electric Range (Miles)" } } }
            tbody {
                @for row in rows {
                    tr {
                        td { (row.ev_type) }
                        td class="number" { (format_range(row.average_range)) }
                    }
                }
            }
        }
    }
}

/// Formats an average range to one decimal place; a missing mean shows as `n/a`.
pub fn format_range(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} 🚗", v),
        None => "n/a".to_string(),
    }
}

/// Horizontal bars, one per (Make, Model Year), largest count on top and colored by model year.
fn counts_chart(rows: &[MakeYearCount]) -> Plot {
    // Plotly draws the first category at the bottom of the axis.
    let ordered: Vec<&MakeYearCount> = rows.iter().rev().collect();

    let counts: Vec<u64> = ordered.iter().map(|row| row.total_evs).collect();
    let labels: Vec<String> = ordered.iter().map(|row| row.label()).collect();
    let hover: Vec<String> = ordered
        .iter()
        .map(|row| {
            format!(
                "Make: {}<br>Model Year: {}<br>Total EVs: {}",
                row.make, row.model_year, row.total_evs
            )
        })
        .collect();
    let years: Vec<f64> = ordered.iter().map(|row| row.model_year as f64).collect();

    let trace = Bar::new(counts, labels)
        .orientation(Orientation::Horizontal)
        .marker(
            Marker::new()
                .color_array(years)
                .color_scale(ColorScale::Palette(ColorScalePalette::Blues)),
        )
        .hover_text_array(hover)
        .hover_info(HoverInfo::Text)
        .name("Total EVs");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .height(CHART_HEIGHT)
            .show_legend(false)
            .x_axis(Axis::new().title(Title::with_text("Total EVs (Count)")))
            .y_axis(Axis::new().title(Title::with_text("Make and Model Year"))),
    );
    plot
}

/// One vertical bar per vehicle type, colored by type.
fn range_chart(rows: &[TypeRange]) -> Plot {
    let types: Vec<String> = rows.iter().map(|row| row.ev_type.clone()).collect();
    let averages: Vec<Option<f64>> = rows.iter().map(|row| row.average_range).collect();
    let hover: Vec<String> = rows
        .iter()
        .map(|row| {
            format!(
                "Electric Vehicle Type: {}<br>Average Electric Range (Miles): {}",
                row.ev_type,
                row.average_range
                    .map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
            )
        })
        .collect();
    let colors: Vec<&'static str> = (0..rows.len())
        .map(|i| TYPE_PALETTE[i % TYPE_PALETTE.len()])
        .collect();

    let trace = Bar::new(types, averages)
        .marker(Marker::new().color_array(colors))
        .hover_text_array(hover)
        .hover_info(HoverInfo::Text)
        .name("Average Electric Range (Miles)");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .height(CHART_HEIGHT)
            .show_legend(false)
            .x_axis(Axis::new().title(Title::with_text("EV Type")))
            .y_axis(Axis::new().title(Title::with_text("Avg. Range (Miles)"))),
    );
    plot
}
