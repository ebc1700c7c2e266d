//! ## Aggregations behind the dashboard
//!
//! This module turns the registrations DataFrame into the two tables the dashboard shows:
//!
//! - **Counts by make and model year**: the number of registrations for each (Make, Model Year)
//!   pair, sorted by count (descending) and cut to the top N rows.
//! - **Average range by vehicle type**: the mean electric range for each vehicle type, sorted
//!   by the mean (descending). Missing ranges are left out of the mean.
//!
//! Every function builds a new logical plan; the input DataFrame is never modified.
//! Rows with a missing grouping key are left out of that grouping, the way a dataframe
//! group-by drops null keys. The order of groups that tie on the sort column is not specified.

use crate::dataset::{self, ELECTRIC_RANGE, EV_TYPE, MAKE, MODEL_YEAR};
use crate::exceptions::{DashboardError, DashboardResult};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::{avg, count};
use datafusion::prelude::*;
use datafusion_expr::{cast, ident, lit};
use datafusion_functions::string::expr_fn::concat;
use std::path::Path;
use tracing::{debug, info};

/// Count column of the make/year table.
pub const TOTAL_EVS: &str = "Total EVs";
/// Chart label column of the make/year table, e.g. `Tesla (2020)`.
pub const MAKE_YEAR_LABEL: &str = "Make and Model Year";
/// Mean column of the vehicle type table.
pub const AVERAGE_RANGE: &str = "Average Electric Range (Miles)";

/// One row of the counts table.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeYearCount {
    pub make: String,
    pub model_year: i64,
    pub total_evs: u64,
}

impl MakeYearCount {
    /// Categorical axis label for the counts chart.
    pub fn label(&self) -> String {
        format!("{} ({})", self.make, self.model_year)
    }
}

/// One row of the average range table.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRange {
    pub ev_type: String,
    /// `None` when no row of this type has a range value.
    pub average_range: Option<f64>,
}

/// Both derived tables, ready for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvSummary {
    pub top_counts: Vec<MakeYearCount>,
    pub average_ranges: Vec<TypeRange>,
}

/// Counts registrations for every (Make, Model Year) pair, largest count first.
///
/// Output columns: `Make` (Utf8), `Model Year` (Int64), `Total EVs` (Int64).
pub fn make_year_counts(df: &DataFrame) -> DashboardResult<DataFrame> {
    let counts = df
        .clone()
        .select(vec![
            cast(ident(MAKE), DataType::Utf8).alias(MAKE),
            cast(ident(MODEL_YEAR), DataType::Int64).alias(MODEL_YEAR),
        ])?
        .filter(ident(MAKE).is_not_null().and(ident(MODEL_YEAR).is_not_null()))?
        .aggregate(
            vec![ident(MAKE), ident(MODEL_YEAR)],
            vec![count(lit(1)).alias(TOTAL_EVS)],
        )?
        .sort(vec![ident(TOTAL_EVS).sort(false, false)])?;
    Ok(counts)
}

/// The first `n` rows of [`make_year_counts`], plus a `Make and Model Year` label column.
pub fn top_make_year_counts(df: &DataFrame, n: usize) -> DashboardResult<DataFrame> {
    if n == 0 {
        return Err(DashboardError::InvalidParameter(
            "Number of top groups must be greater than zero".to_string(),
        ));
    }
    let top = make_year_counts(df)?.limit(0, Some(n))?.with_column(
        MAKE_YEAR_LABEL,
        concat(vec![
            ident(MAKE),
            lit(" ("),
            cast(ident(MODEL_YEAR), DataType::Utf8),
            lit(")"),
        ]),
    )?;
    Ok(top)
}

/// Mean electric range for each vehicle type, highest mean first.
///
/// Output columns: `Electric Vehicle Type` (Utf8), `Average Electric Range (Miles)` (Float64).
/// A type whose ranges are all missing gets a null mean and sorts last.
pub fn average_range_by_type(df: &DataFrame) -> DashboardResult<DataFrame> {
    let averages = df
        .clone()
        .select(vec![
            cast(ident(EV_TYPE), DataType::Utf8).alias(EV_TYPE),
            cast(ident(ELECTRIC_RANGE), DataType::Float64).alias(ELECTRIC_RANGE),
        ])?
        .filter(ident(EV_TYPE).is_not_null())?
        .aggregate(
            vec![ident(EV_TYPE)],
            vec![avg(ident(ELECTRIC_RANGE)).alias(AVERAGE_RANGE)],
        )?
        .sort(vec![ident(AVERAGE_RANGE).sort(false, false)])?;
    Ok(averages)
}

/// Runs both aggregations and converts the results into typed rows.
pub async fn analyze(df: &DataFrame, top_n: usize) -> DashboardResult<EvSummary> {
    let counts_plan = top_make_year_counts(df, top_n)?;
    let ranges_plan = average_range_by_type(df)?;

    let (count_batches, range_batches) =
        futures::try_join!(counts_plan.collect(), ranges_plan.collect())?;

    let top_counts = count_rows(&count_batches)?;
    let average_ranges = range_rows(&range_batches)?;
    debug!(
        "Aggregated {} make/year groups and {} vehicle types",
        top_counts.len(),
        average_ranges.len()
    );
    Ok(EvSummary {
        top_counts,
        average_ranges,
    })
}

/// Loads the dataset at `path` and computes both tables.
pub async fn load_and_analyze(path: &Path, top_n: usize) -> DashboardResult<EvSummary> {
    let df = dataset::read_dataset(path).await?;
    let summary = analyze(&df, top_n).await?;
    info!("Analysis of {} finished", path.display());
    Ok(summary)
}

/// Sums `Total EVs` over a collected counts table.
pub fn total_count(batches: &[RecordBatch]) -> DashboardResult<u64> {
    Ok(count_rows(batches)?.iter().map(|row| row.total_evs).sum())
}

/// Converts collected counts batches into rows, keeping batch order.
pub fn count_rows(batches: &[RecordBatch]) -> DashboardResult<Vec<MakeYearCount>> {
    let mut rows = Vec::new();
    for batch in batches {
        let schema = batch.schema();
        let makes = batch
            .column(schema.index_of(MAKE)?)
            .as_string_opt::<i32>()
            .ok_or_else(|| unexpected_type(MAKE))?;
        let years = batch
            .column(schema.index_of(MODEL_YEAR)?)
            .as_primitive_opt::<Int64Type>()
            .ok_or_else(|| unexpected_type(MODEL_YEAR))?;
        let totals = batch
            .column(schema.index_of(TOTAL_EVS)?)
            .as_primitive_opt::<Int64Type>()
            .ok_or_else(|| unexpected_type(TOTAL_EVS))?;

        for i in 0..batch.num_rows() {
            rows.push(MakeYearCount {
                make: makes.value(i).to_string(),
                model_year: years.value(i),
                total_evs: totals.value(i).max(0) as u64,
            });
        }
    }
    Ok(rows)
}

/// Converts collected average batches into rows, keeping batch order.
pub fn range_rows(batches: &[RecordBatch]) -> DashboardResult<Vec<TypeRange>> {
    let mut rows = Vec::new();
    for batch in batches {
        let schema = batch.schema();
        let types = batch
            .column(schema.index_of(EV_TYPE)?)
            .as_string_opt::<i32>()
            .ok_or_else(|| unexpected_type(EV_TYPE))?;
        let averages = batch
            .column(schema.index_of(AVERAGE_RANGE)?)
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| unexpected_type(AVERAGE_RANGE))?;

        for i in 0..batch.num_rows() {
            let average_range = if averages.is_null(i) {
                None
            } else {
                Some(averages.value(i))
            };
            rows.push(TypeRange {
                ev_type: types.value(i).to_string(),
                average_range,
            });
        }
    }
    Ok(rows)
}

fn unexpected_type(column: &str) -> DashboardError {
    DashboardError::LoadError(format!(
        "Column '{}' has an unexpected type after aggregation",
        column
    ))
}
