//! ## Loading the EV population dataset
//!
//! This module reads the registrations CSV into a DataFusion `DataFrame` and checks that the
//! columns the dashboard aggregates over are present. Other columns are carried along untouched.
//!
//! A path that does not point at a regular file is reported as `DashboardError::FileNotFound`;
//! every other failure (unreadable file, malformed CSV, missing column) becomes
//! `DashboardError::LoadError` carrying the underlying message.

use crate::exceptions::{DashboardError, DashboardResult};
use arrow::datatypes::{DataType, Field, Schema};
use datafusion::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Manufacturer column.
pub const MAKE: &str = "Make";
/// Model year column.
pub const MODEL_YEAR: &str = "Model Year";
/// Vehicle type column (e.g. BEV or PHEV).
pub const EV_TYPE: &str = "Electric Vehicle Type";
/// All-electric range column, in miles.
pub const ELECTRIC_RANGE: &str = "Electric Range";

/// Columns the aggregations read; any other column in the file is ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = [MAKE, MODEL_YEAR, EV_TYPE, ELECTRIC_RANGE];

/// Rows scanned by the first pass, which only needs the header.
const HEADER_SCAN_RECORDS: usize = 1;

/// Validates that every column in `target_cols` exists in the DataFrame.
/// Returns a `LoadError` naming the first missing column.
pub fn validate_columns(df: &DataFrame, target_cols: &[&str]) -> DashboardResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_unqualified_name(col_name).is_err() {
            return Err(DashboardError::LoadError(format!(
                "Column '{}' not found in dataset",
                col_name
            )));
        }
    }
    Ok(())
}

/// Column types the dataset is read with.
///
/// `Model Year` is an integer and `Electric Range` a float wherever they appear in the file;
/// every other column is read as text. Nothing is inferred from the data, so a decimal range
/// deep into a large file reads the same as one in the first row.
pub fn dataset_schema<'a>(column_names: impl IntoIterator<Item = &'a str>) -> Schema {
    let fields: Vec<Field> = column_names
        .into_iter()
        .map(|name| {
            let data_type = match name {
                MODEL_YEAR => DataType::Int64,
                ELECTRIC_RANGE => DataType::Float64,
                _ => DataType::Utf8,
            };
            Field::new(name, data_type, true)
        })
        .collect();
    Schema::new(fields)
}

// Accept any extension; the dataset is always comma separated with a header row.
fn csv_options<'a>() -> CsvReadOptions<'a> {
    CsvReadOptions::new().has_header(true).file_extension("")
}

/// Reads the CSV at `path` into a DataFrame registered on `ctx`.
pub async fn load_dataset(ctx: &SessionContext, path: &Path) -> DashboardResult<DataFrame> {
    if !path.is_file() {
        return Err(DashboardError::FileNotFound(path.to_path_buf()));
    }

    let path_str = path.to_string_lossy().into_owned();
    debug!("Reading CSV header from {}", path_str);
    let header = ctx
        .read_csv(
            path_str.as_str(),
            csv_options().schema_infer_max_records(HEADER_SCAN_RECORDS),
        )
        .await?;
    validate_columns(&header, &REQUIRED_COLUMNS)?;

    let schema = dataset_schema(
        header
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().as_str()),
    );
    let df = ctx
        .read_csv(path_str.as_str(), csv_options().schema(&schema))
        .await?;

    info!(
        "Loaded dataset {} with {} columns",
        path_str,
        df.schema().fields().len()
    );
    Ok(df)
}

/// Same as [`load_dataset`], using a fresh session.
pub async fn read_dataset(path: &Path) -> DashboardResult<DataFrame> {
    let ctx = SessionContext::new();
    load_dataset(&ctx, path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_schema_types() {
        let schema = dataset_schema(["VIN (1-10)", MODEL_YEAR, MAKE, EV_TYPE, ELECTRIC_RANGE]);
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(4).data_type(), &DataType::Float64);
        assert!(schema.fields().iter().all(|field| field.is_nullable()));
    }
}
