use std::path::Path;
use std::sync::Arc;

use approx::assert_relative_eq;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;

use ev_dashboard::analysis::{
    analyze, average_range_by_type, count_rows, load_and_analyze, make_year_counts,
    top_make_year_counts, total_count, MakeYearCount, MAKE_YEAR_LABEL,
};
use ev_dashboard::dataset::read_dataset;
use ev_dashboard::exceptions::{DashboardError, DashboardResult};

const SAMPLE: &str = "tests/testdata/ev_sample.csv";
const BEV: &str = "Battery Electric Vehicle (BEV)";
const PHEV: &str = "Plug-in Hybrid Electric Vehicle (PHEV)";

/// Creates an in-memory DataFrame with the four columns the dashboard reads.
///   - rows 0..3 are Tesla 2020 BEVs, one of them without a range
///   - row 3 is a Nissan 2019 BEV
///   - row 4 is a Toyota PHEV with no model year and no range
///   - row 5 is a FCEV with no range at all
async fn create_dataframe() -> DataFrame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Make", DataType::Utf8, true),
        Field::new("Model Year", DataType::Int64, true),
        Field::new("Electric Vehicle Type", DataType::Utf8, true),
        Field::new("Electric Range", DataType::Float64, true),
    ]));

    let makes: ArrayRef = Arc::new(StringArray::from(vec![
        Some("Tesla"),
        Some("Tesla"),
        Some("Tesla"),
        Some("Nissan"),
        Some("Toyota"),
        Some("Hyundai"),
    ]));
    let years: ArrayRef = Arc::new(Int64Array::from(vec![
        Some(2020),
        Some(2020),
        Some(2020),
        Some(2019),
        None,
        Some(2021),
    ]));
    let types: ArrayRef = Arc::new(StringArray::from(vec![
        Some("BEV"),
        Some("BEV"),
        Some("BEV"),
        Some("BEV"),
        Some("PHEV"),
        Some("FCEV"),
    ]));
    let ranges: ArrayRef = Arc::new(Float64Array::from(vec![
        Some(250.0),
        Some(270.0),
        None,
        Some(150.0),
        None,
        None,
    ]));

    let batch = RecordBatch::try_new(schema.clone(), vec![makes, years, types, ranges]).unwrap();

    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("registrations", Arc::new(mem_table))
        .unwrap();
    ctx.table("registrations").await.unwrap()
}

fn assert_non_increasing(counts: &[MakeYearCount]) {
    for pair in counts.windows(2) {
        assert!(
            pair[0].total_evs >= pair[1].total_evs,
            "counts out of order: {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test]
async fn test_top_counts_are_sorted_and_truncated() -> DashboardResult<()> {
    let summary = load_and_analyze(Path::new(SAMPLE), 10).await?;
    let counts = &summary.top_counts;

    // The sample has 11 (Make, Model Year) groups with distinct counts 12 down to 1.
    assert_eq!(counts.len(), 10);
    assert_non_increasing(counts);
    assert_eq!(
        counts[0],
        MakeYearCount {
            make: "TESLA".to_string(),
            model_year: 2022,
            total_evs: 12,
        }
    );
    assert_eq!(counts[1].label(), "TESLA (2021)");
    assert_eq!(counts[9].label(), "VOLVO (2019)");
    assert_eq!(counts[9].total_evs, 2);
    assert!(counts.iter().all(|row| row.make != "JEEP"));
    Ok(())
}

#[tokio::test]
async fn test_group_counts_cover_rows_with_make_and_year() -> DashboardResult<()> {
    let df = read_dataset(Path::new(SAMPLE)).await?;
    let batches = make_year_counts(&df)?.collect().await?;

    // 69 rows: one without a Make, one without a Model Year.
    assert_eq!(df.clone().count().await?, 69);
    assert_eq!(total_count(&batches)?, 67);
    assert_eq!(count_rows(&batches)?.len(), 11);
    Ok(())
}

#[tokio::test]
async fn test_average_range_per_vehicle_type() -> DashboardResult<()> {
    let summary = load_and_analyze(Path::new(SAMPLE), 10).await?;
    let averages = &summary.average_ranges;

    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].ev_type, BEV);
    assert_eq!(averages[1].ev_type, PHEV);

    // Means over the non-missing ranges only: 10329 / 45 and 505 / 17.
    assert_relative_eq!(
        averages[0].average_range.unwrap(),
        10329.0 / 45.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        averages[1].average_range.unwrap(),
        505.0 / 17.0,
        epsilon = 1e-9
    );
    Ok(())
}

#[tokio::test]
async fn test_small_example_from_csv() -> DashboardResult<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.csv");
    std::fs::write(
        &path,
        "Make,Model Year,Electric Vehicle Type,Electric Range\n\
         Tesla,2020,BEV,250\n\
         Tesla,2020,BEV,270\n\
         Nissan,2019,BEV,150\n",
    )
    .unwrap();

    let summary = load_and_analyze(&path, 10).await?;

    assert_eq!(summary.top_counts.len(), 2);
    assert_eq!(summary.top_counts[0].label(), "Tesla (2020)");
    assert_eq!(summary.top_counts[0].total_evs, 2);
    assert_eq!(summary.top_counts[1].label(), "Nissan (2019)");
    assert_eq!(summary.top_counts[1].total_evs, 1);

    assert_eq!(summary.average_ranges.len(), 1);
    assert_eq!(summary.average_ranges[0].ev_type, "BEV");
    assert_relative_eq!(
        summary.average_ranges[0].average_range.unwrap(),
        670.0 / 3.0,
        epsilon = 1e-9
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_values_in_memory_table() -> DashboardResult<()> {
    let df = create_dataframe().await;
    let summary = analyze(&df, 10).await?;

    // The Toyota row has no model year and is left out of the counts.
    assert_eq!(summary.top_counts.len(), 3);
    assert_eq!(summary.top_counts[0].label(), "Tesla (2020)");
    assert_eq!(summary.top_counts[0].total_evs, 3);
    assert!(summary.top_counts.iter().all(|row| row.make != "Toyota"));

    // One row per type; types without any range sort last with no mean.
    assert_eq!(summary.average_ranges.len(), 3);
    assert_eq!(summary.average_ranges[0].ev_type, "BEV");
    assert_relative_eq!(
        summary.average_ranges[0].average_range.unwrap(),
        (250.0 + 270.0 + 150.0) / 3.0,
        epsilon = 1e-9
    );
    for row in &summary.average_ranges[1..] {
        assert!(row.average_range.is_none(), "expected no mean for {}", row.ev_type);
    }
    Ok(())
}

#[tokio::test]
async fn test_top_n_limits_rows_and_adds_label() -> DashboardResult<()> {
    let df = read_dataset(Path::new(SAMPLE)).await?;
    let batches = top_make_year_counts(&df, 3)?.collect().await?;

    let rows = count_rows(&batches)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].label(), "NISSAN (2019)");

    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .expect("Expected a non-empty batch");
    let labels = batch
        .column(batch.schema().index_of(MAKE_YEAR_LABEL)?)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("Expected StringArray");
    assert_eq!(labels.value(0), "TESLA (2022)");
    Ok(())
}

#[tokio::test]
async fn test_zero_top_n_is_rejected() -> DashboardResult<()> {
    let df = create_dataframe().await;
    let result = top_make_year_counts(&df, 0);
    assert!(matches!(result, Err(DashboardError::InvalidParameter(_))));
    Ok(())
}

#[tokio::test]
async fn test_input_dataframe_is_unchanged() -> DashboardResult<()> {
    let df = create_dataframe().await;
    let schema_before = df.schema().clone();

    let _ = analyze(&df, 10).await?;
    let _ = average_range_by_type(&df)?.collect().await?;

    assert_eq!(df.schema(), &schema_before);
    assert_eq!(df.clone().count().await?, 6);
    Ok(())
}
