//! Column access and conversion helpers
//!
//! Analyses work on plain Rust vectors extracted from polars columns, with
//! nulls preserved as `None` so every vector stays aligned with the rows of
//! the source frame.

use polars::prelude::*;

use crate::error::{AnalysisError, AnalysisResult};

/// Look up a column by name, reporting the available columns when absent
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> AnalysisResult<&'a Column> {
    df.column(name).map_err(|_| {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        AnalysisError::configuration(format!(
            "Column '{}' not found in dataset. Available columns: {:?}",
            name, available
        ))
    })
}

/// Convert a column to a Vec of Option<String> for label comparison and grouping
pub fn column_to_string_vec(col: &Column) -> AnalysisResult<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            // Categoricals, enums and anything else castable to string
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

/// Convert a numeric column to a Vec of Option<f64>.
///
/// Non-numeric columns are rejected rather than cast, since a string-to-float
/// cast would silently turn unparseable values into nulls.
pub fn column_to_f64_vec(col: &Column) -> AnalysisResult<Vec<Option<f64>>> {
    if !col.dtype().is_primitive_numeric() {
        return Err(AnalysisError::configuration(format!(
            "Column '{}' must be numeric, found {}",
            col.name(),
            col.dtype()
        )));
    }

    let float_col = col.cast(&DataType::Float64)?;
    Ok(float_col.f64()?.into_iter().collect())
}

/// Extract the non-null values of a numeric column along with their row indices
pub fn non_null_values(col: &Column) -> AnalysisResult<(Vec<usize>, Vec<f64>)> {
    let values = column_to_f64_vec(col)?;
    let (rows, observed): (Vec<usize>, Vec<f64>) = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .unzip();
    Ok((rows, observed))
}
