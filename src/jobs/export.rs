//! NP-009: Flat CSV export of the food database, one row per record.

use crate::core::error::PrepError;
use crate::core::store;
use crate::core::types::{DataPaths, FoodFileEntries, Taxonomy};
use serde_json::Value;
use std::path::Path;

pub const CSV_HEADER: [&str; 17] = [
    "id",
    "name",
    "calories",
    "protein",
    "carbs",
    "fat",
    "vitaminA",
    "vitaminC",
    "vitaminD",
    "vitaminE",
    "calcium",
    "iron",
    "magnesium",
    "potassium",
    "servingSize",
    "unit",
    "description",
];

/// Where each CSV column lives inside a stored record, in `CSV_HEADER` order.
const RECORD_POINTERS: [&str; 17] = [
    "/id",
    "/name",
    "/calories",
    "/protein",
    "/carbs",
    "/fat",
    "/vitamins/A",
    "/vitamins/C",
    "/vitamins/D",
    "/vitamins/E",
    "/minerals/calcium",
    "/minerals/iron",
    "/minerals/magnesium",
    "/minerals/potassium",
    "/servingSize",
    "/unit",
    "/description",
];

fn field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One CSV row for a stored record, in `CSV_HEADER` order. Values are
/// written as stored: absent and null fields are empty, text stays text.
pub fn csv_row(record: &Value) -> Vec<String> {
    RECORD_POINTERS
        .iter()
        .map(|pointer| field(record.pointer(pointer)))
        .collect()
}

/// Every record of every declared type, in taxonomy order. Unreadable
/// files are skipped the same way the resolver skips them; within a file
/// only entries that are not JSON objects are dropped.
pub fn collect_records(taxonomy: &Taxonomy, food_dir: &Path) -> Vec<Value> {
    let mut records = Vec::new();
    for (food_type, info) in &taxonomy.food_types {
        let Some(file_name) = info.file_name.as_deref() else {
            continue;
        };
        match store::load_json::<FoodFileEntries>(&food_dir.join(file_name)) {
            Ok(mut file) => {
                let Some(by_id) = file.shift_remove(food_type) else {
                    continue;
                };
                for (key, record) in by_id {
                    if record.is_object() {
                        records.push(record);
                    } else {
                        tracing::warn!(food_type = %food_type, key = %key, "food record is not an object, skipping");
                    }
                }
            }
            Err(e) => tracing::warn!(food_type = %food_type, "cannot load food file: {}", e),
        }
    }
    records
}

/// Render records as CSV text with the fixed header.
pub fn render_csv(records: &[Value]) -> Result<Vec<u8>, PrepError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(csv_row(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| PrepError::Csv(e.into_error().into()))
}

/// Run the export: read taxonomy and food files, write the CSV atomically.
pub fn export_csv(paths: &DataPaths) -> Result<usize, PrepError> {
    let taxonomy: Taxonomy = store::load_json(&paths.taxonomy)?;
    let records = collect_records(&taxonomy, &paths.food_dir);
    let bytes = render_csv(&records)?;
    store::write_atomic(&paths.foods_csv, &bytes)?;
    tracing::info!(records = records.len(), path = %paths.foods_csv.display(), "exported foods csv");
    Ok(records.len())
}
