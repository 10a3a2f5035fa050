//! NP-006: Food splitting — reshape food rows into nested records and write
//! one JSON file per taxonomy type.
//!
//! The row reshaping is a pure function (`food_from_row`) so it can be tested
//! without touching the filesystem.

use crate::core::error::PrepError;
use crate::core::store;
use crate::core::types::{
    DataPaths, FoodFile, FoodRecord, Minerals, Taxonomy, Vitamins, DEFAULT_SERVING_SIZE,
};
use crate::sheet::{self, Row, Sheet};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

const VITAMIN_COLUMNS: [&str; 4] = ["vitaminA", "vitaminC", "vitaminD", "vitaminE"];
const MINERAL_COLUMNS: [&str; 4] = ["calcium", "iron", "magnesium", "potassium"];

/// Columns with a fixed place in `FoodRecord`; everything else goes to `extra`.
const KNOWN_COLUMNS: [&str; 20] = [
    "id",
    "name",
    "type",
    "subType",
    "calories",
    "protein",
    "carbs",
    "fat",
    "servingSize",
    "unit",
    "description",
    "alias",
    "vitaminA",
    "vitaminC",
    "vitaminD",
    "vitaminE",
    "calcium",
    "iron",
    "magnesium",
    "potassium",
];

/// Keys the record writes itself that no sheet column has a fixed place for.
/// A column carrying one of these names would be written twice.
const NESTED_KEYS: [&str; 2] = ["vitamins", "minerals"];

/// Why a row could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    /// The id cell is empty or the column is missing.
    NoId,
    /// The id cell holds something that is not a number.
    BadId(String),
}

/// Split an alias cell on ASCII commas into trimmed, non-empty names.
pub fn split_aliases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// A nutrient column: absent column → `absent`, empty cell → None.
fn nutrient(row: &Row<'_>, column: &str, absent: Option<f64>) -> Option<f64> {
    match row.get(column) {
        None => absent,
        Some(cell) if cell.is_empty() => None,
        Some(cell) => {
            let value = cell.to_f64();
            if value.is_none() {
                tracing::warn!(column, cell = ?cell, "non-numeric nutrient value, storing null");
            }
            value
        }
    }
}

fn text(row: &Row<'_>, column: &str) -> Option<String> {
    row.value(column).and_then(|c| c.to_text())
}

/// Reshape one spreadsheet row into a `FoodRecord`.
pub fn food_from_row(row: &Row<'_>) -> Result<FoodRecord, RowSkip> {
    let id_cell = row.value("id").ok_or(RowSkip::NoId)?;
    let id = id_cell
        .to_i64()
        .ok_or_else(|| RowSkip::BadId(id_cell.to_text().unwrap_or_default()))?;

    let serving_size = match row.value("servingSize") {
        None => DEFAULT_SERVING_SIZE,
        Some(cell) => cell.to_f64().unwrap_or_else(|| {
            tracing::warn!(id, cell = ?cell, "non-numeric servingSize, using default");
            DEFAULT_SERVING_SIZE
        }),
    };

    let alias = text(row, "alias")
        .map(|a| split_aliases(&a))
        .unwrap_or_default();

    let [va, vc, vd, ve] = VITAMIN_COLUMNS.map(|c| nutrient(row, c, Some(0.0)));
    let [ca, fe, mg, k] = MINERAL_COLUMNS.map(|c| nutrient(row, c, Some(0.0)));

    let extra: IndexMap<String, serde_json::Value> = row
        .columns()
        .filter(|(h, _)| !KNOWN_COLUMNS.contains(h))
        .filter(|(h, _)| {
            let clash = NESTED_KEYS.contains(h);
            if clash {
                tracing::warn!(id, column = %h, "column name clashes with a nested record key, dropping");
            }
            !clash
        })
        .map(|(h, cell)| (h.to_string(), cell.to_json()))
        .collect();

    Ok(FoodRecord {
        id,
        name: text(row, "name"),
        food_type: text(row, "type"),
        sub_type: text(row, "subType"),
        calories: nutrient(row, "calories", None),
        protein: nutrient(row, "protein", None),
        carbs: nutrient(row, "carbs", None),
        fat: nutrient(row, "fat", None),
        serving_size,
        unit: text(row, "unit"),
        description: text(row, "description"),
        alias,
        vitamins: Vitamins {
            a: va,
            c: vc,
            d: vd,
            e: ve,
        },
        minerals: Minerals {
            calcium: ca,
            iron: fe,
            magnesium: mg,
            potassium: k,
        },
        extra,
    })
}

/// Distinct non-empty `type` values of a sheet, rendered as text.
pub fn sheet_types(sheet: &Sheet) -> BTreeSet<String> {
    sheet
        .rows()
        .filter_map(|row| row.value("type").and_then(|c| c.to_text()))
        .collect()
}

/// Records of one type from one sheet, keyed by id string.
pub fn records_for_type(sheet: &Sheet, food_type: &str) -> IndexMap<String, FoodRecord> {
    let mut records = IndexMap::new();
    for row in sheet.rows() {
        if text(&row, "type").as_deref() != Some(food_type) {
            continue;
        }
        match food_from_row(&row) {
            Ok(record) => {
                records.insert(record.id.to_string(), record);
            }
            Err(RowSkip::NoId) => {}
            Err(RowSkip::BadId(raw)) => {
                tracing::warn!(sheet = %sheet.name, food_type, id = %raw, "id is not a number, skipping row");
            }
        }
    }
    records
}

/// One written per-type file.
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub food_type: String,
    pub path: PathBuf,
    pub records: usize,
}

/// Outcome of one split run.
#[derive(Debug, Clone, Default)]
pub struct SplitReport {
    pub files: Vec<WrittenFile>,
    pub skipped_types: Vec<String>,
}

/// Group every sheet's rows by declared type, without writing anything.
pub fn group_by_type(
    workbook: &sheet::Workbook,
    taxonomy: &Taxonomy,
) -> (IndexMap<String, IndexMap<String, FoodRecord>>, Vec<String>) {
    let mut grouped: IndexMap<String, IndexMap<String, FoodRecord>> = IndexMap::new();
    let mut skipped = Vec::new();

    for sheet in &workbook.sheets {
        if !sheet.has_column("type") {
            tracing::warn!(sheet = %sheet.name, "sheet has no 'type' column, skipping");
            continue;
        }
        for food_type in sheet_types(sheet) {
            if !taxonomy.food_types.contains_key(&food_type) {
                tracing::warn!(
                    sheet = %sheet.name,
                    food_type = %food_type,
                    "food type not declared in taxonomy, skipping"
                );
                if !skipped.contains(&food_type) {
                    skipped.push(food_type);
                }
                continue;
            }
            let records = records_for_type(sheet, &food_type);
            let bucket = grouped.entry(food_type.clone()).or_default();
            for (id, record) in records {
                if bucket.contains_key(&id) {
                    tracing::warn!(food_type = %food_type, id = %id, "duplicate food id, later row wins");
                }
                bucket.insert(id, record);
            }
        }
    }

    (grouped, skipped)
}

/// Run the splitter: read taxonomy and workbook, write one file per type.
pub fn split_foods(paths: &DataPaths) -> Result<SplitReport, PrepError> {
    let taxonomy: Taxonomy = store::load_json(&paths.taxonomy)?;
    let workbook = sheet::open_workbook(&paths.foods_workbook)?;
    tracing::info!(
        workbook = %paths.foods_workbook.display(),
        sheets = ?workbook.sheet_names(),
        "splitting foods by type"
    );

    let (grouped, skipped_types) = group_by_type(&workbook, &taxonomy);

    let mut report = SplitReport {
        skipped_types,
        ..SplitReport::default()
    };
    for (food_type, records) in grouped {
        let file_name = taxonomy.food_types[&food_type].file_name_or_default(&food_type);
        let path = paths.food_dir.join(&file_name);
        let count = records.len();

        let mut file: FoodFile = IndexMap::new();
        file.insert(food_type.clone(), records);
        store::save_json(&path, &file)?;

        tracing::info!(food_type = %food_type, records = count, path = %path.display(), "exported food type");
        report.files.push(WrittenFile {
            food_type,
            path,
            records: count,
        });
    }

    Ok(report)
}
