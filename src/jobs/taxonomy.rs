//! NP-005: Taxonomy extraction — collect (type, subType) pairs and merge them
//! into the existing foodTypes.json without ever removing an entry.

use crate::core::error::PrepError;
use crate::core::store;
use crate::core::types::{DataPaths, FoodType, Taxonomy};
use crate::sheet::{self, Sheet};
use indexmap::IndexMap;

/// Types and subtypes seen in one sheet, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTypes {
    pub sheet: String,
    pub types: IndexMap<String, Vec<String>>,
}

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyReport {
    pub sheets: Vec<SheetTypes>,
    pub types_added: usize,
    pub subtypes_added: usize,
    pub total_types: usize,
}

/// Collect distinct non-empty text `type` values and, per type, the distinct
/// non-empty text `subType` values of that type's rows.
pub fn collect_types(sheet: &Sheet) -> SheetTypes {
    let mut types: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in sheet.rows() {
        let Some(food_type) = row.get("type").and_then(|c| c.as_text()) else {
            continue;
        };
        let subs = types.entry(food_type.to_string()).or_default();
        if let Some(sub) = row.get("subType").and_then(|c| c.as_text()) {
            if !subs.iter().any(|s| s == sub) {
                subs.push(sub.to_string());
            }
        }
    }
    SheetTypes {
        sheet: sheet.name.clone(),
        types,
    }
}

/// Merge observed types into the taxonomy. Returns (types added, subtypes added).
pub fn merge(taxonomy: &mut Taxonomy, observed: &SheetTypes) -> (usize, usize) {
    let mut types_added = 0;
    let mut subtypes_added = 0;
    for (type_name, subs) in &observed.types {
        let entry = taxonomy
            .food_types
            .entry(type_name.clone())
            .or_insert_with(|| {
                types_added += 1;
                FoodType::new(type_name)
            });
        for sub in subs {
            if !entry.sub_types.contains(sub) {
                entry.sub_types.push(sub.clone());
                subtypes_added += 1;
            }
        }
    }
    (types_added, subtypes_added)
}

/// Run the extractor: read the foods workbook, merge, save atomically.
pub fn extract_taxonomy(paths: &DataPaths) -> Result<TaxonomyReport, PrepError> {
    let workbook = sheet::open_workbook(&paths.foods_workbook)?;
    tracing::info!(
        workbook = %paths.foods_workbook.display(),
        sheets = ?workbook.sheet_names(),
        "extracting food taxonomy"
    );

    let mut taxonomy: Taxonomy = store::load_json_if_exists(&paths.taxonomy)?.unwrap_or_default();
    let mut report = TaxonomyReport::default();

    for sheet in &workbook.sheets {
        if !sheet.has_column("type") {
            tracing::warn!(sheet = %sheet.name, "sheet has no 'type' column, skipping");
            continue;
        }
        let observed = collect_types(sheet);
        let (types_added, subtypes_added) = merge(&mut taxonomy, &observed);
        tracing::info!(
            sheet = %sheet.name,
            types = observed.types.len(),
            types_added,
            subtypes_added,
            "processed sheet"
        );
        report.types_added += types_added;
        report.subtypes_added += subtypes_added;
        report.sheets.push(observed);
    }

    store::save_json(&paths.taxonomy, &taxonomy)?;
    report.total_types = taxonomy.food_types.len();
    Ok(report)
}
