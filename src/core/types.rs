//! NP-001: Data model for the configuration file and every JSON artifact.
//!
//! All artifact types derive Serialize/Deserialize so outputs round-trip
//! through `serde_json` with no field loss. Maps are `IndexMap` so key order
//! follows insertion order, the way the downstream app expects to read them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// nutriprep.yaml
// ============================================================================

/// Root configuration: where every job reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,

    /// Input and output locations
    #[serde(default)]
    pub paths: DataPaths,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: DataPaths::default(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Every file location a job touches. Relative paths are resolved against
/// the directory holding the config file before a job sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Food spreadsheet (xlsx file, csv file, or directory of csv sheets)
    pub foods_workbook: PathBuf,

    /// Recipe spreadsheet
    pub dishes_workbook: PathBuf,

    /// Directory holding the per-type food files
    pub food_dir: PathBuf,

    /// Taxonomy file
    pub taxonomy: PathBuf,

    /// Raw recipe file (ingredient names)
    pub dishes_raw: PathBuf,

    /// Resolved recipe file (ingredient ids)
    pub dishes: PathBuf,

    /// Missing-ingredient diagnostic report
    pub missing_report: PathBuf,

    /// Flat CSV export of the food database
    pub foods_csv: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            foods_workbook: PathBuf::from("foods.xlsx"),
            dishes_workbook: PathBuf::from("dishs.xlsx"),
            food_dir: PathBuf::from("data/foods"),
            taxonomy: PathBuf::from("data/foods/foodTypes.json"),
            dishes_raw: PathBuf::from("data/dishs/dishsRaw.json"),
            dishes: PathBuf::from("data/dishs/dishs.json"),
            missing_report: PathBuf::from("missing_ingredients.json"),
            foods_csv: PathBuf::from("foods.csv"),
        }
    }
}

impl DataPaths {
    /// Output files, labelled, in the order the jobs produce them.
    pub fn outputs(&self) -> [(&'static str, &PathBuf); 5] {
        [
            ("taxonomy", &self.taxonomy),
            ("dishes_raw", &self.dishes_raw),
            ("dishes", &self.dishes),
            ("missing_report", &self.missing_report),
            ("foods_csv", &self.foods_csv),
        ]
    }

    /// Input workbooks, labelled.
    pub fn inputs(&self) -> [(&'static str, &PathBuf); 2] {
        [
            ("foods_workbook", &self.foods_workbook),
            ("dishes_workbook", &self.dishes_workbook),
        ]
    }
}

// ============================================================================
// Taxonomy (foodTypes.json)
// ============================================================================

/// Food-type classification and the file each type's records live in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "foodTypes", default)]
    pub food_types: IndexMap<String, FoodType>,

    /// Top-level keys other than `foodTypes`, kept on rewrite.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// One food type: its subtypes and output file name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodType {
    #[serde(rename = "subTypes", default)]
    pub sub_types: Vec<String>,

    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Keys recorded on the entry by hand (icons, labels, ...), kept on rewrite.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl FoodType {
    /// A freshly discovered type: no subtypes yet, file named after the type.
    pub fn new(type_name: &str) -> Self {
        Self {
            sub_types: Vec::new(),
            file_name: Some(default_file_name(type_name)),
            extra: IndexMap::new(),
        }
    }

    /// The recorded file name, or `<type>.json` when none was recorded.
    pub fn file_name_or_default(&self, type_name: &str) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| default_file_name(type_name))
    }
}

fn default_file_name(type_name: &str) -> String {
    format!("{}.json", type_name)
}

// ============================================================================
// Food records (one file per type)
// ============================================================================

/// One food row, reshaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub food_type: Option<String>,

    #[serde(default)]
    pub sub_type: Option<String>,

    #[serde(default, serialize_with = "whole::opt")]
    pub calories: Option<f64>,

    #[serde(default, serialize_with = "whole::opt")]
    pub protein: Option<f64>,

    #[serde(default, serialize_with = "whole::opt")]
    pub carbs: Option<f64>,

    #[serde(default, serialize_with = "whole::opt")]
    pub fat: Option<f64>,

    #[serde(default = "default_serving_size", serialize_with = "whole::one")]
    pub serving_size: f64,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub alias: Vec<String>,

    #[serde(default)]
    pub vitamins: Vitamins,

    #[serde(default)]
    pub minerals: Minerals,

    /// Spreadsheet columns outside the known schema, carried through as-is.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// Serving size used when the sheet leaves it blank.
pub const DEFAULT_SERVING_SIZE: f64 = 100.0;

fn default_serving_size() -> f64 {
    DEFAULT_SERVING_SIZE
}

/// Vitamin content. `None` serializes as `null` (cell present but empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitamins {
    #[serde(rename = "A", default, serialize_with = "whole::opt")]
    pub a: Option<f64>,
    #[serde(rename = "C", default, serialize_with = "whole::opt")]
    pub c: Option<f64>,
    #[serde(rename = "D", default, serialize_with = "whole::opt")]
    pub d: Option<f64>,
    #[serde(rename = "E", default, serialize_with = "whole::opt")]
    pub e: Option<f64>,
}

/// Mineral content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Minerals {
    #[serde(default, serialize_with = "whole::opt")]
    pub calcium: Option<f64>,
    #[serde(default, serialize_with = "whole::opt")]
    pub iron: Option<f64>,
    #[serde(default, serialize_with = "whole::opt")]
    pub magnesium: Option<f64>,
    #[serde(default, serialize_with = "whole::opt")]
    pub potassium: Option<f64>,
}

/// Amounts are held as `f64`; whole amounts are written as JSON integers
/// (`144`, not `144.0`).
mod whole {
    use serde::Serializer;

    // beyond 2^53 an f64 no longer holds every integer exactly
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

    pub fn one<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() < EXACT_LIMIT {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => one(v, serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// A per-type food file: `{ typeName: { idString: FoodRecord } }`.
pub type FoodFile = IndexMap<String, IndexMap<String, FoodRecord>>;

/// A per-type food file read record by record, without committing to the
/// full `FoodRecord` schema. Readers decode each record on its own so one
/// malformed record cannot hide the rest of the file.
pub type FoodFileEntries = IndexMap<String, IndexMap<String, serde_json::Value>>;

/// The part of a stored food record that name lookup needs. Other keys are
/// ignored, whatever their shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FoodEntry {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "subType", default)]
    pub sub_type: Option<String>,

    #[serde(default)]
    pub alias: Option<Vec<String>>,
}

// ============================================================================
// Dishes
// ============================================================================

/// A recipe whose ingredients are still human-readable names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRaw {
    pub id: i64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dish_type: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foods: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// A recipe whose ingredients are numeric food ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishResolved {
    pub id: i64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dish_type: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub foods: Vec<i64>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl DishRaw {
    /// Keep everything but the ingredient list, which becomes `foods`.
    pub fn with_food_ids(&self, foods: Vec<i64>) -> DishResolved {
        DishResolved {
            id: self.id,
            dish_type: self.dish_type.clone(),
            name: self.name.clone(),
            foods,
            extra: self.extra.clone(),
        }
    }
}

/// `{ idString: DishRaw }`
pub type RawDishes = IndexMap<String, DishRaw>;

/// `{ idString: DishResolved }`
pub type ResolvedDishes = IndexMap<String, DishResolved>;

// ============================================================================
// Diagnostic report
// ============================================================================

/// Missing-ingredient report written next to the resolved recipes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingReport {
    pub missing_ingredients: IndexMap<String, MissingDish>,
    pub all_unique_ingredients: Vec<String>,
    pub all_unique_missing_ingredients: Vec<String>,
}

/// One recipe's unresolved ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingDish {
    pub name: String,
    pub missing_ingredients: Vec<String>,
}
