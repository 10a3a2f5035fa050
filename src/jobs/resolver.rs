//! NP-008: Ingredient resolution — index the food database by name and alias,
//! rewrite recipe ingredient names to food ids, and report what is missing.
//!
//! Lookup order for an ingredient string:
//! 1. exact food name
//! 2. alias → canonical name → food
//!
//! Collisions are last-write-wins, both for names across types and for
//! aliases. Unresolved ingredients are dropped from the resolved list and
//! collected into a `MissingReport`; no recipe is ever dropped.

use crate::core::error::PrepError;
use crate::core::store;
use crate::core::types::{
    DataPaths, FoodEntry, FoodFileEntries, MissingDish, MissingReport, RawDishes,
    ResolvedDishes, Taxonomy,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// What a food name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodRef {
    pub id: i64,
    pub food_type: String,
    pub sub_type: String,
}

/// Name and alias lookup over the whole food database. Built fresh per run.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    foods: IndexMap<String, FoodRef>,
    aliases: IndexMap<String, String>,
}

impl NameIndex {
    /// Index one record under its type. Records without a name are ignored.
    pub fn insert(&mut self, food_type: &str, record: &FoodEntry) {
        let Some(name) = record.name.as_ref() else {
            return;
        };
        if let Some(prev) = self.foods.get(name) {
            tracing::debug!(name = %name, previous = prev.id, current = record.id, "food name collision, later record wins");
        }
        self.foods.insert(
            name.clone(),
            FoodRef {
                id: record.id,
                food_type: food_type.to_string(),
                sub_type: record.sub_type.clone().unwrap_or_default(),
            },
        );
        for alias in record.alias.iter().flatten() {
            self.aliases.insert(alias.clone(), name.clone());
        }
    }

    /// Index every record of a per-type file that sits under `food_type`.
    /// A record without a usable id is skipped on its own.
    pub fn insert_file(&mut self, food_type: &str, file: &FoodFileEntries) {
        let Some(records) = file.get(food_type) else {
            return;
        };
        for (key, value) in records {
            match FoodEntry::deserialize(value) {
                Ok(record) => self.insert(food_type, &record),
                Err(e) => tracing::warn!(food_type, key = %key, "skipping unreadable food record: {}", e),
            }
        }
    }

    /// Resolve an ingredient by exact name, then by alias.
    pub fn lookup(&self, ingredient: &str) -> Option<&FoodRef> {
        if let Some(food) = self.foods.get(ingredient) {
            return Some(food);
        }
        self.aliases
            .get(ingredient)
            .and_then(|name| self.foods.get(name))
    }

    pub fn food_count(&self) -> usize {
        self.foods.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Load every per-type food file the taxonomy declares into one index.
/// A file that fails to load is logged and contributes nothing.
pub fn load_index(taxonomy: &Taxonomy, food_dir: &Path) -> NameIndex {
    let mut index = NameIndex::default();
    for (food_type, info) in &taxonomy.food_types {
        let Some(file_name) = info.file_name.as_deref() else {
            tracing::debug!(food_type = %food_type, "no fileName recorded, skipping");
            continue;
        };
        let path = food_dir.join(file_name);
        match store::load_json::<FoodFileEntries>(&path) {
            Ok(file) => index.insert_file(food_type, &file),
            Err(e) => tracing::warn!(food_type = %food_type, "cannot load food file: {}", e),
        }
    }
    index
}

/// Resolved dishes plus the diagnostic report.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub dishes: ResolvedDishes,
    pub report: MissingReport,
    /// Total unresolved ingredient occurrences (not deduplicated).
    pub unresolved: usize,
}

/// Rewrite every dish's ingredient names to food ids.
pub fn resolve(dishes: &RawDishes, index: &NameIndex) -> Resolution {
    let mut resolved = ResolvedDishes::new();
    let mut missing: IndexMap<String, MissingDish> = IndexMap::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut seen_missing: BTreeSet<&str> = BTreeSet::new();
    let mut unresolved = 0;

    for (key, dish) in dishes {
        let names = dish.foods.as_deref().unwrap_or_default();
        let mut ids = Vec::with_capacity(names.len());
        let mut missing_here = Vec::new();

        for name in names {
            seen.insert(name.as_str());
            match index.lookup(name) {
                Some(food) => ids.push(food.id),
                None => {
                    seen_missing.insert(name.as_str());
                    missing_here.push(name.clone());
                }
            }
        }

        if !missing_here.is_empty() {
            unresolved += missing_here.len();
            missing.insert(
                key.clone(),
                MissingDish {
                    name: dish
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("unnamed dish {}", key)),
                    missing_ingredients: missing_here,
                },
            );
        }
        resolved.insert(key.clone(), dish.with_food_ids(ids));
    }

    Resolution {
        dishes: resolved,
        report: MissingReport {
            missing_ingredients: missing,
            all_unique_ingredients: seen.into_iter().map(str::to_string).collect(),
            all_unique_missing_ingredients: seen_missing.into_iter().map(str::to_string).collect(),
        },
        unresolved,
    }
}

/// Run the resolver: load taxonomy, foods, raw dishes; write both outputs.
pub fn resolve_dishes(paths: &DataPaths) -> Result<Resolution, PrepError> {
    let taxonomy: Taxonomy = store::load_json(&paths.taxonomy)?;
    tracing::info!(types = taxonomy.food_types.len(), "loaded food taxonomy");

    let index = load_index(&taxonomy, &paths.food_dir);
    tracing::info!(
        foods = index.food_count(),
        aliases = index.alias_count(),
        "indexed food database"
    );

    let raw: RawDishes = store::load_json(&paths.dishes_raw)?;
    tracing::info!(dishes = raw.len(), "loaded raw dishes");

    let resolution = resolve(&raw, &index);
    if resolution.unresolved > 0 {
        tracing::warn!(
            occurrences = resolution.unresolved,
            dishes = resolution.report.missing_ingredients.len(),
            distinct = resolution.report.all_unique_missing_ingredients.len(),
            "unresolved ingredients dropped from foods"
        );
    }

    store::save_json(&paths.dishes, &resolution.dishes)?;
    store::save_json(&paths.missing_report, &resolution.report)?;
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DishRaw, FoodFile, FoodRecord, FoodType, Minerals, Vitamins};

    fn entry(id: i64, name: &str, aliases: &[&str]) -> FoodEntry {
        FoodEntry {
            id,
            name: Some(name.to_string()),
            sub_type: Some("子类".to_string()),
            alias: Some(aliases.iter().map(|a| a.to_string()).collect()),
        }
    }

    fn food(id: i64, name: &str, aliases: &[&str]) -> FoodRecord {
        FoodRecord {
            id,
            name: Some(name.to_string()),
            food_type: None,
            sub_type: Some("子类".to_string()),
            calories: None,
            protein: None,
            carbs: None,
            fat: None,
            serving_size: 100.0,
            unit: None,
            description: None,
            alias: aliases.iter().map(|a| a.to_string()).collect(),
            vitamins: Vitamins::default(),
            minerals: Minerals::default(),
            extra: IndexMap::new(),
        }
    }

    fn dish(id: i64, name: Option<&str>, foods: Option<&[&str]>) -> DishRaw {
        DishRaw {
            id,
            dish_type: None,
            name: name.map(str::to_string),
            foods: foods.map(|f| f.iter().map(|s| s.to_string()).collect()),
            extra: IndexMap::new(),
        }
    }

    fn raw(dishes: Vec<DishRaw>) -> RawDishes {
        dishes.into_iter().map(|d| (d.id.to_string(), d)).collect()
    }

    #[test]
    fn test_np008_alias_resolves_to_same_id() {
        let mut index = NameIndex::default();
        index.insert("水果", &entry(11, "Apple", &["Red Apple"]));
        assert_eq!(index.lookup("Apple").unwrap().id, 11);
        assert_eq!(index.lookup("Red Apple").unwrap().id, 11);
        assert_eq!(index.lookup("Red Apple").unwrap().food_type, "水果");
        assert!(index.lookup("Green Apple").is_none());
    }

    #[test]
    fn test_np008_name_beats_alias() {
        let mut index = NameIndex::default();
        index.insert("a", &entry(1, "番茄", &["西红柿"]));
        index.insert("b", &entry(2, "西红柿", &[]));
        assert_eq!(index.lookup("西红柿").unwrap().id, 2);
    }

    #[test]
    fn test_np008_last_write_wins() {
        let mut index = NameIndex::default();
        index.insert("a", &entry(1, "豆腐", &["老豆腐"]));
        index.insert("b", &entry(2, "豆腐", &[]));
        assert_eq!(index.food_count(), 1);
        assert_eq!(index.lookup("豆腐").unwrap().id, 2);
        // the alias follows the name to the later record
        assert_eq!(index.lookup("老豆腐").unwrap().id, 2);
    }

    #[test]
    fn test_np008_nameless_record_ignored() {
        let mut index = NameIndex::default();
        let mut r = entry(9, "x", &["别名"]);
        r.name = None;
        index.insert("a", &r);
        assert_eq!(index.food_count(), 0);
        assert_eq!(index.alias_count(), 0);
    }

    #[test]
    fn test_np008_missing_accounting() {
        let mut index = NameIndex::default();
        index.insert("蛋类", &entry(7, "鸡蛋", &[]));
        let dishes = raw(vec![dish(1, Some("蛋汤"), Some(&["鸡蛋", "不存在的食材"]))]);

        let res = resolve(&dishes, &index);
        assert_eq!(res.dishes["1"].foods, vec![7]);
        assert_eq!(
            res.report.missing_ingredients["1"].missing_ingredients,
            vec!["不存在的食材"]
        );
        assert_eq!(res.report.missing_ingredients["1"].name, "蛋汤");
        assert_eq!(res.unresolved, 1);
    }

    #[test]
    fn test_np008_every_dish_retained() {
        let index = NameIndex::default();
        let dishes = raw(vec![
            dish(1, None, Some(&["幽灵"])),
            dish(2, Some("白开水"), None),
        ]);
        let res = resolve(&dishes, &index);
        assert_eq!(res.dishes.len(), 2);
        assert!(res.dishes["1"].foods.is_empty());
        assert!(res.dishes["2"].foods.is_empty());
        assert_eq!(res.report.missing_ingredients["1"].name, "unnamed dish 1");
        assert!(!res.report.missing_ingredients.contains_key("2"));
    }

    #[test]
    fn test_np008_unique_lists_sorted() {
        let mut index = NameIndex::default();
        index.insert("t", &entry(1, "b", &[]));
        let dishes = raw(vec![
            dish(1, Some("x"), Some(&["c", "b", "a"])),
            dish(2, Some("y"), Some(&["a", "b", "c", "d"])),
        ]);
        let res = resolve(&dishes, &index);
        assert_eq!(res.report.all_unique_ingredients, vec!["a", "b", "c", "d"]);
        assert_eq!(res.report.all_unique_missing_ingredients, vec!["a", "c", "d"]);
        assert_eq!(res.unresolved, 5);
    }

    #[test]
    fn test_np008_duplicates_resolve_in_order() {
        let mut index = NameIndex::default();
        index.insert("t", &entry(1, "盐", &["食盐"]));
        index.insert("t", &entry(2, "油", &[]));
        let dishes = raw(vec![dish(1, Some("炒"), Some(&["油", "食盐", "盐", "油"]))]);
        let res = resolve(&dishes, &index);
        assert_eq!(res.dishes["1"].foods, vec![2, 1, 1, 2]);
    }

    fn write_fixture(dir: &Path) -> DataPaths {
        let paths = crate::core::parser::resolve_paths(&DataPaths::default(), dir);
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .food_types
            .insert("蛋类".to_string(), FoodType::new("蛋类"));
        taxonomy
            .food_types
            .insert("坏文件".to_string(), FoodType::new("坏文件"));
        taxonomy.food_types.insert(
            "无文件".to_string(),
            FoodType {
                sub_types: vec![],
                file_name: None,
                ..FoodType::default()
            },
        );
        store::save_json(&paths.taxonomy, &taxonomy).unwrap();

        let mut file: FoodFile = IndexMap::new();
        let mut eggs = IndexMap::new();
        eggs.insert("7".to_string(), food(7, "鸡蛋", &["鸡子"]));
        file.insert("蛋类".to_string(), eggs);
        store::save_json(&paths.food_dir.join("蛋类.json"), &file).unwrap();
        std::fs::write(paths.food_dir.join("坏文件.json"), "not json").unwrap();

        let dishes = raw(vec![
            dish(1, Some("蒸蛋"), Some(&["鸡子", "水"])),
            dish(2, Some("煮蛋"), Some(&["鸡蛋"])),
        ]);
        store::save_json(&paths.dishes_raw, &dishes).unwrap();
        paths
    }

    #[test]
    fn test_np008_resolve_dishes_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());

        let res = resolve_dishes(&paths).unwrap();
        assert_eq!(res.unresolved, 1);

        let written: ResolvedDishes = store::load_json(&paths.dishes).unwrap();
        assert_eq!(written["1"].foods, vec![7]);
        assert_eq!(written["2"].foods, vec![7]);

        let report: MissingReport = store::load_json(&paths.missing_report).unwrap();
        assert_eq!(report.all_unique_missing_ingredients, vec!["水"]);
        assert_eq!(report.all_unique_ingredients, vec!["水", "鸡子", "鸡蛋"]);
    }

    #[test]
    fn test_np008_malformed_record_does_not_hide_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = crate::core::parser::resolve_paths(&DataPaths::default(), dir.path());
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .food_types
            .insert("蛋类".to_string(), FoodType::new("蛋类"));
        store::save_json(&paths.taxonomy, &taxonomy).unwrap();

        std::fs::write(
            paths.food_dir.join("蛋类.json"),
            r#"{"蛋类": {
                "7": {"id": 7, "name": "鸡蛋", "servingSize": 100},
                "8": {"id": 8, "name": "鸭蛋", "vitamins": {"A": "微量"}, "servingSize": null},
                "9": {"name": "无编号"}
            }}"#,
        )
        .unwrap();
        let dishes = raw(vec![dish(1, Some("双蛋"), Some(&["鸡蛋", "鸭蛋", "无编号"]))]);
        store::save_json(&paths.dishes_raw, &dishes).unwrap();

        let res = resolve_dishes(&paths).unwrap();
        assert_eq!(res.dishes["1"].foods, vec![7, 8]);
        assert_eq!(res.report.all_unique_missing_ingredients, vec!["无编号"]);
    }

    #[test]
    fn test_np008_missing_taxonomy_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = crate::core::parser::resolve_paths(&DataPaths::default(), dir.path());
        assert!(resolve_dishes(&paths).is_err());
        assert!(!paths.dishes.exists());
    }

    #[test]
    fn test_np008_missing_raw_dishes_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());
        std::fs::remove_file(&paths.dishes_raw).unwrap();
        let err = resolve_dishes(&paths).unwrap_err();
        assert!(err.to_string().contains("dishsRaw.json"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_np008_resolved_never_longer_than_raw(
                known in proptest::collection::vec("[a-e]{1,2}", 0..6),
                foods in proptest::collection::vec(proptest::collection::vec("[a-g]{1,2}", 0..8), 0..6),
            ) {
                let mut index = NameIndex::default();
                for (i, name) in known.iter().enumerate() {
                    index.insert("t", &entry(i as i64, name, &[]));
                }
                let dishes: RawDishes = foods
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        let names: Vec<&str> = f.iter().map(String::as_str).collect();
                        (i.to_string(), dish(i as i64, None, Some(names.as_slice())))
                    })
                    .collect();

                let res = resolve(&dishes, &index);
                prop_assert_eq!(res.dishes.len(), dishes.len());
                for (key, d) in &dishes {
                    let raw_len = d.foods.as_ref().map_or(0, Vec::len);
                    let missing = res
                        .report
                        .missing_ingredients
                        .get(key)
                        .map_or(0, |m| m.missing_ingredients.len());
                    prop_assert!(res.dishes[key].foods.len() <= raw_len);
                    prop_assert_eq!(res.dishes[key].foods.len() + missing, raw_len);
                }
            }
        }
    }
}
