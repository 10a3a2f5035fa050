//! NP-010: CLI subcommands — init, validate, taxonomy, foods, dishes, resolve, run, export-csv.

use crate::core::error::PrepError;
use crate::core::{parser, store, types};
use crate::jobs::{dishes, export, foods, resolver, taxonomy};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new nutriprep project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate nutriprep.yaml and check that input workbooks exist
    Validate {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,
    },

    /// Extract food types and subtypes into the taxonomy file
    Taxonomy {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,
    },

    /// Split the food workbook into one JSON file per food type
    Foods {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,
    },

    /// Convert the dish workbook into raw dish JSON
    Dishes {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,
    },

    /// Resolve dish ingredient names to food ids and report missing ones
    Resolve {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,

        /// Exit non-zero if any ingredient is unresolved (for CI)
        #[arg(long)]
        strict: bool,
    },

    /// Run taxonomy, foods, dishes, and resolve in order
    Run {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,

        /// Exit non-zero if any ingredient is unresolved (for CI)
        #[arg(long)]
        strict: bool,
    },

    /// Export every food record to a flat CSV file
    ExportCsv {
        /// Path to nutriprep.yaml
        #[arg(short, long, default_value = "nutriprep.yaml")]
        config: PathBuf,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), PrepError> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Taxonomy { config } => cmd_taxonomy(&parser::load_data_paths(&config)?),
        Commands::Foods { config } => cmd_foods(&parser::load_data_paths(&config)?),
        Commands::Dishes { config } => cmd_dishes(&parser::load_data_paths(&config)?),
        Commands::Resolve { config, strict } => {
            cmd_resolve(&parser::load_data_paths(&config)?, strict)
        }
        Commands::Run { config, strict } => cmd_run(&parser::load_data_paths(&config)?, strict),
        Commands::ExportCsv { config } => cmd_export_csv(&parser::load_data_paths(&config)?),
    }
}

const CONFIG_TEMPLATE: &str = r#"version: "1.0"

# Relative paths resolve against this file's directory.
paths:
  foods_workbook: foods.xlsx
  dishes_workbook: dishs.xlsx
  food_dir: data/foods
  taxonomy: data/foods/foodTypes.json
  dishes_raw: data/dishs/dishsRaw.json
  dishes: data/dishs/dishs.json
  missing_report: missing_ingredients.json
  foods_csv: foods.csv
"#;

fn cmd_init(path: &Path) -> Result<(), PrepError> {
    let config_path = path.join("nutriprep.yaml");
    if config_path.exists() {
        return Err(PrepError::AlreadyExists(config_path));
    }

    let defaults = types::DataPaths::default();
    for dir in [&defaults.food_dir, &parent_of(&defaults.dishes_raw)] {
        let dir = path.join(dir);
        std::fs::create_dir_all(&dir).map_err(PrepError::io("create dir", &dir))?;
    }
    std::fs::write(&config_path, CONFIG_TEMPLATE).map_err(PrepError::io("write", &config_path))?;

    println!("Initialized nutriprep project at {}", path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", path.join(&defaults.food_dir).display());
    Ok(())
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn cmd_validate(file: &Path) -> Result<(), PrepError> {
    let config = parser::parse_config_file(file)?;
    let mut errors: Vec<String> = parser::validate_config(&config)
        .into_iter()
        .map(|e| e.message)
        .collect();

    let paths = parser::resolve_paths(&config.paths, &parser::config_base_dir(file));
    for (label, input) in paths.inputs() {
        if !input.exists() {
            errors.push(format!("input '{}' not found: {}", label, input.display()));
        }
    }

    if errors.is_empty() {
        println!(
            "OK: {} (foods: {}, dishes: {})",
            file.display(),
            paths.foods_workbook.display(),
            paths.dishes_workbook.display()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(PrepError::Validation(errors.len()))
    }
}

fn cmd_taxonomy(paths: &types::DataPaths) -> Result<(), PrepError> {
    let report = taxonomy::extract_taxonomy(paths)?;
    for sheet in &report.sheets {
        println!("{}: {} type(s)", sheet.sheet, sheet.types.len());
    }

    let saved: types::Taxonomy = store::load_json(&paths.taxonomy)?;
    println!();
    for (name, info) in &saved.food_types {
        println!("{}:", name);
        println!("  file: {}", info.file_name_or_default(name));
        println!("  subtypes: {}", info.sub_types.join(", "));
    }

    println!();
    println!(
        "Taxonomy: {} type(s), {} added, {} new subtype(s) -> {}",
        report.total_types,
        report.types_added,
        report.subtypes_added,
        paths.taxonomy.display()
    );
    Ok(())
}

fn cmd_foods(paths: &types::DataPaths) -> Result<(), PrepError> {
    let report = foods::split_foods(paths)?;
    for file in &report.files {
        println!(
            "  {} -> {} ({} records)",
            file.food_type,
            file.path.display(),
            file.records
        );
    }
    for skipped in &report.skipped_types {
        println!("  SKIPPED: '{}' is not declared in the taxonomy", skipped);
    }
    println!(
        "Foods: {} file(s) written, {} type(s) skipped.",
        report.files.len(),
        report.skipped_types.len()
    );
    Ok(())
}

fn cmd_dishes(paths: &types::DataPaths) -> Result<(), PrepError> {
    let dishes = dishes::convert_dishes(paths)?;
    println!(
        "Dishes: {} converted -> {}",
        dishes.len(),
        paths.dishes_raw.display()
    );
    Ok(())
}

fn cmd_resolve(paths: &types::DataPaths, strict: bool) -> Result<(), PrepError> {
    let resolution = resolver::resolve_dishes(paths)?;
    let report = &resolution.report;

    println!(
        "Resolved {} dish(es), {} distinct ingredient(s) -> {}",
        resolution.dishes.len(),
        report.all_unique_ingredients.len(),
        paths.dishes.display()
    );

    if report.missing_ingredients.is_empty() {
        println!("All ingredients resolved.");
        return Ok(());
    }

    println!(
        "{} dish(es) reference {} distinct unknown ingredient(s); kept, with those ingredients dropped:",
        report.missing_ingredients.len(),
        report.all_unique_missing_ingredients.len()
    );
    for (id, missing) in report.missing_ingredients.iter().take(5) {
        println!(
            "  {} ({}): {}",
            missing.name,
            id,
            missing.missing_ingredients.join(", ")
        );
    }
    println!("Report: {}", paths.missing_report.display());

    if strict {
        return Err(PrepError::Unresolved(resolution.unresolved));
    }
    Ok(())
}

fn cmd_run(paths: &types::DataPaths, strict: bool) -> Result<(), PrepError> {
    cmd_taxonomy(paths)?;
    println!();
    cmd_foods(paths)?;
    println!();
    cmd_dishes(paths)?;
    println!();
    cmd_resolve(paths, strict)
}

fn cmd_export_csv(paths: &types::DataPaths) -> Result<(), PrepError> {
    let count = export::export_csv(paths)?;
    println!("Exported {} food(s) -> {}", count, paths.foods_csv.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOODS_CSV: &str = "id,name,type,subType,alias,calories,vitaminC,servingSize\n\
        1,鸡蛋,蛋类,禽蛋,鸡子,144,,\n\
        2,牛奶,乳类,鲜奶,,54,1,250\n\
        3,豆腐,豆类,豆制品,\"北豆腐, 南豆腐\",81,,\n";

    const DISHES_CSV: &str = "id,name,type,foods\n\
        10,蛋奶羹,甜品,\"鸡蛋，牛奶、豆腐\"\n\
        11,怪味菜,家常菜、下饭,\"鸡子,不存在的食材\"\n\
        ,无编号,,鸡蛋\n";

    fn project(dir: &Path) -> PathBuf {
        std::fs::write(dir.join("foods.csv"), FOODS_CSV).unwrap();
        std::fs::write(dir.join("dishes.csv"), DISHES_CSV).unwrap();
        let config = dir.join("nutriprep.yaml");
        std::fs::write(
            &config,
            r#"
version: "1.0"
paths:
  foods_workbook: foods.csv
  dishes_workbook: dishes.csv
  foods_csv: out/foods_flat.csv
"#,
        )
        .unwrap();
        config
    }

    #[test]
    fn test_np010_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("diet-data");
        std::fs::create_dir_all(&sub).unwrap();
        cmd_init(&sub).unwrap();
        assert!(sub.join("nutriprep.yaml").exists());
        assert!(sub.join("data/foods").is_dir());
        assert!(sub.join("data/dishs").is_dir());

        // the template parses and validates
        let config = parser::parse_config_file(&sub.join("nutriprep.yaml")).unwrap();
        assert!(parser::validate_config(&config).is_empty());
        assert_eq!(config.paths, types::DataPaths::default());
    }

    #[test]
    fn test_np010_init_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nutriprep.yaml"), "exists").unwrap();
        let result = cmd_init(dir.path());
        assert!(matches!(result, Err(PrepError::AlreadyExists(_))));
    }

    #[test]
    fn test_np010_validate_valid() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        cmd_validate(&config).unwrap();
    }

    #[test]
    fn test_np010_validate_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("nutriprep.yaml");
        std::fs::write(&config, "version: \"1.0\"\n").unwrap();
        let result = cmd_validate(&config);
        assert!(matches!(result, Err(PrepError::Validation(2))));
    }

    #[test]
    fn test_np010_validate_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        std::fs::write(
            &config,
            "version: \"2.0\"\npaths:\n  foods_workbook: foods.csv\n  dishes_workbook: dishes.csv\n  foods_csv: flat.csv\n",
        )
        .unwrap();
        let result = cmd_validate(&config);
        assert!(matches!(result, Err(PrepError::Validation(1))));
    }

    #[test]
    fn test_np010_run_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        dispatch(Commands::Run {
            config: config.clone(),
            strict: false,
        })
        .unwrap();

        let taxonomy: types::Taxonomy =
            store::load_json(&dir.path().join("data/foods/foodTypes.json")).unwrap();
        let keys: Vec<_> = taxonomy.food_types.keys().collect();
        assert_eq!(keys, vec!["蛋类", "乳类", "豆类"]);

        let eggs: types::FoodFile =
            store::load_json(&dir.path().join("data/foods/蛋类.json")).unwrap();
        assert_eq!(eggs["蛋类"]["1"].serving_size, 100.0);
        assert_eq!(eggs["蛋类"]["1"].alias, vec!["鸡子"]);

        let raw: types::RawDishes =
            store::load_json(&dir.path().join("data/dishs/dishsRaw.json")).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(
            raw["10"].foods.as_deref().unwrap(),
            ["鸡蛋", "牛奶", "豆腐"]
        );

        let resolved: types::ResolvedDishes =
            store::load_json(&dir.path().join("data/dishs/dishs.json")).unwrap();
        assert_eq!(resolved["10"].foods, vec![1, 2, 3]);
        assert_eq!(resolved["11"].foods, vec![1]);
        assert_eq!(
            resolved["11"].dish_type.as_deref().unwrap(),
            ["家常菜", "下饭"]
        );

        let report: types::MissingReport =
            store::load_json(&dir.path().join("missing_ingredients.json")).unwrap();
        assert_eq!(
            report.missing_ingredients["11"].missing_ingredients,
            vec!["不存在的食材"]
        );
        assert_eq!(report.all_unique_missing_ingredients, vec!["不存在的食材"]);
    }

    #[test]
    fn test_np010_run_strict_fails_on_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        let result = dispatch(Commands::Run {
            config,
            strict: true,
        });
        assert!(matches!(result, Err(PrepError::Unresolved(1))));
        // outputs are still written before the strict check fails
        assert!(dir.path().join("data/dishs/dishs.json").exists());
    }

    #[test]
    fn test_np010_resolve_without_raw_dishes_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        dispatch(Commands::Taxonomy {
            config: config.clone(),
        })
        .unwrap();
        let result = dispatch(Commands::Resolve {
            config,
            strict: false,
        });
        assert!(matches!(result, Err(PrepError::Io { .. })));
    }

    #[test]
    fn test_np010_dispatch_each_step() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        dispatch(Commands::Taxonomy {
            config: config.clone(),
        })
        .unwrap();
        dispatch(Commands::Foods {
            config: config.clone(),
        })
        .unwrap();
        dispatch(Commands::Dishes {
            config: config.clone(),
        })
        .unwrap();
        dispatch(Commands::Resolve {
            config: config.clone(),
            strict: false,
        })
        .unwrap();
        dispatch(Commands::ExportCsv { config }).unwrap();

        let csv = std::fs::read_to_string(dir.path().join("out/foods_flat.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains("豆腐"));
    }

    #[test]
    fn test_np010_foods_before_taxonomy_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        let result = dispatch(Commands::Foods { config });
        assert!(result.is_err());
    }

    #[test]
    fn test_np010_dispatch_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dispatch-test");
        std::fs::create_dir_all(&sub).unwrap();
        dispatch(Commands::Init { path: sub.clone() }).unwrap();
        assert!(sub.join("nutriprep.yaml").exists());
    }
}
