//! NP-007: Raw recipe conversion — one record per row with an id, multi-value
//! cells split into ordered lists, all sheets merged into one file.

use crate::core::error::PrepError;
use crate::core::store;
use crate::core::types::{DataPaths, DishRaw, RawDishes};
use crate::sheet::{self, Row, Workbook};
use indexmap::IndexMap;

/// Characters accepted between list items: comma, full-width comma,
/// ideographic enumeration mark.
pub const LIST_SEPARATORS: [char; 3] = [',', '，', '、'];

/// Split a multi-value cell. With any separator present, the non-ASCII
/// separators are normalised to `,` and each piece is trimmed; otherwise the
/// whole trimmed text is the only element.
pub fn split_list(raw: &str) -> Vec<String> {
    if !raw.contains(LIST_SEPARATORS) {
        return vec![raw.trim().to_string()];
    }
    raw.replace(['，', '、'], ",")
        .split(',')
        .map(|piece| piece.trim().to_string())
        .collect()
}

/// Build a raw dish from a row. None when the row has no usable id.
pub fn dish_from_row(row: &Row<'_>) -> Option<DishRaw> {
    let id_cell = row.value("id")?;
    let Some(id) = id_cell.to_i64() else {
        tracing::warn!(id = ?id_cell, "dish id is not a number, skipping row");
        return None;
    };

    let list = |column: &str| {
        row.value(column)
            .and_then(|c| c.to_text())
            .map(|text| split_list(&text))
    };

    Some(DishRaw {
        id,
        dish_type: list("type"),
        name: row.value("name").and_then(|c| c.to_text()),
        foods: list("foods"),
        extra: IndexMap::new(),
    })
}

/// Convert every sheet, keyed by id string. Later sheets win on duplicate ids.
pub fn convert_workbook(workbook: &Workbook) -> RawDishes {
    let mut dishes = RawDishes::new();
    for sheet in &workbook.sheets {
        tracing::info!(sheet = %sheet.name, columns = ?sheet.headers, "processing dish sheet");
        let before = dishes.len();
        for row in sheet.rows() {
            let Some(dish) = dish_from_row(&row) else {
                continue;
            };
            let key = dish.id.to_string();
            if dishes.contains_key(&key) {
                tracing::warn!(sheet = %sheet.name, id = %key, "duplicate dish id, later row wins");
            }
            dishes.insert(key, dish);
        }
        tracing::debug!(sheet = %sheet.name, added = dishes.len() - before, "sheet done");
    }
    dishes
}

/// Run the converter: read the dishes workbook, write the raw dish file.
pub fn convert_dishes(paths: &DataPaths) -> Result<RawDishes, PrepError> {
    let workbook = sheet::open_workbook(&paths.dishes_workbook)?;
    tracing::info!(
        workbook = %paths.dishes_workbook.display(),
        sheets = ?workbook.sheet_names(),
        "converting dishes"
    );
    let dishes = convert_workbook(&workbook);
    store::save_json(&paths.dishes_raw, &dishes)?;
    Ok(dishes)
}
