use crate::models::category::{Category, CategoryKind, NewCategory};
use crate::db::queries::cents_param;
use crate::models::cents_to_decimal;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::debug;

const CATEGORY_COLUMNS: &str = "id, name, kind, budget_cents, description";

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: CategoryKind::parse(&kind),
        budget: cents_to_decimal(row.get(3)?),
        description: row.get(4)?,
    })
}

/// Categories of one kind, in creation order.
pub fn list_categories(conn: &Connection, kind: CategoryKind) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE kind = ? ORDER BY id"
    ))?;

    let categories = stmt
        .query_map([kind.as_str()], map_category)?
        .filter_map(|c| c.ok())
        .collect();

    Ok(categories)
}

pub fn get_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"),
        [id],
        map_category,
    )
    .optional()
}

pub fn create_category(
    conn: &Connection,
    kind: CategoryKind,
    category: &NewCategory,
) -> rusqlite::Result<i64> {
    let budget_cents = match kind {
        CategoryKind::Expense => cents_param(category.budget)?,
        CategoryKind::Income => 0,
    };
    conn.execute(
        "INSERT INTO categories (name, kind, budget_cents, description) VALUES (?, ?, ?, ?)",
        params![category.name, kind.as_str(), budget_cents, category.description],
    )?;
    let id = conn.last_insert_rowid();
    debug!(category_id = id, name = %category.name, kind = kind.as_str(), "Created category");
    Ok(id)
}

/// Set the monthly budget of an expense category. Income categories are left alone.
pub fn set_budget(conn: &Connection, id: i64, budget: Decimal) -> rusqlite::Result<bool> {
    let budget_cents = cents_param(budget)?;
    let rows = conn.execute(
        "UPDATE categories SET budget_cents = ?, updated_at = datetime('now')
         WHERE id = ? AND kind = 'expense'",
        params![budget_cents, id],
    )?;
    if rows > 0 {
        debug!(category_id = id, budget = %budget, "Updated budget");
    }
    Ok(rows > 0)
}

pub fn delete_category(conn: &Connection, id: i64, kind: CategoryKind) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM categories WHERE id = ? AND kind = ?",
        params![id, kind.as_str()],
    )?;
    if rows > 0 {
        debug!(category_id = id, "Deleted category");
    }
    Ok(rows > 0)
}
