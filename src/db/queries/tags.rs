use crate::models::tag::{NewTag, Tag};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

fn map_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn list_tags(conn: &Connection) -> rusqlite::Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name, color, created_at FROM tags ORDER BY name")?;

    let tags = stmt
        .query_map([], map_tag)?
        .filter_map(|t| t.ok())
        .collect();

    Ok(tags)
}

pub fn get_tag(conn: &Connection, id: i64) -> rusqlite::Result<Option<Tag>> {
    conn.query_row(
        "SELECT id, name, color, created_at FROM tags WHERE id = ?",
        [id],
        map_tag,
    )
    .optional()
}

pub fn get_tag_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Tag>> {
    conn.query_row(
        "SELECT id, name, color, created_at FROM tags WHERE name = ?",
        [name],
        map_tag,
    )
    .optional()
}

pub fn create_tag(conn: &Connection, tag: &NewTag) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tags (name, color) VALUES (?, ?)",
        params![tag.name, tag.color],
    )?;
    let id = conn.last_insert_rowid();
    debug!(tag_id = id, name = %tag.name, "Created tag");
    Ok(id)
}

pub fn update_tag(conn: &Connection, id: i64, tag: &NewTag) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE tags SET name = ?, color = ? WHERE id = ?",
        params![tag.name, tag.color, id],
    )?;
    if rows > 0 {
        debug!(tag_id = id, name = %tag.name, "Updated tag");
    }
    Ok(rows > 0)
}

pub fn delete_tag(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM tags WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(tag_id = id, "Deleted tag");
    }
    Ok(rows > 0)
}
