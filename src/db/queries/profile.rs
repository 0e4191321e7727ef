use rusqlite::{params, Connection};
use std::collections::HashMap;

use crate::models::Profile;

fn get_all_settings(conn: &Connection) -> rusqlite::Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;

    let settings = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()?;

    Ok(settings)
}

pub fn get_profile(conn: &Connection) -> rusqlite::Result<Profile> {
    Ok(Profile::from_map(get_all_settings(conn)?))
}

/// Persist every profile field in one transaction.
pub fn save_profile(conn: &Connection, profile: &Profile) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in profile.to_map() {
        tx.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
    }
    tx.commit()?;
    tracing::debug!(username = %profile.username, "Saved profile");
    Ok(())
}
