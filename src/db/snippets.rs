use anyhow::Result;
use rusqlite::Connection;

use crate::config::Snippet;

pub fn get_all(conn: &Connection) -> Result<Vec<Snippet>> {
    let mut stmt = conn.prepare("SELECT trigger_key, content FROM snippets ORDER BY id")?;
    let entries = stmt
        .query_map([], |row| {
            Ok(Snippet {
                trigger: row.get(0)?,
                content: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Inserts the snippet, or replaces the content of the one with the same key.
pub fn upsert(conn: &Connection, snippet: &Snippet) -> Result<()> {
    conn.execute(
        "INSERT INTO snippets (trigger_key, content) VALUES (?1, ?2)
         ON CONFLICT(trigger_key) DO UPDATE SET content = ?2, updated_at = CURRENT_TIMESTAMP",
        [&snippet.trigger, &snippet.content],
    )?;
    Ok(())
}

pub fn replace_all(conn: &mut Connection, snippets: &[Snippet]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM snippets", [])?;
    for snippet in snippets {
        upsert(&tx, snippet)?;
    }
    tx.commit()?;
    Ok(())
}
