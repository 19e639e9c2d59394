//! LanceDB connection and table helpers.
use anyhow::{Context, Result};
use lancedb::{connect, Connection};
use std::path::Path;

use crate::schema::build_chunk_schema;

pub async fn open_db(path: &Path) -> Result<Connection> {
    std::fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let uri = path.to_string_lossy();
    connect(uri.as_ref()).execute().await.context("Failed to connect to lancedb")
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Open `name`, creating an empty chunk table with `dim`-wide vectors if missing.
pub async fn ensure_table(conn: &Connection, name: &str, dim: usize) -> Result<lancedb::Table> {
    if !table_exists(conn, name).await? {
        tracing::info!(table = name, dim, "creating chunk table");
        conn.create_empty_table(name, build_chunk_schema(dim)).execute().await.context("Failed to create lancedb table")?;
    }
    conn.open_table(name).execute().await.context("Failed to open lancedb table")
}
