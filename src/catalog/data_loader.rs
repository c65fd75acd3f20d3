use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{error, info, warn};

use super::{Catalog, ProductRecord, PRODUCT_COLUMNS};
use crate::config::StoreConfig;
use crate::error::{RecommendError, Result};

/// Reads the whole product table into a [`Catalog`].
///
/// Never fails: a store that cannot be reached or that holds no rows is
/// logged and yields [`Catalog::not_ready`], which disables search while the
/// process keeps serving.
pub fn load_catalog(config: &StoreConfig) -> Catalog {
    match fetch_product_records(config) {
        Ok(records) => {
            info!(
                table = %config.table,
                products = records.len(),
                "product catalog loaded"
            );
            Catalog::from_records(records)
        }
        Err(e @ RecommendError::EmptyCatalog { .. }) => {
            warn!("{}; search is disabled", e);
            Catalog::not_ready()
        }
        Err(e) => {
            error!(
                database = %config.database_path.display(),
                "failed to load product catalog: {}; search is disabled",
                e
            );
            Catalog::not_ready()
        }
    }
}

/// Runs the single catalog query against the store.
///
/// The connection is opened read-only and closed before returning, whether
/// the query succeeded or not.
pub fn fetch_product_records(config: &StoreConfig) -> Result<Vec<ProductRecord>> {
    validate_table_name(&config.table)?;

    let conn = Connection::open_with_flags(
        &config.database_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let fetched = query_products(&conn, &config.table);
    if let Err((_, e)) = conn.close() {
        warn!("failed to close product store connection: {}", e);
    }

    let records = fetched?;
    if records.is_empty() {
        return Err(RecommendError::EmptyCatalog {
            table: config.table.clone(),
        });
    }
    Ok(records)
}

fn query_products(conn: &Connection, table: &str) -> Result<Vec<ProductRecord>> {
    let sql = format!("SELECT {} FROM {}", PRODUCT_COLUMNS.join(", "), table);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(ProductRecord {
            report_no: text_column(row, 0)?,
            product_name: text_column(row, 1)?,
            raw_materials_text: text_column(row, 2)?,
            manufacturer: text_column(row, 3)?,
            nutrient_text: text_column(row, 4)?,
        })
    })?;
    let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

// NULL becomes "", numeric identifiers keep their decimal text.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    })
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub(crate) fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RecommendError::InvalidTable(table.to_string()))
    }
}
