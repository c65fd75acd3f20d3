use csv::ReaderBuilder;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

use super::{ProductRecord, PRODUCT_COLUMNS};
use crate::catalog::data_loader::validate_table_name;
use crate::config::StoreConfig;
use crate::error::{RecommendError, Result};

fn parse_products_csv(csv_path: &Path) -> Result<Vec<ProductRecord>> {
    if !csv_path.exists() {
        return Err(RecommendError::CsvImport(format!(
            "products CSV file not found at: {:?}",
            csv_path
        )));
    }

    let file = std::fs::File::open(csv_path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    let mut column_idx = [0usize; 5];
    for (slot, name) in column_idx.iter_mut().zip(PRODUCT_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| RecommendError::CsvImport(format!("Column '{}' not found", name)))?;
    }

    let mut products = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(column_idx[i]).unwrap_or("").trim().to_string();

        let report_no = field(0);
        if report_no.is_empty() {
            debug!(row = row_index + 1, "skipping CSV row without report_no");
            continue;
        }
        products.push(ProductRecord {
            report_no,
            product_name: field(1),
            raw_materials_text: field(2),
            manufacturer: field(3),
            nutrient_text: field(4),
        });
    }
    Ok(products)
}

/// Seeds the product store from a CSV export.
///
/// Creates the table when missing and, with `replace`, clears it first. All
/// rows go in one transaction. Returns the number of products written.
pub fn import_products_csv(csv_path: &Path, store: &StoreConfig, replace: bool) -> Result<usize> {
    validate_table_name(&store.table)?;
    let products = parse_products_csv(csv_path)?;
    if products.is_empty() {
        return Err(RecommendError::CsvImport(format!(
            "no products with a report_no in {:?}",
            csv_path
        )));
    }

    let mut conn = Connection::open(&store.database_path)?;
    let column_defs = PRODUCT_COLUMNS
        .iter()
        .map(|c| format!("{} TEXT", c))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        store.table, column_defs
    ))?;

    let tx = conn.transaction()?;
    if replace {
        tx.execute(&format!("DELETE FROM {}", store.table), [])?;
    }
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
            store.table,
            PRODUCT_COLUMNS.join(", ")
        ))?;
        for p in &products {
            stmt.execute(params![
                p.report_no,
                p.product_name,
                p.raw_materials_text,
                p.manufacturer,
                p.nutrient_text
            ])?;
        }
    }
    tx.commit()?;

    info!(
        table = %store.table,
        imported = products.len(),
        "imported products from {}",
        csv_path.display()
    );
    Ok(products.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::data_loader::fetch_product_records;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_test_csv_file() -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "report_no,product_name,raw_materials_text,manufacturer,nutrient_text,capacity"
        )?;
        writeln!(file, "A1,Shrimp Crackers,wheat flour shrimp,M1,N1,90g")?;
        writeln!(file, "A2,Choco Pie,\"flour, cocoa, sugar\",M2,N2,360g")?;
        writeln!(file, ",Nameless,water,M3,N3,1L")?; // no report_no
        writeln!(file, "A3,Cola,,,,")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_parse_products_csv_success() -> anyhow::Result<()> {
        let file = create_test_csv_file()?;
        let products = parse_products_csv(file.path())?;

        assert_eq!(products.len(), 3);
        assert_eq!(products[1].raw_materials_text, "flour, cocoa, sugar");
        assert_eq!(products[2].report_no, "A3");
        assert_eq!(products[2].manufacturer, "");
        Ok(())
    }

    #[test]
    fn test_parse_products_csv_missing_column() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "report_no,product_name,manufacturer,nutrient_text")?;
        writeln!(file, "A1,Shrimp Crackers,M1,N1")?;
        file.flush()?;

        let result = parse_products_csv(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Column 'raw_materials_text' not found"));
        Ok(())
    }

    #[test]
    fn test_parse_products_csv_file_not_found() {
        let result = parse_products_csv(Path::new("this_file_does_not_exist.csv"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("products CSV file not found"));
    }

    #[test]
    fn test_import_then_fetch() -> anyhow::Result<()> {
        let file = create_test_csv_file()?;
        let dir = TempDir::new()?;
        let store = StoreConfig::new(dir.path().join("products.db"), "products");

        assert_eq!(import_products_csv(file.path(), &store, false)?, 3);
        let records = fetch_product_records(&store)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].product_name, "Shrimp Crackers");

        // Appending doubles the rows, replacing resets them.
        import_products_csv(file.path(), &store, false)?;
        assert_eq!(fetch_product_records(&store)?.len(), 6);
        import_products_csv(file.path(), &store, true)?;
        assert_eq!(fetch_product_records(&store)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_import_rejects_csv_without_products() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "report_no,product_name,raw_materials_text,manufacturer,nutrient_text"
        )?;
        file.flush()?;
        let dir = TempDir::new()?;
        let store = StoreConfig::new(dir.path().join("products.db"), "products");

        let result = import_products_csv(file.path(), &store, false);
        assert!(matches!(result, Err(RecommendError::CsvImport(_))));
        Ok(())
    }
}
