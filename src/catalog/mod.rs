pub mod csv_import;
pub mod data_loader;

pub use csv_import::import_products_csv;
pub use data_loader::{fetch_product_records, load_catalog};

use serde::{Deserialize, Serialize};

/// Column names shared by the store query and the CSV importer.
pub const PRODUCT_COLUMNS: [&str; 5] = [
    "report_no",
    "product_name",
    "raw_materials_text",
    "manufacturer",
    "nutrient_text",
];

/// One product row as read from the store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ProductRecord {
    pub report_no: String,
    pub product_name: String,
    pub raw_materials_text: String,
    pub manufacturer: String,
    pub nutrient_text: String,
}

impl ProductRecord {
    /// The text a product is matched on: its name followed by its raw materials.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.product_name, self.raw_materials_text)
    }
}

/// Immutable in-memory snapshot of every searchable product.
///
/// Built once; there is no way to add, change or remove records afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ProductRecord>,
    search_texts: Vec<String>,
}

impl Catalog {
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        let search_texts = records.iter().map(ProductRecord::search_text).collect();
        Self {
            records,
            search_texts,
        }
    }

    /// The degraded catalog used when the store could not provide products.
    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn search_texts(&self) -> &[String] {
        &self.search_texts
    }

    pub fn get(&self, position: usize) -> Option<&ProductRecord> {
        self.records.get(position)
    }
}
