//! Reading supplier CSV files into `ImportRow` values.
//!
//! Supplier spreadsheets do not agree on column names, so headers are matched loosely: case,
//! spacing and punctuation are ignored and several spellings are accepted for each column.

use crate::model::OrderQuantity;
use crate::Result;
use anyhow::{bail, Context};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One row of a supplier CSV, mapped onto the canonical import columns. All fields are untrusted.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub product: String,
    /// Weight or amount descriptor, e.g. `"1kg"`, `"100g"` or `"1 item"`.
    pub weight_amount: String,
    /// Price per purchase unit, possibly with a currency symbol.
    pub price_per_unit: String,
    pub order_quantities: OrderQuantity,
}

impl ImportRow {
    pub fn new(
        product: impl Into<String>,
        weight_amount: impl Into<String>,
        price_per_unit: impl Into<String>,
        order_quantities: impl Into<OrderQuantity>,
    ) -> Self {
        Self {
            product: product.into(),
            weight_amount: weight_amount.into(),
            price_per_unit: price_per_unit.into(),
            order_quantities: order_quantities.into(),
        }
    }
}

/// The canonical columns of an import file.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportColumn {
    Product,
    WeightAmount,
    PricePerUnit,
    OrderQuantities,
}

serde_plain::derive_display_from_serialize!(ImportColumn);

impl ImportColumn {
    /// Recognizes a header cell, returning `None` for columns the importer does not use.
    pub fn from_header(header: impl AsRef<str>) -> Option<ImportColumn> {
        match normalize_header(header.as_ref()).as_str() {
            "product" | "productname" | "name" | "item" | "itemname" | "description" => {
                Some(ImportColumn::Product)
            }
            "weight" | "weightamount" | "amount" | "size" | "unitsize" => {
                Some(ImportColumn::WeightAmount)
            }
            "price" | "priceperunit" | "unitprice" | "cost" | "unitcost" => {
                Some(ImportColumn::PricePerUnit)
            }
            "qty" | "quantity" | "count" | "orderquantity" | "orderquantities" | "orderqty" => {
                Some(ImportColumn::OrderQuantities)
            }
            _ => None,
        }
    }
}

/// Lower-cases and drops everything but letters and digits, so `"Weight/Amount"`,
/// `"weight amount"` and `"WeightAmount"` compare equal.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Where each canonical column sits in a particular file.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct ColumnIndexes {
    product: usize,
    weight_amount: Option<usize>,
    price_per_unit: Option<usize>,
    order_quantities: usize,
}

impl ColumnIndexes {
    fn new(headers: &StringRecord) -> Result<Self> {
        let find = |column: ImportColumn| {
            headers
                .iter()
                .position(|h| ImportColumn::from_header(h) == Some(column))
        };
        let Some(product) = find(ImportColumn::Product) else {
            bail!(
                "No product column found in the CSV headers {:?}; expected something like \
                'Product' or 'Name'",
                headers.iter().collect::<Vec<_>>()
            );
        };
        let Some(order_quantities) = find(ImportColumn::OrderQuantities) else {
            bail!(
                "No quantity column found in the CSV headers {:?}; expected something like \
                'Qty', 'Count' or 'Order Quantity'",
                headers.iter().collect::<Vec<_>>()
            );
        };
        Ok(Self {
            product,
            weight_amount: find(ImportColumn::WeightAmount),
            price_per_unit: find(ImportColumn::PricePerUnit),
            order_quantities,
        })
    }

    fn row(&self, record: &StringRecord) -> ImportRow {
        let get = |ix: Option<usize>| {
            ix.and_then(|ix| record.get(ix))
                .unwrap_or_default()
                .to_string()
        };
        ImportRow {
            product: get(Some(self.product)),
            weight_amount: get(self.weight_amount),
            price_per_unit: get(self.price_per_unit),
            order_quantities: OrderQuantity::parse(&get(Some(self.order_quantities))),
        }
    }
}

/// Reads every data row from a CSV with a header row. Fully blank rows are skipped.
///
/// # Errors
/// - The header row cannot be read, or it has no product or quantity column.
/// - A record cannot be read, e.g. it is not valid UTF-8.
pub fn read_import_rows(reader: impl Read) -> Result<Vec<ImportRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .context("Unable to read the CSV header row")?
        .clone();
    let columns = ColumnIndexes::new(&headers)?;

    let mut rows = Vec::new();
    for (ix, result) in rdr.records().enumerate() {
        // +2 because the header is line 1
        let record = result.with_context(|| format!("Unable to read CSV line {}", ix + 2))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(columns.row(&record));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_header_variants() {
        assert_eq!(
            ImportColumn::from_header("Qty"),
            Some(ImportColumn::OrderQuantities)
        );
        assert_eq!(
            ImportColumn::from_header("Count"),
            Some(ImportColumn::OrderQuantities)
        );
        assert_eq!(
            ImportColumn::from_header("Order Quantity"),
            Some(ImportColumn::OrderQuantities)
        );
        assert_eq!(
            ImportColumn::from_header("orderQuantities"),
            Some(ImportColumn::OrderQuantities)
        );
        assert_eq!(
            ImportColumn::from_header("Weight/Amount"),
            Some(ImportColumn::WeightAmount)
        );
        assert_eq!(
            ImportColumn::from_header("Price Per Unit"),
            Some(ImportColumn::PricePerUnit)
        );
        assert_eq!(
            ImportColumn::from_header("\u{feff}Product"),
            Some(ImportColumn::Product)
        );
        assert_eq!(ImportColumn::from_header("Supplier"), None);
    }

    #[test]
    fn test_read_import_rows() {
        let data = "Product,Weight/Amount,Price Per Unit,Qty,Supplier\n\
                    Rice,1 kg,$1.99,20,Acme\n\
                    Beans,1 item,$0.89,12 cases,Acme\n\
                    ,,,,\n\
                    Oats,500g,2.10,-1,Acme\n";
        let rows = read_import_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ImportRow::new("Rice", "1 kg", "$1.99", 20));
        assert_eq!(rows[1].order_quantities.value(), Decimal::from(12));
        assert_eq!(rows[2].order_quantities.value(), Decimal::from(-1));
    }

    #[test]
    fn test_read_import_rows_optional_columns() {
        let data = "Name,Count\nSoup,4\n";
        let rows = read_import_rows(data.as_bytes()).unwrap();
        assert_eq!(rows, vec![ImportRow::new("Soup", "", "", 4)]);
    }

    #[test]
    fn test_read_import_rows_short_row() {
        let data = "Product,Qty,Price\nPasta,3\n";
        let rows = read_import_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].price_per_unit, "");
    }

    #[test]
    fn test_read_import_rows_missing_columns() {
        let err = read_import_rows("Qty,Price\n1,2\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No product column"));

        let err = read_import_rows("Product,Price\nRice,2\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No quantity column"));
    }
}
