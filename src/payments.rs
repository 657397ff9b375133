// 💵 Payments - daily takings per store, with per-product breakdown
//
// Payments CSV layout:
//   Date,StoreID,Amount,<Product> <StoreID>,<Product> <StoreID>,...
//
// The product columns are resolved into the store catalog while reading the
// header, so downstream code never looks at column names again.

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::dates::parse_date;
use crate::error::{DashboardError, Result};
use crate::stores::{ProductKey, StoreCatalog, StoreId};

const DATE_COLUMN: &str = "Date";
const STORE_COLUMN: &str = "StoreID";
const AMOUNT_COLUMN: &str = "Amount";

/// Largest accepted cell value. Keeps every sum over a payments file well
/// inside `Decimal`'s range.
const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

// ============================================================================
// PAYMENT RECORD
// ============================================================================

/// One row of the payments table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub date: NaiveDate,
    pub store: StoreId,
    pub amount: Decimal,
    pub products: BTreeMap<ProductKey, Decimal>,
}

impl PaymentRecord {
    pub fn new(date: NaiveDate, store: StoreId, amount: Decimal) -> Self {
        PaymentRecord {
            date,
            store,
            amount,
            products: BTreeMap::new(),
        }
    }

    /// Builder: attach revenue for one (store, product) column
    pub fn with_product(mut self, store: &str, product: &str, amount: Decimal) -> Self {
        self.products.insert(
            ProductKey {
                store: StoreId::new(store),
                product: product.to_string(),
            },
            amount,
        );
        self
    }

    /// Revenue recorded in a product column; absent cells count as zero.
    pub fn product_amount(&self, key: &ProductKey) -> Decimal {
        self.products.get(key).copied().unwrap_or(Decimal::ZERO)
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Column positions resolved from the header row.
struct PaymentsLayout {
    date: usize,
    store: usize,
    amount: usize,
    products: Vec<(usize, ProductKey)>,
}

impl PaymentsLayout {
    fn from_headers(headers: &csv::StringRecord, catalog: &mut StoreCatalog) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DashboardError::Schema(format!("missing '{}' column", name)))
        };

        let date = position(DATE_COLUMN)?;
        let store = position(STORE_COLUMN)?;
        let amount = position(AMOUNT_COLUMN)?;

        let mut products = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == date || idx == store || idx == amount {
                continue;
            }

            match catalog.parse_product_column(header) {
                Some(key) => {
                    catalog.register_product(&key)?;
                    products.push((idx, key));
                }
                None => {
                    tracing::warn!(column = header, "Skipping payments column without a known store suffix");
                }
            }
        }

        Ok(PaymentsLayout {
            date,
            store,
            amount,
            products,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord, line: u64, catalog: &StoreCatalog) -> Result<PaymentRecord> {
        let raw_date = row.get(self.date).unwrap_or("");
        let date = parse_date(raw_date)
            .ok_or_else(|| DashboardError::invalid_record(line, format!("invalid date '{}'", raw_date)))?;

        let store = catalog
            .resolve(row.get(self.store).unwrap_or(""))
            .map_err(|e| DashboardError::invalid_record(line, e.to_string()))?;

        let raw_amount = row.get(self.amount).unwrap_or("");
        if raw_amount.is_empty() {
            return Err(DashboardError::invalid_record(line, "missing Amount"));
        }
        let amount = parse_amount(raw_amount, line, AMOUNT_COLUMN)?;

        let mut record = PaymentRecord::new(date, store, amount);
        for (idx, key) in &self.products {
            let raw = row.get(*idx).unwrap_or("");
            let value = if raw.is_empty() {
                Decimal::ZERO
            } else {
                parse_amount(raw, line, &format!("{} {}", key.product, key.store))?
            };
            record.products.insert(key.clone(), value);
        }

        Ok(record)
    }
}

fn parse_amount(raw: &str, line: u64, column: &str) -> Result<Decimal> {
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| DashboardError::invalid_record(line, format!("invalid {} '{}'", column, raw)))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(DashboardError::invalid_record(
            line,
            format!("negative {} '{}'", column, raw),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(DashboardError::invalid_record(
            line,
            format!("{} '{}' exceeds {}", column, raw, MAX_AMOUNT),
        ));
    }
    Ok(value)
}

/// Read payments from any CSV source, registering product columns in `catalog`.
pub fn read_payments<R: Read>(reader: R, catalog: &mut StoreCatalog) -> Result<Vec<PaymentRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = PaymentsLayout::from_headers(&headers, catalog)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(layout.parse_row(&row, line, catalog)?);
    }

    Ok(records)
}

pub fn load_payments(path: &Path, catalog: &mut StoreCatalog) -> anyhow::Result<Vec<PaymentRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open payments file: {}", path.display()))?;

    let records = read_payments(file, catalog)
        .with_context(|| format!("Failed to load payments from {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        "Loaded payments"
    );
    Ok(records)
}
