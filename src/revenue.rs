// 📈 Revenue Aggregator
//
// Turns the flat payments list into chart-ready tables:
//   - period-bucketed revenue per store (Daily / Weekly / Monthly)
//   - per-product revenue for one store
//   - daily revenue for one store
//
// Everything here is a pure function of its inputs. Weeks follow the ISO
// convention and start on Monday; months are keyed by their first day.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::payments::PaymentRecord;
use crate::stores::{ProductKey, StoreCatalog, StoreId};

// ============================================================================
// PERIOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
        }
    }

    /// Key of the bucket that `date` falls into.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => date,
            Period::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Period::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            _ => Err(DashboardError::UnknownPeriod(s.to_string())),
        }
    }
}

// ============================================================================
// REVENUE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueRow {
    pub bucket: NaiveDate,
    /// One entry per table column, zero where the store had no sales
    pub totals: BTreeMap<StoreId, Decimal>,
}

/// Revenue indexed by bucket, one column per store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTable {
    pub period: Period,
    pub stores: Vec<StoreId>,
    pub rows: Vec<RevenueRow>,
}

impl RevenueTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup; `None` when the bucket or the column is absent.
    pub fn get(&self, bucket: NaiveDate, store: &str) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|row| row.bucket == bucket)
            .and_then(|row| row.totals.get(store).copied())
    }

    /// Sum of a column over every bucket.
    pub fn store_total(&self, store: &str) -> Decimal {
        self.rows
            .iter()
            .filter_map(|row| row.totals.get(store))
            .copied()
            .sum()
    }

    /// Sum of every cell in the table.
    pub fn grand_total(&self) -> Decimal {
        self.rows.iter().flat_map(|row| row.totals.values()).copied().sum()
    }
}

/// Bucket payments by `period` and sum amounts per (bucket, store).
///
/// Columns are the stores present in `records`; rows ascend by bucket.
pub fn aggregate_revenue(records: &[PaymentRecord], period: Period) -> RevenueTable {
    let mut sums: BTreeMap<NaiveDate, BTreeMap<StoreId, Decimal>> = BTreeMap::new();
    let mut stores: BTreeSet<StoreId> = BTreeSet::new();

    for record in records {
        let bucket = period.bucket_start(record.date);
        stores.insert(record.store.clone());
        *sums
            .entry(bucket)
            .or_default()
            .entry(record.store.clone())
            .or_insert(Decimal::ZERO) += record.amount;
    }

    let rows = sums
        .into_iter()
        .map(|(bucket, mut totals)| {
            for store in &stores {
                totals.entry(store.clone()).or_insert(Decimal::ZERO);
            }
            RevenueRow { bucket, totals }
        })
        .collect();

    RevenueTable {
        period,
        stores: stores.into_iter().collect(),
        rows,
    }
}

// ============================================================================
// PRODUCT SHARE
// ============================================================================

/// Total revenue per product for one store, keyed by bare product name.
pub fn product_share(
    records: &[PaymentRecord],
    catalog: &StoreCatalog,
    store: &StoreId,
) -> BTreeMap<String, Decimal> {
    let mut share = BTreeMap::new();
    if records.is_empty() {
        return share;
    }

    for product in catalog.products(store) {
        let key = ProductKey {
            store: store.clone(),
            product: product.clone(),
        };
        let total: Decimal = records.iter().map(|r| r.product_amount(&key)).sum();
        share.insert(product.clone(), total);
    }

    share
}

/// Percentage of the grand total held by each product.
///
/// Rounded to two decimal places. Empty when the grand total is zero or
/// too large to represent.
pub fn share_percentages(share: &BTreeMap<String, Decimal>) -> BTreeMap<String, Decimal> {
    let total = share
        .values()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount));
    let total = match total {
        Some(total) if !total.is_zero() => total,
        _ => return BTreeMap::new(),
    };

    // Divide first: the ratio stays small even when the amounts do not
    share
        .iter()
        .filter_map(|(product, amount)| {
            let pct = amount.checked_div(total)?.checked_mul(Decimal::ONE_HUNDRED)?;
            Some((product.clone(), pct.round_dp(2)))
        })
        .collect()
}

// ============================================================================
// PER-STORE SERIES
// ============================================================================

/// Daily revenue for one store, ascending by date.
pub fn store_revenue(records: &[PaymentRecord], store: &StoreId) -> Vec<(NaiveDate, Decimal)> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for record in records.iter().filter(|r| &r.store == store) {
        *by_date.entry(record.date).or_insert(Decimal::ZERO) += record.amount;
    }
    by_date.into_iter().collect()
}

pub fn revenue_total(records: &[PaymentRecord]) -> Decimal {
    records.iter().map(|r| r.amount).sum()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(d: NaiveDate, store: &str, amount: Decimal) -> PaymentRecord {
        PaymentRecord::new(d, StoreId::new(store), amount)
    }

    /// Six weeks of sales across two month boundaries.
    fn sample_records() -> Vec<PaymentRecord> {
        let mut records = Vec::new();
        let start = date(2024, 1, 20);
        for offset in 0..42 {
            let d = start + Duration::days(offset);
            records.push(payment(d, "ShopA", Decimal::from(10 + offset)));
            if offset % 3 == 0 {
                records.push(payment(d, "ShopB", dec!(7.25)));
            }
            if offset % 5 == 0 {
                records.push(payment(d, "ShopA", dec!(0.5)));
            }
        }
        records
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("Daily".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!(" MONTHLY ".parse::<Period>().unwrap(), Period::Monthly);
    }

    #[test]
    fn test_unknown_period_fails_fast() {
        assert!(matches!(
            "Yearly".parse::<Period>(),
            Err(DashboardError::UnknownPeriod(p)) if p == "Yearly"
        ));
    }

    #[test]
    fn test_bucket_start() {
        // 2024-01-03 is a Wednesday
        let wed = date(2024, 1, 3);
        assert_eq!(Period::Daily.bucket_start(wed), wed);
        assert_eq!(Period::Weekly.bucket_start(wed), date(2024, 1, 1));
        assert_eq!(Period::Monthly.bucket_start(wed), date(2024, 1, 1));

        // Sunday belongs to the week that started the previous Monday
        assert_eq!(Period::Weekly.bucket_start(date(2024, 1, 7)), date(2024, 1, 1));
        assert_eq!(Period::Weekly.bucket_start(date(2024, 1, 8)), date(2024, 1, 8));

        // Weeks may start in the previous year
        assert_eq!(Period::Weekly.bucket_start(date(2025, 1, 1)), date(2024, 12, 30));
        assert_eq!(Period::Monthly.bucket_start(date(2024, 2, 29)), date(2024, 2, 1));
    }

    #[test]
    fn test_daily_example() {
        let records = vec![
            payment(date(2024, 1, 1), "A", dec!(100)),
            payment(date(2024, 1, 2), "A", dec!(50)),
            payment(date(2024, 1, 1), "B", dec!(30)),
        ];

        let table = aggregate_revenue(&records, Period::Daily);

        assert_eq!(table.stores, vec![StoreId::new("A"), StoreId::new("B")]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.get(date(2024, 1, 1), "A"), Some(dec!(100)));
        assert_eq!(table.get(date(2024, 1, 1), "B"), Some(dec!(30)));
        assert_eq!(table.get(date(2024, 1, 2), "A"), Some(dec!(50)));
        assert_eq!(table.get(date(2024, 1, 2), "B"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_daily_one_row_per_distinct_date() {
        let records = sample_records();
        let table = aggregate_revenue(&records, Period::Daily);

        let distinct: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(table.rows.len(), distinct.len());

        for row in &table.rows {
            for (store, total) in &row.totals {
                let expected: Decimal = records
                    .iter()
                    .filter(|r| r.date == row.bucket && &r.store == store)
                    .map(|r| r.amount)
                    .sum();
                assert_eq!(*total, expected);
            }
        }
    }

    #[test]
    fn test_rows_ascend_by_bucket() {
        let mut records = sample_records();
        records.reverse();

        for period in Period::ALL {
            let table = aggregate_revenue(&records, period);
            assert!(table.rows.windows(2).all(|w| w[0].bucket < w[1].bucket));
        }
    }

    #[test]
    fn test_total_revenue_conserved() {
        let records = sample_records();
        let expected = revenue_total(&records);

        let shop_b: Decimal = records
            .iter()
            .filter(|r| r.store.as_str() == "ShopB")
            .map(|r| r.amount)
            .sum();

        for period in Period::ALL {
            let table = aggregate_revenue(&records, period);
            assert_eq!(table.grand_total(), expected);
            assert_eq!(table.store_total("ShopB"), shop_b);
        }
    }

    #[test]
    fn test_coarser_periods_sum_daily_buckets() {
        let records = sample_records();
        let daily = aggregate_revenue(&records, Period::Daily);

        for period in [Period::Weekly, Period::Monthly] {
            let coarse = aggregate_revenue(&records, period);
            assert_eq!(coarse.stores, daily.stores);

            for row in &coarse.rows {
                for store in &coarse.stores {
                    let from_daily: Decimal = daily
                        .rows
                        .iter()
                        .filter(|d| period.bucket_start(d.bucket) == row.bucket)
                        .map(|d| d.totals[store])
                        .sum();
                    assert_eq!(row.totals[store], from_daily);
                }
            }
        }
    }

    #[test]
    fn test_weekly_and_monthly_bucket_keys() {
        let records = sample_records();

        let weekly = aggregate_revenue(&records, Period::Weekly);
        assert!(weekly.rows.iter().all(|r| r.bucket.weekday() == chrono::Weekday::Mon));
        // 2024-01-20 (Sat) .. 2024-03-01 (Fri)
        assert_eq!(weekly.rows.first().unwrap().bucket, date(2024, 1, 15));
        assert_eq!(weekly.rows.last().unwrap().bucket, date(2024, 2, 26));

        let monthly = aggregate_revenue(&records, Period::Monthly);
        let keys: Vec<NaiveDate> = monthly.rows.iter().map(|r| r.bucket).collect();
        assert_eq!(keys, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
    }

    #[test]
    fn test_empty_input() {
        let table = aggregate_revenue(&[], Period::Weekly);
        assert!(table.is_empty());
        assert!(table.stores.is_empty());
        assert_eq!(table.grand_total(), Decimal::ZERO);
    }

    fn product_catalog() -> StoreCatalog {
        let mut catalog = StoreCatalog::new(["ShopA", "ShopB", "ShopC"]);
        for header in ["Water ShopA", "Ice ShopA", "Water ShopB"] {
            let key = catalog.parse_product_column(header).unwrap();
            catalog.register_product(&key).unwrap();
        }
        catalog
    }

    #[test]
    fn test_product_share_sums_columns() {
        let catalog = product_catalog();
        let records = vec![
            payment(date(2024, 1, 1), "ShopA", dec!(100))
                .with_product("ShopA", "Water", dec!(60))
                .with_product("ShopA", "Ice", dec!(40)),
            payment(date(2024, 1, 2), "ShopA", dec!(25))
                .with_product("ShopA", "Water", dec!(25)),
            payment(date(2024, 1, 2), "ShopB", dec!(9))
                .with_product("ShopB", "Water", dec!(9)),
        ];

        let share = product_share(&records, &catalog, &StoreId::new("ShopA"));
        assert_eq!(share.len(), 2);
        assert_eq!(share["Water"], dec!(85));
        assert_eq!(share["Ice"], dec!(40));
    }

    #[test]
    fn test_product_share_single_column() {
        let catalog = product_catalog();
        let records = vec![
            payment(date(2024, 1, 1), "ShopB", dec!(9)).with_product("ShopB", "Water", dec!(9)),
            payment(date(2024, 1, 5), "ShopB", dec!(3)).with_product("ShopB", "Water", dec!(3)),
        ];

        let share = product_share(&records, &catalog, &StoreId::new("ShopB"));
        assert_eq!(share.len(), 1);
        assert_eq!(share["Water"], dec!(12));
    }

    #[test]
    fn test_product_share_degenerate_cases() {
        let catalog = product_catalog();
        assert!(product_share(&[], &catalog, &StoreId::new("ShopA")).is_empty());

        let records = vec![payment(date(2024, 1, 1), "ShopC", dec!(1))];
        assert!(product_share(&records, &catalog, &StoreId::new("ShopC")).is_empty());
    }

    #[test]
    fn test_share_percentages() {
        let mut share = BTreeMap::new();
        share.insert("Water".to_string(), dec!(75));
        share.insert("Ice".to_string(), dec!(25));

        let pct = share_percentages(&share);
        assert_eq!(pct["Water"], dec!(75));
        assert_eq!(pct["Ice"], dec!(25));

        share.insert("Ice".to_string(), Decimal::ZERO);
        share.insert("Water".to_string(), Decimal::ZERO);
        assert!(share_percentages(&share).is_empty());
    }

    #[test]
    fn test_share_percentages_of_huge_totals() {
        let mut share = BTreeMap::new();
        let e27 = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        share.insert("Water".to_string(), e27);
        let pct = share_percentages(&share);
        assert_eq!(pct["Water"], dec!(100));

        share.insert("Ice".to_string(), e27 * dec!(3));
        let pct = share_percentages(&share);
        assert_eq!(pct["Water"], dec!(25));
        assert_eq!(pct["Ice"], dec!(75));

        // Grand total past Decimal::MAX
        share.insert("Soda".to_string(), Decimal::MAX);
        assert!(share_percentages(&share).is_empty());
    }

    #[test]
    fn test_store_revenue() {
        let records = vec![
            payment(date(2024, 1, 2), "ShopA", dec!(5)),
            payment(date(2024, 1, 1), "ShopA", dec!(10)),
            payment(date(2024, 1, 1), "ShopA", dec!(2.5)),
            payment(date(2024, 1, 1), "ShopB", dec!(99)),
        ];

        let series = store_revenue(&records, &StoreId::new("ShopA"));
        assert_eq!(
            series,
            vec![(date(2024, 1, 1), dec!(12.5)), (date(2024, 1, 2), dec!(5))]
        );
        assert!(store_revenue(&records, &StoreId::new("ShopC")).is_empty());
    }
}
