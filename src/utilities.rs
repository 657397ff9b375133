// ⚡ Utility usage - electricity and water per store per day
//
// Utilities CSV layout:
//   Date,StoreID,ElectricityUsed,WaterUsed

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dates::deserialize_date;
use crate::error::{DashboardError, Result};
use crate::stores::{StoreCatalog, StoreId};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UtilityRecord {
    #[serde(rename = "Date", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(rename = "StoreID")]
    pub store: StoreId,

    #[serde(rename = "ElectricityUsed")]
    pub electricity_used: f64,

    #[serde(rename = "WaterUsed")]
    pub water_used: f64,
}

/// One point of the two-series usage chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsagePoint {
    pub date: NaiveDate,
    pub electricity_used: f64,
    pub water_used: f64,
}

pub fn read_utilities<R: Read>(reader: R, catalog: &StoreCatalog) -> Result<Vec<UtilityRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let record: UtilityRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| DashboardError::invalid_record(line, e.to_string()))?;

        if !catalog.contains(record.store.as_str()) {
            return Err(DashboardError::invalid_record(
                line,
                format!("unknown store '{}'", record.store),
            ));
        }
        records.push(record);
    }

    Ok(records)
}

pub fn load_utilities(path: &Path, catalog: &StoreCatalog) -> anyhow::Result<Vec<UtilityRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open utilities file: {}", path.display()))?;

    let records = read_utilities(file, catalog)
        .with_context(|| format!("Failed to load utilities from {}", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "Loaded utility usage");
    Ok(records)
}

/// Usage series for one store, ordered by date.
pub fn usage_for_store(records: &[UtilityRecord], store: &StoreId) -> Vec<UsagePoint> {
    let mut points: Vec<UsagePoint> = records
        .iter()
        .filter(|r| &r.store == store)
        .map(|r| UsagePoint {
            date: r.date,
            electricity_used: r.electricity_used,
            water_used: r.water_used,
        })
        .collect();

    // stable: same-day rows keep file order
    points.sort_by_key(|p| p.date);
    points
}
