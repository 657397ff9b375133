// 🔧 Maintenance Ticket Store
//
// File-as-database: the whole maintenance table is read at startup, mutated
// in memory when a ticket is resolved, and written back in full. There is
// no merge with other writers, so the last process to persist wins.
//
// Maintenance CSV layout:
//   StoreID,MachineType,Issue,ReportedDate,Status,ResolvedDate

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::dates::{deserialize_date, deserialize_optional_date};
use crate::error::{DashboardError, Result};
use crate::stores::{StoreCatalog, StoreId};

const TICKET_COLUMNS: [&str; 6] = [
    "StoreID",
    "MachineType",
    "Issue",
    "ReportedDate",
    "Status",
    "ResolvedDate",
];

// ============================================================================
// TICKET
// ============================================================================

/// Position of a ticket in the loaded table. Stable for one process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub usize);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(TicketId)
            .map_err(|_| DashboardError::InvalidTicketId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTicket {
    #[serde(rename = "StoreID")]
    pub store: StoreId,

    #[serde(rename = "MachineType")]
    pub machine_type: String,

    #[serde(rename = "Issue")]
    pub issue: String,

    #[serde(rename = "ReportedDate", deserialize_with = "deserialize_date")]
    pub reported_date: NaiveDate,

    #[serde(rename = "Status")]
    pub status: TicketStatus,

    #[serde(rename = "ResolvedDate", default, deserialize_with = "deserialize_optional_date")]
    pub resolved_date: Option<NaiveDate>,
}

impl MaintenanceTicket {
    pub fn is_pending(&self) -> bool {
        self.status == TicketStatus::Pending
    }
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct TicketStore {
    path: Option<PathBuf>,
    tickets: Vec<MaintenanceTicket>,
    dirty: bool,
}

impl TicketStore {
    /// In-memory store with no backing file.
    pub fn new(tickets: Vec<MaintenanceTicket>) -> Self {
        TicketStore {
            path: None,
            tickets,
            dirty: false,
        }
    }

    /// Read tickets from any CSV source, checking stores against `catalog`.
    pub fn read<R: Read>(reader: R, catalog: &StoreCatalog) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let mut tickets = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let ticket: MaintenanceTicket = row
                .deserialize(Some(&headers))
                .map_err(|e| DashboardError::invalid_record(line, e.to_string()))?;

            if !catalog.contains(ticket.store.as_str()) {
                return Err(DashboardError::invalid_record(
                    line,
                    format!("unknown store '{}'", ticket.store),
                ));
            }
            tickets.push(ticket);
        }

        Ok(TicketStore::new(tickets))
    }

    pub fn load(path: &Path, catalog: &StoreCatalog) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open maintenance file: {}", path.display()))?;

        let mut store = TicketStore::read(file, catalog)
            .with_context(|| format!("Failed to load maintenance tickets from {}", path.display()))?;
        store.path = Some(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            tickets = store.len(),
            pending = store.list_pending().len(),
            "Loaded maintenance tickets"
        );
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Whether any ticket changed since load or the last persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, id: TicketId) -> Option<&MaintenanceTicket> {
        self.tickets.get(id.0)
    }

    pub fn tickets(&self) -> impl Iterator<Item = (TicketId, &MaintenanceTicket)> {
        self.tickets.iter().enumerate().map(|(idx, t)| (TicketId(idx), t))
    }

    /// Pending tickets in file order.
    pub fn list_pending(&self) -> Vec<(TicketId, &MaintenanceTicket)> {
        self.tickets().filter(|(_, t)| t.is_pending()).collect()
    }

    /// Resolve a ticket as of today's local date.
    pub fn mark_done(&mut self, id: TicketId) -> Result<&MaintenanceTicket> {
        self.mark_done_on(id, Local::now().date_naive())
    }

    /// Resolve a ticket with an explicit resolution date.
    ///
    /// Unknown and already-resolved tickets are rejected without touching
    /// any state.
    pub fn mark_done_on(&mut self, id: TicketId, date: NaiveDate) -> Result<&MaintenanceTicket> {
        let ticket = self
            .tickets
            .get_mut(id.0)
            .ok_or(DashboardError::TicketNotFound(id))?;

        if !ticket.is_pending() {
            return Err(DashboardError::TicketAlreadyResolved(id));
        }

        ticket.status = TicketStatus::Done;
        ticket.resolved_date = Some(date);
        self.dirty = true;

        tracing::info!(ticket = %id, store = %ticket.store, resolved = %date, "Ticket marked as done");
        Ok(ticket)
    }

    /// Write the full table, header included, to `writer`.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(TICKET_COLUMNS)?;
        for ticket in &self.tickets {
            wtr.serialize(ticket)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Overwrite `path` with the current table.
    pub fn persist_to(&self, path: &Path) -> anyhow::Result<()> {
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        let replaced = self
            .write(file)
            .with_context(|| format!("Failed to write maintenance tickets to {}", tmp_path.display()))
            .and_then(|()| {
                std::fs::rename(&tmp_path, path)
                    .with_context(|| format!("Failed to replace {}", path.display()))
            });

        if let Err(e) = replaced {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                tracing::warn!(path = %tmp_path.display(), "Failed to remove temp file: {}", cleanup);
            }
            return Err(e);
        }

        tracing::info!(path = %path.display(), tickets = self.len(), "Persisted maintenance tickets");
        Ok(())
    }

    /// Overwrite the file the tickets were loaded from.
    pub fn persist(&mut self) -> anyhow::Result<()> {
        let path = self
            .path
            .clone()
            .context("Ticket store has no backing file")?;
        self.persist_to(&path)?;
        self.dirty = false;
        Ok(())
    }
}
