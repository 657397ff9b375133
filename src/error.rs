// ⚠️ Dashboard errors
//
// Domain failures the views and the ticket store can report. Fatal startup
// problems (missing files, unreadable CSV) travel as anyhow errors with
// context; these variants are the ones callers are expected to match on.

use thiserror::Error;

use crate::maintenance::TicketId;

/// Result type alias using the dashboard error type.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// No ticket with this id was loaded
    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// Ticket id that is not a row number
    #[error("Invalid ticket id '{0}'")]
    InvalidTicketId(String),

    /// Ticket was already marked as done
    #[error("Ticket already resolved: {0}")]
    TicketAlreadyResolved(TicketId),

    /// Store identifier outside the configured store set
    #[error("Unknown store: {0}")]
    UnknownStore(String),

    /// Period selector other than Daily, Weekly or Monthly
    #[error("Unknown period '{0}' (expected Daily, Weekly or Monthly)")]
    UnknownPeriod(String),

    /// Payments header does not match the expected layout
    #[error("Invalid payments schema: {0}")]
    Schema(String),

    /// A data row failed validation
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub(crate) fn invalid_record(line: u64, reason: impl Into<String>) -> Self {
        DashboardError::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }
}
