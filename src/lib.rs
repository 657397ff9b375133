// Water Store Dashboard - Core Library
// Shared by the CLI report and the API server

pub mod config;
pub mod dates;
pub mod error;
pub mod logging;
pub mod maintenance;
pub mod payments;
pub mod revenue;
pub mod session;
pub mod stores;
pub mod utilities;
pub mod views;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use maintenance::{MaintenanceTicket, TicketId, TicketStatus, TicketStore};
pub use payments::{load_payments, read_payments, PaymentRecord};
pub use revenue::{
    aggregate_revenue, product_share, revenue_total, share_percentages, store_revenue, Period,
    RevenueRow, RevenueTable,
};
pub use session::Dashboard;
pub use stores::{ProductKey, StoreCatalog, StoreId};
pub use utilities::{load_utilities, read_utilities, usage_for_store, UsagePoint, UtilityRecord};
pub use views::{DailyRevenue, OverviewView, ProductShareView, StoreDetailsView, TicketView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
