// 🖼️ View models - what each dashboard screen needs, as plain data
//
// The presentation client draws these; nothing here knows about charts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::maintenance::{MaintenanceTicket, TicketId, TicketStatus};
use crate::revenue::RevenueTable;
use crate::stores::StoreId;
use crate::utilities::UsagePoint;

/// Product revenue for the share-of-total chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductShareView {
    pub store: StoreId,
    pub totals: BTreeMap<String, Decimal>,
    pub percentages: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub revenue: RevenueTable,
    pub product_share: ProductShareView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    pub id: TicketId,
    pub store: StoreId,
    pub machine_type: String,
    pub issue: String,
    pub reported_date: NaiveDate,
    pub status: TicketStatus,
    pub resolved_date: Option<NaiveDate>,
    /// e.g. "ShopA - Filter (Clogged) on 2024-01-03"
    pub label: String,
}

impl TicketView {
    pub fn new(id: TicketId, ticket: &MaintenanceTicket) -> Self {
        TicketView {
            id,
            store: ticket.store.clone(),
            machine_type: ticket.machine_type.clone(),
            issue: ticket.issue.clone(),
            reported_date: ticket.reported_date,
            status: ticket.status,
            resolved_date: ticket.resolved_date,
            label: format!(
                "{} - {} ({}) on {}",
                ticket.store, ticket.machine_type, ticket.issue, ticket.reported_date
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreDetailsView {
    pub store: StoreId,
    pub revenue: Vec<DailyRevenue>,
    pub usage: Vec<UsagePoint>,
}
