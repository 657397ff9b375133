// 🧭 Dashboard session
//
// Owns everything loaded for one process run. Views are recomputed from
// scratch on every call; the only mutable piece is the ticket table.

use anyhow::Result as AnyResult;

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::maintenance::{MaintenanceTicket, TicketId, TicketStore};
use crate::payments::{load_payments, PaymentRecord};
use crate::revenue::{
    aggregate_revenue, product_share, share_percentages, store_revenue, Period, RevenueTable,
};
use crate::stores::{StoreCatalog, StoreId};
use crate::utilities::{load_utilities, usage_for_store, UtilityRecord};
use crate::views::{DailyRevenue, OverviewView, ProductShareView, StoreDetailsView, TicketView};

pub struct Dashboard {
    catalog: StoreCatalog,
    payments: Vec<PaymentRecord>,
    utilities: Vec<UtilityRecord>,
    tickets: TicketStore,
    persist_on_change: bool,
}

impl Dashboard {
    pub fn new(
        catalog: StoreCatalog,
        payments: Vec<PaymentRecord>,
        utilities: Vec<UtilityRecord>,
        tickets: TicketStore,
    ) -> Self {
        Dashboard {
            catalog,
            payments,
            utilities,
            tickets,
            persist_on_change: false,
        }
    }

    pub fn with_persist_on_change(mut self, enabled: bool) -> Self {
        self.persist_on_change = enabled;
        self
    }

    /// Load all three datasets. Any failure is fatal: no view can be drawn.
    pub fn load(config: &DashboardConfig) -> AnyResult<Self> {
        let mut catalog = config.catalog();
        let payments = load_payments(&config.data.payments, &mut catalog)?;
        let utilities = load_utilities(&config.data.utilities, &catalog)?;
        let tickets = TicketStore::load(&config.data.maintenance, &catalog)?;

        Ok(Dashboard::new(catalog, payments, utilities, tickets)
            .with_persist_on_change(config.maintenance.persist_on_change))
    }

    pub fn catalog(&self) -> &StoreCatalog {
        &self.catalog
    }

    pub fn payments(&self) -> &[PaymentRecord] {
        &self.payments
    }

    pub fn tickets(&self) -> &TicketStore {
        &self.tickets
    }

    pub fn resolve_store(&self, raw: &str) -> Result<StoreId> {
        self.catalog.resolve(raw)
    }

    // ========================================================================
    // OVERVIEW
    // ========================================================================

    pub fn revenue(&self, period: Period) -> RevenueTable {
        tracing::debug!(%period, "Aggregating revenue");
        aggregate_revenue(&self.payments, period)
    }

    pub fn product_share(&self, store: &StoreId) -> ProductShareView {
        let totals = product_share(&self.payments, &self.catalog, store);
        let percentages = share_percentages(&totals);
        ProductShareView {
            store: store.clone(),
            totals,
            percentages,
        }
    }

    pub fn overview(&self, period: Period, store: &StoreId) -> OverviewView {
        OverviewView {
            revenue: self.revenue(period),
            product_share: self.product_share(store),
        }
    }

    // ========================================================================
    // MAINTENANCE ALERTS
    // ========================================================================

    pub fn maintenance_alerts(&self) -> Vec<TicketView> {
        self.tickets
            .list_pending()
            .into_iter()
            .map(|(id, ticket)| TicketView::new(id, ticket))
            .collect()
    }

    /// Mark a ticket as done today.
    ///
    /// With `persist_on_change` the table is written straight away; a failed
    /// write is logged and retried at shutdown.
    pub fn resolve_ticket(&mut self, id: TicketId) -> Result<MaintenanceTicket> {
        let ticket = self.tickets.mark_done(id)?.clone();

        if self.persist_on_change && self.tickets.path().is_some() {
            if let Err(e) = self.tickets.persist() {
                tracing::error!("Failed to persist maintenance tickets: {:#}", e);
            }
        }

        Ok(ticket)
    }

    // ========================================================================
    // STORE DETAILS
    // ========================================================================

    pub fn store_details(&self, store: &StoreId) -> StoreDetailsView {
        let revenue = store_revenue(&self.payments, store)
            .into_iter()
            .map(|(date, amount)| DailyRevenue { date, amount })
            .collect();

        StoreDetailsView {
            store: store.clone(),
            revenue,
            usage: usage_for_store(&self.utilities, store),
        }
    }

    /// Write the ticket table back to its file, overwriting whatever is there.
    pub fn shutdown(&mut self) -> AnyResult<()> {
        if self.tickets.path().is_none() {
            return Ok(());
        }
        self.tickets.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::maintenance::TicketStatus;
    use crate::payments::read_payments;
    use crate::utilities::read_utilities;
    use rust_decimal_macros::dec;

    const PAYMENTS: &str = "\
Date,StoreID,Amount,Water ShopA,Ice ShopA,Water ShopB
2024-01-01,ShopA,100,60,40,0
2024-01-02,ShopA,50,50,0,0
2024-01-01,ShopB,30,0,0,30
";

    const UTILITIES: &str = "\
Date,StoreID,ElectricityUsed,WaterUsed
2024-01-01,ShopA,10,200
2024-01-02,ShopA,11,210
";

    const TICKETS: &str = "\
StoreID,MachineType,Issue,ReportedDate,Status,ResolvedDate
ShopA,Filter,Clogged,2024-01-03,Pending,
ShopB,Chiller,Leak,2024-01-04,Done,2024-01-06
";

    fn dashboard() -> Dashboard {
        let mut catalog = StoreCatalog::new(["ShopA", "ShopB", "ShopC"]);
        let payments = read_payments(PAYMENTS.as_bytes(), &mut catalog).unwrap();
        let utilities = read_utilities(UTILITIES.as_bytes(), &catalog).unwrap();
        let tickets = TicketStore::read(TICKETS.as_bytes(), &catalog).unwrap();
        Dashboard::new(catalog, payments, utilities, tickets)
    }

    #[test]
    fn test_overview() {
        let dashboard = dashboard();
        let store = dashboard.resolve_store("ShopA").unwrap();
        let view = dashboard.overview(Period::Daily, &store);

        assert_eq!(view.revenue.rows.len(), 2);
        assert_eq!(view.product_share.totals["Water"], dec!(110));
        assert_eq!(view.product_share.totals["Ice"], dec!(40));
        assert_eq!(view.product_share.percentages["Water"], dec!(73.33));
    }

    #[test]
    fn test_maintenance_alerts_and_resolve() {
        let mut dashboard = dashboard();
        let alerts = dashboard.maintenance_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].label, "ShopA - Filter (Clogged) on 2024-01-03");

        let resolved = dashboard.resolve_ticket(alerts[0].id).unwrap();
        assert_eq!(resolved.status, TicketStatus::Done);
        assert!(dashboard.maintenance_alerts().is_empty());
    }

    #[test]
    fn test_resolve_unknown_ticket() {
        let mut dashboard = dashboard();
        assert!(matches!(
            dashboard.resolve_ticket(TicketId(9)),
            Err(DashboardError::TicketNotFound(_))
        ));
        assert_eq!(dashboard.maintenance_alerts().len(), 1);
    }

    #[test]
    fn test_store_details() {
        let dashboard = dashboard();
        let store = dashboard.resolve_store("ShopA").unwrap();
        let view = dashboard.store_details(&store);

        assert_eq!(view.revenue.len(), 2);
        assert_eq!(view.revenue[0].amount, dec!(100));
        assert_eq!(view.usage.len(), 2);
        assert_eq!(view.usage[1].water_used, 210.0);
    }

    #[test]
    fn test_shutdown_without_file_is_noop() {
        let mut dashboard = dashboard();
        dashboard.shutdown().unwrap();
    }
}
