use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use store_dashboard::{logging, Dashboard, DashboardConfig, Period, TicketId};

const USAGE: &str = "\
Usage: store-dashboard [config.toml] <command>

Commands:
  overview [daily|weekly|monthly] [store]   Revenue summary and product shares (default)
  pending                                   Maintenance tickets awaiting action
  resolve <ticket-id>                       Mark a ticket as done
  store <store>                             Revenue records and utility usage";

fn main() -> Result<()> {
    logging::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = if args.first().is_some_and(|a| a.ends_with(".toml")) {
        Some(PathBuf::from(args.remove(0)))
    } else {
        None
    };

    let config = DashboardConfig::load(config_path.as_deref())?;
    let mut dashboard = Dashboard::load(&config).context("Cannot start dashboard: input data unavailable")?;

    let command = args.first().map(String::as_str).unwrap_or("overview");
    match command {
        "overview" => run_overview(&dashboard, &args[1.min(args.len())..])?,
        "pending" => run_pending(&dashboard),
        "resolve" => run_resolve(&mut dashboard, args.get(1))?,
        "store" => run_store(&dashboard, args.get(1))?,
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }

    // The ticket file is rewritten at exit whether or not anything changed
    dashboard.shutdown()?;
    Ok(())
}

fn run_overview(dashboard: &Dashboard, args: &[String]) -> Result<()> {
    let period: Period = match args.first() {
        Some(raw) => raw.parse()?,
        None => Period::Daily,
    };
    let store = match args.get(1) {
        Some(raw) => dashboard.resolve_store(raw)?,
        None => dashboard
            .catalog()
            .stores()
            .first()
            .cloned()
            .context("No stores configured")?,
    };

    let view = dashboard.overview(period, &store);

    println!("🗓️  Revenue Summary ({})", period);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print!("{:<12}", "Date");
    for store in &view.revenue.stores {
        print!("{:>12}", store);
    }
    println!();
    for row in &view.revenue.rows {
        print!("{:<12}", row.bucket.to_string());
        for total in row.totals.values() {
            print!("{:>12.2}", total);
        }
        println!();
    }

    println!("\n🍽️  Product Market Share - {}", store);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if view.product_share.totals.is_empty() {
        println!("No product sales recorded for {}", store);
    }
    for (product, total) in &view.product_share.totals {
        let pct = view.product_share.percentages.get(product).copied().unwrap_or_default();
        println!("{:<20}{:>12.2}{:>9.1}%", product, total, pct);
    }

    Ok(())
}

fn run_pending(dashboard: &Dashboard) {
    println!("⚠️  Stores Requiring Attention");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let alerts = dashboard.maintenance_alerts();
    if alerts.is_empty() {
        println!("✅ No pending issues. All systems good!");
        return;
    }
    for alert in alerts {
        println!("[{}] {}", alert.id, alert.label);
    }
}

fn run_resolve(dashboard: &mut Dashboard, raw_id: Option<&String>) -> Result<()> {
    let raw_id = raw_id.context("resolve needs a ticket id (see `pending`)")?;
    let id: TicketId = raw_id.parse()?;

    let ticket = dashboard.resolve_ticket(id)?;
    println!(
        "✓ Marked as done: {} - {} ({})",
        ticket.store, ticket.machine_type, ticket.issue
    );
    Ok(())
}

fn run_store(dashboard: &Dashboard, raw_store: Option<&String>) -> Result<()> {
    let raw_store = raw_store.context("store needs a store id")?;
    let store = dashboard.resolve_store(raw_store)?;
    let view = dashboard.store_details(&store);

    println!("🏠 {} - Revenue Records", store);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for day in &view.revenue {
        println!("{:<12}{:>12.2}", day.date.to_string(), day.amount);
    }

    println!("\n⚡ {} - Utility Usage", store);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:<12}{:>16}{:>12}", "Date", "Electricity", "Water");
    for point in &view.usage {
        println!(
            "{:<12}{:>16.2}{:>12.2}",
            point.date.to_string(),
            point.electricity_used,
            point.water_used
        );
    }

    Ok(())
}
