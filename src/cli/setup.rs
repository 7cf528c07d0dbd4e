//! Database setup with sample data

use chrono::{Duration, Utc};
use slamon_core::{
    error::Result,
    storage::{seed, LibsqlStore},
    SlaConfig, TicketStore,
};

use super::helpers::print_banner;

pub async fn handle(config: SlaConfig, tickets: usize, seed_value: Option<u64>) -> Result<()> {
    print_banner("🚀 SLA Monitoring Database Setup");

    let path = config.database.path.to_string_lossy().to_string();
    println!("\n1️⃣ Opening database at {}...", path);
    let store = LibsqlStore::open_or_create(&path).await?;
    store.health_check().await?;
    println!("✅ Database ready, schema applied");

    println!("\n2️⃣ Populating with sample data...");
    let now = Utc::now();
    let summary =
        seed::seed_with_thresholds(&store, tickets, seed_value, &config.sla_thresholds, now).await?;
    println!("✅ {} tickets created", summary.tickets);
    println!("   - Services: {}", summary.services);
    println!("   - Customers: {}", summary.customers);
    println!("   - Delayed portions: {}", summary.delays);
    println!("   - Escalations: {}", summary.escalations);

    println!("\n3️⃣ Verifying data...");
    let metrics = store.sla_metrics(now - Duration::days(7)).await?;
    println!("✅ Data verification complete:");
    println!("   Total tickets: {}", metrics.total_tickets);
    println!("   SLA compliance: {}%", metrics.compliance_rate);
    println!("   Average delay: {:.1} minutes", metrics.avg_delay_minutes);

    println!();
    print_banner("🎉 SETUP COMPLETE!");
    println!("\nNext steps:");
    println!("  slamon analyze        run the daily analysis");
    println!("  slamon-dash           open the terminal dashboard");
    Ok(())
}
