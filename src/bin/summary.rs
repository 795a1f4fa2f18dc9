use std::{error::Error, fs, path::PathBuf, sync::Arc};

use clap::Parser;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use budget_ledger::{
    AuthContext, LiveTransactionStore, LocalIdentityProvider, MemoryDocumentStore, SyncConfig,
    User, UserId,
    alert::alert_channel,
    currency::format_currency,
    dashboard::{
        TimeRange, category_shares, cumulative_trend, expenses_by_category, in_window,
        monthly_summary, totals, window_start, window_totals,
    },
    logging::setup_logging,
    stores::TransactionDocument,
    sync::SubscriptionPhase,
};

/// Print a budget summary for an export of transaction documents.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to a JSON array of transaction documents.
    #[arg(long)]
    input: PathBuf,

    /// How far back to look: 1m, 3m, 6m or 1y.
    #[arg(long, default_value_t = TimeRange::SixMonths)]
    range: TimeRange,

    /// The current time as an RFC 3339 timestamp. Defaults to the system clock.
    #[arg(long, value_parser = parse_timestamp)]
    now: Option<OffsetDateTime>,

    /// File path to write debug logs to.
    #[arg(long, default_value = "debug.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    setup_logging(&args.log_file)?;

    let now = args.now.unwrap_or_else(|| {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    });

    let export = fs::read_to_string(&args.input).map_err(|error| {
        budget_ledger::Error::InvalidExport(format!("{}: {error}", args.input.display()))
    })?;
    let documents: Vec<TransactionDocument> = serde_json::from_str(&export)
        .map_err(|error| budget_ledger::Error::InvalidExport(error.to_string()))?;

    let user = User::new(UserId::new("local"), "local@localhost", true);
    let store = Arc::new(MemoryDocumentStore::new());
    let imported = store.import(&user.id, documents);
    tracing::info!("Loaded {imported} transactions from {}", args.input.display());

    let provider = LocalIdentityProvider::new();
    provider.sign_in(user);
    let auth = AuthContext::initialize(&provider);
    let (alerts, _alert_receiver) = alert_channel();
    let live = LiveTransactionStore::spawn(store, auth.clone(), alerts, SyncConfig::default());

    let phase = live
        .watch()
        .wait_for(|state| {
            matches!(
                state.phase,
                SubscriptionPhase::Synced | SubscriptionPhase::Failed
            )
        })
        .await?
        .phase;

    if phase == SubscriptionPhase::Failed {
        return Err("could not load transactions, check the log for details".into());
    }

    let transactions = live.transactions();
    live.dispose();
    auth.dispose();

    let start = window_start(args.range, now);
    let windowed = in_window(&transactions, start);

    let all_time = totals(&transactions);
    println!("All time");
    println!("  Income:      {}", format_currency(all_time.income));
    println!("  Expenses:    {}", format_currency(all_time.expenses));
    println!("  Credit card: {}", format_currency(all_time.credit_card));
    println!("  Balance:     {}", format_currency(all_time.balance));

    let monthly = monthly_summary(&windowed, start);
    let window = window_totals(&monthly);
    println!();
    println!("{} (since {})", args.range.label(), start.date());
    println!("  Income:   {}", format_currency(window.income));
    println!("  Expenses: {}", format_currency(window.expenses));
    println!("  Balance:  {}", format_currency(window.balance));

    let by_category = expenses_by_category(&windowed);
    let shares = category_shares(&by_category);
    println!();
    println!("Expenses by category");
    for (category, amount) in &by_category {
        let share = shares.get(category).copied().unwrap_or(0.0);
        println!(
            "  {:<20} {:>14} {:>5.1}%",
            category.label(),
            format_currency(*amount),
            share * 100.0
        );
    }

    println!();
    println!("Monthly");
    for month in &monthly {
        println!(
            "  {:<9} income {:>14}  expenses {:>14}  balance {:>14}",
            month.label,
            format_currency(month.income),
            format_currency(month.expenses),
            format_currency(month.balance)
        );
    }

    println!();
    println!("Trend");
    for point in cumulative_trend(&windowed, start) {
        println!(
            "  {:<7} {:>14} {:>14}",
            point.label,
            format_currency(point.amount),
            format_currency(point.cumulative)
        );
    }

    Ok(())
}

fn parse_timestamp(text: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|error| format!("{text}: {error}"))
}
