use std::{path::PathBuf, process, sync::Arc};

use colored::Colorize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use tuition_ledger::{
    config::{ConfigError, ConfigManager},
    core::services::{ReconciliationService, RecordQuery},
    domain::FinancialOverview,
    init,
    storage::{CsvExpenseFeed, CsvLegacySource, JsonLedgerStore},
    utils::build_info,
    LedgerError, StoreError,
};

const USAGE: &str =
    "usage: tuition_ledger_report <ledger.json> [--legacy <rows.csv>] [--expenses <expenses.csv>] [--json]\n       tuition_ledger_report --version";

#[derive(Debug, Error)]
enum ReportError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct Args {
    ledger: Option<PathBuf>,
    legacy: Option<PathBuf>,
    expenses: Option<PathBuf>,
    json: bool,
    version: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, ReportError> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--version" | "-V" => args.version = true,
            "--json" => args.json = true,
            "--legacy" => args.legacy = Some(expect_value(&arg, raw.next())?),
            "--expenses" => args.expenses = Some(expect_value(&arg, raw.next())?),
            flag if flag.starts_with("--") => {
                return Err(ReportError::Usage(format!("unknown option `{flag}`")))
            }
            _ if args.ledger.is_none() => args.ledger = Some(PathBuf::from(&arg)),
            _ => return Err(ReportError::Usage(format!("unexpected argument `{arg}`"))),
        }
    }
    Ok(args)
}

fn expect_value(flag: &str, value: Option<String>) -> Result<PathBuf, ReportError> {
    value
        .map(PathBuf::from)
        .ok_or_else(|| ReportError::Usage(format!("`{flag}` needs a file path")))
}

async fn run(args: Args) -> Result<(), ReportError> {
    if args.version {
        println!("{}", build_info::current().summary());
        return Ok(());
    }
    let ledger_path = args
        .ledger
        .ok_or_else(|| ReportError::Usage("missing ledger snapshot path".into()))?;

    let config = ConfigManager::new().load()?;
    let store = Arc::new(JsonLedgerStore::open(ledger_path)?);
    let legacy = match args.legacy {
        Some(path) => CsvLegacySource::from_path(path)?,
        None => CsvLegacySource::default(),
    };
    let expenses = match args.expenses {
        Some(path) => CsvExpenseFeed::from_path(path)?,
        None => CsvExpenseFeed::default(),
    };

    let service = ReconciliationService::new(
        store.clone(),
        store,
        Arc::new(legacy),
        Arc::new(expenses),
    )
    .with_config(config.reporting);
    let overview = service
        .overview(&RecordQuery::all(), &CancellationToken::new())
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        print_overview(&overview);
    }
    Ok(())
}

fn print_overview(overview: &FinancialOverview) {
    println!(
        "{} {} ({} records)",
        "Financial overview".bold(),
        overview.generated_on,
        overview.record_count
    );
    for warning in &overview.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    println!("\n{}", "Balance".bold().underline());
    println!("  revenue   {:>12.2}", overview.balance.total_revenue);
    println!("  expenses  {:>12.2}", overview.balance.total_expenses);
    let balance = format!("{:>12.2}", overview.balance.balance);
    if overview.balance.balance < 0.0 {
        println!("  balance   {}", balance.red());
    } else {
        println!("  balance   {}", balance.green());
    }

    println!("\n{}", "Aging".bold().underline());
    let aging = &overview.aging;
    for (label, bucket) in [
        ("received", aging.received),
        ("pending", aging.pending),
        ("overdue", aging.overdue),
        ("cancelled", aging.cancelled),
    ] {
        println!("  {label:<10}{:>12.2} ({})", bucket.amount, bucket.count);
    }
    println!("  receivable{:>12.2}", aging.total_receivable);
    println!("  collected {:>11.2}%", aging.percent_collected);

    println!("\n{}", "Monthly revenue".bold().underline());
    for month in &overview.monthly_revenue {
        println!(
            "  {}-{:02} {:>12.2} {:>12.2}",
            month.year, month.month, month.total, month.cumulative
        );
    }

    println!("\n{}", "Revenue by category".bold().underline());
    for group in &overview.category_revenue {
        println!("  {:<16}{:>12.2}", group.label, group.total);
    }

    println!("\n{}", "Upcoming dues".bold().underline());
    if overview.upcoming_dues.is_empty() {
        println!("  {}", "nothing due".dimmed());
    }
    for due in &overview.upcoming_dues {
        let days = match due.days_remaining {
            0 => "today".yellow().to_string(),
            n => format!("in {n}d"),
        };
        println!(
            "  {} {:<24}{:>10.2} {}",
            due.record.due_date, due.record.owner_name, due.record.amount, days
        );
    }
}

#[tokio::main]
async fn main() {
    init();

    let outcome = match parse_args(std::env::args().skip(1)) {
        Ok(args) => run(args).await,
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
