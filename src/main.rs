mod cli;

use clap::Parser;
use cli::{Cli, Commands, DateArgs};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use subscription_date_manager::{
    config::Config,
    error::{self, DateManagerError},
    schedule::{
        BatchObserver, DateManager, DateRule, ExclusionSet, RunMode, SubscriptionClassifier,
        UpdateRequest, UpdateResponse,
    },
    storage::{Database, Subscription, UpdateLog},
    utils,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subscription_date_manager=debug,sub_date_manager=debug,info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init => {
            info!("Initializing...");
            initialize(&config)
        }

        Commands::Import { path } => {
            info!("Importing subscriptions from {}", path);
            import_subscriptions(&config, &path)
        }

        Commands::List { limit, format } => list_subscriptions(&config, limit, &format),

        Commands::Preview { dates, format } => {
            run_update(&config, &dates, RunMode::Preview, true, &format).await
        }

        Commands::Apply { dates, yes, format } => {
            run_update(&config, &dates, RunMode::Apply, yes, &format).await
        }

        Commands::Check { id, dates } => check_subscription(&config, &id, &dates),

        Commands::History { format, clear } => show_history(&config, &format, clear),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// Progress bar fed by the batch run
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl BatchObserver for ProgressObserver {
    fn record_updated(&self, subscription: &Subscription, _new_date: chrono::DateTime<chrono::Utc>) {
        self.bar.set_message(format!("updated {}", subscription.id));
    }

    fn record_processed(&self, processed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(processed as u64);
    }
}

fn resolve_exclusions(config: &Config, dates: &DateArgs) -> error::Result<String> {
    if let Some(emails) = &dates.exclude_emails {
        return Ok(utils::split_list(emails));
    }
    if let Some(path) = &dates.exclude_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(config.engine.default_exclusion_text())
}

fn resolve_actor(config: &Config, dates: &DateArgs) -> error::Result<String> {
    let actor = dates.actor.clone().unwrap_or_else(|| config.engine.actor.clone());
    if !config.engine.is_authorized(&actor) {
        return Err(DateManagerError::PermissionDenied(format!(
            "{} may not update subscriptions",
            actor
        )));
    }
    Ok(actor)
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing Subscription Date Manager...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Database:        {}", config.database.path);
    println!("  Batch Size:      {}", config.engine.batch_size());
    println!("  Batch Delay:     {} ms", config.engine.batch_delay_ms);
    println!("  Default Actor:   {}", config.engine.actor);
    println!("  Default Exclude: {} emails", ExclusionSet::from_text(&config.engine.default_exclusion_text()).len());

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to load subscriptions", "sub-date-manager import subs.json".yellow());
    println!(
        "  {} to see what would change",
        "sub-date-manager preview --new-date 2024-02-01 --exclude-after 2024-01-15".yellow()
    );
    Ok(())
}

fn import_subscriptions(config: &Config, path: &str) -> error::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let subscriptions: Vec<Subscription> = serde_json::from_str(&raw)?;

    let db = Database::new(&config.database.path)?;
    for subscription in &subscriptions {
        db.upsert_subscription(subscription)?;
    }

    info!("Imported {} subscriptions", subscriptions.len());
    println!("✓ Imported {} subscriptions", subscriptions.len().to_string().green());
    Ok(())
}

fn list_subscriptions(config: &Config, limit: usize, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let subscriptions = db.list_subscriptions(limit)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&subscriptions)?);
        return Ok(());
    }

    println!("{}", "=== Active Subscriptions ===".cyan().bold());
    utils::print_table_border(100);
    utils::print_table_row(&["ID", "Email", "Last Payment", "Next Payment", "Status"], &[12, 30, 23, 23, 8]);
    utils::print_table_border(100);

    for sub in &subscriptions {
        utils::print_table_row(
            &[
                &utils::truncate(&sub.id, 12),
                &utils::truncate(sub.billing_email.as_deref().unwrap_or("-"), 30),
                &utils::format_optional_timestamp(sub.last_payment.as_ref()),
                &utils::format_optional_timestamp(sub.next_payment.as_ref()),
                &sub.status.to_string(),
            ],
            &[12, 30, 23, 23, 8],
        );
    }
    utils::print_table_border(100);
    println!("Showing {} subscriptions", subscriptions.len());
    Ok(())
}

/// Caller gate, exclusion input and date checks, all before any prompt
fn prepare_request(config: &Config, dates: &DateArgs, mode: RunMode) -> error::Result<(String, UpdateRequest)> {
    let actor = resolve_actor(config, dates)?;
    let request = UpdateRequest {
        new_date: dates.new_date.clone(),
        exclude_after: dates.exclude_after.clone(),
        excluded_emails: resolve_exclusions(config, dates)?,
        mode,
    };

    DateRule::validate(&request.new_date, &request.exclude_after)?;
    Ok((actor, request))
}

async fn run_update(
    config: &Config,
    dates: &DateArgs,
    mode: RunMode,
    yes: bool,
    format: &str,
) -> error::Result<()> {
    let (actor, request) = match prepare_request(config, dates, mode) {
        Ok(prepared) => prepared,
        Err(e) => {
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&UpdateResponse::from_error(&e))?);
            }
            return Err(e);
        }
    };

    if mode == RunMode::Apply
        && !yes
        && !utils::confirm_action(
            "Are you sure you want to update subscription dates? This action cannot be undone.",
        )
    {
        println!("Cancelled");
        return Ok(());
    }

    let db = Database::new(&config.database.path)?;
    let manager = DateManager::new(&db, &db, &config.engine);

    let observer = ProgressObserver::new();
    let show_progress = format != "json";
    let observer_ref: Option<&dyn BatchObserver> = if show_progress { Some(&observer) } else { None };

    let result = manager.execute(&request, &actor, observer_ref).await;
    observer.bar.finish_and_clear();

    let response = UpdateResponse::from_result(&result);
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return result.map(|_| ());
    }

    let batch = result?;
    println!("\n{}", batch.summary_message().cyan().bold());
    println!("Total:    {}", batch.total);
    println!("Updated:  {}", batch.updated.to_string().green());
    println!("Skipped:  {}", batch.skipped.to_string().yellow());
    println!("Errors:   {}", batch.errors.to_string().red());

    if mode == RunMode::Preview && !batch.sample.is_empty() {
        println!("\n{}", "Sample:".yellow());
        utils::print_table_border(90);
        utils::print_table_row(&["ID", "Email", "Current Date", "Result"], &[12, 30, 23, 20]);
        utils::print_table_border(90);
        for preview in &batch.sample {
            utils::print_table_row(
                &[
                    &utils::truncate(&preview.id, 12),
                    &utils::truncate(preview.billing_email.as_deref().unwrap_or("-"), 30),
                    &utils::format_optional_timestamp(preview.current_date.as_ref()),
                    &utils::format_outcome(preview.outcome, preview.reason),
                ],
                &[12, 30, 23, 20],
            );
        }
        utils::print_table_border(90);
        println!("\n{}", "PREVIEW: No subscriptions were changed".yellow());
    }

    Ok(())
}

fn check_subscription(config: &Config, id: &str, dates: &DateArgs) -> error::Result<()> {
    let rule = DateRule::validate(&dates.new_date, &dates.exclude_after)?;
    let exclusions = ExclusionSet::from_text(&resolve_exclusions(config, dates)?);

    let db = Database::new(&config.database.path)?;
    let classifier = SubscriptionClassifier::new(&rule, &exclusions);
    let classification = classifier.classify_by_id(&db, id)?;

    println!("Subscription {}: {}", id.cyan(), utils::format_outcome(classification.outcome, classification.reason));

    let notes = db.notes_for(id)?;
    if !notes.is_empty() {
        println!("\n{}", "Notes:".yellow());
        for note in notes {
            println!("  {}  {}", utils::format_timestamp(&note.created_at), note.note);
        }
    }
    Ok(())
}

fn show_history(config: &Config, format: &str, clear: bool) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let log = UpdateLog::new(&db);

    if clear {
        log.clear()?;
        println!("{}", "✓ Update history cleared".green());
        return Ok(());
    }

    let entries = log.list()?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No updates recorded yet");
        return Ok(());
    }

    println!("{}", "=== Recent Updates ===".cyan().bold());
    utils::print_table_border(110);
    utils::print_table_row(
        &["Timestamp", "Actor", "Mode", "Target", "Cutoff", "Upd/Skip/Err", "Excl"],
        &[23, 10, 7, 19, 19, 14, 5],
    );
    utils::print_table_border(110);
    for entry in &entries {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&entry.timestamp),
                &utils::truncate(&entry.actor, 10),
                &entry.mode,
                &entry.target_date.format("%Y-%m-%d %H:%M").to_string(),
                &entry.cutoff_date.format("%Y-%m-%d %H:%M").to_string(),
                &format!("{}/{}/{}", entry.updated, entry.skipped, entry.errors),
                &entry.excluded_count.to_string(),
            ],
            &[23, 10, 7, 19, 19, 14, 5],
        );
    }
    utils::print_table_border(110);
    Ok(())
}
