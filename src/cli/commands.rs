use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sub-date-manager")]
#[command(about = "Bulk update next payment dates on active subscriptions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and show configuration
    Init,

    /// Import subscriptions from a JSON array
    Import {
        /// Path to the JSON file
        path: String,
    },

    /// List active subscriptions
    List {
        /// Maximum number of subscriptions to show
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show what an update would do without changing anything
    Preview {
        #[command(flatten)]
        dates: DateArgs,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Update next payment dates
    Apply {
        #[command(flatten)]
        dates: DateArgs,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Explain how a single subscription would be treated
    Check {
        /// Subscription id
        id: String,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Show or clear the update history
    History {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Delete all history entries
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DateArgs {
    /// New next payment date (e.g. 2024-02-01 or "2024-02-01 09:00:00")
    #[arg(long)]
    pub new_date: String,

    /// Skip subscriptions with a payment after this date
    #[arg(long)]
    pub exclude_after: String,

    /// Billing emails to exclude, newline or comma separated
    #[arg(long, conflicts_with = "exclude_file")]
    pub exclude_emails: Option<String>,

    /// File with one billing email per line to exclude
    #[arg(long)]
    pub exclude_file: Option<String>,

    /// Actor recorded in the update history
    #[arg(long)]
    pub actor: Option<String>,
}
