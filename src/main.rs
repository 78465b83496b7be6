use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use tally::cli::{
    handle_category_command, handle_eval_command, handle_export_command,
    handle_frequencies_command, handle_report_command, handle_schedule_command,
    handle_transaction_command, parse_frequency,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::logging::init_logging;
use tally::models::Frequency;
use tally::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "tally",
    author = "Kaylee Beyene",
    version,
    about = "Budgeting with formula-defined recurring transactions",
    long_about = "Tally tracks recurring income and expenses whose amounts are \
                  arithmetic formulas. A formula may reference other transactions \
                  with $<id>, and every amount is normalized to a monthly figure."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize data directory, settings and default categories
    Init,

    /// Show configuration, or change one setting
    Config {
        /// Setting to change (e.g. currency_symbol, max_reference_depth)
        #[arg(requires = "value")]
        key: Option<String>,
        /// New value
        value: Option<String>,
    },

    /// Evaluate an expression, resolving $<id> references
    Eval {
        /// Arithmetic expression
        #[arg(allow_hyphen_values = true)]
        expression: String,
        /// Frequency used for the monthly amount
        #[arg(short, long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
    },

    /// List supported frequencies
    Frequencies,

    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(tally::cli::TransactionCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(tally::cli::CategoryCommands),

    /// Reports
    #[command(subcommand)]
    Report(tally::cli::ReportCommands),

    /// Upcoming and due occurrences
    #[command(subcommand)]
    Schedule(tally::cli::ScheduleCommands),

    /// Export data
    #[command(subcommand)]
    Export(tally::cli::ExportCommands),
}

impl Commands {
    /// Commands that read or write stored data need `tally init` first
    fn needs_data(&self) -> bool {
        !matches!(
            self,
            Commands::Init | Commands::Config { .. } | Commands::Eval { .. } | Commands::Frequencies
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TallyPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    init_logging(cli.verbose, &settings.log_level);

    let Some(command) = cli.command else {
        println!("Tally - formula-defined recurring transactions");
        println!();
        println!("Run 'tally --help' for usage information.");
        println!("Run 'tally init' to get started.");
        return Ok(());
    };

    if command.needs_data() && !paths.is_initialized() {
        bail!("Tally is not initialized. Run 'tally init' first.");
    }

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match command {
        Commands::Init => {
            println!("Initializing Tally at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            settings.setup_completed = true;
            settings.save(&paths)?;
            storage.load_all()?;

            println!("Initialization complete!");
            println!();
            println!("{} categories available.", storage.categories.count()?);
            println!("Run 'tally category list' to see them.");
            println!("Run 'tally transaction add <description> <expression>' to add a transaction.");
        }

        Commands::Config { key, value } => match (key, value) {
            (Some(key), Some(value)) => {
                settings.set(&key, &value)?;
                settings.save(&paths)?;
                println!("Set {} = {}", key, value);
            }
            _ => {
                println!("Tally Configuration");
                println!("===================");
                println!("Base directory:   {}", paths.base_dir().display());
                println!("Data directory:   {}", paths.data_dir().display());
                println!("Export directory: {}", paths.export_dir().display());
                println!("Initialized:      {}", paths.is_initialized());
                println!();
                println!("Settings:");
                println!("  owner_id:               {}", settings.owner_id);
                println!("  currency_symbol:        {}", settings.currency_symbol);
                println!("  date_format:            {}", settings.date_format);
                println!("  default_frequency:      {}", settings.default_frequency);
                println!("  max_reference_depth:    {}", settings.max_reference_depth);
                println!("  summary_failure_policy: {}", settings.summary_failure_policy);
                println!("  log_level:              {}", settings.log_level);
            }
        },

        Commands::Eval {
            expression,
            frequency,
        } => handle_eval_command(&storage, &settings, &expression, frequency).await?,

        Commands::Frequencies => handle_frequencies_command(),

        Commands::Transaction(cmd) => handle_transaction_command(&storage, &settings, cmd).await?,

        Commands::Category(cmd) => handle_category_command(&storage, cmd)?,

        Commands::Report(cmd) => handle_report_command(&storage, &settings, cmd).await?,

        Commands::Schedule(cmd) => handle_schedule_command(&storage, &settings, cmd)?,

        Commands::Export(cmd) => handle_export_command(&storage, &settings, cmd).await?,
    }

    Ok(())
}
