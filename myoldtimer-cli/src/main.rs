use anyhow::Result;
use clap::{Parser, Subcommand};
use myoldtimer_core::{Clock, PrefixedIds, SystemClock, WarningConfig};
use myoldtimer_store::{Garage, JsonFileStore};

mod config;
mod maintenance_cmd;
mod records_cmd;
mod render;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "myoldtimer",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MYOLDTIMER_BUILD_SHA"), ")"),
    about = "Maintenance tracker for classic cars"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every maintenance category with its due state, most urgent first
    Status {
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Manage maintenance categories
    Category {
        #[command(subcommand)]
        command: maintenance_cmd::CategoryCommand,
    },

    /// Manage the service log
    Log {
        #[command(subcommand)]
        command: maintenance_cmd::LogCommand,
    },

    /// Show or set the current odometer reading
    Mileage {
        #[command(subcommand)]
        command: maintenance_cmd::MileageCommand,
    },

    /// Restoration checklist
    Checklist {
        #[command(subcommand)]
        command: records_cmd::ChecklistCommand,
    },

    /// Replaced-parts history
    Replace {
        #[command(subcommand)]
        command: records_cmd::ReplaceCommand,
    },

    /// Normalize all stored records and write back the ones that changed
    Migrate,

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective configuration
    Show,
}

/// Process-wide handles, built once and lent to every command.
pub struct App {
    store: JsonFileStore,
    ids: PrefixedIds,
    clock: SystemClock,
    warning: WarningConfig,
}

impl App {
    fn from_config(cfg: &config::Config) -> Result<Self> {
        Ok(Self {
            store: JsonFileStore::new(cfg.data_dir()?),
            ids: PrefixedIds::new(),
            clock: SystemClock::new(cfg.timezone()?),
            warning: cfg.warning()?,
        })
    }

    pub fn garage(&self) -> Garage<'_, JsonFileStore> {
        Garage::new(&self.store, &self.ids, &self.clock).with_warning(self.warning)
    }

    /// Today in the configured timezone, `YYYY-MM-DD`.
    pub fn clock_today(&self) -> String {
        self.clock.today_iso()
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => config::show_config(),
        };
    }

    let cfg = config::load_config()?;
    let app = App::from_config(&cfg)?;
    log::debug!("data dir: {}", app.store.dir().display());

    // Ids printed or resolved by a command must be the ones on disk.
    if !matches!(cli.command, Command::Migrate) {
        let report = app.garage().migrate().await?;
        if report.any() {
            log::info!("migrated stored records: {report:?}");
        }
    }

    match cli.command {
        Command::Status { json } => maintenance_cmd::status(&app, json).await?,
        Command::Category { command } => maintenance_cmd::run_category(&app, command).await?,
        Command::Log { command } => maintenance_cmd::run_log(&app, command).await?,
        Command::Mileage { command } => maintenance_cmd::run_mileage(&app, command).await?,
        Command::Checklist { command } => records_cmd::run_checklist(&app, command).await?,
        Command::Replace { command } => records_cmd::run_replace(&app, command).await?,
        Command::Migrate => maintenance_cmd::migrate(&app).await?,
        Command::Config { .. } => {}
    }

    Ok(())
}
