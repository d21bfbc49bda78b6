//! stockwatcher - stock statistics and price alerts
//!
//! Run one watch pass (typically hourly from cron):
//! ```sh
//! stockwatcher run
//! ```
//!
//! Manage users and positions:
//! ```sh
//! stockwatcher add-user --name Ann --email ann@example.com --cooldown-hours 24
//! stockwatcher add-position --email ann@example.com --symbol MSFT \
//!     --entry-date 2012-09-03 --entry-price 30.50 --shares 100 --trailing-stop 10
//! stockwatcher list --email ann@example.com
//! ```

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use stockwatcher::application::bootstrap::{
    PersistenceBootstrap, ServicesBootstrap, ServicesHandle,
};
use stockwatcher::config::Config;
use stockwatcher::domain::market::calendar::AsOf;
use stockwatcher::domain::tracking::position::{Position, SignalSettings};
use stockwatcher::domain::tracking::user::User;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    db: Option<String>,

    /// SMTP relay as host or host:port (overrides SMTP_HOST/SMTP_PORT)
    #[arg(long, global = true)]
    mail_server: Option<String>,

    /// Log alerts instead of mailing them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backfill history, refresh trends and send due alerts
    Run {
        /// Refetch current prices even if this bucket is cached
        #[arg(long)]
        force: bool,
    },
    /// Show a user's positions with current statistics
    List {
        #[arg(short, long)]
        email: String,
    },
    AddUser {
        #[arg(short, long)]
        name: String,

        /// Primary email
        #[arg(short, long)]
        email: String,

        /// Additional addresses the user can be looked up by
        #[arg(long)]
        secondary: Vec<String>,

        /// Minimum time between two alerts on the same channel
        #[arg(long, default_value = "24")]
        cooldown_hours: i64,
    },
    AddPosition {
        /// Owner's email
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        symbol: String,

        /// YYYY-MM-DD
        #[arg(long)]
        entry_date: NaiveDate,

        #[arg(long)]
        entry_price: Decimal,

        /// Negative for a short, 0 to only watch
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        shares: i64,

        /// Percent below the highest close (above the lowest for shorts)
        #[arg(long)]
        trailing_stop: Option<Decimal>,

        #[arg(long)]
        buy_stop: Option<Decimal>,

        #[arg(long)]
        sell_stop: Option<Decimal>,

        /// Daily rise in percent
        #[arg(long)]
        rise: Option<Decimal>,

        /// Daily fall in percent
        #[arg(long)]
        fall: Option<Decimal>,

        /// Alert on 50/200 day average crossovers
        #[arg(long)]
        bull_bear: bool,
    },
    RemovePosition {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let persistence = PersistenceBootstrap::init(&config.store).await?;
    let services = ServicesBootstrap::init(&config, &persistence)?;

    match cli.command {
        Commands::Run { force } => {
            info!("stockwatcher {} starting watch pass", env!("CARGO_PKG_VERSION"));
            let as_of = AsOf::now(config.watch.exchange_timezone, config.watch.quote_bucket);
            let report = services.watch_pass().run(as_of, force).await?;
            if !report.failed_symbols.is_empty() {
                info!("Symbols not refreshed: {}", report.failed_symbols.join(", "));
            }
            if !report.failed_positions.is_empty() {
                info!("Positions not evaluated: {:?}", report.failed_positions);
            }
        }
        Commands::List { email } => {
            let as_of = AsOf::now(config.watch.exchange_timezone, config.watch.quote_bucket);
            list_positions(&services, &email, &as_of).await?;
        }
        Commands::AddUser {
            name,
            email,
            secondary,
            cooldown_hours,
        } => {
            let mut user = User::new(name, email, Duration::hours(cooldown_hours));
            for address in secondary {
                user = user.with_secondary_email(address);
            }
            let id = services.tracker.add_user(&user).await?;
            println!("Added user {}", id);
        }
        Commands::AddPosition {
            email,
            symbol,
            entry_date,
            entry_price,
            shares,
            trailing_stop,
            buy_stop,
            sell_stop,
            rise,
            fall,
            bull_bear,
        } => {
            let user = find_user(&services, &email).await?;
            let signals = SignalSettings {
                trailing_stop_percent: trailing_stop,
                buy_stop_price: buy_stop,
                sell_stop_price: sell_stop,
                rise_percent: rise,
                fall_percent: fall,
                notify_bull_bear: bull_bear,
                ..Default::default()
            };
            let position = Position::new(user.id, symbol, entry_date, entry_price, shares)
                .with_signals(signals);
            let id = services.tracker.add_position(position).await?;
            println!("Added position {}", id);
        }
        Commands::RemovePosition { id } => {
            if !services.tracker.remove_position(id).await? {
                bail!("No position with id {}", id);
            }
            println!("Removed position {}", id);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(db) = &cli.db {
        config.store.database_url = db.clone();
    }
    if let Some(server) = &cli.mail_server {
        match server.rsplit_once(':') {
            Some((host, port)) => {
                config.mail.smtp_host = host.to_string();
                config.mail.smtp_port = port
                    .parse()
                    .with_context(|| format!("Invalid port in --mail-server {}", server))?;
            }
            None => config.mail.smtp_host = server.clone(),
        }
    }
    if cli.dry_run {
        config.mail.dry_run = true;
    }

    Ok(config)
}

async fn find_user(services: &ServicesHandle, email: &str) -> Result<User> {
    services
        .tracker
        .user_by_email(email)
        .await?
        .with_context(|| format!("No user with email {}", email))
}

async fn list_positions(services: &ServicesHandle, email: &str, as_of: &AsOf) -> Result<()> {
    let user = find_user(services, email).await?;
    let details = services.tracker.details(user.id, as_of).await?;

    println!(
        "{:>5} {:<8} {:>10} {:>8} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "id", "symbol", "entry", "shares", "price", "stop", "gain $", "gain %", "sma %"
    );
    for detail in details {
        let position = &detail.position;
        let price = detail
            .current_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let (stop, gain_dollar, gain_percent) = match &detail.stats {
            Some(stats) => (
                stats
                    .trailing_stop_price
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                stats.gain_dollar.to_string(),
                format!("{:.2}", stats.gain_percent),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let sma = detail
            .latest_trend
            .as_ref()
            .map(|t| format!("{:.2}", t.sma_percent))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:>5} {:<8} {:>10} {:>8} {:>10} {:>10} {:>10} {:>8} {:>8}",
            position.id,
            position.symbol,
            position.entry_date,
            position.shares,
            price,
            stop,
            gain_dollar,
            gain_percent,
            sma
        );
    }
    Ok(())
}
