use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod api;
mod config;
mod credit;
mod error;
mod import;
mod listing;
mod models;
mod report;
mod session;
mod store;
mod view;

use api::ApiClient;
use config::Config;
use listing::SortMode;
use models::ActivityType;
use session::Session;
use store::{Store, TOKEN_KEY};
use view::{Event, NoticeKind, ViewState};

#[derive(Parser)]
#[command(name = "carbon-credit")]
#[command(about = "Log carbon-saving activities and track their credit score", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the bearer token used for API calls
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the token and the saved wallet address
    Logout,
    /// Show or change the saved wallet address
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// List submitted activities with their credit
    List {
        #[arg(long = "type")]
        filter: Option<ActivityType>,
        #[arg(long, value_enum, default_value_t = SortMode::NewestFirst)]
        sort: SortMode,
    },
    /// Submit a new activity
    Submit {
        #[arg(long = "type")]
        activity_type: ActivityType,
        #[arg(long)]
        amount: String,
        /// Wallet address to use when none is saved yet
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Delete an activity by id
    Delete { id: String },
    /// Submit activities from a CSV file (activity_type,amount[,wallet_address])
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long = "type")]
        filter: Option<ActivityType>,
        #[arg(long, value_enum, default_value_t = SortMode::NewestFirst)]
        sort: SortMode,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Print the saved wallet address and its balance
    Show,
    /// Save a wallet address
    Set {
        address: String,
        /// Replace an already saved address
        #[arg(long)]
        change: bool,
    },
    /// Remove the saved wallet address
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_credit=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let mut store = Store::open(&config.state_file)
        .with_context(|| format!("failed to open {}", config.state_file.display()))?;

    match cli.command {
        Commands::Login { token } => {
            store.set(TOKEN_KEY, &token)?;
            println!("Token saved to {}.", store.path().display());
        }
        Commands::Logout => {
            session::logout(&mut store)?;
            println!("Logged out.");
        }
        Commands::Wallet { action } => {
            let mut session = connect(&config, store)?;
            match action {
                WalletAction::Show => {}
                WalletAction::Set { address, change } => session.set_wallet(&address, change)?,
                WalletAction::Reset => {
                    session.enable_wallet_change();
                    session.reset_wallet()?;
                }
            }
            session.refresh_balance().await;
            print_wallet(session.state());
        }
        Commands::List { filter, sort } => {
            let session = load_page(&config, store, filter, sort).await?;
            print_activities(session.state());
        }
        Commands::Submit {
            activity_type,
            amount,
            wallet,
        } => {
            let mut session = connect(&config, store)?;
            if let Some(wallet) = wallet {
                session.set_wallet(&wallet, false)?;
            }
            session.apply(Event::TypeSelected(Some(activity_type)));
            session.apply(Event::AmountEntered(amount));
            if session.submit().await? {
                session.refresh_balance().await;
            }
            print_notice(session.state());
            if let Some(created) = session.state().activities.first() {
                println!(
                    "{} {} x {} = {} credit",
                    created.id,
                    created.activity_type,
                    created.amount,
                    credit::activity_credit(created)
                );
                print_wallet(session.state());
            }
        }
        Commands::Delete { id } => {
            let mut session = connect(&config, store)?;
            if session.delete(&id).await {
                session.refresh_balance().await;
                print_wallet(session.state());
            }
            print_notice(session.state());
        }
        Commands::Import { csv } => {
            let file = import::read_rows(&csv)?;
            let mut session = connect(&config, store)?;
            let summary = import::import_rows(&mut session, &file).await;
            session.refresh_balance().await;
            println!(
                "Imported {} of {} activities from {} ({} rejected).",
                summary.accepted,
                summary.accepted + summary.rejected,
                csv.display(),
                summary.rejected
            );
            print_wallet(session.state());
        }
        Commands::Report { filter, sort, out } => {
            let session = load_page(&config, store, filter, sort).await?;
            let report = report::build_report(session.state());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn connect(config: &Config, store: Store) -> anyhow::Result<Session<ApiClient>> {
    let token = session::stored_token(&store)?;
    let client = ApiClient::new(config.api_url()?, &token, config.http_timeout)
        .context("failed to build HTTP client")?;
    Ok(Session::mount(client, store)?)
}

/// Mount effects: fetch the list, then the balance that depends on it.
async fn load_page(
    config: &Config,
    store: Store,
    filter: Option<ActivityType>,
    sort: SortMode,
) -> anyhow::Result<Session<ApiClient>> {
    let mut session = connect(config, store)?;
    session.apply(Event::FilterChanged(filter));
    session.apply(Event::SortChanged(sort));
    session.load_activities().await;
    session.refresh_balance().await;
    Ok(session)
}

fn print_wallet(state: &ViewState) {
    if state.wallet_address.is_empty() {
        println!("No wallet address saved.");
    } else {
        println!(
            "Wallet {} balance {}",
            state.wallet_address,
            report::format_balance(state.balance)
        );
    }
}

fn print_notice(state: &ViewState) {
    match &state.notice {
        Some(notice) if notice.kind == NoticeKind::Error => eprintln!("{}", notice.text),
        Some(notice) => println!("{}", notice.text),
        None => {}
    }
}

fn print_activities(state: &ViewState) {
    if state.loading {
        return;
    }
    print_wallet(state);
    println!("Total credit: {}", state.total_credit());

    let visible = state.visible_activities();
    if visible.is_empty() {
        println!("No activities submitted yet.");
        return;
    }

    println!("Submitted activities:");
    for activity in visible {
        println!(
            "- [{}] {} {} x {} = {} credit",
            activity.id,
            activity.wallet_address,
            activity.activity_type,
            activity.amount,
            credit::activity_credit(activity)
        );
    }
}
