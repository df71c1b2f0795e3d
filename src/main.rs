//! tradeterm - terminal client for the trading backend.
//!
//! Thin command-line front-end over the client core: restores the session
//! from disk, routes every command through the navigation guard, and
//! prints notices the core emits.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradeterm::models::{OrderSide, OrderTicket};
use tradeterm::{
    notice_channel, ApiClient, Config, FileStore, GuardOutcome, HistoryNavigator, Navigator,
    NavigationGuard, Notice, NoticeLevel, RouteTable, SessionManager,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!(
        "Usage: tradeterm <command>\n\n\
         Commands:\n\
         \x20 status                          show session state\n\
         \x20 login [username]                authenticate and store the session\n\
         \x20 logout                          clear the session\n\
         \x20 quote <symbol>                  fetch a market quote\n\
         \x20 account                         show the account summary (requires login)\n\
         \x20 order <symbol> <buy|sell> <qty> <price>   submit an order (requires login)"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("tradeterm starting");

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let store = Arc::new(FileStore::open_default("tradeterm")?);
    let (notices, mut notice_rx) = notice_channel();
    let navigator = Arc::new(HistoryNavigator::new());
    let routes = RouteTable::default();

    let session = Arc::new(SessionManager::new(
        store,
        navigator.clone(),
        notices.clone(),
        routes.clone(),
    ));
    session.initialize();

    let guard = NavigationGuard::new(session.clone(), routes);
    let api = ApiClient::new(&config.base_url, config.timeout_secs, session.clone(), notices)?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("status");

    let result = match command {
        "status" => {
            show_status(&session);
            Ok(())
        }
        "login" => login(&api, &session, config, args.get(2).cloned()).await,
        "logout" => {
            session.logout();
            println!("Logged out");
            Ok(())
        }
        "quote" => match args.get(2) {
            Some(symbol) => quote(&api, &guard, &navigator, symbol).await,
            None => {
                usage();
                Ok(())
            }
        },
        "account" => account(&api, &guard, &navigator).await,
        "order" => order(&api, &guard, &navigator, &args[2..]).await,
        _ => {
            usage();
            Ok(())
        }
    };

    flush_notices(&mut notice_rx);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("tradeterm done");
    Ok(())
}

/// Route a command through the guard the way a router would. Returns true
/// when the transition landed on the requested path.
fn navigate(guard: &NavigationGuard, navigator: &HistoryNavigator, to: &str) -> bool {
    let from = navigator.current_path();
    let outcome = guard.evaluate(&from, to);
    navigator.push(outcome.target(to));
    match outcome {
        GuardOutcome::Proceed => true,
        GuardOutcome::ToLogin => {
            eprintln!("Login required - run `tradeterm login`");
            false
        }
        GuardOutcome::ToRoot => {
            eprintln!("Already logged in");
            false
        }
    }
}

fn show_status(session: &SessionManager) {
    let snap = session.snapshot();
    if snap.logged_in {
        println!(
            "Logged in as {} (user id {})",
            snap.username.as_deref().unwrap_or("?"),
            snap.user_id.as_deref().unwrap_or("?")
        );
        println!("Last visited: {}", session.last_visited_path());
    } else {
        println!("Not logged in");
    }
}

async fn login(
    api: &ApiClient,
    session: &Arc<SessionManager>,
    mut config: Config,
    username_arg: Option<String>,
) -> Result<()> {
    let username = match username_arg.or_else(|| config.last_username.clone()) {
        Some(u) => u,
        None => prompt_username()?,
    };

    let password = match std::env::var("TRADETERM_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    let data = api.login(&username, &password).await?;
    session.set_login_info(&data.token, &data.user_id, &data.username)?;

    config.last_username = Some(data.username.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    session.redirect_after_login();
    println!("Logged in as {}", data.username);
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

async fn quote(
    api: &ApiClient,
    guard: &NavigationGuard,
    navigator: &HistoryNavigator,
    symbol: &str,
) -> Result<()> {
    if !navigate(guard, navigator, "/quotes") {
        return Ok(());
    }

    let quote = api.fetch_quote(symbol).await?;
    let change = quote
        .change_percent
        .map(|c| format!(" ({:+.2}%)", c))
        .unwrap_or_default();
    println!(
        "{} {} {:.2}{}",
        quote.symbol,
        quote.name.as_deref().unwrap_or(""),
        quote.last,
        change
    );
    Ok(())
}

async fn account(
    api: &ApiClient,
    guard: &NavigationGuard,
    navigator: &HistoryNavigator,
) -> Result<()> {
    if !navigate(guard, navigator, "/account") {
        return Ok(());
    }

    let account = api.fetch_account().await?;
    println!(
        "{} (user id {}): balance {:.2}",
        account.username, account.user_id, account.balance
    );
    Ok(())
}

async fn order(
    api: &ApiClient,
    guard: &NavigationGuard,
    navigator: &HistoryNavigator,
    args: &[String],
) -> Result<()> {
    let (symbol, side, quantity, price) = match args {
        [symbol, side, qty, price] => {
            let side = match side.to_lowercase().as_str() {
                "buy" => OrderSide::Buy,
                "sell" => OrderSide::Sell,
                other => anyhow::bail!("Unknown order side: {}", other),
            };
            (
                symbol.to_uppercase(),
                side,
                qty.parse::<u32>()?,
                price.parse::<f64>()?,
            )
        }
        _ => {
            usage();
            return Ok(());
        }
    };

    if !navigate(guard, navigator, "/trade") {
        return Ok(());
    }

    let receipt = api
        .submit_order(&OrderTicket {
            symbol,
            side,
            quantity,
            price,
        })
        .await?;
    println!("Order {} {}", receipt.order_id, receipt.status);
    Ok(())
}

/// Print any notices the core emitted during the command.
fn flush_notices(rx: &mut UnboundedReceiver<Notice>) {
    while let Ok(Notice { level, text }) = rx.try_recv() {
        match level {
            NoticeLevel::Error => eprintln!("error: {}", text),
            NoticeLevel::Warning => eprintln!("warning: {}", text),
            NoticeLevel::Info => eprintln!("{}", text),
        }
    }
}
