//! GE ORACLE: Grand Exchange profit ranker
//!
//! Entry point. Loads configuration, initialises structured logging to
//! the application log, and runs the interactive prompt loop: read a gp
//! amount, rank the best trades, draw the table, repeat until Ctrl+C.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use ge_oracle::config::AppConfig;
use ge_oracle::display::{Renderer, TableRenderer};
use ge_oracle::engine::recommender::Recommender;
use ge_oracle::gold::parse_gold_amount;
use ge_oracle::prices::wiki::WikiPriceClient;

const BANNER: &str = r#"
   ____ _____    ___  ____      _    ____ _     _____
  / ___| ____|  / _ \|  _ \    / \  / ___| |   | ____|
 | |  _|  _|   | | | | |_) |  / _ \| |   | |   |  _|
 | |_| | |___  | |_| |  _ <  / ___ \ |___| |___| |___
  \____|_____|  \___/|_| \_\/_/   \_\____|_____|_____|

  Grand Exchange profit ranker
"#;

const PROMPT: &str = "How much gp do you have? ";
const INPUT_HINT: &str =
    "Please enter a valid gp amount. Use 'k' for thousand, 'm' for million, or 'b' for billion.";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::default_path();
    let cfg = AppConfig::load_or_default(&config_path)?;

    init_logging(&cfg);

    let interactive = std::io::stdout().is_terminal();
    if interactive {
        println!("{}", BANNER.green());
    } else {
        println!("{BANNER}");
    }

    info!(
        config = %config_path,
        base_url = %cfg.api.base_url,
        tax_rate_bps = cfg.trading.tax_rate_bps,
        tax_cap = cfg.trading.tax_cap,
        top_n = cfg.trading.top_n,
        "GE ORACLE starting up"
    );

    let source = WikiPriceClient::new(&cfg.api)?;
    let recommender = Recommender::from_config(Box::new(source), &cfg);
    let mut renderer = TableRenderer::new(std::io::stdout())
        .with_color(interactive)
        .with_clear_screen(interactive);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", if interactive { PROMPT.cyan().to_string() } else { PROMPT.to_string() });
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let input = tokio::select! {
            line = lines.next_line() => match line.context("Failed to read from stdin")? {
                Some(line) => line,
                None => {
                    info!("stdin closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupt received at prompt.");
                break;
            }
        };

        let capital = match parse_gold_amount(&input) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Rejected gp input");
                println!("{e}\n{INPUT_HINT}");
                continue;
            }
        };

        let set = tokio::select! {
            set = recommender.get_recommendations(Some(capital)) => set,
            _ = tokio::signal::ctrl_c() => {
                println!();
                warn!(capital, "Interrupt received, round aborted");
                continue;
            }
        };

        if let Err(e) = renderer.render(&set) {
            error!(error = %e, "Failed to render recommendations");
        }
        if set.is_empty() {
            println!("No recommendations available this round. See the log for details.");
        }
    }

    info!("GE ORACLE shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber, writing to the log file.
fn init_logging(cfg: &AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ge_oracle=info"));

    let json_logging = std::env::var("GE_ORACLE_LOG_JSON").is_ok();

    let file = match OpenOptions::new().create(true).append(true).open(&cfg.logging.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}; logging to stderr", cfg.logging.file);
            fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
            return;
        }
    };

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}
