//! tokentrack fetch CLI.
//!
//! Pulls recent ERC-20 `Transfer` logs for the tracked token on each
//! supported chain and stores them as Parquet files.
//!
//! # Usage
//!
//! ```bash
//! # Fetch every chain's trailing window (same as `tokentrack-fetch fetch`)
//! tokentrack-fetch
//!
//! # Fetch one chain through a custom endpoint
//! tokentrack-fetch fetch --chain polygon --rpc https://my-rpc.example.com
//!
//! # Continue from the last fetched block instead of a fixed window
//! tokentrack-fetch fetch --resume --parallel
//!
//! # Inspect what is stored
//! tokentrack-fetch show --chain eth --address 0xdac17f
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokentrack::Chain;
use tokentrack_fetch::{
    ChainConfig, Config, FetchError, FetchOptions, FetchOutcome, Store, StoreError, WindowMode,
    fetcher, summary,
};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CONFIG: &str = "config.toml";

/// Cross-chain ERC-20 transfer fetcher.
#[derive(Debug, Parser)]
#[command(name = "tokentrack-fetch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch recent transfers into each chain's Parquet file.
    Fetch(FetchArgs),

    /// List the resolved per-chain configuration.
    List {
        /// Path to the TOML configuration file.
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Print the stored transfers of one chain with totals.
    Show {
        /// Chain to show (`eth`, `polygon`, `bnb`).
        #[arg(long)]
        chain: Chain,

        /// Directory holding chain data.
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Path to the TOML configuration file.
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Only transfers whose sender or recipient contains this fragment.
        #[arg(long)]
        address: Option<String>,

        /// Maximum number of rows to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Output directory for chain data.
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Fetch only this chain. If omitted, all chains are fetched.
    #[arg(long)]
    chain: Option<Chain>,

    /// Override the RPC endpoint of the target chain.
    /// Only valid when `--chain` is also specified.
    #[arg(long)]
    rpc: Option<String>,

    /// Continue after the last fetched block and append, instead of
    /// replacing with a fixed trailing window.
    #[arg(long)]
    resume: bool,

    /// Fetch chains concurrently, one task per chain.
    #[arg(long)]
    parallel: bool,
}

impl Default for FetchArgs {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.into(),
            config: DEFAULT_CONFIG.into(),
            chain: None,
            rpc: None,
            resume: false,
            parallel: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or_else(|| Command::Fetch(FetchArgs::default())) {
        Command::Fetch(args) => cmd_fetch(args).await,
        Command::List { config } => cmd_list(&Config::load(&config)?),
        Command::Show {
            chain,
            data_dir,
            config,
            address,
            limit,
        } => cmd_show(
            &Config::load(&config)?,
            &Store::new(data_dir),
            chain,
            address.as_deref(),
            limit,
        ),
    }
}

/// Execute the `fetch` subcommand.
async fn cmd_fetch(args: FetchArgs) -> Result<()> {
    if args.rpc.is_some() && args.chain.is_none() {
        bail!("--rpc requires --chain to be specified");
    }

    let config = Config::load(&args.config)?;
    let targets: Vec<ChainConfig> = match args.chain {
        Some(chain) => {
            let mut cfg = config.resolve(chain);
            if let Some(rpc) = args.rpc {
                cfg.rpc_endpoint = rpc;
            }
            vec![cfg]
        }
        None => config.resolve_all(),
    };

    let opts = FetchOptions {
        timeout: config.request_timeout(),
        mode: if args.resume {
            WindowMode::Resume
        } else {
            WindowMode::Trailing
        },
    };
    let store = Store::new(args.data_dir);

    tracing::info!(
        chains = targets.len(),
        data_dir = %store.root().display(),
        mode = ?opts.mode,
        "starting fetch"
    );

    let results = if args.parallel {
        fetch_parallel(targets, &store, opts).await?
    } else {
        let mut results = Vec::with_capacity(targets.len());
        for chain in targets {
            let result = fetcher::fetch_chain(&chain, &store, opts).await;
            results.push((chain.chain, result));
        }
        results
    };

    let mut success = 0u32;
    let mut failed = 0u32;
    for (chain, result) in results {
        if report(chain, &result) {
            success += 1;
        } else {
            failed += 1;
        }
    }

    tracing::info!(success, failed, "fetch finished");

    if failed > 0 {
        bail!("{failed} chain(s) failed to fetch");
    }

    Ok(())
}

/// One task per chain; chains share nothing but the data directory root.
async fn fetch_parallel(
    targets: Vec<ChainConfig>,
    store: &Store,
    opts: FetchOptions,
) -> Result<Vec<(Chain, Result<FetchOutcome, FetchError>)>> {
    let mut tasks = tokio::task::JoinSet::new();
    for chain in targets {
        let store = store.clone();
        tasks.spawn(async move {
            let result = fetcher::fetch_chain(&chain, &store, opts).await;
            (chain.chain, result)
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("fetch task panicked")?);
    }
    results.sort_by_key(|(chain, _)| *chain);
    Ok(results)
}

/// Log the outcome of one chain. Returns `true` on success.
fn report(chain: Chain, result: &Result<FetchOutcome, FetchError>) -> bool {
    match result {
        Ok(outcome @ FetchOutcome::Written { records, .. }) => {
            tracing::info!(
                chain = %chain,
                records,
                skipped = outcome.failures().len(),
                "fetch complete"
            );
            true
        }
        Ok(outcome @ FetchOutcome::Empty { .. }) => {
            tracing::info!(
                chain = %chain,
                skipped = outcome.failures().len(),
                "fetch complete, no new transfers"
            );
            true
        }
        Err(e) => {
            tracing::error!(chain = %chain, error = %e, "fetch failed, stored data unchanged");
            false
        }
    }
}

/// Execute the `list` subcommand.
#[allow(clippy::print_stdout, clippy::unnecessary_wraps)]
fn cmd_list(config: &Config) -> Result<()> {
    println!(
        "{:<10} {:<10} {:<44} {:<10} {:<4} RPC",
        "Chain", "Chain ID", "Token", "Lookback", "Dec"
    );
    println!("{}", "-".repeat(110));

    for chain in config.resolve_all() {
        println!(
            "{:<10} {:<10} {:<44} {:<10} {:<4} {}",
            chain.id(),
            chain.chain.chain_id(),
            format!("{:#x}", chain.token_address),
            chain.lookback_blocks,
            chain.decimals,
            chain.rpc_endpoint,
        );
    }
    Ok(())
}

/// Execute the `show` subcommand.
#[allow(clippy::print_stdout)]
fn cmd_show(
    config: &Config,
    store: &Store,
    chain: Chain,
    address: Option<&str>,
    limit: usize,
) -> Result<()> {
    let decimals = config.resolve(chain).decimals;
    let records = match store.load(chain, decimals) {
        Ok(records) => records,
        Err(StoreError::NotFound(_)) => {
            bail!("no data for {chain} yet; run `tokentrack-fetch fetch --chain {chain}` first")
        }
        Err(e) => return Err(e).with_context(|| format!("loading {chain}")),
    };

    let shown: Vec<_> = records
        .iter()
        .filter(|r| address.is_none_or(|needle| summary::matches_address(r, needle)))
        .collect();

    println!(
        "{:<66} {:>10} {:<42} {:<42} {:>16}",
        "tx_hash", "block", "from", "to", "value"
    );
    for r in shown.iter().take(limit) {
        println!(
            "{:<66} {:>10} {:<42} {:<42} {:>16.2}",
            format!("{:#x}", r.tx_hash),
            r.block_number,
            format!("{:#x}", r.from),
            format!("{:#x}", r.to),
            r.value,
        );
    }
    if shown.len() > limit {
        println!("... {} more", shown.len() - limit);
    }

    let totals = summary::summarize(shown.iter().copied());
    println!();
    println!("Total transfers: {}", totals.transfers);
    println!("Total volume:    {:.2}", totals.volume);
    println!("Volume by block:");
    for (block, volume) in &totals.by_block {
        println!("  {block:>10}  {volume:>16.2}");
    }
    Ok(())
}
