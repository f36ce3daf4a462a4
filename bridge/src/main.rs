use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use eyre::WrapErr;
use stargate_bridge::{
    config, connect, ensure_affordable, fetch_balance, parse_amount, Bridge, ContractInvoker,
    PrivateKey, Registry, Slippage, TokenKind, TransferRequest,
};
use tracing::info;

/// Bridge ETH or USDC between chains through Stargate V2 pools.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Chain registry to use instead of the built-in one.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Environment file holding PRIVATE_KEY.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered chains and their pools.
    Chains,
    /// Quote the fee and transaction value without sending anything.
    Quote(TransferArgs),
    /// Approve if needed, then submit the bridge transaction.
    Send(TransferArgs),
}

#[derive(Debug, Args)]
struct TransferArgs {
    /// Source chain name.
    #[arg(long)]
    from: String,

    /// Destination chain name.
    #[arg(long)]
    to: String,

    /// Asset to bridge: ETH or USDC.
    #[arg(long)]
    token: TokenKind,

    /// Amount in whole tokens, e.g. 0.25.
    #[arg(long)]
    amount: String,

    /// Receiving address on the destination chain. Defaults to the sender.
    #[arg(long)]
    recipient: Option<Address>,

    #[arg(long, default_value_t = Slippage::DEFAULT.bps())]
    slippage_bps: u16,

    /// RPC endpoint overriding the registry's.
    #[arg(long)]
    rpc_url: Option<String>,

    /// How long to wait for the approval to be mined.
    #[arg(long, default_value_t = 180)]
    receipt_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    config::load_dotenv(&cli.env_file)?;
    init_logging(cli.log_file.as_deref())?;

    let registry = match &cli.registry {
        Some(path) => Registry::load(path)?,
        None => Registry::builtin()?,
    };

    match cli.command {
        Command::Chains => {
            list_chains(&registry);
            Ok(())
        }
        Command::Quote(args) => transfer(&registry, args, true).await,
        Command::Send(args) => transfer(&registry, args, false).await,
    }
}

async fn transfer(registry: &Registry, args: TransferArgs, dry_run: bool) -> eyre::Result<()> {
    let kind = args.token;
    let slippage = Slippage::from_bps(args.slippage_bps)?;

    // Every registry check happens before the first network call.
    let (source, _) = registry.route(&args.from, &args.to, kind)?;

    let private_key = PrivateKey::from_env()?;
    let rpc_url = match &args.rpc_url {
        Some(url) => url.as_str(),
        None => source.rpc_url()?,
    };
    let invoker = connect(rpc_url, &private_key)?
        .with_receipt_timeout(Duration::from_secs(args.receipt_timeout_secs));
    let sender = invoker.sender();

    let balance = fetch_balance(&invoker, source, kind, sender).await?;
    info!(%balance, %sender, chain = %source.name, "current balance");

    let amount = parse_amount(&args.amount, balance.decimals)?;
    ensure_affordable(amount, &balance)?;

    let mut request = TransferRequest::resolve(registry, &args.from, &args.to, kind, amount, sender)?;
    if let Some(recipient) = args.recipient {
        request = request.with_recipient(recipient);
    }

    let bridge = Bridge::new(request.source.clone(), invoker).with_slippage(slippage);

    if dry_run {
        let quote = bridge.quote(&request).await?;
        println!("pool:             {}", quote.pool);
        println!("native fee:       {} wei", quote.fee.native_fee);
        println!("tx value:         {} wei", quote.value);
        println!("minimum received: {}", quote.params.minimum_received);
        return Ok(());
    }

    let outcome = bridge
        .transfer(&request)
        .await
        .wrap_err_with(|| format!("bridging {} from {} to {}", kind, args.from, args.to))?;

    println!("transaction sent: {outcome}");
    if let Some(link) = outcome.explorer_link(&request.source) {
        println!("{link}");
    }
    Ok(())
}

fn list_chains(registry: &Registry) {
    for (i, name) in registry.chain_names().into_iter().enumerate() {
        let Ok(chain) = registry.chain(name) else {
            continue;
        };
        let pools: Vec<String> = TokenKind::ALL
            .iter()
            .filter_map(|kind| chain.pool(*kind).ok().map(|pool| format!("{kind}={pool}")))
            .collect();
        println!(
            "{}: {} (chain id {}, eid {}) {}",
            i + 1,
            chain.name,
            chain.chain_id,
            chain.endpoint_id,
            pools.join(" ")
        );
    }
}

fn init_logging(log_file: Option<&Path>) -> eyre::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}
