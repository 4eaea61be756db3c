use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inj_broadcast::broadcast::BroadcastRequest;
use inj_broadcast::chain::{resolve_addresses, GasEstimator, Message, MessageGasEstimator, TxRestClient};
use inj_broadcast::config::{Config, MNEMONIC_ENV};
use inj_broadcast::explorer::ExplorerApi;
use inj_broadcast::indexer::{IndexerTransactionApi, TransactionApi};
use inj_broadcast::telemetry::{MetricsProvider, NoopMetrics, TelemetryMetrics};
use inj_broadcast::wallet::{InjectiveWallet, LocalEvmSigner, LocalNativeSigner, WalletStrategy};
use inj_broadcast::MsgBroadcaster;

#[derive(Parser)]
#[command(name = "inj-broadcast")]
#[command(about = "Fee-delegated transaction broadcasting for Injective", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum WalletKind {
    /// EIP-712 signatures, submitted through the web3 gateway
    Evm,
    /// SIGN_MODE_DIRECT signatures, submitted to the chain node
    Native,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Show both forms of an address
    Address {
        /// 0x or inj1 address
        address: String,
    },

    /// Estimate gas for a JSON file of messages
    EstimateGas {
        messages: String,
    },

    /// Broadcast a JSON file of messages with the wallet from $INJ_MNEMONIC
    Broadcast {
        messages: String,

        #[arg(short, long, value_enum, default_value = "evm")]
        wallet: WalletKind,

        /// Gas limit; estimated from the messages when omitted
        #[arg(long)]
        gas: Option<u64>,

        #[arg(long, default_value = "")]
        memo: String,

        /// Metrics bucket
        #[arg(long)]
        bucket: Option<String>,

        /// Wait until the transaction is included in a block
        #[arg(long)]
        wait: bool,
    },

    /// Look up a transaction
    Tx {
        hash: String,
    },

    /// Look up a block by height or hash
    Block {
        block: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inj_broadcast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output);
        }
        Commands::Address { address } => {
            let resolved = resolve_addresses(&address)?;
            println!("{}", resolved.ethereum_address);
            println!("{}", resolved.injective_address);
        }
        Commands::EstimateGas { messages } => {
            let messages = read_messages(&messages)?;
            println!("{}", MessageGasEstimator.estimate(&messages));
        }
        Commands::Broadcast {
            messages,
            wallet,
            gas,
            memo,
            bucket,
            wait,
        } => {
            let config = load_config(&cli.config)?;
            let messages = read_messages(&messages)?;
            run_broadcast(&config, messages, wallet, gas, memo, bucket, wait).await?;
        }
        Commands::Tx { hash } => {
            let config = load_config(&cli.config)?;
            let explorer = ExplorerApi::new(&config.network.explorer_endpoint, config.network.request_timeout_secs)?;
            let tx = explorer.fetch_transaction(&hash).await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Commands::Block { block } => {
            let config = load_config(&cli.config)?;
            let explorer = ExplorerApi::new(&config.network.explorer_endpoint, config.network.request_timeout_secs)?;
            let block = explorer.fetch_block(&block).await?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).with_context(|| format!("Failed to load {}", path))
    } else {
        info!("No config at {}, using testnet defaults", path);
        Ok(Config::default())
    }
}

fn read_messages(path: &str) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let messages: Vec<Message> = serde_json::from_str(&content).with_context(|| format!("Invalid messages in {}", path))?;
    if messages.is_empty() {
        bail!("{} contains no messages", path);
    }
    Ok(messages)
}

async fn run_broadcast(
    config: &Config,
    messages: Vec<Message>,
    wallet_kind: WalletKind,
    gas: Option<u64>,
    memo: String,
    bucket: Option<String>,
    wait: bool,
) -> Result<()> {
    let mnemonic = std::env::var(MNEMONIC_ENV).map_err(|_| anyhow!("{} is not set", MNEMONIC_ENV))?;
    let wallet = Arc::new(InjectiveWallet::from_mnemonic_no_passphrase(&mnemonic)?);
    info!("Wallet: {} ({})", wallet.address, wallet.ethereum_address);

    let network = &config.network;
    let transaction_api: Arc<dyn TransactionApi> = Arc::new(IndexerTransactionApi::new(
        &network.indexer_endpoint,
        network.request_timeout_secs,
    )?);
    let node = TxRestClient::new(&network.rest_endpoint, network.request_timeout_secs)?;

    let wallet_strategy = match wallet_kind {
        WalletKind::Evm => WalletStrategy::evm(LocalEvmSigner::new(wallet.clone(), transaction_api.clone())),
        WalletKind::Native => WalletStrategy::native(LocalNativeSigner::new(
            wallet.clone(),
            node.clone(),
            &network.chain_id,
            &config.broadcast.gas_price,
        )),
    };

    let telemetry = if config.broadcast.metrics_enabled {
        Some(Arc::new(TelemetryMetrics::new(config.telemetry.clone())?))
    } else {
        None
    };
    let metrics: Arc<dyn MetricsProvider> = match &telemetry {
        Some(telemetry) => telemetry.clone() as Arc<dyn MetricsProvider>,
        None => Arc::new(NoopMetrics),
    };

    let broadcaster = MsgBroadcaster::new(
        config.broadcast_options(),
        transaction_api,
        wallet_strategy,
        metrics,
        Arc::new(MessageGasEstimator),
    );

    let mut request = BroadcastRequest::new(messages, wallet.address.clone())?
        .with_memo(memo)
        .with_bucket(bucket.unwrap_or_else(|| config.broadcast.default_bucket.clone()));
    if let Some(gas) = gas {
        request = request.with_gas_limit(gas);
    }

    let result = broadcaster.broadcast(&request).await;

    if let Some(telemetry) = &telemetry {
        for (label, stats) in telemetry.stats().await.labels {
            info!(
                "{}: {} call(s), {} failed, {}ms avg",
                label,
                stats.calls,
                stats.failures,
                stats.average_duration_ms()
            );
        }
        telemetry.flush().await;
    }

    let tx_hash = result?;
    println!("{}", tx_hash);

    if wait {
        let included = node
            .fetch_tx_poll(
                tx_hash.trim_start_matches("0x"),
                Duration::from_millis(config.broadcast.poll_interval_ms),
                Duration::from_secs(config.broadcast.poll_timeout_secs),
            )
            .await?;
        info!("Included at height {} (gas used {})", included.height, included.gas_used);
    }

    Ok(())
}
