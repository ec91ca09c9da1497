use eyre::eyre;
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::Directive, fmt, layer::SubscriberExt};
use tvlscan_rpc::{EthRpcClient, RpcConfig};
use tvlscan_scanner::config::{ScannerFullConfig, load_config, merge_cli_overrides};
use tvlscan_scanner::source::StaticTvlSource;
use tvlscan_scanner::ContractScanner;

use crate::cli::{DEFAULT_RPC_URL, Options};

pub type RpcScanner = ContractScanner<EthRpcClient, StaticTvlSource>;

/// Install the global subscriber. Logs go to stderr so JSON output on
/// stdout stays machine-readable.
pub fn init_tracing(opts: &Options) -> eyre::Result<()> {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let include_target = matches!(opts.log_level, tracing::Level::DEBUG | tracing::Level::TRACE);

    let fmt_layer = fmt::layer()
        .with_target(include_target)
        .with_writer(std::io::stderr);

    let subscriber = Registry::default().with(fmt_layer.with_filter(log_filter));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("setting default subscriber failed: {e}"))
}

/// Config file (if any) with command-line flags layered on top.
pub fn init_config(opts: &Options) -> eyre::Result<ScannerFullConfig> {
    let loaded = load_config(opts.config.as_ref()).map_err(|e| eyre!(e))?;
    let merged = merge_cli_overrides(
        &loaded,
        opts.rpc_url.as_deref(),
        opts.chain.as_deref(),
        opts.bulk_delay_ms,
    );
    merged.validate().map_err(|e| eyre!(e))?;
    Ok(merged)
}

pub fn init_scanner(config: &ScannerFullConfig) -> RpcScanner {
    let url = config.rpc_url.as_deref().unwrap_or(DEFAULT_RPC_URL);
    tracing::info!(rpc_url = %url, chain = %config.chain, "Initializing contract scanner");

    let client = EthRpcClient::with_config(url, RpcConfig::from(&config.rpc));
    ContractScanner::from_config(client, config.to_tvl_source(), config)
}
