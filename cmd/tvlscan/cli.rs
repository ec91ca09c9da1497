use std::{fmt::Display, path::PathBuf, str::FromStr, sync::Arc};

use clap::{Parser as ClapParser, Subcommand as ClapSubcommand};
use eyre::{WrapErr, eyre};
use serde::{Deserialize, Serialize};
use tracing::{Level, info};
use tvlscan_scanner::risk::{RiskStatistics, statistics};
use tvlscan_scanner::scanner::BulkSummary;
use tvlscan_scanner::types::ProtocolRisk;
use tvlscan_scanner::{ContractInfo, RiskEngine, RuleCatalog};

use crate::{
    demo, formatter,
    initializers::{RpcScanner, init_config, init_scanner},
};

/// Public endpoint used when neither the flag, the env var nor the config set one.
pub const DEFAULT_RPC_URL: &str = "https://eth-mainnet.alchemyapi.io/v2/demo";

/// Protocol recorded for contracts scanned without one.
pub const DEFAULT_PROTOCOL: &str = "Unknown";

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(
    name = "tvlscan",
    version,
    about = "Compiler-vulnerability scanner and TVL-at-risk estimator for EVM contracts"
)]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "rpc-url",
        value_name = "URL",
        env = "ETHEREUM_RPC_URL",
        help = "Ethereum JSON-RPC endpoint used to fetch contract bytecode.",
        help_heading = "Scanner options"
    )]
    pub rpc_url: Option<String>,
    #[arg(
        long = "config",
        value_name = "CONFIG_FILE",
        env = "TVLSCAN_CONFIG",
        help = "TOML file with a [tvlscan] table.",
        help_heading = "Scanner options"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "chain",
        value_name = "CHAIN",
        help = "Chain name recorded on scanned contracts.",
        help_heading = "Scanner options"
    )]
    pub chain: Option<String>,
    #[arg(
        long = "bulk.delay-ms",
        value_name = "MILLISECONDS",
        help = "Pause between bulk scan requests, 0 disables it.",
        help_heading = "Scanner options"
    )]
    pub bulk_delay_ms: Option<u64>,
    #[arg(
        long = "format",
        default_value_t = OutputFormat::Text,
        value_name = "FORMAT",
        help = "Output format.",
        long_help = "Possible values: text, json",
        help_heading = "Output options"
    )]
    pub format: OutputFormat,
    #[arg(
        long = "metrics",
        help = "Print scan counters in Prometheus text format after scanning.",
        help_heading = "Output options"
    )]
    pub metrics: bool,
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "TVLSCAN_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Output options"
    )]
    pub log_level: Level,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format '{s}'. Expected: text, json")),
        }
    }
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    #[command(name = "scan", about = "Fingerprint a single contract")]
    Scan {
        #[arg(required = true, value_name = "ADDRESS")]
        address: String,
        #[arg(long = "protocol", default_value = DEFAULT_PROTOCOL, value_name = "PROTOCOL")]
        protocol: String,
    },
    #[command(
        name = "bulk",
        about = "Scan every contract listed in a JSON file",
        long_about = "The file holds a JSON array of {\"address\": ..., \"protocol\": ...} objects."
    )]
    Bulk {
        #[arg(required = true, value_name = "FILE_PATH")]
        path: PathBuf,
    },
    #[command(
        name = "assess",
        about = "Assess protocol risk for previously scanned contracts",
        long_about = "The file holds a JSON array of scanned contracts, such as the `contracts` field printed by `bulk --format json`."
    )]
    Assess {
        #[arg(required = true, value_name = "FILE_PATH")]
        path: PathBuf,
    },
    #[command(name = "rules", about = "List the vulnerability catalog")]
    Rules,
    #[command(name = "demo", about = "Assess a built-in sample portfolio without RPC access")]
    Demo,
}

/// One line of a bulk scan request file.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEntry {
    pub address: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

#[derive(Serialize)]
struct BulkOutput<'a> {
    contracts: &'a [ContractInfo],
    summary: BulkSummary,
}

impl Subcommand {
    pub fn run(self, opts: &Options) -> eyre::Result<()> {
        let catalog = Arc::new(RuleCatalog::builtin());

        match self {
            Subcommand::Scan { address, protocol } => {
                let config = init_config(opts)?;
                let scanner = init_scanner(&config);
                let info = scanner.scan(&address, &protocol)?;
                match opts.format {
                    OutputFormat::Text => println!("{}", formatter::format_contract(&info)),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
                }
                print_metrics(opts, &scanner);
            }
            Subcommand::Bulk { path } => {
                let config = init_config(opts)?;
                let entries: Vec<BulkEntry> = read_json(&path)?;
                let requests: Vec<(String, String)> = entries
                    .into_iter()
                    .map(|e| (e.address, e.protocol))
                    .collect();
                info!(contracts = requests.len(), path = %path.display(), "Starting bulk scan");

                let scanner = init_scanner(&config);
                let contracts = scanner.bulk_scan(&requests);
                let summary = BulkSummary::from_results(&contracts);
                match opts.format {
                    OutputFormat::Text => {
                        for contract in &contracts {
                            println!("{}", formatter::format_contract(contract));
                        }
                        println!("{}", formatter::format_bulk_summary(&summary));
                    }
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string_pretty(&BulkOutput {
                            contracts: &contracts,
                            summary,
                        })?
                    ),
                }
                print_metrics(opts, &scanner);
            }
            Subcommand::Assess { path } => {
                let contracts: Vec<ContractInfo> = read_json(&path)?;
                assess_and_print(opts, catalog, &contracts)?;
            }
            Subcommand::Rules => {
                let rules = catalog.list_rules();
                match opts.format {
                    OutputFormat::Text => println!("{}", formatter::format_rules(&rules)),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
                }
            }
            Subcommand::Demo => {
                let config = init_config(opts)?;
                let contracts = demo::sample_portfolio(&config);
                assess_and_print(opts, catalog, &contracts)?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessOutput<'a> {
    protocols: &'a [ProtocolRisk],
    statistics: RiskStatistics,
}

fn assess_and_print(
    opts: &Options,
    catalog: Arc<RuleCatalog>,
    contracts: &[ContractInfo],
) -> eyre::Result<()> {
    if contracts.is_empty() {
        return Err(eyre!("No contracts to assess"));
    }
    let engine = RiskEngine::new(catalog);
    let protocols = engine.assess_portfolio(contracts)?;
    let stats = statistics(&protocols);

    match opts.format {
        OutputFormat::Text => {
            for protocol in &protocols {
                println!("{}\n", formatter::format_risk_score(&protocol.risk_score));
            }
            println!("{}", formatter::format_protocol_table(&protocols));
            println!("{}", formatter::format_statistics(&stats));
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&AssessOutput {
                protocols: &protocols,
                statistics: stats,
            })?
        ),
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> eyre::Result<T> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

fn print_metrics(opts: &Options, scanner: &RpcScanner) {
    if opts.metrics {
        eprint!("{}", scanner.metrics().to_prometheus_text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }

    #[test]
    fn cli_parses_scan_with_protocol() {
        let cli = CLI::try_parse_from([
            "tvlscan",
            "--format",
            "json",
            "scan",
            "0x1234567890123456789012345678901234567890",
            "--protocol",
            "Curve Finance",
        ])
        .expect("parse");
        assert_eq!(cli.opts.format, OutputFormat::Json);
        match cli.command {
            Subcommand::Scan { address, protocol } => {
                assert_eq!(address, "0x1234567890123456789012345678901234567890");
                assert_eq!(protocol, "Curve Finance");
            }
            _ => panic!("expected scan subcommand"),
        }
    }

    #[test]
    fn cli_parses_bulk_overrides() {
        let cli = CLI::try_parse_from([
            "tvlscan",
            "--bulk.delay-ms",
            "0",
            "--chain",
            "base",
            "bulk",
            "contracts.json",
        ])
        .expect("parse");
        assert_eq!(cli.opts.bulk_delay_ms, Some(0));
        assert_eq!(cli.opts.chain.as_deref(), Some("base"));
        assert!(matches!(cli.command, Subcommand::Bulk { .. }));
    }

    #[test]
    fn bulk_entries_parse_from_json() {
        let entries: Vec<BulkEntry> = serde_json::from_str(
            r#"[{"address": "0x6B175474E89094C44Da98b954EedeAC495271d0F", "protocol": "Curve Finance"}]"#,
        )
        .expect("parse");
        assert_eq!(entries[0].protocol, "Curve Finance");
    }

    #[test]
    fn bulk_entry_without_protocol_defaults_to_unknown() {
        let entries: Vec<BulkEntry> = serde_json::from_str(
            r#"[
                {"address": "0x6B175474E89094C44Da98b954EedeAC495271d0F", "protocol": "Aave"},
                {"address": "0x514910771AF9Ca656af840dff83E8264EcF986CA"}
            ]"#,
        )
        .expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].protocol, "Aave");
        assert_eq!(entries[1].protocol, DEFAULT_PROTOCOL);
    }

    #[test]
    fn scan_protocol_defaults_to_unknown() {
        let cli = CLI::try_parse_from([
            "tvlscan",
            "scan",
            "0x1234567890123456789012345678901234567890",
        ])
        .expect("parse");
        match cli.command {
            Subcommand::Scan { protocol, .. } => assert_eq!(protocol, DEFAULT_PROTOCOL),
            _ => panic!("expected scan subcommand"),
        }
    }
}
