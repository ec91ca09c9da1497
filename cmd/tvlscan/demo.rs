//! Offline sample portfolio for `tvlscan demo`.

use tvlscan_scanner::config::ScannerFullConfig;
use tvlscan_scanner::source::TvlSource;
use tvlscan_scanner::types::now_unix_secs;
use tvlscan_scanner::catalog::LevelTable;
use tvlscan_scanner::{CompilerFamily, ContractInfo};

/// (address, compiler, version, protocol)
#[rustfmt::skip]
const SAMPLE_CONTRACTS: [(&str, CompilerFamily, &str, &str); 8] = [
    ("0x6B175474E89094C44Da98b954EedeAC495271d0F", CompilerFamily::Solidity, "0.8.19", "Curve Finance"),
    ("0x514910771AF9Ca656af840dff83E8264EcF986CA", CompilerFamily::Solidity, "0.8.21", "Chainlink"),
    ("0x7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9", CompilerFamily::Solidity, "0.8.23", "Aave"),
    ("0xBA12222222228d8Ba445958a75a0704d566BF2C8", CompilerFamily::Solidity, "0.8.25", "Balancer"),
    ("0xc00e94Cb662C3520282E6f5717214004A7f26888", CompilerFamily::Solidity, "0.8.24", "Compound"),
    ("0x1234567890123456789012345678901234567890", CompilerFamily::Vyper, "0.2.15", "Vulnerable Protocol 1"),
    ("0x2345678901234567890123456789012345678901", CompilerFamily::Vyper, "0.2.16", "Vulnerable Protocol 2"),
    ("0x3456789012345678901234567890123456789012", CompilerFamily::Vyper, "0.3.0", "Vulnerable Protocol 3"),
];

/// Sample contracts priced from the configured TVL table and leveled the
/// way the scanner levels them.
pub fn sample_portfolio(config: &ScannerFullConfig) -> Vec<ContractInfo> {
    let tvl = config.to_tvl_source();
    let levels = LevelTable::builtin();
    let now = now_unix_secs();

    SAMPLE_CONTRACTS
        .iter()
        .map(|&(address, compiler, version, protocol)| ContractInfo {
            address: address.to_string(),
            compiler,
            version: version.to_string(),
            protocol: protocol.to_string(),
            tvl: tvl.get_tvl(protocol).unwrap_or(config.tvl.default_usd),
            risk_level: levels.level(compiler, version),
            chain: config.chain.clone(),
            last_scanned: now,
        })
        .collect()
}
