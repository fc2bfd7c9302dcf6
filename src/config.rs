use std::time::Duration;

use tracing::trace;

use crate::error::ConfigError;

pub const METRICS_SUBGRAPH_URL: &str =
    "https://api.goldsky.com/api/public/project_cmgzm4q1q009c5np2angrczxw/subgraphs/temple-metrics/prod/gn";

pub const TREASURY_SUBGRAPH_URL: &str =
    "https://subgraph.satsuma-prod.com/a912521dd162/templedao/temple-v2-mainnet/api";

pub const LLAMA_PRICES_URL: &str = "https://coins.llama.fi";

pub const TEMPLE_COIN: &str = "ethereum:0x470EBf5f030Ed85Fc1ed4C2d36B9DD02e77CF1b7";

pub const ENA_SPICE_AUCTION_ADDRESS: &str = "0xa68e1a9a93223f812191f35d102a4b2fb16b60f4";

pub const ENA_SPICE_AUCTION_TICKER: &str = "TGLD/$ENA";

const TEMPLE_PRICE_BOT_TOKEN: &str = "TEMPLE_PRICE_BOT_TOKEN";
const SPICE_BOT_TOKEN: &str = "SPICE_BOT_TOKEN";
const DISCORD_TOKEN: &str = "DISCORD_TOKEN";
const REFRESH_RATE_S: &str = "REFRESH_RATE_S";
const MAINNET_RPC_URL: &str = "MAINNET_RPC_URL";

/// The legacy sidebar bot refreshed faster than the newer ones
const LEGACY_INTERVAL: u64 = 90;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub bots: Vec<BotConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Bot credential given inline
    pub token: Option<String>,
    /// Name of the environment variable holding the credential
    pub token_env: Option<String>,
    #[serde(default = "crate::util::get_default_interval")]
    pub interval: u64,
    #[serde(default = "crate::util::get_default_timeout")]
    pub timeout: u64,
    pub source: SourceConfig,
}

/// Which provider a bot reads from
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Spot price and TPI from the protocol metrics subgraph
    TemplePrice {
        #[serde(default = "default_metrics_url")]
        url: String,
    },

    /// TPI from the treasury reserves vault subgraph, spot price from DefiLlama
    TreasuryVault {
        #[serde(default = "default_treasury_url")]
        subgraph_url: String,
        #[serde(default = "default_prices_url")]
        prices_url: String,
        #[serde(default = "default_coin")]
        coin: String,
    },

    /// Current epoch of an on-chain spice auction
    SpiceAuction {
        #[serde(default = "crate::util::get_rpc_url")]
        rpc_url: String,
        address: String,
        ticker: String,
    },
}

fn default_metrics_url() -> String {
    METRICS_SUBGRAPH_URL.to_string()
}

fn default_treasury_url() -> String {
    TREASURY_SUBGRAPH_URL.to_string()
}

fn default_prices_url() -> String {
    LLAMA_PRICES_URL.to_string()
}

fn default_coin() -> String {
    TEMPLE_COIN.to_string()
}

/// A bot configuration with the credential looked up and every value validated
#[derive(Debug, Clone)]
pub struct ResolvedBotConfig {
    pub name: String,
    pub token: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub source: SourceConfig,
}

impl Config {
    /// Load from a JSON file if one is given, otherwise build bots from the environment
    pub fn load(path: Option<&str>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => read_config_file(path),
            None => Config::from_env(),
        }
    }

    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| crate::util::get_token(var))
    }

    /// Build the default bot set: one bot per credential that is present
    ///
    /// A refresh rate that is set but not a whole number of seconds is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let interval = lookup(REFRESH_RATE_S)
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(format!(
                        "{REFRESH_RATE_S} must be a whole number of seconds, got '{value}'"
                    ))
                })
            })
            .transpose()?;
        let mut bots = vec![];

        if let Some(token) = lookup(TEMPLE_PRICE_BOT_TOKEN) {
            bots.push(BotConfig {
                name: "temple-price".to_string(),
                token: Some(token),
                token_env: None,
                interval: interval.unwrap_or_else(crate::util::get_default_interval),
                timeout: crate::util::get_default_timeout(),
                source: SourceConfig::TemplePrice {
                    url: default_metrics_url(),
                },
            });
        }

        if let Some(token) = lookup(SPICE_BOT_TOKEN) {
            bots.push(BotConfig {
                name: "spice-auction".to_string(),
                token: Some(token),
                token_env: None,
                interval: interval.unwrap_or_else(crate::util::get_default_interval),
                timeout: crate::util::get_default_timeout(),
                source: SourceConfig::SpiceAuction {
                    rpc_url: lookup(MAINNET_RPC_URL).unwrap_or_default(),
                    address: ENA_SPICE_AUCTION_ADDRESS.to_string(),
                    ticker: ENA_SPICE_AUCTION_TICKER.to_string(),
                },
            });
        }

        if let Some(token) = lookup(DISCORD_TOKEN) {
            bots.push(BotConfig {
                name: "sidebar".to_string(),
                token: Some(token),
                token_env: None,
                interval: interval.unwrap_or(LEGACY_INTERVAL),
                timeout: crate::util::get_default_timeout(),
                source: SourceConfig::TreasuryVault {
                    subgraph_url: default_treasury_url(),
                    prices_url: default_prices_url(),
                    coin: default_coin(),
                },
            });
        }

        Ok(Config { bots })
    }

    /// Validate every bot; any failure here is fatal at startup
    pub fn resolve(self) -> Result<Vec<ResolvedBotConfig>, ConfigError> {
        if self.bots.is_empty() {
            return Err(ConfigError::Missing(format!(
                "no bots configured (set {TEMPLE_PRICE_BOT_TOKEN}, {SPICE_BOT_TOKEN} or {DISCORD_TOKEN}, or pass a config file)"
            )));
        }

        self.bots
            .into_iter()
            .map(|bot| bot.resolve(|var| crate::util::get_token(var)))
            .collect()
    }
}

impl BotConfig {
    pub fn resolve(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedBotConfig, ConfigError> {
        let token = self
            .token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .or_else(|| self.token_env.as_deref().and_then(&lookup))
            .ok_or_else(|| ConfigError::Missing(format!("credential for bot '{}'", self.name)))?;

        if self.interval == 0 {
            return Err(ConfigError::Invalid(format!(
                "bot '{}' has a refresh interval of 0 seconds",
                self.name
            )));
        }

        if self.timeout == 0 {
            return Err(ConfigError::Invalid(format!(
                "bot '{}' has a request timeout of 0 seconds",
                self.name
            )));
        }

        if let SourceConfig::SpiceAuction {
            rpc_url, address, ..
        } = &self.source
        {
            if rpc_url.trim().is_empty() {
                return Err(ConfigError::Missing(format!(
                    "{MAINNET_RPC_URL} for bot '{}'",
                    self.name
                )));
            }

            if !is_contract_address(address) {
                return Err(ConfigError::Invalid(format!(
                    "bot '{}' has an invalid contract address '{address}'",
                    self.name
                )));
            }
        }

        Ok(ResolvedBotConfig {
            name: self.name,
            token,
            interval: Duration::from_secs(self.interval),
            timeout: Duration::from_secs(self.timeout),
            source: self.source,
        })
    }
}

fn is_contract_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(ConfigError::from)
        .inspect(|config: &Config| trace!("loaded config: {} bots", config.bots.len()))
}
