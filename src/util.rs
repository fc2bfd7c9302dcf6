const DEFAULT_INTERVAL: u64 = 300;

pub fn get_default_interval() -> u64 {
    DEFAULT_INTERVAL
}

const DEFAULT_TIMEOUT: u64 = 15;

pub fn get_default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

const MAINNET_RPC_URL: &str = "MAINNET_RPC_URL";

/// RPC endpoint for on-chain sources; empty when unset so config validation can report it
pub fn get_rpc_url() -> String {
    std::env::var(MAINNET_RPC_URL).unwrap_or_default()
}

const DISCORD_API_URL: &str = "DISCORD_API_URL";

const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

pub fn get_discord_api_url() -> String {
    std::env::var(DISCORD_API_URL).unwrap_or_else(|_| DEFAULT_DISCORD_API_URL.to_string())
}

const DISCORD_GATEWAY_URL: &str = "DISCORD_GATEWAY_URL";

const DEFAULT_DISCORD_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

pub fn get_discord_gateway_url() -> String {
    std::env::var(DISCORD_GATEWAY_URL)
        .unwrap_or_else(|_| DEFAULT_DISCORD_GATEWAY_URL.to_string())
}

/// Read a credential from the environment, treating blank values as unset
pub fn get_token(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
