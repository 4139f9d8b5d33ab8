use crate::errors::ConfigError;
use std::env;
use std::time::Duration;

const DEFAULT_TOKENS: &str = "USDT,USDC,USD1,U";

/// Upstream endpoints. Defaults point at production APIs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub wlfi_tokens: String,
    pub wlfi_rates: String,
    pub echelon_markets: String,
    pub justlend_yields: String,
    pub kamino_base: String,
    pub lista_vault_list: String,
    pub lista_vault_allocation: String,
    pub stablecoins: String,
    pub exchange_pairs: String,
    pub telegram_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            wlfi_tokens: "https://api-markets.worldlibertyfinancial.com/trpc/dolomite.getTokens?input=%7B%22json%22%3A%7B%22chainId%22%3A1%7D%7D".to_string(),
            wlfi_rates: "https://api-markets.worldlibertyfinancial.com/trpc/dolomite.getInterestRates?input=%7B%22json%22%3A%7B%22chainId%22%3A1%7D%7D".to_string(),
            echelon_markets: "https://app.echelon.market/api/markets?network=aptos_mainnet".to_string(),
            justlend_yields: "https://labc.ablesdxd.link/justlend/yieldInfos?config=TE2RzoSV3wFK99w6J9UnnZ4vLfXYoxvRwP$0$14,TXJgMdjVX5dKiQaUi9QobwNxtSQaFqccvd$0$14,TL5x9MtSnDy537FXKx53yAaHRRNdg9TkkA$0$14,TGBr8uh9jBVHJhhkwSJvQN2ZAKzVkxDmno$0$14,TRg6MnpsFXc82ymUPgf5qbj59ibxiEDWvv$0$14,TLeEu311Cbw63BcmMHDgDLu7fnk9fqGcqT$0$14,TWQhCXaWz4eHK4Kd1ErSDHjMFPoPc9czts$0$14,TUY54PVeH6WCcYCd6ZXXoBDsHytN9V5PXt$0$14,TR7BUFRQeq1w5jAZf1FKx85SHuX6PfMqsV$0$14,TFpPyDCKvNFgos3g3WVsAqMrdqhB81JXHE$0$14".to_string(),
            kamino_base: "https://api.kamino.finance".to_string(),
            lista_vault_list: "https://api.lista.org/api/moolah/vault/list".to_string(),
            lista_vault_allocation: "https://api.lista.org/api/moolah/vault/allocation".to_string(),
            stablecoins: "https://stablecoins.llama.fi/stablecoins".to_string(),
            exchange_pairs: "https://api.coinmarketcap.com/data-api/v3/exchange/market-pairs/latest?slug=aster-pro&category=spot&start=1&limit=100".to_string(),
            telegram_api: "https://api.telegram.org".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub request_timeout: Duration,
    pub debug: bool,
    pub stablecoin_tokens: Vec<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token =
            get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let telegram_chat_id =
            get("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?;

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0 && secs.is_finite())
                .map(Duration::from_secs_f64)
                .ok_or(ConfigError::Invalid {
                    name: "REQUEST_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(20),
        };

        let debug = match get("REPORT_DEBUG") {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "REPORT_DEBUG",
                        value: raw,
                    });
                }
            },
            None => false,
        };

        let stablecoin_tokens = get("STABLECOIN_TOKENS")
            .unwrap_or_else(|| DEFAULT_TOKENS.to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            request_timeout,
            debug,
            stablecoin_tokens,
            endpoints: Endpoints::default(),
        })
    }
}
