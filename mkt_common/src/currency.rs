use thiserror::Error;

pub const DEFAULT_CURRENCY_CODE: &str = "USDT";
pub const SUPPORTED_CURRENCIES: [&str; 5] = ["USDT", "USDC", "ETH", "BTC", "SOL"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported currency: {0}")]
pub struct CurrencyError(pub String);

/// Returns the canonical (upper case) currency code, or an error if the marketplace does not accept it.
pub fn normalize_currency(code: &str) -> Result<String, CurrencyError> {
    let upper = code.trim().to_ascii_uppercase();
    if SUPPORTED_CURRENCIES.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(CurrencyError(code.to_string()))
    }
}
