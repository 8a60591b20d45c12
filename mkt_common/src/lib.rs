mod currency;
mod micro_units;

pub mod helpers;
pub mod op;
mod secret;

pub use currency::{normalize_currency, CurrencyError, DEFAULT_CURRENCY_CODE, SUPPORTED_CURRENCIES};
pub use micro_units::{MicroUnits, MicroUnitsConversionError, UNITS_SCALE};
pub use secret::Secret;
