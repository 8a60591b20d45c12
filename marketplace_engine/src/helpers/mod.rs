mod password;
mod validation;

pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{
    check_length,
    validate_email,
    validate_event_name,
    validate_locale,
    validate_password,
    validate_slug,
    validate_tx_hash,
    validate_username,
    validate_wallet_address,
    ValidationError,
};
