//! Input checks shared by the engine APIs. Each function returns the offending field in its error so that callers can
//! pass the message straight back to the client.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self { field, reason: reason.into() }
    }
}

/// Checks that `value` has between `min` and `max` characters (not bytes).
pub fn check_length(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let n = value.chars().count();
    if n < min {
        return Err(ValidationError::new(field, format!("must be at least {min} characters long")));
    }
    if n > max {
        return Err(ValidationError::new(field, format!("must be at most {max} characters long")));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    check_length("username", username, 3, 32)?;
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username", "may only contain letters, digits and underscores"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    check_length("email", email, 3, 254)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) => {
            Ok(())
        },
        _ => Err(ValidationError::new("email", "is not a valid email address")),
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_length("password", password, 8, 128)
}

pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    check_length("wallet_address", address, 20, 128)?;
    if address.contains(char::is_whitespace) {
        return Err(ValidationError::new("wallet_address", "may not contain whitespace"));
    }
    Ok(())
}

pub fn validate_tx_hash(tx_hash: &str) -> Result<(), ValidationError> {
    check_length("tx_hash", tx_hash, 8, 256)?;
    if tx_hash.contains(char::is_whitespace) {
        return Err(ValidationError::new("tx_hash", "may not contain whitespace"));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    check_length("slug", slug, 1, 100)?;
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(ValidationError::new("slug", "may only contain lower case letters, digits and hyphens"));
    }
    Ok(())
}

/// Accepts language tags such as `en`, `zh-CN` or `pt-BR`.
pub fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    check_length("locale", locale, 2, 10)?;
    let mut parts = locale.split('-');
    let lang_ok = parts.next().map(|l| l.len() >= 2 && l.chars().all(|c| c.is_ascii_lowercase())).unwrap_or(false);
    let rest_ok = parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if lang_ok && rest_ok {
        Ok(())
    } else {
        Err(ValidationError::new("locale", "must be a language tag like 'en' or 'zh-CN'"))
    }
}

pub fn validate_event_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name, 1, 64)?;
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.:-".contains(c)) {
        return Err(ValidationError::new("name", "may only contain lower case letters, digits and _.:-"));
    }
    Ok(())
}
