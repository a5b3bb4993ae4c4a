//! Client-side validation of addresses and hashes.
//!
//! Inputs are checked before any network call is made.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate an EVM-style address (`0x` + 40 hex characters).
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    validate_hex("address", address, 40)
}

/// Validate a transaction or block hash (`0x` + 64 hex characters).
pub fn validate_hash(hash: &str) -> Result<(), ValidationError> {
    validate_hex("hash", hash, 64)
}

fn validate_hex(field: &'static str, value: &str, digits: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "cannot be empty"));
    }
    let Some(hex) = value.strip_prefix("0x") else {
        return Err(ValidationError::new(field, "must start with '0x'"));
    };
    if hex.len() != digits {
        return Err(ValidationError::new(
            field,
            format!("must be {} hex characters after '0x'", digits),
        ));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new(field, "contains non-hex characters"));
    }
    Ok(())
}

/// Validate a contract name used as a compiler input file name.
pub fn validate_contract_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ValidationError::new("contract_name", "cannot be empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return Err(ValidationError::new(
            "contract_name",
            "must start with a letter, '_' or '$'",
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return Err(ValidationError::new(
            "contract_name",
            "must contain only letters, digits, '_' or '$'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    #[test]
    fn accepts_mixed_case_address() {
        assert!(validate_address(ADDRESS).is_ok());
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(validate_address("").is_err());
        assert!(validate_address(&ADDRESS[2..]).is_err());
        assert!(validate_address(&ADDRESS[..41]).is_err());
        let err = validate_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44g").unwrap_err();
        assert_eq!(err.field, "address");
        assert!(err.to_string().contains("non-hex"));
    }

    #[test]
    fn validates_hashes() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(validate_hash(&hash).is_ok());
        assert!(validate_hash(&hash[..65]).is_err());
        assert!(validate_hash(ADDRESS).is_err());
    }

    #[test]
    fn validates_contract_names() {
        assert!(validate_contract_name("SafeHarbor_V2").is_ok());
        assert!(validate_contract_name("").is_err());
        assert!(validate_contract_name("2Fast").is_err());
        assert!(validate_contract_name("../etc/passwd").is_err());
    }
}
