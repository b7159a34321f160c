//! Per-room player session tokens
//!
//! Clients keep the token under `storage_key(room_id)` and present it on
//! every join so a returning browser maps back to the same player.

use crate::error::PollError;
use crate::types::MAX_SESSION_TOKEN_CHARS;

/// Local storage key a client should keep the token under
pub fn storage_key(room_id: &str) -> String {
    format!("hotshot_{}", room_id)
}

/// Mint a fresh token
pub fn issue_token() -> String {
    ulid::Ulid::new().to_string()
}

/// Accept a client-supplied token, or mint one when none was given
pub fn resolve_token(token: Option<&str>) -> Result<String, PollError> {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(issue_token()),
        Some(token) => {
            validate_token(token)?;
            Ok(token.to_string())
        }
    }
}

pub fn validate_token(token: &str) -> Result<(), PollError> {
    let valid_chars = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if token.is_empty() || token.len() > MAX_SESSION_TOKEN_CHARS || !valid_chars {
        return Err(PollError::InvalidInput(
            "Session token must be 1-64 characters of letters, digits, '-' or '_'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("01ABC"), "hotshot_01ABC");
    }

    #[test]
    fn test_resolve_token_mints_when_missing() {
        let a = resolve_token(None).unwrap();
        let b = resolve_token(Some("   ")).unwrap();
        assert_eq!(a.len(), 26);
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_token_keeps_valid_uuid() {
        let token = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
        assert_eq!(resolve_token(Some(token)).unwrap(), token);
    }

    #[test]
    fn test_validate_token_rejects_garbage() {
        assert!(validate_token("has space").is_err());
        assert!(validate_token("").is_err());
        assert!(validate_token(&"a".repeat(65)).is_err());
        assert!(validate_token(&"a".repeat(64)).is_ok());
    }
}
