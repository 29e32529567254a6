pub mod client;
pub mod normalize;
pub mod scan;

pub use client::{ZoteroClient, ZoteroLibrary, extract_user_id};
pub use normalize::{normalize_creators, normalize_item, normalize_tags};
pub use scan::{ExhaustiveOutcome, ExhaustiveScan};

use crate::error::{HarvestError, Result};

/// Validate an API key read from the environment variable `var`.
pub fn api_key_from(value: Option<String>, var: &str) -> Result<String> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| HarvestError::Configuration(format!("Zotero API key missing. Set {var}.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_trimmed() {
        let key = api_key_from(Some("  abc123 \n".to_string()), "ZOTERO_API_KEY").unwrap();
        assert_eq!(key, "abc123");
    }

    #[test]
    fn missing_or_blank_key_is_a_configuration_error() {
        for value in [None, Some("   ".to_string())] {
            let err = api_key_from(value, "MY_KEY").unwrap_err();
            assert!(err.is_configuration());
            assert!(err.to_string().contains("Set MY_KEY."));
        }
    }
}
