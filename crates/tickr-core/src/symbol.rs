use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_SYMBOL_LEN, MIN_SYMBOL_LEN};
use crate::error::TickrError;

/// A ticker symbol in canonical (upper-case) form.
///
/// Only `Symbol::parse` builds one, so every `Symbol` in the system has
/// already passed the length bound and two spellings that differ only in
/// case always map to the same store key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Canonicalize `raw` and check that it holds between
    /// `MIN_SYMBOL_LEN` and `MAX_SYMBOL_LEN` characters.
    pub fn parse(raw: &str) -> Result<Self, TickrError> {
        let canonical = raw.to_uppercase();
        let len = canonical.chars().count();
        if !(MIN_SYMBOL_LEN..=MAX_SYMBOL_LEN).contains(&len) {
            return Err(TickrError::InvalidParameter(format!(
                "symbol length must be {MIN_SYMBOL_LEN}..={MAX_SYMBOL_LEN} characters, got {len}"
            )));
        }
        Ok(Self(canonical))
    }

    /// Canonicalize `raw` for a read. A symbol outside the length bounds
    /// can never have been registered, so it is reported as `NotFound`.
    pub fn lookup(raw: &str) -> Result<Self, TickrError> {
        Self::parse(raw).map_err(|_| TickrError::NotFound(raw.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key for this symbol.
    pub fn as_key(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_upper_cases() {
        assert_eq!(Symbol::parse("det").unwrap().as_str(), "DET");
        assert_eq!(Symbol::parse("DeT").unwrap(), Symbol::parse("DET").unwrap());
    }

    #[test]
    fn empty_symbol_rejected() {
        assert!(matches!(Symbol::parse("").unwrap_err(), TickrError::InvalidParameter(_)));
    }

    #[test]
    fn length_bounds() {
        assert!(Symbol::parse("POLYMATHNE").is_ok());
        assert!(matches!(
            Symbol::parse("POLYMATHNET").unwrap_err(),
            TickrError::InvalidParameter(_)
        ));
        assert!(Symbol::parse("A").is_ok());
    }

    #[test]
    fn lookup_reports_unregistrable_symbols_as_not_found() {
        assert_eq!(Symbol::lookup("det").unwrap().as_str(), "DET");
        assert!(matches!(Symbol::lookup("").unwrap_err(), TickrError::NotFound(_)));
        assert!(matches!(
            Symbol::lookup("POLYMATHNET").unwrap_err(),
            TickrError::NotFound(s) if s == "POLYMATHNET"
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 10 two-byte characters.
        assert!(Symbol::parse("ÄÄÄÄÄÄÄÄÄÄ").is_ok());
    }
}
