use serde::{Serialize, Serializer};
use std::fmt;

/// Free-text moderation reason
///
/// Always trimmed and non-empty; "no reason" is `Option::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason(String);

impl Reason {
    /// Absent, blank and whitespace-only input all mean no reason
    pub fn parse(input: Option<impl AsRef<str>>) -> Option<Self> {
        let trimmed = input?.as_ref().trim().to_string();
        (!trimmed.is_empty()).then_some(Self(trimmed))
    }

    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reason_is_none() {
        assert_eq!(Reason::parse(None::<&str>), None);
        assert_eq!(Reason::parse(Some("")), None);
        assert_eq!(Reason::parse(Some("  \n ")), None);
    }

    #[test]
    fn test_reason_is_trimmed() {
        let reason = Reason::parse(Some("  spam links ")).unwrap();
        assert_eq!(reason.as_str(), "spam links");
    }
}
