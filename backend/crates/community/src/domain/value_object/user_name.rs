//! User Name Value Object
//!
//! ユーザー名はプロフィールURL（`/u/{name}`）やフォロー操作で使われる公開ハンドル。
//!
//! ## 設計方針
//! - 入力は trim → NFKC 正規化した形をそのまま表示用に保持する
//! - 一意性の判定は小文字化した canonical で行う
//! - 使用可能な文字は ASCII 英数字と `_ . - +` のみ
//!
//! ## 不変条件
//! - 長さ: 3〜30文字（正規化後）
//! - 先頭・末尾は英数字または `_`
//! - 連続ドット禁止

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-', '+'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("Username is required")]
    Empty,

    #[error("Username must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Username must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Username cannot contain '{0}'. Only a-z, 0-9, _, ., -, + are allowed")]
    InvalidCharacter(char),

    #[error("Username must start and end with a letter, digit or _")]
    InvalidBoundary,

    #[error("Username cannot contain consecutive dots")]
    ConsecutiveDots,
}

/// Validated user name
///
/// `original` keeps the case the user typed; `canonical` is the lower-cased
/// form used for lookups and uniqueness.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        Self::validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Rebuild from a stored value (already validated at write time)
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_lowercase();
        Self {
            original,
            canonical,
        }
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    fn validate(canonical: &str) -> Result<(), UserNameError> {
        let length = canonical.chars().count();
        if length == 0 {
            return Err(UserNameError::Empty);
        }
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: USER_NAME_MAX_LENGTH,
            });
        }

        if let Some(ch) = canonical.chars().find(|&c| !is_allowed(c)) {
            return Err(UserNameError::InvalidCharacter(ch));
        }

        let boundary_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if !boundary_ok(canonical.chars().next()) || !boundary_ok(canonical.chars().next_back()) {
            return Err(UserNameError::InvalidBoundary);
        }

        if canonical.contains("..") {
            return Err(UserNameError::ConsecutiveDots);
        }

        Ok(())
    }
}

#[inline]
fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ALLOWED_SPECIAL_CHARS.contains(&c)
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.original).finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.original
    }
}
