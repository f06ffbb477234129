//! Application Configuration
//!
//! Configuration for the community application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::password::HashCost;
use platform::token::TokenSigner;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Community application configuration
#[derive(Debug, Clone)]
pub struct CommunityConfig {
    /// Session token cookie name
    pub token_cookie_name: String,
    /// Cached ban signal cookie name
    pub ban_cookie_name: String,
    /// Token secret key for HMAC signing (32 bytes)
    pub token_secret: [u8; 32],
    /// Token validity window, renewed on every resolution (1 week)
    pub token_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2 cost profile for new hashes
    pub password_cost: HashCost,
    /// Default page size for the notification list
    pub notification_limit: i64,
    /// Default page size for a user's moderation history
    pub moderation_history_limit: i64,
    /// Page size for post listings and feeds
    pub post_list_limit: i64,
    /// Page size for the admin identity listing
    pub identity_list_limit: i64,
    /// Re-read the ban flag from the store whenever a token is resolved
    pub recheck_ban_on_resolve: bool,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            token_cookie_name: "token".to_string(),
            ban_cookie_name: "banned".to_string(),
            token_secret: [0u8; 32],
            token_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            password_cost: HashCost::Standard,
            notification_limit: 20,
            moderation_history_limit: 30,
            post_list_limit: 50,
            identity_list_limit: 200,
            recheck_ban_on_resolve: true,
        }
    }
}

impl CommunityConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn token_signer(&self) -> TokenSigner {
        // Out-of-range TTLs fall back to the default week.
        let ttl = chrono::Duration::from_std(self.token_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(7));
        TokenSigner::new(self.token_secret, ttl)
    }

    /// Attributes of the session token cookie
    pub fn token_cookie(&self) -> CookieConfig {
        self.cookie(&self.token_cookie_name)
    }

    /// Attributes of the ban signal cookie
    pub fn ban_cookie(&self) -> CookieConfig {
        self.cookie(&self.ban_cookie_name)
    }

    fn cookie(&self, name: &str) -> CookieConfig {
        CookieConfig {
            name: name.to_string(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.token_ttl.as_secs() as i64),
        }
    }
}
