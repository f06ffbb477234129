//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC, Base64, random secrets)
//! - Password hashing (Argon2id)
//! - Signed bearer tokens
//! - Cookie management
//! - Blob store access behind a credential serialization queue

pub mod blob;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod token;
