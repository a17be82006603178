//! Jobport Core — configuration, storage, OAuth token lifecycle, credential
//! tokens, and the upstream field-service API client.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod error;
pub mod models;
pub mod oauth;
pub mod upstream;
