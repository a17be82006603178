pub mod credential;
pub mod oauth;
pub mod upstream;
pub mod user;
