pub mod auth;
pub mod config;
pub mod models;
pub mod push;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
