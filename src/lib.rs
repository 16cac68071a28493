pub mod commands;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod ipc;
pub mod monitor;
pub mod notify;
pub mod platform;
pub mod shutdown;
#[cfg(test)]
mod test_utils;
pub mod validation;

pub use error::AppError;
