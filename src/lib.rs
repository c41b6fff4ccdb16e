pub mod api;
pub mod config;
pub mod error;
pub mod exchange;
pub mod markdown;
pub mod session;
pub mod storage;
pub mod theme;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;

pub use config::AppConfig;
pub use error::QueryError;
pub use session::{RequestState, SessionState};
