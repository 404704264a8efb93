#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod client;
pub mod credentials;
pub mod error;
pub mod fees;
pub mod groups;
pub mod orders;
pub mod period;
pub mod stats;
pub mod usd;
pub mod window;

pub use aggregate::{Counts, Grouped, Tally};
pub use client::Client;
pub use credentials::{ApiKey, CredentialSpec, ORDERS_CREDENTIAL, STATS_CREDENTIAL};
pub use error::ReportError;
pub use fees::{fee, Fee, FeeBreakdown};
pub use groups::Groups;
pub use period::Period;
pub use usd::Usd;
pub use window::{LocalDays, UtcDays, Window, Windowed};
