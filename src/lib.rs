//! Async client for the PrivatBank archive exchange-rate API.
//! Fetches a window of recent days, keeps the EUR and USD quotes and
//! renders them as JSON for the `privat-rates` command.

pub mod app;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod models;

pub use app::ConsoleApp;
pub use client::{BASE_URL, Client, RateSource};
pub use error::RatesError;
pub use fetcher::{FetchMode, RateFetcher};
pub use models::{CurrencyQuote, DailyRates, DateKey, Rate, ResultSet, extract};
