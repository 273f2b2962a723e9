use crate::client::RateSource;
use crate::error::RatesError;
use crate::models::{DateKey, ResultSet, extract};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 10;

/// How the per-day requests of one window are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Concurrent,
    Sequential,
}

/// Collects EUR/USD rates for a window of recent days.
#[derive(Debug)]
pub struct RateFetcher<S> {
    source: Arc<S>,
    mode: FetchMode,
}

impl<S: RateSource> RateFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            mode: FetchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Rates for today and the `days - 1` days before it, most recent first.
    pub async fn get_rates(&self, days: i64) -> Result<ResultSet, RatesError> {
        self.get_rates_since(Local::now().date_naive(), days).await
    }

    /// Same as [`RateFetcher::get_rates`] with an explicit reference day.
    ///
    /// Any failed day aborts the whole window; days without tracked
    /// currencies are left out.
    pub async fn get_rates_since(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> Result<ResultSet, RatesError> {
        let days = validate_days(days)?;
        let dates = (0..days)
            .map(|offset| DateKey::days_before(today, offset))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Fetching {} days ({:?}) starting {}", days, self.mode, dates[0]);
        let documents = match self.mode {
            FetchMode::Concurrent => self.fetch_concurrent(&dates).await?,
            FetchMode::Sequential => self.fetch_sequential(&dates).await?,
        };

        let mut results = ResultSet::with_capacity(dates.len());
        for (date, document) in dates.iter().zip(&documents) {
            if let Some(daily) = extract(document, *date)? {
                results.push(daily);
            }
        }
        info!("Collected rates for {} of {} days", results.len(), days);
        Ok(results)
    }

    async fn fetch_sequential(&self, dates: &[DateKey]) -> Result<Vec<Value>, RatesError> {
        let mut documents = Vec::with_capacity(dates.len());
        for date in dates {
            documents.push(self.source.fetch_day(*date).await?);
        }
        Ok(documents)
    }

    async fn fetch_concurrent(&self, dates: &[DateKey]) -> Result<Vec<Value>, RatesError> {
        let mut tasks = JoinSet::new();
        for (index, date) in dates.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move { (index, source.fetch_day(date).await) });
        }

        // Slots keep offset order regardless of completion order.
        let mut slots: Vec<Option<Value>> = vec![None; dates.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined?;
            slots[index] = Some(result?);
        }
        // Every task has joined successfully here, so every slot is filled.
        let documents: Vec<Value> = slots.into_iter().flatten().collect();
        debug_assert_eq!(documents.len(), dates.len());
        Ok(documents)
    }
}

const DAY_RANGE_MESSAGE: &str = "day count must be between 1 and 10";

fn validate_days(days: i64) -> Result<u32, RatesError> {
    if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
        return Err(RatesError::InvalidArgument(DAY_RANGE_MESSAGE));
    }
    u32::try_from(days).map_err(|_| RatesError::InvalidArgument(DAY_RANGE_MESSAGE))
}
