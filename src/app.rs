use crate::client::RateSource;
use crate::error::RatesError;
use crate::fetcher::RateFetcher;
use chrono::{Local, NaiveDate};
use log::warn;
use std::io::{self, Write};
use std::num::IntErrorKind;

pub const USAGE: &str = "Usage: privat-rates <days>";

const INVALID_NUMBER: &str = "enter a valid number of days (1-10).";

/// Parse the day-count argument as a base-10 integer.
///
/// Integers too large for `i64` saturate so they fail the day range check
/// rather than being reported as non-numeric.
pub fn parse_days(raw: &str) -> Result<i64, RatesError> {
    raw.trim().parse::<i64>().or_else(|err| match err.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(RatesError::InvalidArgument(INVALID_NUMBER)),
    })
}

/// Console front end: turns a raw argument into either pretty JSON or a
/// single `Error:` line on `out`. Failures never escape as `Err`; only
/// writing to `out` can fail.
pub struct ConsoleApp<S> {
    fetcher: RateFetcher<S>,
}

impl<S: RateSource> ConsoleApp<S> {
    pub fn new(fetcher: RateFetcher<S>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &RateFetcher<S> {
        &self.fetcher
    }

    pub async fn run<W: Write>(&self, raw_days: &str, out: &mut W) -> io::Result<()> {
        self.run_since(Local::now().date_naive(), raw_days, out).await
    }

    pub async fn run_since<W: Write>(
        &self,
        today: NaiveDate,
        raw_days: &str,
        out: &mut W,
    ) -> io::Result<()> {
        let days = match parse_days(raw_days) {
            Ok(days) => days,
            Err(err) => return report(out, &err),
        };

        match self.fetcher.get_rates_since(today, days).await {
            Ok(rates) => {
                serde_json::to_writer_pretty(&mut *out, &rates)?;
                writeln!(out)
            }
            Err(err) => report(out, &err),
        }
    }
}

fn report<W: Write>(out: &mut W, err: &RatesError) -> io::Result<()> {
    warn!("Request failed: {:?}", err);
    writeln!(out, "Error: {err}")
}
