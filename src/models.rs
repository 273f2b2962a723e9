use crate::error::RatesError;
use chrono::{Days, NaiveDate};
use log::debug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Currencies kept by [`extract`]; everything else in a response is dropped.
pub const TRACKED_CURRENCIES: [&str; 2] = ["EUR", "USD"];

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Calendar date used both as the API query parameter and as the output key.
/// Renders as `DD.MM.YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The date `offset` days before `today`.
    pub fn days_before(today: NaiveDate, offset: u32) -> Result<Self, RatesError> {
        today
            .checked_sub_days(Days::new(offset.into()))
            .map(Self)
            .ok_or(RatesError::InvalidArgument("date offset out of range"))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// One entry of the `exchangeRate` array. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyQuote {
    pub currency: Option<String>,
    #[serde(rename = "saleRate")]
    pub sale_rate: Option<Number>,
    #[serde(rename = "purchaseRate")]
    pub purchase_rate: Option<Number>,
}

/// Sale and purchase rate, kept exactly as the API reported them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    pub sale: Number,
    pub purchase: Number,
}

/// Filtered rates for a single day. Serializes as `{"DD.MM.YYYY": {"EUR": {..}, ..}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRates {
    date: DateKey,
    rates: BTreeMap<String, Rate>,
}

impl DailyRates {
    pub fn date(&self) -> DateKey {
        self.date
    }

    pub fn rates(&self) -> &BTreeMap<String, Rate> {
        &self.rates
    }

    pub fn get(&self, currency: &str) -> Option<&Rate> {
        self.rates.get(currency)
    }
}

impl Serialize for DailyRates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date.to_string(), &self.rates)?;
        map.end()
    }
}

/// Per-day rates ordered from the most recent day to the oldest.
pub type ResultSet = Vec<DailyRates>;

/// Pull the tracked currencies for `date` out of an API document.
///
/// Returns `Ok(None)` when the document has no `exchangeRate` field or none of
/// its entries is a tracked currency. Untracked entries, including the base
/// currency row without a `currency` field, are never inspected further.
pub fn extract(document: &Value, date: DateKey) -> Result<Option<DailyRates>, RatesError> {
    let Some(entries) = document.get("exchangeRate") else {
        debug!("No exchangeRate field for {}", date);
        return Ok(None);
    };

    let entries = entries.as_array().ok_or(RatesError::InvalidResponse)?;

    let mut rates = BTreeMap::new();
    for entry in entries {
        let tracked = entry
            .get("currency")
            .and_then(Value::as_str)
            .is_some_and(|currency| TRACKED_CURRENCIES.contains(&currency));
        if !tracked {
            continue;
        }
        let quote =
            CurrencyQuote::deserialize(entry).map_err(|_| RatesError::InvalidResponse)?;
        let (Some(currency), Some(sale), Some(purchase)) =
            (quote.currency, quote.sale_rate, quote.purchase_rate)
        else {
            return Err(RatesError::InvalidResponse);
        };
        rates.insert(currency, Rate { sale, purchase });
    }

    debug!("Extracted {} tracked currencies for {}", rates.len(), date);
    if rates.is_empty() {
        return Ok(None);
    }
    Ok(Some(DailyRates { date, rates }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_year() -> DateKey {
        DateKey::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn mixed_payload() -> Value {
        json!({
            "date": "01.01.2024",
            "bank": "PB",
            "baseCurrency": 980,
            "baseCurrencyLit": "UAH",
            "exchangeRate": [
                { "currency": "EUR", "saleRate": 40.1, "purchaseRate": 39.8 },
                { "currency": "GBP", "saleRate": 50, "purchaseRate": 49 },
                { "currency": "USD", "saleRate": 38, "purchaseRate": 37.5 }
            ]
        })
    }

    #[test]
    fn formats_date_key() {
        assert_eq!(new_year().to_string(), "01.01.2024");
        let key = DateKey::new(NaiveDate::from_ymd_opt(2023, 11, 25).unwrap());
        assert_eq!(key.to_string(), "25.11.2023");
    }

    #[test]
    fn date_key_counts_back_across_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(DateKey::days_before(today, 0).unwrap().to_string(), "02.01.2024");
        assert_eq!(DateKey::days_before(today, 2).unwrap().to_string(), "31.12.2023");
    }

    #[test]
    fn keeps_only_eur_and_usd() {
        let daily = extract(&mixed_payload(), new_year())
            .expect("payload should extract")
            .expect("tracked currencies present");

        assert_eq!(daily.date(), new_year());
        assert_eq!(daily.rates().len(), 2);
        assert!(daily.get("GBP").is_none());

        let value = serde_json::to_value(&daily).unwrap();
        assert_eq!(
            value,
            json!({
                "01.01.2024": {
                    "EUR": { "sale": 40.1, "purchase": 39.8 },
                    "USD": { "sale": 38, "purchase": 37.5 }
                }
            })
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let payload = mixed_payload();
        let first = extract(&payload, new_year()).unwrap();
        let second = extract(&payload, new_year()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_exchange_rate_field_yields_nothing() {
        let payload = json!({ "date": "01.01.2024", "bank": "PB" });
        assert_eq!(extract(&payload, new_year()).unwrap(), None);
    }

    #[test]
    fn untracked_currencies_only_yield_nothing() {
        let payload = json!({
            "exchangeRate": [
                { "currency": "GBP", "saleRate": 50, "purchaseRate": 49 },
                { "currency": "PLN", "saleRate": 9.4, "purchaseRate": 9.1 }
            ]
        });
        assert_eq!(extract(&payload, new_year()).unwrap(), None);
    }

    #[test]
    fn skips_base_currency_row() {
        let payload = json!({
            "exchangeRate": [
                { "baseCurrency": "UAH", "saleRateNB": 1.0, "purchaseRateNB": 1.0 },
                { "baseCurrency": "UAH", "currency": "USD", "saleRateNB": 37.9,
                  "saleRate": 38.2, "purchaseRate": 37.6 }
            ]
        });
        let daily = extract(&payload, new_year()).unwrap().unwrap();
        let usd = daily.get("USD").unwrap();
        assert_eq!(usd.sale.as_f64(), Some(38.2));
        assert_eq!(usd.purchase.as_f64(), Some(37.6));
    }

    #[test]
    fn ignores_malformed_untracked_entries() {
        let payload = json!({
            "exchangeRate": [
                { "currency": "EUR", "saleRate": 40.1, "purchaseRate": 39.8 },
                { "currency": "XAU", "saleRate": "n/a" },
                { "currency": 978 },
                "unexpected"
            ]
        });
        let daily = extract(&payload, new_year())
            .expect("untracked rows must not fail the day")
            .expect("EUR present");

        assert_eq!(
            serde_json::to_value(&daily).unwrap(),
            json!({ "01.01.2024": { "EUR": { "sale": 40.1, "purchase": 39.8 } } })
        );
    }

    #[test]
    fn tracked_currency_with_non_numeric_rate_is_invalid() {
        let payload = json!({
            "exchangeRate": [{ "currency": "USD", "saleRate": "n/a", "purchaseRate": 37.5 }]
        });
        assert!(matches!(
            extract(&payload, new_year()),
            Err(RatesError::InvalidResponse)
        ));
    }

    #[test]
    fn tracked_currency_without_rates_is_invalid() {
        let payload = json!({
            "exchangeRate": [{ "currency": "EUR", "saleRateNB": 40.0 }]
        });
        assert!(matches!(
            extract(&payload, new_year()),
            Err(RatesError::InvalidResponse)
        ));
    }

    #[test]
    fn non_array_exchange_rate_is_invalid() {
        let payload = json!({ "exchangeRate": "unavailable" });
        assert!(matches!(
            extract(&payload, new_year()),
            Err(RatesError::InvalidResponse)
        ));
    }

    #[test]
    fn pretty_output_preserves_integer_rates() {
        let daily = extract(&mixed_payload(), new_year()).unwrap().unwrap();
        let text = serde_json::to_string_pretty(&vec![daily]).unwrap();
        assert!(text.starts_with("[\n  {\n    \"01.01.2024\": {\n      \"EUR\": {"));
        assert!(text.contains("\"sale\": 38,"));
        assert!(text.contains("\"sale\": 40.1,"));
    }
}
