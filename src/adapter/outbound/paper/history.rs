//! Historical snapshot files for backtesting.
//!
//! A history is a TOML list of `[[snapshots]]`, each a timestamp plus the
//! same `[[snapshots.markets]]` tables a scenario file carries.
//!
//! ```toml
//! [[snapshots]]
//! at = "2026-03-01T12:00:00Z"
//!
//! [[snapshots.markets]]
//! id = "senate-dem"
//! question = "Will Democrats win the Senate?"
//! yes_price = 0.46
//! no_price = 0.46
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::scenario::{Scenario, ScenarioMarket};
use crate::domain::history::sort_chronologically;
use crate::domain::MarketSnapshot;
use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    snapshots: Vec<HistorySnapshot>,
}

#[derive(Debug, Deserialize)]
struct HistorySnapshot {
    at: DateTime<Utc>,
    #[serde(default)]
    markets: Vec<ScenarioMarket>,
}

/// Parse history content into snapshots sorted by time.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and a domain error for
/// invalid market data in any snapshot.
pub fn parse_history(content: &str) -> Result<Vec<MarketSnapshot>> {
    let file: HistoryFile = toml::from_str(content).map_err(ConfigError::Parse)?;

    let mut snapshots = file
        .snapshots
        .into_iter()
        .map(|raw| {
            let scenario = Scenario::from_markets(raw.markets)?;
            Ok(MarketSnapshot::new(
                raw.at,
                scenario.markets().to_vec(),
                scenario.books(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    sort_chronologically(&mut snapshots);
    Ok(snapshots)
}

/// Read and parse a history file.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] if the file cannot be read, or any
/// error from [`parse_history`].
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<MarketSnapshot>> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    parse_history(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, Outcome};

    const HISTORY: &str = r#"
        [[snapshots]]
        at = "2026-03-02T12:00:00Z"

        [[snapshots.markets]]
        id = "rain"
        question = "Will it rain?"
        yes_price = 0.50
        no_price = 0.50

        [[snapshots]]
        at = "2026-03-01T12:00:00Z"

        [[snapshots.markets]]
        id = "rain"
        question = "Will it rain?"
        yes_price = 0.46
        no_price = 0.46

        [[snapshots.markets.books]]
        outcome = "yes"
        asks = [[0.46, 500]]
    "#;

    #[test]
    fn snapshots_are_sorted_by_time() {
        let snapshots = parse_history(HISTORY).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].at < snapshots[1].at);
        assert_eq!(snapshots[0].markets[0].yes_price(), rust_decimal_macros::dec!(0.46));
        assert!(snapshots[0]
            .books
            .get(&MarketId::new("rain"), Outcome::Yes)
            .is_some());
        assert!(snapshots[1].books.is_empty());
    }

    #[test]
    fn invalid_market_fails_the_whole_file() {
        let bad = r#"
            [[snapshots]]
            at = "2026-03-01T12:00:00Z"

            [[snapshots.markets]]
            id = "x"
            question = "X?"
            yes_price = 1.5
            no_price = 0.1
        "#;
        assert!(parse_history(bad).is_err());
    }

    #[test]
    fn missing_timestamp_is_a_parse_error() {
        assert!(parse_history("[[snapshots]]\n").is_err());
    }
}
