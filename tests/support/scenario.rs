//! Scenario and config files on disk for end-to-end tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A split opportunity (0.46 + 0.46) and a fairly priced market.
pub const SCENARIO: &str = r#"
[[markets]]
id = "split"
question = "Will it rain in Paris tomorrow?"
yes_price = 0.46
no_price = 0.46
yes_liquidity = 5000
no_liquidity = 5000

[[markets.books]]
outcome = "yes"
asks = [[0.46, 5000]]

[[markets.books]]
outcome = "no"
asks = [[0.46, 5000]]

[[markets]]
id = "fair"
question = "Will the Fed cut rates?"
yes_price = 0.50
no_price = 0.50
yes_liquidity = 5000
no_liquidity = 5000
"#;

/// Three snapshots of one market: a split, a fair quote and a merge.
pub const HISTORY: &str = r#"
[[snapshots]]
at = "2026-03-01T12:00:00Z"

[[snapshots.markets]]
id = "rain"
question = "Will it rain in Paris tomorrow?"
yes_price = 0.46
no_price = 0.46
yes_liquidity = 5000
no_liquidity = 5000

[[snapshots.markets.books]]
outcome = "yes"
asks = [[0.46, 5000]]

[[snapshots.markets.books]]
outcome = "no"
asks = [[0.46, 5000]]

[[snapshots]]
at = "2026-03-02T12:00:00Z"

[[snapshots.markets]]
id = "rain"
question = "Will it rain in Paris tomorrow?"
yes_price = 0.50
no_price = 0.50
yes_liquidity = 5000
no_liquidity = 5000

[[snapshots]]
at = "2026-03-03T12:00:00Z"

[[snapshots.markets]]
id = "rain"
question = "Will it rain in Paris tomorrow?"
yes_price = 0.54
no_price = 0.54
yes_liquidity = 5000
no_liquidity = 5000

[[snapshots.markets.books]]
outcome = "yes"
bids = [[0.54, 5000]]

[[snapshots.markets.books]]
outcome = "no"
bids = [[0.54, 5000]]
"#;

/// Config with combinatorial detection off and a paper venue that always
/// fills.
pub const CONFIG: &str = r#"
[strategies.combinatorial]
enabled = false

[paper]
scenario = "scenario.toml"
fill_probability = 1.0
latency_ms = 10
seed = 7
"#;

/// A temp directory holding `config.toml` and `scenario.toml`.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(config: &str, scenario: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("config.toml"), config).expect("write config");
        fs::write(dir.path().join("scenario.toml"), scenario).expect("write scenario");
        Self { dir }
    }

    pub fn standard() -> Self {
        Self::new(CONFIG, SCENARIO)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write `history.toml` next to the config.
    pub fn with_history(self, history: &str) -> Self {
        fs::write(self.dir.path().join("history.toml"), history).expect("write history");
        self
    }
}
