//! Paper trading venue.
//!
//! Serves markets and orderbooks from a scenario file and simulates order
//! execution against the scenario quotes. Used for `arbiter run` without
//! real venue credentials and for end-to-end tests. History files of
//! timestamped scenarios feed `arbiter backtest`.

pub mod feed;
pub mod history;
pub mod scenario;
pub mod settings;
pub mod venue;

pub use feed::PaperFeed;
pub use history::load_history;
pub use scenario::Scenario;
pub use settings::PaperConfig;
pub use venue::PaperVenue;
