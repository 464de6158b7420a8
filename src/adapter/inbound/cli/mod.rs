//! CLI module graph.

pub mod backtest;
pub mod command;
pub mod config;
pub mod output;
pub mod paths;
pub mod run;
pub mod scan;
pub mod strategy;
