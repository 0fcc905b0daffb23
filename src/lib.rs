pub mod algorithm;
pub mod common;
pub mod config;
pub mod error;
pub mod expander;
pub mod heuristic;
pub mod map;
pub mod planner;
pub mod runner;
pub mod scenario;
pub mod stat;
