// Library root: re-exports all modules so the CLI and integration tests can
// reach the crate's public API.

pub mod cache;
pub mod config;
pub mod daily;
pub mod difficulty;
pub mod eligibility;
pub mod game;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod record;
pub mod session;
pub mod teams;

#[cfg(test)]
mod testutil;
