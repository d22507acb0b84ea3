//! Shared fixtures for the integration suite.

pub mod fixtures;
