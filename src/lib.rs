//! crm-insight - CRM back office with AI-assisted SQL and sales insights.
//!
//! This library exposes the core modules for the `crm` binary and the
//! integration tests.

pub mod analytics;
pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod llm;
pub mod logging;
pub mod query;
pub mod records;
pub mod safety;
