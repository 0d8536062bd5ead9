//! logwatch: Realtime client for the CS2 log dashboard
//!
//! This library provides the core components for:
//! - A self-healing event stream connection with exponential backoff
//! - Reference-counted subscriptions replayed after every reconnect
//! - Per-event-type dispatch with isolated listener failures
//! - REST access to log listings, content, and downloads
//! - Full observability stack

pub mod api;
pub mod cli;
pub mod config;
pub mod realtime;
pub mod telemetry;
pub mod ws;
