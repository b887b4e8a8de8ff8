pub mod capture;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod platform;
pub mod reconcile;
pub mod snapshot;
pub mod web;

#[cfg(test)]
pub mod testutil;
