pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod league;
pub mod matcher;
pub mod reconcile;
pub mod scheduler;
pub mod types;
