pub mod auth;
pub mod config;
pub mod db;
pub mod donation;
pub mod environment;
pub mod errors;
pub mod filter;
pub mod lifecycle;
pub mod normalization;
pub mod notifications;
pub mod routes;
pub mod stats;
pub mod urls;
