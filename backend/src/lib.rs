pub mod auth;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod routes;
pub mod storage;
