pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod form;
pub mod listing;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod submission;

#[cfg(test)]
mod testing;
