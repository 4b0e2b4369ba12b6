pub mod analytics;
pub mod apperror;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod models;
