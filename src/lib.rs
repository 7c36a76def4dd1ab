pub mod audit;
pub mod auth;
pub mod db;
pub mod debounce;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
