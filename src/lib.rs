pub mod availability;
pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod router;
pub mod save_state;
pub mod slots;
pub mod state;
