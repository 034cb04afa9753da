pub mod api;
pub mod controller;
pub mod format;
pub mod models;
pub mod row_fetcher;
pub mod ui;
