//! Terminal front end: one panel per tab plus the notification and modal overlays

pub mod analysis;
pub mod app;
pub mod components;
pub mod dashboard;
pub mod events;
pub mod layout;
pub mod modal;
pub mod notification;
pub mod reports;
pub mod state;
pub mod system;
pub mod view;
pub mod watchlist;

pub use layout::{Tab, TuiLayout};
pub use view::View;
