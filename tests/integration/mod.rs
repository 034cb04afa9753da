mod analysis;
mod dashboard;
mod system;
mod watchlist;
