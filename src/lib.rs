pub mod api;
pub mod client;
pub mod game;
pub mod history;
pub mod ledger;
pub mod model;
pub mod session;
pub mod sync;
pub mod ui;
