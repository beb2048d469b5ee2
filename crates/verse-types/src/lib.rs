//! Wire types shared by the Verse API handlers and the server binary.

pub mod api;
pub mod models;
