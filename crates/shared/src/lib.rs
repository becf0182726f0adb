//! Wire types shared by the Virtual Wandelen server and its API client.

mod api;

pub use api::*;
