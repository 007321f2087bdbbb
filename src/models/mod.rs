pub mod quote;
pub mod user;
pub mod watchlist;

pub use quote::*;
pub use user::*;
pub use watchlist::*;
