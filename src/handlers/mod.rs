pub mod symbols;
pub mod watchlist;

pub use symbols::*;
pub use watchlist::*;
