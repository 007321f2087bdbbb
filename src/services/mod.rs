pub mod auth;
pub mod quotes;
pub mod store;
pub mod watchlist;

pub use auth::AuthService;
pub use quotes::QuoteService;
pub use store::StoreClient;
pub use watchlist::{StoreStatus, WatchlistService};
