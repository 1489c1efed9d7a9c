pub mod shares;
pub mod ticker;

pub use shares::ShareCount;
pub use ticker::{canonicalize, Ticker, TickerError, MAX_TICKER_LEN};
