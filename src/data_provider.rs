pub mod cache;
pub mod quote;
pub mod yahoo;

pub use cache::{normalize_constituents, ConstituentCache, ConstituentSnapshot};
pub use quote::{QuoteError, QuoteProvider, StaticQuoteProvider, StockQuote};
pub use yahoo::YahooQuoteProvider;
