pub mod error;
pub mod service;

pub use error::{PortfolioError, PortfolioResult};
pub use service::{
    HoldingView, PortfolioDetail, PortfolioInput, PortfolioService, MAX_DESCRIPTION_LEN,
    MAX_NAME_LEN,
};
