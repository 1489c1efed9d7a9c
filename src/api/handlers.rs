pub mod index;
pub mod portfolio;
pub mod system;
