pub mod analysis;
pub mod annotation;
pub mod collection;
pub mod export;
pub mod progress;
