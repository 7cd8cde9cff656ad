pub mod config;
pub use config::*;

mod rendered;
pub use rendered::*;

pub mod builder;
pub use builder::*;

pub mod midi;

mod writer;
