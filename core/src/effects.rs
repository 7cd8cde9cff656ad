mod limiter;
pub use limiter::*;
