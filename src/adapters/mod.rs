pub mod lock;
pub mod store;

pub use lock::*;
pub use store::*;
