pub mod calendar;
pub mod method;
pub mod ops;
pub mod store;

pub use calendar::*;
pub use method::*;
pub use ops::*;
pub use store::*;
