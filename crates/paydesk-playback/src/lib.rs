pub mod config;
pub mod driver;
pub mod layout;
pub mod session;

pub use config::*;
pub use driver::*;
pub use layout::*;
pub use session::*;
