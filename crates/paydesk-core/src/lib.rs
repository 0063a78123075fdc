pub mod config;
pub mod console;
pub mod fixtures;
pub mod menu;
pub mod notifications;

pub use config::*;
pub use console::*;
pub use fixtures::*;
pub use menu::*;
pub use notifications::*;
