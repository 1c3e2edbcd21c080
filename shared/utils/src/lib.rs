pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod validation;

pub use self::config::*;
pub use self::environment::*;
pub use self::error::*;
pub use self::logging::*;
pub use self::validation::*;
