pub mod comments;
pub mod config;
pub mod error;
pub mod error_utils;
pub mod keywords;
pub mod traits;
pub mod types;
pub mod window;

pub use comments::*;
pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use keywords::*;
pub use traits::*;
pub use types::*;
pub use window::*;
