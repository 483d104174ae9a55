mod collection;
mod config;
mod document;
mod error;
mod request;

pub use collection::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use request::*;
