pub mod constants;
pub mod error;
pub mod types;
pub mod symbol;
pub mod record;

pub use constants::*;
pub use error::TickrError;
pub use types::*;
pub use symbol::Symbol;
pub use record::*;
