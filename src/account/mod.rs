//! Account management module
//!
//! Account rows, their field validation and the CRUD repository. Balance
//! changes made here follow the same row-lock discipline as transfers.

pub mod models;
pub mod repository;
pub mod validation;

// Re-export commonly used types
pub use models::{Account, NewAccount, NewAccountRow, UpdateAccount};
pub use repository::{AccountError, AccountRepository};
pub use validation::{FieldLimits, ValidationError};
