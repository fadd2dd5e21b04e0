//! Payment records
//!
//! Payments are written only by the transfer coordinator; this module owns
//! their shape and the read side (single lookup, per-account history).

pub mod models;
pub mod repository;

pub use models::{InsertedPayment, NewPaymentRow, Payment};
pub use repository::{PaymentQueryError, PaymentRepository};
