//! Bank Ledger - accounts and atomic funds transfers
//!
//! Accounts hold a decimal balance; a payment moves funds from one account
//! to another as a single store transaction under ordered row locks.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier newtypes (AccountId, PaymentId) and AccountSide
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`store`] - Ledger Store capability (row locks, transactions) and backends
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`account`] - Account models, field validation, CRUD repository
//! - [`payment`] - Payment models and read repository
//! - [`transfer`] - Transfer coordinator (lock ordering, funds check, dual update)
//! - [`gateway`] - HTTP surface

// Core types - must be first!
pub mod core_types;

// Ambient
pub mod config;
pub mod logging;

// Storage
pub mod db;
pub mod store;

// Ledger components
pub mod account;
pub mod payment;
pub mod transfer;

// HTTP
pub mod gateway;

// Convenient re-exports at crate root
pub use account::{Account, AccountError, AccountRepository, FieldLimits, ValidationError};
pub use config::AppConfig;
pub use core_types::{AccountId, AccountSide, PaymentId};
pub use payment::{Payment, PaymentRepository};
pub use store::{LedgerStore, LedgerTx, MemoryStore, PgLedgerStore, StoreError};
pub use transfer::{TransferCoordinator, TransferError, TransferRequest, ValidatedTransfer};
