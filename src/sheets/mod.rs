//! Spreadsheet service client module
//!
//! Structure:
//! - `store.rs`: range-level operations against one workbook
//! - `transport.rs`: transport trait and wire request/response types
//! - `client.rs`: HTTP/JSON transport with bearer-token authentication
//! - `range.rs`: A1 range parsing and formatting
//! - `value.rs`: cell values, rows and matrices
//! - `error.rs`: error types

pub mod client;
pub mod error;
pub mod range;
pub mod store;
pub mod transport;
pub mod value;

// Re-exports for convenience
pub use client::HttpTransport;
pub use error::{FailureKind, Result, SheetsError, TransportFailure};
pub use range::{CellRef, RangeAddress, Span};
pub use store::{SheetTab, TabularStoreClient};
pub use transport::Transport;
pub use value::{CellValue, Matrix, Row};
