//! Sheets Client Library
//!
//! Range-addressed access to a remotely hosted spreadsheet workbook: read,
//! update, append, clear, delete rows and list sheets. The console binary
//! drives these operations interactively.

pub mod config;
pub mod console;
pub mod sheets;
