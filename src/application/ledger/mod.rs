//! Receivable ledger

pub mod service;

pub use service::ReceivableLedger;
