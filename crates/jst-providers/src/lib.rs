//! JST Providers - Collaborator providers for the JST translation engine
//!
//! These providers sit outside the engine's default set and are registered
//! explicitly by callers that need them:
//! - **DateParse**: normalizes dates to RFC 3339 UTC strings
//! - **CurrencyParse**: turns formatted money amounts into numbers
//! - **RecordLink**: resolves values to record ids in a pluggable store, and
//!   creates missing records from another known schema
//!
//! # Example
//!
//! ```no_run
//! use jst_core::{Translator, Result};
//! use jst_providers::{providers, MemoryRecordStore};
//! use std::sync::Arc;
//!
//! fn example() -> Result<Translator> {
//!     let store = Arc::new(MemoryRecordStore::new());
//!     Translator::builder().providers(providers(store)).build()
//! }
//! ```

pub mod currency;
pub mod date;
pub mod error;
pub mod link;

pub use currency::{CurrencyFormat, CurrencyParse};
pub use date::DateParse;
pub use error::{StoreError, StoreResult};
pub use link::{LinkOptions, MemoryRecordStore, RecordLink, RecordStore};

use jst_core::Provider;
use std::sync::Arc;

/// Every collaborator provider, linking against `store`
pub fn providers(store: Arc<dyn RecordStore>) -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(DateParse::new()),
        Arc::new(CurrencyParse::new()),
        Arc::new(RecordLink::new(store)),
    ]
}
