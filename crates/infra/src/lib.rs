//! Infrastructure layer: persistence boundary, ledger operations, config.

pub mod balances;
pub mod config;
pub mod ledger;
pub mod store;

pub use balances::CustomerBalanceSummary;
pub use config::{ConfigError, InvoicemeConfig, LedgerConfig};
pub use ledger::{Ledger, LedgerError, LedgerResult};
pub use store::{InMemoryLedgerStore, LedgerStore, StoreError};
