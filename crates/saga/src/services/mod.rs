//! External capabilities used by saga steps.

pub mod credit;

pub use credit::{CreditService, FixedCreditService, InMemoryCreditService};
