//! Parties domain module: the companies (tenants) that issue invoices and the
//! customers they bill.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod company;
pub mod customer;

pub use company::Company;
pub use customer::{Customer, CustomerId, CustomerDetails};
