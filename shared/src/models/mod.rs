//! Shared data models

pub mod customer;

pub use customer::Customer;
