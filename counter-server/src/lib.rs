//! Counter Server - order tracking engine for a retail bakery counter
//!
//! # Architecture Overview
//!
//! - **orders**: order composition, derived totals, lifecycle, persistence
//! - **customers**: customer directory and the deletion cascade
//! - **config**: environment-driven configuration
//! - **utils**: logging setup
//!
//! Orders are composed interactively (items merge by product + notes),
//! totals are derived through a generation-memoized graph, and every
//! status change is guarded server-side and recorded in an append-only
//! history. All writes go through redb with optimistic version checks.

pub mod config;
pub mod customers;
pub mod orders;
pub mod utils;

pub use config::Config;
pub use customers::CustomerDirectory;
pub use orders::OrdersManager;
