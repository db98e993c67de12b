//! Shoe mileage ledger.
//!
//! `stat` holds the ledger itself: shoes, their run logs, and the pure
//! operations that keep a shoe's cumulative miles equal to the sum of its log.
//! `tui` is the shell around it: an explicit application state with one
//! reducer per user action, a two-phase commit against a [`stat::ShoeStore`],
//! and the terminal front end.

pub mod config;
pub mod stat;
pub mod tui;
