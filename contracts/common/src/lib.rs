//! Shared power-ledger machinery for the Quorum contract suite.
//!
//! This crate provides:
//! - [`curve`] — the [`curve::PowerCurve`] capability and its two
//!   implementations (linear decay and flat), plus the [`curve::Point`] and
//!   [`curve::LockState`] shapes they exchange.
//! - [`checkpoint`] — the append-only per-account and global power
//!   histories, the transition engine that keeps them consistent, and the
//!   binary-search historical lookup.
//! - [`delegation`] — per-axis collector records and the contribution
//!   transfer that reassigns power between accounts.
//!
//! Contracts own their lifecycle state (positions, custody, guards) and
//! call into this crate for every ledger mutation and query.

#![no_std]

pub mod checkpoint;
pub mod curve;
pub mod delegation;

pub use checkpoint::*;
pub use curve::*;
pub use delegation::*;
