// SPDX-License-Identifier: MIT
//! Derived-list synchronization.
//!
//! A mutation performed in one UI subtree (say, a dialog deleting an agent)
//! reaches the sidebar list in another subtree through [`SyncBus`] instead of
//! a full network round-trip or prop drilling. The list owner additionally
//! refetches on a fixed interval and on focus regain, so missed events are
//! corrected eventually rather than relied upon never happening.

pub mod bus;
pub mod list;

pub use bus::{ListItem, SyncBus, SyncEvent};
pub use list::{run_synchronizer, DerivedList, ListFetcher, SyncOptions};
