//! A split-only buddy table over one contiguous extent of pages
//!
//! The table partitions a single extent into runs described by
//! [`BuddyEntry`] records. Reservations pick the smallest free run that
//! fits and split it in half repeatedly until halving again would make it
//! too small; the final run is handed out whole. Runs are never merged
//! back together, so the partition only ever gets finer.
//!
//! Entries live in a fixed arena inside the table itself. Nothing is
//! heap-allocated and all operations are linear scans, which keeps the
//! table usable from the earliest stages of kernel initialisation.
#![no_std]

mod table;


pub use table::{BuddyEntry, BuddyTable, MAX_ENTRIES};
