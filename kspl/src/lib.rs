//! Kernel interrupt priority synchronisation primitives
#![no_std]

mod spl;

pub use spl::{raise, InterruptControl, Ipl, SplGuard};
