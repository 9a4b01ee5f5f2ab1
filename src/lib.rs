//! bustrs: a resumable, concurrent web directory brute-forcer.
//!
//! The crate is organized as a small pipeline of components wired together
//! by `Supervisor`, matching the component list in SPEC_FULL.md §2:
//! Store -> Expander -> Poller -> Prober pool -> Collector -> Monitor,
//! with Supervisor owning lifecycle.

pub mod collector;
pub mod config;
pub mod error;
pub mod expander;
pub mod logging;
pub mod monitor;
pub mod poller;
pub mod prober;
pub mod store;
pub mod supervisor;
pub mod wordlist;

#[cfg(feature = "dashboard")]
pub mod tui;
