//! SkyNET: participant adapter for a message-bus workflow engine.
//!
//! The engine dispatches workitems to named participants. This crate routes
//! those deliveries (and the cancel / stop control messages that accompany
//! them) to an application [`Handler`](participant::Handler), and gives the
//! handler a thread-safe callback for replying to the engine once its work is
//! done.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod echo;
pub mod logging;
pub mod participant;
pub mod runner;
pub mod transport;
pub mod workitem;
