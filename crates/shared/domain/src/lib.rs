//! # Domain Models
//!
//! Data types shared by every slice: packages and their status vocabularies, customers,
//! broadcasts, configuration, events, and the repository ports the infrastructure implements.
//! No I/O lives here.

pub mod broadcast;
pub mod config;
pub mod constants;
pub mod customer;
pub mod events;
pub mod package;
pub mod ports;
pub mod registry;
pub mod role;
pub mod status;
