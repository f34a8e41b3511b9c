//! Waypoint - Hypermedia HTTP Client
//!
//! Core library for transport-agnostic resource access, content negotiation
//! and suspended calls.

pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod header;
pub mod media;
pub mod message;
pub mod resource;
pub mod suspend;
pub mod transport;
