//! groundcast - schema-driven validation and serialization for ground.news payloads
//!
//! A schema is a named set of type descriptors. Decoding walks a wire
//! payload against a descriptor, rejecting the first mismatch and renaming
//! fields to their internal names; encoding walks the other way.

pub mod catalog;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod schema;
