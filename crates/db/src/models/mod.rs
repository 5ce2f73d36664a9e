//! Datastore entity mappings.
//!
//! Each submodule names its entity kind and property keys and converts
//! between the domain record and the wire entity.

pub mod session;
pub mod user;
