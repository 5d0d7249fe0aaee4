//! Domain types, access policy, and workflow for the achievement tracker.
//!
//! Storage is abstracted behind [`store::DirectoryStore`] and
//! [`store::DocumentStore`]; the services in [`service`] combine both with
//! the policy table in [`policy`].

#![allow(async_fn_in_trait)]

pub mod academic;
pub mod achievement;
pub mod error;
pub mod identity;
pub mod policy;
pub mod principal;
pub mod service;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
