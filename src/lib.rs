//! Main crate for the `alidnsctl` application.
//!
//! For more information, choose one of the modules below.
//! The following modules might be of interest if you want to add new functionality:
//! - [`provider`]s are DNS services such as Alibaba Cloud DNS that store and serve the records
//! - [`plan`]s describe the changes needed to bring the records of a name to a desired state
//! - the [`executor`] fetches records, generates plans and applies them through a provider
//! - [`domain`] contains the hostname splitting and record type detection rules

#![allow(clippy::uninlined_format_args)]

pub mod domain;
pub mod executor;
pub mod plan;
pub mod provider;
