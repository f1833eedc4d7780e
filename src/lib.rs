//! Frankenbot: mashes up random images and quotes and posts the result

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![deny(warnings)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod annotate;
pub mod bot;
pub mod caption;
pub mod cli;
pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod http;
pub mod policy;
pub mod publish;
pub mod sources;
