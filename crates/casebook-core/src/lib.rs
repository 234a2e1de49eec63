//! Core types and trait definitions for the Casebook crime record store.
//!
//! This crate is deliberately free of database and terminal dependencies.
//! Backends implement [`store::CrimeStore`]; front ends drive records through
//! [`session::EditSession`] and render them through [`projection`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod crime;
pub mod error;
pub mod feed;
pub mod memory;
pub mod photo;
pub mod projection;
pub mod session;
pub mod store;

pub use error::{Error, Result};
