//! Core types and decision logic for the StackIt Q&A platform.
//!
//! This crate is free of HTTP and database dependencies. The
//! vote ledger and the access guard are pure functions over already-fetched
//! facts; all I/O lives behind the [`store::ForumStore`] trait.

// Native `async fn` in trait impls; the trait itself spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod guard;
pub mod ledger;
pub mod principal;
pub mod store;
pub mod votable;
pub mod vote;

pub use error::{
  AuthenticationError, AuthorizationError, Error, InvalidVoteType, Result,
};
