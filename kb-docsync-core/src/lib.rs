#![doc = "kb-docsync-core: core logic library for kb-docsync."]

//! Lists the documentation files of a GitHub repository, diffs them against the
//! documents of a knowledge-base dataset and registers what is missing.
//!
//! # Usage
//! Implement or mock [`contract::RepositoryTree`] and [`contract::KnowledgeBase`],
//! build a [`config::SyncConfig`] and call [`synchronise::synchronise`], or run the
//! stages one at a time through [`list`], [`register`] and [`purge`].

pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod list;
pub mod purge;
pub mod register;
pub mod snapshot;
pub mod synchronise;
