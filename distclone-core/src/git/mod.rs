//! Git operations for distclone
//!
//! This module provides the repository client seam and its libgit2 backend.

mod clone;

pub use clone::{
    classify, Git2Client, RepositoryClient, TASK_CHECKOUT, TASK_RECEIVING, TASK_RESOLVING,
};
