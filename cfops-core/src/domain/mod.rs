//! Core domain types
//!
//! This module contains the structures observed on, or sent to, the two remote
//! control planes: the deployment director and the platform controller.

pub mod event;
pub mod system;
pub mod task;
pub mod toggle;
