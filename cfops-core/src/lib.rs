//! Cfops Core
//!
//! Core types shared by the cfops client and CLI.
//!
//! This crate contains:
//! - Domain types: director tasks, event documents, job toggles, system info records
//! - DTOs: request descriptions handed to a Rest Runner
//!
//! Note: nothing here performs I/O. Remote calls live in `cfops-client`.

pub mod domain;
pub mod dto;
