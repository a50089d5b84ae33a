//! Data Transfer Objects
//!
//! Lightweight descriptions of outbound requests. A Rest Runner turns these
//! into real HTTP calls.

pub mod rest;
