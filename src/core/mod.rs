//! Core module - Configuration, errors, events and the selection model

pub mod config;
pub mod error;
pub mod events;
pub mod selection;
pub mod state;
