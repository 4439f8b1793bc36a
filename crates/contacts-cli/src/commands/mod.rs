//! Command handlers

pub mod category;
pub mod config;
pub mod contact;
pub mod status;
