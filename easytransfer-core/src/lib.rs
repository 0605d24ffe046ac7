//! EasyTransfer Core
//!
//! Core types shared by the EasyTransfer agent, client and CLI.
//!
//! This crate contains:
//! - Domain types: credentials, transfer jobs and their outcomes
//! - DTOs: wire bodies exchanged with the transfer server
//! - Settings: the key-value store the agent reads its credentials from

pub mod domain;
pub mod dto;
pub mod settings;
