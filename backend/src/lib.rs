//! # GearGuard Backend
//!
//! Maintenance ticketing for industrial equipment.
//!
//! Users raise maintenance requests against equipment, technicians are
//! auto-assigned from maintenance teams based on time-slot availability, and
//! work progress is logged until completion. The backend exposes a REST API
//! via Axum.
//!
//! ## Architecture
//!
//! - [`api`]: identifier newtypes and the domain types shared by every layer
//! - [`models`]: entity definitions and their validation
//! - [`access`]: per-entity visibility and authorization predicates
//! - [`scheduler`]: technician/work-center availability engine
//! - [`services`]: business operations (requests, work logs, reassignment,
//!   directory CRUD, accounts)
//! - [`auth`]: tokens, password hashing and the per-request principal
//! - [`db`]: repository traits with in-memory and Postgres backends
//! - [`http`]: Axum router and handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod models;

pub mod api;

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
