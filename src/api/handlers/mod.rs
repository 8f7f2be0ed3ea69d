//! API handlers for the HR management backend.
//!
//! This module organizes the service's route handlers: the login flow and
//! session plumbing under [`auth`], operator management under [`hr`], and the
//! operational endpoints.

pub mod auth;
pub mod health;
pub mod hr;
pub mod root;
