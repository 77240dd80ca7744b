//! Leave approval rules: the status engine, the error taxonomy, and the
//! role-gated transitions in [`service::LeaveService`].

pub mod error;
pub mod service;
pub mod status;
