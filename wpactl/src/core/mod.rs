//! Core internal logic for profile management.
//!
//! This module contains the internal implementation of the catalog, scan,
//! status and connect flows, all written against a
//! [`ControlClient`](crate::ControlClient).

pub(crate) mod catalog;
pub(crate) mod lifecycle;
pub(crate) mod orchestrator;
pub(crate) mod params;
pub(crate) mod scan;
pub(crate) mod status;
