//! Iterative solvers for reconstruction
//!
//! This module provides iterative solvers used by the NUFFT inverse:
//! - CGNR: Conjugate gradient on the normal equations

pub mod cgnr;

pub use cgnr::*;
