//! Kernels for field simulation and non-uniform gridding

pub mod dipole;
pub mod kaiser_bessel;

pub use dipole::*;
pub use kaiser_bessel::*;
