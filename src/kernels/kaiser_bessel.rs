//! Kaiser-Bessel interpolation kernel for NUFFT gridding
//!
//! ψ(u) = I0(β·sqrt(1 - (u/m)²)) / I0(β) for |u| <= m, in units of
//! oversampled grid cells, with the closed-form Fourier transform
//!
//! ψ̂(ν) = 2m · sinh(sqrt(β² - (2πmν)²)) / sqrt(β² - (2πmν)²) / I0(β)
//!
//! β follows Beatty et al. (2005) for the given width and oversampling.

use std::f64::consts::PI;

/// Modified Bessel function of the first kind, order zero
///
/// Power series Σ (x²/4)^k / (k!)², summed until terms stop contributing.
pub fn bessel_i0(x: f64) -> f64 {
    let y = x * x / 4.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..500 {
        let kf = k as f64;
        term *= y / (kf * kf);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

#[derive(Debug, Clone, PartialEq)]
pub struct KaiserBessel {
    /// Half-width of the support in oversampled grid cells
    pub half_width: usize,
    pub beta: f64,
    norm: f64,
}

impl KaiserBessel {
    /// Kernel of half-width `half_width` cells for oversampling factor `sigma`
    pub fn new(half_width: usize, sigma: f64) -> Self {
        let w = 2.0 * half_width as f64;
        let arg = (w / sigma).powi(2) * (sigma - 0.5).powi(2) - 0.8;
        let beta = PI * arg.max(0.0).sqrt();
        Self { half_width, beta, norm: bessel_i0(beta) }
    }

    /// ψ(u); zero outside the support
    pub fn eval(&self, u: f64) -> f64 {
        let m = self.half_width as f64;
        let r = u / m;
        if r.abs() > 1.0 {
            return 0.0;
        }
        bessel_i0(self.beta * (1.0 - r * r).sqrt()) / self.norm
    }

    /// ψ̂(ν) for frequency ν in cycles per oversampled cell
    pub fn fourier(&self, nu: f64) -> f64 {
        let m = self.half_width as f64;
        let a = 2.0 * PI * m * nu;
        let z2 = self.beta * self.beta - a * a;
        let shape = if z2 > 0.0 {
            let z = z2.sqrt();
            z.sinh() / z
        } else if z2 < 0.0 {
            let z = (-z2).sqrt();
            z.sin() / z
        } else {
            1.0
        };
        2.0 * m * shape / self.norm
    }
}
