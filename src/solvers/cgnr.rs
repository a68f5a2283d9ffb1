//! CGNR solver
//!
//! Conjugate gradient on the normal equations AᴴA x = Aᴴy for complex
//! linear operators, solving min ||Ax - y||₂.
//!
//! The solver runs a fixed number of iterations from a zero start; it has
//! no residual-based stopping rule.

use num_complex::Complex64;

/// Result of a CGNR run
#[derive(Debug, Clone)]
pub struct CgnrOutput {
    /// Solution estimate
    pub x: Vec<Complex64>,
    /// Iterations actually performed
    pub iterations: usize,
    /// ||y - Ax||₂ after the last iteration
    pub residual_norm: f64,
}

/// CGNR solver
///
/// Solves min ||Ax - y||₂ where A is a linear operator.
///
/// # Arguments
/// * `a_op` - Closure that computes A*x
/// * `ah_op` - Closure that computes Aᴴ*r
/// * `y` - Right-hand side vector
/// * `iterations` - Number of iterations to run
///
/// # Returns
/// Solution after `iterations` steps. Stops early only when the search
/// direction vanishes, since no further progress is possible.
pub fn cgnr_solve<F, G>(
    a_op: F,
    ah_op: G,
    y: &[Complex64],
    iterations: usize,
) -> CgnrOutput
where
    F: Fn(&[Complex64]) -> Vec<Complex64>,
    G: Fn(&[Complex64]) -> Vec<Complex64>,
{
    // r = y - A*0
    let mut r = y.to_vec();
    let mut z = ah_op(&r);
    let n = z.len();
    let mut x = vec![Complex64::new(0.0, 0.0); n];
    let mut p = z.clone();
    let mut zz = norm_sqr(&z);

    let mut done = 0;
    for _iter in 0..iterations {
        if zz <= f64::MIN_POSITIVE {
            break;
        }

        let v = a_op(&p);
        let vv = norm_sqr(&v);
        if vv <= f64::MIN_POSITIVE {
            break;
        }

        let alpha = zz / vv;

        // x = x + alpha * p
        for (xi, &pi) in x.iter_mut().zip(p.iter()) {
            *xi += pi * alpha;
        }

        // r = r - alpha * A*p
        for (ri, &vi) in r.iter_mut().zip(v.iter()) {
            *ri -= vi * alpha;
        }

        z = ah_op(&r);
        let zz_new = norm_sqr(&z);
        let beta = zz_new / zz;

        // p = z + beta * p
        for (pi, &zi) in p.iter_mut().zip(z.iter()) {
            *pi = zi + *pi * beta;
        }

        zz = zz_new;
        done += 1;
    }

    CgnrOutput {
        x,
        iterations: done,
        residual_norm: norm_sqr(&r).sqrt(),
    }
}

fn norm_sqr(v: &[Complex64]) -> f64 {
    v.iter().map(|c| c.norm_sqr()).sum()
}
