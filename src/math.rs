use ndarray::{Array1, Array2};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Raises `base` to an unsigned integer power, using repeated multiplication whenever the exponent
/// fits into an `i32`.
pub fn pow(base: f64, exponent: usize) -> f64 {
    match i32::try_from(exponent) {
        Ok(exponent) => base.powi(exponent),
        Err(_) => base.powf(exponent as f64),
    }
}

/// Pivots whose magnitude is below this fraction of the largest coefficient are treated as zero.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Solves the square linear system `a · x = b` through Gaussian elimination with partial
/// pivoting. Returns `None` if `a` is singular, i.e. if some pivot vanishes up to
/// [`PIVOT_TOLERANCE`] (relative to the largest absolute coefficient of `a`).
///
/// The system is consumed, as elimination happens in place.
pub fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n, "coefficient matrix must be square");
    debug_assert_eq!(b.len(), n, "right hand side does not match the system");

    let scale = a.iter().fold(1f64, |acc, x| acc.max(x.abs()));

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() <= PIVOT_TOLERANCE * scale {
            return None;
        }
        if pivot != col {
            for k in col..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[[col, k]];
                a[[row, k]] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let known: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - known) / a[[row, row]];
    }
    Some(x)
}
