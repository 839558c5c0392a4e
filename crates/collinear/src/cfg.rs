//! Tolerances and output policy for collinearity grouping.
//!
//! - `CollinearCfg`: centralizes the float tolerances used by slope comparison,
//!   the minimum group size, and how discovered lines are looked up.
//! - `is_close`: relative/absolute closeness test shared by `Line` operations.
//!
//! Policy
//! - Defaults: rel 1e-9, abs 0, exact keys, groups of 3 or more.
//!   Callers change them explicitly; nothing adapts tolerances on the fly.

/// Default relative tolerance for slope comparison.
pub const REL_TOL: f64 = 1e-9;
/// Default absolute tolerance for slope comparison.
pub const ABS_TOL: f64 = 0.0;
/// Smallest group reported as "collinear".
pub const MIN_POINTS: usize = 3;

/// How Phase 1 decides that a candidate line already exists in the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Hash lookup on the exact `(slope, intercept)` key.
    #[default]
    Exact,
    /// Exact lookup first, then a linear scan with `Line::is_same_as`.
    /// Merges lines whose keys differ only by rounding.
    Tolerant,
}

/// Grouping configuration (tolerances + output filter).
#[derive(Clone, Copy, Debug)]
pub struct CollinearCfg {
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// Lines with fewer members are not emitted. Values below 2 behave like 2.
    pub min_points: usize,
    pub keys: KeyPolicy,
}

impl Default for CollinearCfg {
    fn default() -> Self {
        Self {
            rel_tol: REL_TOL,
            abs_tol: ABS_TOL,
            min_points: MIN_POINTS,
            keys: KeyPolicy::Exact,
        }
    }
}

impl CollinearCfg {
    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        is_close(a, b, self.rel_tol, self.abs_tol)
    }
}

/// `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)`.
///
/// Infinite or NaN operands are never close to anything (the plain formula
/// would accept `inf` against any finite value).
#[inline]
pub fn is_close(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> bool {
    if a == b {
        return true;
    }
    if !(a.is_finite() && b.is_finite()) {
        return false;
    }
    (a - b).abs() <= (rel_tol * a.abs().max(b.abs())).max(abs_tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_tolerance_scales_with_magnitude() {
        assert!(is_close(1.0, 1.0 + 1e-10, REL_TOL, ABS_TOL));
        assert!(!is_close(1.0, 1.0 + 1e-8, REL_TOL, ABS_TOL));
        assert!(is_close(1e6, 1e6 + 1e-4, REL_TOL, ABS_TOL));
    }

    #[test]
    fn zero_only_matches_zero_without_abs_tol() {
        assert!(is_close(0.0, -0.0, REL_TOL, ABS_TOL));
        assert!(!is_close(0.0, 1e-300, REL_TOL, ABS_TOL));
        assert!(is_close(0.0, 1e-12, REL_TOL, 1e-9));
    }

    #[test]
    fn non_finite_never_close() {
        assert!(!is_close(1.0, f64::INFINITY, REL_TOL, ABS_TOL));
        assert!(!is_close(f64::NAN, f64::NAN, REL_TOL, ABS_TOL));
        assert!(!is_close(f64::NEG_INFINITY, -1e300, REL_TOL, 1.0));
    }

    #[test]
    fn defaults() {
        let cfg = CollinearCfg::default();
        assert_eq!(cfg.min_points, 3);
        assert_eq!(cfg.keys, KeyPolicy::Exact);
        assert!(cfg.is_close(2.0, 2.0));
    }
}
