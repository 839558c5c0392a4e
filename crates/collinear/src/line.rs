//! Inferred straight lines and their member points.
//!
//! - `Line`: accumulator of collinear points, slope/intercept fixed by the
//!   first two members.
//! - `LineKey`: hashable canonical identity built from `(slope, intercept)`.
//! - `LineIds`: sequential id source owned by whoever builds lines.
//!
//! Two comparisons are kept apart:
//! - `Line::key` / `PartialEq`: exact on `(slope, intercept)`.
//! - `Line::is_same_as`: tolerance-based, per `CollinearCfg`.
//!
//! Vertical membership compares x exactly while non-vertical membership
//! compares slopes with tolerance. Both `try_add` and `is_same_as` keep that
//! asymmetry.

use std::fmt;

use tracing::trace;

use crate::cfg::CollinearCfg;
use crate::point::Point;

/// Slope of a line; vertical lines have no finite slope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slope {
    Finite(f64),
    Vertical,
}

impl Slope {
    #[inline]
    pub fn is_vertical(&self) -> bool {
        matches!(self, Slope::Vertical)
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slope::Finite(m) => write!(f, "{m}"),
            Slope::Vertical => f.write_str("vertical"),
        }
    }
}

/// Canonical identity of a line.
///
/// Floats are compared by bit pattern with `-0.0` folded into `0.0`, so the
/// same pair of points taken in either order yields the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineKey {
    vertical: bool,
    slope_bits: u64,
    intercept_bits: u64,
}

impl LineKey {
    pub fn new(slope: Slope, intercept: f64) -> Self {
        let (vertical, slope_bits) = match slope {
            Slope::Finite(m) => (false, canonical_bits(m)),
            Slope::Vertical => (true, 0),
        };
        Self {
            vertical,
            slope_bits,
            intercept_bits: canonical_bits(intercept),
        }
    }

    #[inline]
    pub fn slope(&self) -> Slope {
        if self.vertical {
            Slope::Vertical
        } else {
            Slope::Finite(f64::from_bits(self.slope_bits))
        }
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        f64::from_bits(self.intercept_bits)
    }
}

/// `slope_intercept`, e.g. `1_0` or `vertical_5`.
impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.slope(), self.intercept())
    }
}

#[inline]
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Sequential line identifier (display/debug only, never part of identity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues `LineId`s starting at 1.
#[derive(Clone, Debug, Default)]
pub struct LineIds {
    issued: u64,
}

impl LineIds {
    pub fn new() -> Self {
        Self::default()
    }
    #[inline]
    pub fn next_id(&mut self) -> LineId {
        self.issued += 1;
        LineId(self.issued)
    }
    /// Number of ids handed out so far.
    #[inline]
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// A line needs two distinct points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegenerateLineError {
    pub point: Point,
}

impl fmt::Display for DegenerateLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot create a line from the same point {} twice", self.point)
    }
}

impl std::error::Error for DegenerateLineError {}

/// Result of `Line::try_add`. None of these is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyMember,
    NotOnLine,
}

/// One inferred line plus the input points found on it (borrowed, in
/// insertion order, no duplicates by value).
#[derive(Clone, Debug)]
pub struct Line<'a> {
    id: LineId,
    slope: Slope,
    /// y-intercept, or the shared x-coordinate for vertical lines.
    intercept: f64,
    members: Vec<&'a Point>,
}

impl<'a> Line<'a> {
    /// Line through `p1` and `p2`. Consumes an id only on success.
    pub fn new(
        p1: &'a Point,
        p2: &'a Point,
        ids: &mut LineIds,
    ) -> Result<Self, DegenerateLineError> {
        if p1 == p2 {
            return Err(DegenerateLineError { point: *p1 });
        }
        let d = p2.to_vec2() - p1.to_vec2();
        let (slope, intercept) = if d.x == 0.0 {
            (Slope::Vertical, p1.x())
        } else {
            let m = d.y / d.x;
            (Slope::Finite(m), p1.y() - m * p1.x())
        };
        Ok(Self {
            id: ids.next_id(),
            slope,
            intercept,
            members: vec![p1, p2],
        })
    }

    #[inline]
    pub fn id(&self) -> LineId {
        self.id
    }
    #[inline]
    pub fn slope(&self) -> Slope {
        self.slope
    }
    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
    #[inline]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.slope, self.intercept)
    }
    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }
    pub fn points(&self) -> impl ExactSizeIterator<Item = &'a Point> + '_ {
        self.members.iter().copied()
    }

    /// Exact lookup among current members.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.members.iter().any(|&m| m == p)
    }

    /// Append `p` if it lies on the line and is not already a member.
    pub fn try_add(&mut self, p: &'a Point, cfg: &CollinearCfg) -> AddOutcome {
        if self.contains_point(p) {
            trace!(point = %p, line = self.id.0, "point already on line");
            return AddOutcome::AlreadyMember;
        }
        if self.passes_through(p, cfg) {
            self.members.push(p);
            trace!(point = %p, line = self.id.0, size = self.members.len(), "point added");
            AddOutcome::Added
        } else {
            trace!(point = %p, line = self.id.0, key = %self.key(), "point not on line");
            AddOutcome::NotOnLine
        }
    }

    /// Collinearity of `p` with the first member under this line's slope.
    fn passes_through(&self, p: &Point, cfg: &CollinearCfg) -> bool {
        match self.slope {
            Slope::Vertical => p.x() == self.intercept,
            Slope::Finite(m) => {
                // A non-vertical line meets each vertical exactly once.
                let d = p.to_vec2() - self.members[0].to_vec2();
                d.x != 0.0 && cfg.is_close(m, d.y / d.x)
            }
        }
    }

    /// Tolerant identity: slopes and intercepts close under `cfg`.
    /// Vertical lines match only vertical lines at the exact same x.
    pub fn is_same_as(&self, other: &Line<'_>, cfg: &CollinearCfg) -> bool {
        match (self.slope, other.slope) {
            (Slope::Vertical, Slope::Vertical) => self.intercept == other.intercept,
            (Slope::Finite(a), Slope::Finite(b)) => {
                cfg.is_close(a, b) && cfg.is_close(self.intercept, other.intercept)
            }
            _ => false,
        }
    }

    /// Owned snapshot for output.
    pub fn to_record(&self) -> LineRecord {
        LineRecord {
            id: self.id,
            points: self.members.iter().map(|&p| *p).collect(),
        }
    }
}

/// Exact `(slope, intercept)` equality; see `is_same_as` for the tolerant form.
impl PartialEq for Line<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// `id,x1,y1,...,xk,yk`
impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for p in &self.members {
            write!(f, ",{p}")?;
        }
        Ok(())
    }
}

/// Emitted group: line id plus its member points in member order.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRecord {
    pub id: LineId,
    pub points: Vec<Point>,
}

impl LineRecord {
    /// Flattened output fields: id, then x and y of every point.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(1 + 2 * self.points.len());
        out.push(self.id.to_string());
        for p in &self.points {
            out.push(p.x().to_string());
            out.push(p.y().to_string());
        }
        out
    }
}

impl fmt::Display for LineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields().join(","))
    }
}
