//! Grouping of 2D points into maximal collinear sets.
//!
//! Layout
//! - `point`: immutable input point with exact equality.
//! - `line`: line accumulator, canonical `LineKey`, sequential `LineIds`.
//! - `engine`: two-phase grouping (pairwise discovery, full sweep, size filter).
//! - `cfg`: tolerances and output policy.
//!
//! Reading and writing delimited text lives in the CLI crate; this crate only
//! sees `&[Point]` in and `Vec<LineRecord>` out.

pub mod cfg;
pub mod engine;
pub mod line;
pub mod point;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{is_close, CollinearCfg, KeyPolicy};
pub use engine::{find_collinear, CollinearityEngine, RunStats};
pub use line::{AddOutcome, DegenerateLineError, Line, LineId, LineIds, LineKey, LineRecord, Slope};
pub use point::Point;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::cfg::{CollinearCfg, KeyPolicy};
    pub use crate::engine::{find_collinear, CollinearityEngine, RunStats};
    pub use crate::line::{LineId, LineRecord};
    pub use crate::point::Point;
    pub use nalgebra::Vector2 as Vec2;
}
