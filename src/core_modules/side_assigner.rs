// THEORY:
// The `SideAssigner` decides which detected blob drives which paddle. Assignment is
// purely positional and recomputed every frame: of two blobs, the one whose box
// starts further left is the left hand. There is no identity carried between
// frames, so if the players cross their hands quickly the paddles swap owners.
//
// Fewer than two blobs cannot be assigned with confidence. The result says so
// explicitly (`None` or `One`) and leaves the policy decision to the pipeline.

use crate::core_modules::blob_detector::Blob;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which paddle a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The side of the frame `x` falls in, split at the vertical midline.
    pub fn of_midline(x: u32, frame_width: u32) -> Self {
        if x < frame_width / 2 { Side::Left } else { Side::Right }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The outcome of assigning up to two blobs to sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideAssignment {
    /// Nothing was detected.
    None,
    /// A single blob was detected; its side is not known.
    One(Blob),
    /// Two blobs, ordered by the left edge of their bounding boxes.
    Pair { left: Blob, right: Blob },
}

/// Assigns the first two of `blobs` to sides by horizontal position.
///
/// Callers pass at most two blobs; anything beyond the first two is ignored.
/// When both blobs start at the same column, input order decides.
pub fn assign_sides(blobs: &[Blob]) -> SideAssignment {
    match blobs {
        [] => SideAssignment::None,
        [only] => SideAssignment::One(*only),
        [first, second, ..] => {
            if second.bounding_box.x < first.bounding_box.x {
                SideAssignment::Pair {
                    left: *second,
                    right: *first,
                }
            } else {
                SideAssignment::Pair {
                    left: *first,
                    right: *second,
                }
            }
        }
    }
}
