//! Trait definitions for external tool abstractions
//!
//! Clustering, alignment and colinearity detection are delegated to external
//! programs. These traits are the seams that let the core swap a subprocess
//! wrapper for an in-process stand-in.
use crate::bio::sequence::Sequence;
use crate::Result;
use std::fmt;
use std::path::Path;

/// One line of clusterer membership output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipRecord {
    /// Founding member (centroid) of tool cluster `cluster`.
    Centroid { id: String, cluster: usize },
    /// Member assigned to an existing tool cluster.
    Hit { id: String, cluster: usize },
    /// Sequence the tool did not place in any cluster.
    Unclustered { id: String },
}

impl MembershipRecord {
    pub fn id(&self) -> &str {
        match self {
            MembershipRecord::Centroid { id, .. }
            | MembershipRecord::Hit { id, .. }
            | MembershipRecord::Unclustered { id } => id,
        }
    }
}

/// Greedy sequence clusterer
pub trait Clusterer: Send + Sync {
    /// Cluster `sequences` so that members share at least `identity`
    /// fractional identity with their centroid.
    fn cluster(&self, sequences: &[Sequence], identity: f64) -> Result<Vec<MembershipRecord>>;

    /// Verify that the tool is properly installed
    fn verify_installation(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Multiple-sequence aligner
pub trait Aligner: Send + Sync {
    /// Align `sequences` and write the aligned FASTA to `output`.
    fn align(&self, sequences: &[Sequence], output: &Path) -> Result<()>;

    fn verify_installation(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Relative orientation of a synteny block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "+",
            Direction::Reverse => "-",
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A homologous pair of proteins on one fragment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub a_id: String,
    pub b_id: String,
    pub a_frag: String,
    pub b_frag: String,
    pub a_pos: i64,
    pub b_pos: i64,
    pub cluster: i64,
}

/// A colinear run of anchors, as indices into the slice handed to the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub anchors: Vec<usize>,
    pub direction: Direction,
}

/// Chains anchors into colinear runs.
pub trait ColinearityDetector: Send + Sync {
    /// Anchors arrive sorted by `(a_frag, b_frag, a_pos, b_pos, a_id, b_id)`.
    /// Returned chains hold at least `min_len` anchors, consecutive anchors no
    /// more than `max_gap` positions apart on either side.
    fn chain(&self, anchors: &[Anchor], max_gap: u32, min_len: usize) -> Result<Vec<Chain>>;

    fn name(&self) -> &str;
}
