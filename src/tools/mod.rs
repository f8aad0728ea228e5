pub mod dagchainer;
pub mod muscle;
pub mod testing;
pub mod tool_manager;
pub mod traits;
pub mod usearch;

pub use dagchainer::DagChainer;
pub use muscle::MuscleAligner;
pub use tool_manager::{ToolManager, ToolStatus};
pub use traits::{
    Aligner, Anchor, Chain, Clusterer, ColinearityDetector, Direction, MembershipRecord,
};
pub use usearch::UsearchClusterer;

use crate::core::config::Config;
use crate::Result;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Usearch,
    Muscle,
    Dagchainer,
}

impl Tool {
    pub fn all() -> Vec<Tool> {
        vec![Tool::Usearch, Tool::Muscle, Tool::Dagchainer]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Usearch => "usearch",
            Tool::Muscle => "muscle",
            Tool::Dagchainer => "dagchainer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Usearch => "USEARCH",
            Tool::Muscle => "MUSCLE",
            Tool::Dagchainer => "DAGchainer",
        }
    }

    /// Default binary name
    pub fn binary_name(&self) -> &'static str {
        self.name()
    }

    pub fn purpose(&self) -> &'static str {
        match self {
            Tool::Usearch => "greedy clustering",
            Tool::Muscle => "multiple alignment",
            Tool::Dagchainer => "colinearity chains",
        }
    }

    pub(crate) fn version_arg(&self) -> &'static str {
        match self {
            Tool::Usearch => "--version",
            Tool::Muscle => "-version",
            Tool::Dagchainer => "-h",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usearch" => Ok(Tool::Usearch),
            "muscle" => Ok(Tool::Muscle),
            "dagchainer" | "dag" => Ok(Tool::Dagchainer),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

/// Clusterer named by the configuration, located on this machine.
pub fn configured_clusterer(config: &Config) -> Result<UsearchClusterer> {
    let path = ToolManager::new(config).require(Tool::Usearch)?;
    Ok(UsearchClusterer::new(path).with_extra_args(config.clustering.extra_args.clone()))
}

pub fn configured_aligner(config: &Config) -> Result<MuscleAligner> {
    let path = ToolManager::new(config).require(Tool::Muscle)?;
    Ok(MuscleAligner::new(path))
}

pub fn configured_dagchainer(config: &Config) -> Result<DagChainer> {
    let path = ToolManager::new(config).require(Tool::Dagchainer)?;
    Ok(DagChainer::new(path))
}
