use super::Tool;
use crate::core::config::Config;
use crate::{AzulejoError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

static VERSION_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn version_regex() -> Option<&'static Regex> {
    VERSION_RE
        .get_or_init(|| Regex::new(r"v?(\d+(?:\.\d+)+)").ok())
        .as_ref()
}

/// What is known about one external tool on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub tool: Tool,
    pub binary: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Locates the external programs the pipeline shells out to
///
/// Binaries come from the configuration; a bare name is searched on `PATH`,
/// anything containing a path separator is used as given.
pub struct ToolManager {
    binaries: Vec<(Tool, String)>,
}

impl ToolManager {
    pub fn new(config: &Config) -> Self {
        Self {
            binaries: vec![
                (Tool::Usearch, config.clustering.binary.clone()),
                (Tool::Muscle, config.alignment.binary.clone()),
                (Tool::Dagchainer, config.synteny.dagchainer_binary.clone()),
            ],
        }
    }

    pub fn binary_name(&self, tool: Tool) -> &str {
        self.binaries
            .iter()
            .find(|(t, _)| *t == tool)
            .map(|(_, b)| b.as_str())
            .unwrap_or_else(|| tool.binary_name())
    }

    /// Get the path to a tool's binary if it can be found
    pub fn get_tool_path(&self, tool: Tool) -> Option<PathBuf> {
        let binary = self.binary_name(tool);
        let candidate = Path::new(binary);
        if candidate.components().count() > 1 {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }
        which::which(binary).ok()
    }

    pub fn require(&self, tool: Tool) -> Result<PathBuf> {
        self.get_tool_path(tool).ok_or_else(|| {
            let message = format!(
                "{} binary '{}' not found on PATH",
                tool.display_name(),
                self.binary_name(tool)
            );
            match tool {
                Tool::Usearch => AzulejoError::ClusteringTool(message),
                Tool::Muscle => AzulejoError::AlignmentTool(message),
                Tool::Dagchainer => AzulejoError::SyntenyTool(message),
            }
        })
    }

    /// Ask the binary for its version.
    pub fn probe_version(&self, tool: Tool, path: &Path) -> Option<String> {
        let output = Command::new(path).arg(tool.version_arg()).output().ok()?;
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let version = parse_version(&text);
        debug!("{} version probe gave {:?}", tool.name(), version);
        version
    }

    pub fn status(&self, tool: Tool) -> ToolStatus {
        let path = self.get_tool_path(tool);
        let version = path.as_deref().and_then(|p| self.probe_version(tool, p));
        ToolStatus {
            tool,
            binary: self.binary_name(tool).to_string(),
            path,
            version,
        }
    }

    pub fn list(&self) -> Vec<ToolStatus> {
        Tool::all().into_iter().map(|t| self.status(t)).collect()
    }
}

/// First dotted version number in a tool banner.
pub fn parse_version(text: &str) -> Option<String> {
    version_regex()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
