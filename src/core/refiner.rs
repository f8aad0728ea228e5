//! Incremental clustering over an identity schedule.
//!
//! Step 0 clusters every input sequence; each later step clusters only the
//! representatives of the step before. The steps form a forest stored as an
//! arena of [`ClusterNode`]s indexed by `(step, cluster)`.
use super::cluster_builder::{build_clusters, clusters_to_histograms, ClusterTable};
use super::config::ScheduleOrder;
use crate::bio::sequence::Sequence;
use crate::storage::{Column, Table};
use crate::tools::Clusterer;
use crate::{AzulejoError, Result};
use std::collections::{HashMap, HashSet};
use tracing::info;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterNode {
    pub step: usize,
    pub cluster: usize,
    pub representative: String,
    /// Node at the next step holding this node's representative.
    pub parent: Option<NodeId>,
    /// Nodes at the previous step whose representatives are members here.
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterHierarchy {
    nodes: Vec<ClusterNode>,
    step_offsets: Vec<usize>,
    identities: Vec<f64>,
    leaves: HashMap<String, NodeId>,
    /// Sorted members of each step-0 cluster, indexed by cluster id.
    bottom_members: Vec<Vec<String>>,
}

impl ClusterHierarchy {
    /// Link per-step tables. Step `k` must contain exactly the representatives
    /// of step `k - 1`.
    pub fn from_steps(steps: &[ClusterTable]) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut step_offsets = Vec::with_capacity(steps.len());
        for (step, table) in steps.iter().enumerate() {
            step_offsets.push(nodes.len());
            for cluster in table.clusters() {
                nodes.push(ClusterNode {
                    step,
                    cluster: cluster.id,
                    representative: cluster.representative.clone(),
                    parent: None,
                    children: Vec::new(),
                });
            }
        }

        for step in 1..steps.len() {
            let previous = &steps[step - 1];
            let current = &steps[step];
            let expected: HashSet<&str> = previous.representatives().into_iter().collect();
            let found: HashSet<&str> = current.members().collect();
            if expected != found {
                let missing = expected.difference(&found).count();
                let extra = found.difference(&expected).count();
                return Err(AzulejoError::InvalidInput(format!(
                    "step {} members differ from step {} representatives ({} missing, {} extra)",
                    step,
                    step - 1,
                    missing,
                    extra
                )));
            }
            for cluster in previous.clusters() {
                let child = step_offsets[step - 1] + cluster.id;
                let parent_cluster = current
                    .cluster_of(&cluster.representative)
                    .ok_or_else(|| {
                        AzulejoError::InvalidInput(format!(
                            "representative {} missing at step {}",
                            cluster.representative, step
                        ))
                    })?;
                let parent = step_offsets[step] + parent_cluster;
                nodes[child].parent = Some(parent);
                nodes[parent].children.push(child);
            }
        }

        let mut leaves = HashMap::new();
        let mut bottom_members = Vec::new();
        if let Some(first) = steps.first() {
            bottom_members.resize(first.n_clusters(), Vec::new());
            for cluster in first.clusters() {
                for member in &cluster.members {
                    leaves.insert(member.clone(), cluster.id);
                }
                if let Some(slot) = bottom_members.get_mut(cluster.id) {
                    *slot = cluster.members.clone();
                    slot.sort_unstable();
                }
            }
        }

        Ok(Self {
            nodes,
            step_offsets,
            identities: steps.iter().map(|t| t.identity).collect(),
            leaves,
            bottom_members,
        })
    }

    pub fn n_steps(&self) -> usize {
        self.step_offsets.len()
    }

    pub fn identities(&self) -> &[f64] {
        &self.identities
    }

    pub fn node(&self, id: NodeId) -> &ClusterNode {
        &self.nodes[id]
    }

    pub fn node_at(&self, step: usize, cluster: usize) -> Option<NodeId> {
        let start = *self.step_offsets.get(step)?;
        let end = self
            .step_offsets
            .get(step + 1)
            .copied()
            .unwrap_or(self.nodes.len());
        let id = start + cluster;
        (id < end).then_some(id)
    }

    /// Nodes of the final step.
    pub fn roots(&self) -> Vec<NodeId> {
        match self.step_offsets.last() {
            Some(&start) => (start..self.nodes.len()).collect(),
            None => Vec::new(),
        }
    }

    /// Path from a sequence's step-0 cluster up to its root.
    pub fn lineage(&self, seq_id: &str) -> Option<Vec<NodeId>> {
        let mut node = self.leaves.get(seq_id).copied()?;
        let mut path = vec![node];
        while let Some(parent) = self.nodes[node].parent {
            path.push(parent);
            node = parent;
        }
        Some(path)
    }

    pub fn root_of(&self, seq_id: &str) -> Option<NodeId> {
        self.lineage(seq_id).and_then(|p| p.last().copied())
    }

    /// Step-0 sequence ids under a node.
    pub fn leaves_of(&self, node: NodeId) -> Vec<&str> {
        let mut frontier = vec![node];
        let mut out = Vec::new();
        while let Some(id) = frontier.pop() {
            if self.nodes[id].step == 0 {
                if let Some(members) = self.bottom_members.get(self.nodes[id].cluster) {
                    out.extend(members.iter().map(String::as_str));
                }
            } else {
                frontier.extend(self.nodes[id].children.iter().copied());
            }
        }
        out.sort_unstable();
        out
    }

    /// One row per input sequence with its cluster at every step.
    pub fn lineage_table(&self) -> Result<Table> {
        let mut ids: Vec<&str> = self.leaves.keys().map(String::as_str).collect();
        ids.sort_unstable();
        let mut columns: Vec<Vec<i64>> = vec![Vec::with_capacity(ids.len()); self.n_steps()];
        for id in &ids {
            for (step, node) in self.lineage(id).unwrap_or_default().into_iter().enumerate() {
                columns[step].push(self.nodes[node].cluster as i64);
            }
        }
        let mut table = Table::new()
            .with_key("id")
            .with_column("id", Column::strings(ids.iter().copied()))?;
        for (step, values) in columns.into_iter().enumerate() {
            table.push_column(&format!("step{}", step), Column::ints(values))?;
        }
        Ok(table)
    }
}

#[derive(Debug, Clone)]
pub struct Refinement {
    pub steps: Vec<ClusterTable>,
    pub hierarchy: ClusterHierarchy,
    /// Cluster size against cluster count, per step.
    pub histograms: Table,
}

pub fn validate_schedule(schedule: &[f64], order: ScheduleOrder) -> Result<()> {
    if schedule.is_empty() {
        return Err(AzulejoError::InvalidInput(
            "identity schedule is empty".to_string(),
        ));
    }
    for pair in schedule.windows(2) {
        let monotone = match order {
            ScheduleOrder::Descending => pair[1] < pair[0],
            ScheduleOrder::Ascending => pair[1] > pair[0],
        };
        if !monotone {
            return Err(AzulejoError::InvalidInput(format!(
                "identity schedule is not strictly {:?}: {} then {}",
                order, pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

/// Cluster at each identity in `schedule`, feeding each step's representatives
/// to the next.
pub fn refine_in_steps(
    clusterer: &dyn Clusterer,
    sequences: &[Sequence],
    schedule: &[f64],
    order: ScheduleOrder,
) -> Result<Refinement> {
    validate_schedule(schedule, order)?;
    let by_id: HashMap<&str, &Sequence> = sequences.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut steps: Vec<ClusterTable> = Vec::with_capacity(schedule.len());
    let mut input: Vec<Sequence> = sequences.to_vec();
    for (step, &identity) in schedule.iter().enumerate() {
        let table = build_clusters(clusterer, &input, identity)?;
        info!(
            "Step {} at identity {}: {} sequences in {} clusters",
            step,
            identity,
            input.len(),
            table.n_clusters()
        );
        input = table
            .representatives()
            .into_iter()
            .filter_map(|id| by_id.get(id).map(|s| (*s).clone()))
            .collect();
        steps.push(table);
    }

    let hierarchy = ClusterHierarchy::from_steps(&steps)?;
    let histograms = clusters_to_histograms(&steps)?;
    Ok(Refinement {
        steps,
        hierarchy,
        histograms,
    })
}
