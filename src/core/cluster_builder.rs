//! Cluster membership tables built from external clusterer output.
//!
//! A [`ClusterTable`] assigns every input sequence to exactly one cluster.
//! Cluster ids are dense, numbered by descending size with ties broken by the
//! lowest member id, so the same membership always gets the same numbering.
use crate::bio::sequence::Sequence;
use crate::storage::{Column, Table};
use crate::tools::{Clusterer, MembershipRecord};
use crate::{AzulejoError, Result};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: usize,
    /// Sorted member ids.
    pub members: Vec<String>,
    pub representative: String,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTable {
    pub identity: f64,
    clusters: Vec<Cluster>,
    index: HashMap<String, usize>,
}

impl ClusterTable {
    /// Build from member groups. The representative of each group is its
    /// longest member according to `lengths` (lowest id on ties, or when the
    /// length is unknown).
    pub fn from_groups(
        identity: f64,
        groups: Vec<Vec<String>>,
        lengths: &HashMap<String, usize>,
    ) -> Result<Self> {
        let mut groups: Vec<Vec<String>> = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|mut g| {
                g.sort();
                g
            })
            .collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

        let mut clusters = Vec::with_capacity(groups.len());
        let mut index = HashMap::new();
        for (id, members) in groups.into_iter().enumerate() {
            let representative = pick_representative(&members, lengths);
            for member in &members {
                if index.insert(member.clone(), id).is_some() {
                    return Err(AzulejoError::InvalidInput(format!(
                        "sequence {} is in more than one cluster",
                        member
                    )));
                }
            }
            clusters.push(Cluster {
                id,
                members,
                representative,
            });
        }
        Ok(Self {
            identity,
            clusters,
            index,
        })
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn n_sequences(&self) -> usize {
        self.index.len()
    }

    pub fn cluster_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, cluster: usize) -> Option<&Cluster> {
        self.clusters.get(cluster)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every member id, in cluster order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter().map(String::as_str))
    }

    /// One representative per cluster, in cluster order.
    pub fn representatives(&self) -> Vec<&str> {
        self.clusters
            .iter()
            .map(|c| c.representative.as_str())
            .collect()
    }

    /// Cluster size to number of clusters of that size, ascending by size.
    pub fn histogram(&self) -> BTreeMap<usize, usize> {
        let mut hist = BTreeMap::new();
        for cluster in &self.clusters {
            *hist.entry(cluster.size()).or_insert(0) += 1;
        }
        hist
    }

    /// One row per member: `id`, `cluster`, `size`, `is_rep`, `identity`.
    pub fn to_table(&self) -> Result<Table> {
        let n = self.n_sequences();
        let mut ids = Vec::with_capacity(n);
        let mut cluster_ids = Vec::with_capacity(n);
        let mut sizes = Vec::with_capacity(n);
        let mut reps = Vec::with_capacity(n);
        for cluster in &self.clusters {
            for member in &cluster.members {
                ids.push(member.clone());
                cluster_ids.push(cluster.id as i64);
                sizes.push(cluster.size() as i64);
                reps.push(*member == cluster.representative);
            }
        }
        Table::new()
            .with_key("id")
            .with_column("id", Column::strings(ids))?
            .with_column("cluster", Column::ints(cluster_ids))?
            .with_column("size", Column::ints(sizes))?
            .with_column("is_rep", Column::bools(reps))?
            .with_column("identity", Column::floats(std::iter::repeat(self.identity).take(n)))
    }

    /// Rebuild from a persisted membership table.
    ///
    /// Only `id` and `cluster` are required; a missing `is_rep` column makes
    /// the lowest member id the representative. Clusters are renumbered.
    pub fn from_table(table: &Table) -> Result<Self> {
        let ids = table.str_values("id")?;
        let cluster_ids = table.str_values("cluster")?;
        let reps = if table.has_column("is_rep") {
            Some(table.bool_values("is_rep")?)
        } else {
            None
        };
        let identity = if table.has_column("identity") && table.n_rows() > 0 {
            table.float_values("identity")?[0]
        } else {
            f64::NAN
        };

        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut chosen: HashMap<&str, &str> = HashMap::new();
        for (row, (id, cluster)) in ids.iter().zip(&cluster_ids).enumerate() {
            groups.entry(cluster.as_str()).or_default().push(id.clone());
            if reps.as_ref().map(|r| r[row]).unwrap_or(false) {
                if let Some(previous) = chosen.insert(cluster.as_str(), id.as_str()) {
                    return Err(AzulejoError::InvalidInput(format!(
                        "cluster {} has two representatives ({} and {})",
                        cluster, previous, id
                    )));
                }
            }
        }

        // Ranking the chosen representative longest makes from_groups pick it.
        let lengths: HashMap<String, usize> = chosen
            .values()
            .map(|id| (id.to_string(), usize::MAX))
            .collect();
        let groups = groups.into_values().collect();
        Self::from_groups(identity, groups, &lengths)
    }
}

fn pick_representative(members: &[String], lengths: &HashMap<String, usize>) -> String {
    let mut best = &members[0];
    let mut best_len = lengths.get(best).copied().unwrap_or(0);
    for member in &members[1..] {
        let len = lengths.get(member).copied().unwrap_or(0);
        if len > best_len {
            best = member;
            best_len = len;
        }
    }
    best.clone()
}

fn check_identity(identity: f64) -> Result<()> {
    if identity > 0.0 && identity <= 1.0 {
        Ok(())
    } else {
        Err(AzulejoError::InvalidInput(format!(
            "identity {} is outside (0, 1]",
            identity
        )))
    }
}

/// Cluster `sequences` at `identity` with an external clusterer.
///
/// Sequences the tool leaves unclustered, or does not mention at all, become
/// singleton clusters. Output naming an unknown sequence, or one sequence
/// twice, is a clustering-tool error.
pub fn build_clusters(
    clusterer: &dyn Clusterer,
    sequences: &[Sequence],
    identity: f64,
) -> Result<ClusterTable> {
    check_identity(identity)?;

    let mut lengths = HashMap::with_capacity(sequences.len());
    for seq in sequences {
        if lengths.insert(seq.id.clone(), seq.len()).is_some() {
            return Err(AzulejoError::InvalidInput(format!(
                "duplicate sequence id {}",
                seq.id
            )));
        }
    }

    let records = clusterer.cluster(sequences, identity)?;

    let mut tool_clusters: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut singletons: Vec<Vec<String>> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(sequences.len());
    for record in &records {
        let id = record.id();
        if !lengths.contains_key(id) {
            return Err(AzulejoError::ClusteringTool(format!(
                "{} reported unknown sequence {}",
                clusterer.name(),
                id
            )));
        }
        if !seen.insert(id) {
            return Err(AzulejoError::ClusteringTool(format!(
                "{} reported sequence {} twice",
                clusterer.name(),
                id
            )));
        }
        match record {
            MembershipRecord::Centroid { cluster, .. } | MembershipRecord::Hit { cluster, .. } => {
                tool_clusters.entry(*cluster).or_default().push(id.to_string())
            }
            MembershipRecord::Unclustered { .. } => singletons.push(vec![id.to_string()]),
        }
    }

    let missing: Vec<&Sequence> = sequences
        .iter()
        .filter(|s| !seen.contains(s.id.as_str()))
        .collect();
    if !missing.is_empty() {
        warn!(
            "{} did not report {} sequences; adding them as singletons",
            clusterer.name(),
            missing.len()
        );
        singletons.extend(missing.iter().map(|s| vec![s.id.clone()]));
    }

    let mut groups: Vec<Vec<String>> = tool_clusters.into_values().collect();
    let n_singletons = singletons.len();
    groups.extend(singletons);
    let table = ClusterTable::from_groups(identity, groups, &lengths)?;

    info!(
        "Clustered {} sequences into {} clusters at identity {} ({} added singletons)",
        sequences.len(),
        table.n_clusters(),
        identity,
        n_singletons
    );
    Ok(table)
}

/// Merge cluster tables over disjoint sequence sets into one table.
pub fn combine_clusters(tables: &[ClusterTable]) -> Result<ClusterTable> {
    let mut groups = Vec::new();
    let mut lengths = HashMap::new();
    let mut seen = HashSet::new();
    for table in tables {
        for cluster in table.clusters() {
            for member in &cluster.members {
                if !seen.insert(member.clone()) {
                    return Err(AzulejoError::InvalidInput(format!(
                        "sequence {} appears in more than one input table",
                        member
                    )));
                }
            }
            lengths.insert(cluster.representative.clone(), usize::MAX);
            groups.push(cluster.members.clone());
        }
    }
    let identity = tables
        .iter()
        .map(|t| t.identity)
        .filter(|x| !x.is_nan())
        .fold(f64::NAN, f64::min);
    let combined = ClusterTable::from_groups(identity, groups, &lengths)?;
    debug!(
        "Combined {} tables into {} clusters",
        tables.len(),
        combined.n_clusters()
    );
    Ok(combined)
}

/// Connected components of a pairwise adjacency list become clusters.
///
/// `ids` lists every sequence, so isolated ones come out as singletons.
pub fn adjacency_to_clusters(
    ids: &[String],
    edges: &[(String, String)],
    identity: f64,
) -> Result<ClusterTable> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if position.insert(id.as_str(), i).is_some() {
            return Err(AzulejoError::InvalidInput(format!("duplicate id {}", id)));
        }
    }

    let mut components = UnionFind::<usize>::new(ids.len());
    for (a, b) in edges {
        let (Some(&ia), Some(&ib)) = (position.get(a.as_str()), position.get(b.as_str())) else {
            return Err(AzulejoError::InvalidInput(format!(
                "adjacency {} - {} names an unknown id",
                a, b
            )));
        };
        components.union(ia, ib);
    }

    let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, id) in ids.iter().enumerate() {
        groups.entry(components.find(i)).or_default().push(id.clone());
    }
    ClusterTable::from_groups(identity, groups.into_values().collect(), &HashMap::new())
}

/// Read the `a`/`b` adjacency columns of a table, plus the full id set.
pub fn adjacency_from_table(table: &Table) -> Result<(Vec<String>, Vec<(String, String)>)> {
    let a = table.str_values("a")?;
    let b = table.str_values("b")?;
    let mut ids: Vec<String> = a.iter().chain(&b).cloned().collect();
    ids.sort();
    ids.dedup();
    Ok((ids, a.into_iter().zip(b).collect()))
}

/// Size-vs-count histogram of several cluster tables, one row per
/// (table, size).
pub fn clusters_to_histograms(tables: &[ClusterTable]) -> Result<Table> {
    let mut steps = Vec::new();
    let mut identities = Vec::new();
    let mut sizes = Vec::new();
    let mut counts = Vec::new();
    for (step, table) in tables.iter().enumerate() {
        for (size, count) in table.histogram() {
            steps.push(step as i64);
            identities.push(table.identity);
            sizes.push(size as i64);
            counts.push(count as i64);
        }
    }
    Table::new()
        .with_column("step", Column::ints(steps))?
        .with_column("identity", Column::floats(identities))?
        .with_column("size", Column::ints(sizes))?
        .with_column("n_clusters", Column::ints(counts))
}
