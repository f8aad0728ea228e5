//! Read-only comparison of two cluster sets.
use super::cluster_builder::ClusterTable;
use crate::storage::{Column, Table};
use crate::Result;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    pub clusters_a: usize,
    pub clusters_b: usize,
    /// Clusters with exactly the same members in both sets.
    pub identical: usize,
    /// Clusters of A whose shared members spread over several clusters of B.
    pub splits: usize,
    /// Clusters of B that gather shared members of several clusters of A.
    pub merges: usize,
    /// Sequences present only in A.
    pub only_in_a: Vec<String>,
    /// Sequences present only in B.
    pub only_in_b: Vec<String>,
}

/// Map each cluster of `from` to the set of `to` clusters its shared members
/// fall into.
fn images(from: &ClusterTable, to: &ClusterTable) -> Vec<BTreeSet<usize>> {
    from.clusters()
        .iter()
        .map(|c| {
            c.members
                .iter()
                .filter_map(|m| to.cluster_of(m))
                .collect()
        })
        .collect()
}

pub fn compare_clusters(a: &ClusterTable, b: &ClusterTable) -> ComparisonReport {
    let b_sets: HashMap<&[String], usize> = b
        .clusters()
        .iter()
        .map(|c| (c.members.as_slice(), c.id))
        .collect();
    let identical = a
        .clusters()
        .iter()
        .filter(|c| b_sets.contains_key(c.members.as_slice()))
        .count();

    let splits = images(a, b).iter().filter(|s| s.len() > 1).count();
    let merges = images(b, a).iter().filter(|s| s.len() > 1).count();

    let ids_a: HashSet<&str> = a.members().collect();
    let ids_b: HashSet<&str> = b.members().collect();
    let mut only_in_a: Vec<String> = ids_a.difference(&ids_b).map(|s| s.to_string()).collect();
    let mut only_in_b: Vec<String> = ids_b.difference(&ids_a).map(|s| s.to_string()).collect();
    only_in_a.sort();
    only_in_b.sort();

    ComparisonReport {
        clusters_a: a.n_clusters(),
        clusters_b: b.n_clusters(),
        identical,
        splits,
        merges,
        only_in_a,
        only_in_b,
    }
}

impl ComparisonReport {
    /// Two-column `metric` / `value` summary.
    pub fn to_table(&self) -> Result<Table> {
        let rows = [
            ("clusters_a", self.clusters_a),
            ("clusters_b", self.clusters_b),
            ("identical", self.identical),
            ("splits", self.splits),
            ("merges", self.merges),
            ("only_in_a", self.only_in_a.len()),
            ("only_in_b", self.only_in_b.len()),
        ];
        Table::new()
            .with_key("metric")
            .with_column("metric", Column::strings(rows.iter().map(|(k, _)| *k)))?
            .with_column("value", Column::ints(rows.iter().map(|(_, v)| *v as i64)))
    }
}
