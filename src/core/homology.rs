//! Homology annotation: cluster membership joined onto protein records, with
//! per-cluster length statistics.
use super::cluster_builder::ClusterTable;
use super::config::HomologyConfig;
use super::diagnostics::Diagnostics;
use super::proteome::ProteinRecord;
use super::refiner::ClusterHierarchy;
use crate::storage::{Column, Table};
use crate::{AzulejoError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeCategory {
    Singleton,
    Small,
    Large,
}

impl SizeCategory {
    pub fn classify(size: usize, small_max: usize) -> Self {
        match size {
            0 | 1 => SizeCategory::Singleton,
            n if n <= small_max => SizeCategory::Small,
            _ => SizeCategory::Large,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeCategory::Singleton => "singleton",
            SizeCategory::Small => "small",
            SizeCategory::Large => "large",
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    pub cluster: usize,
    pub size: usize,
    pub n_proteomes: usize,
    pub category: SizeCategory,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; zero for singletons.
    pub std: f64,
    /// Median absolute deviation from the median.
    pub mad: f64,
    pub n_outliers: usize,
    /// Sorted member ids.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedProtein {
    pub record: ProteinRecord,
    pub hom_cluster: usize,
    pub cluster_size: usize,
    pub category: SizeCategory,
    pub is_outlier: bool,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    /// Input order.
    pub proteins: Vec<AnnotatedProtein>,
    /// Indexed by cluster id.
    pub stats: Vec<ClusterStats>,
    pub n_proteomes: usize,
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Mean, median, sample standard deviation and MAD of `values`.
pub fn length_stats(values: &[f64]) -> (f64, f64, f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN, f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let med = median(&sorted);
    let std = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let mut deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    (mean, med, std, median(&deviations))
}

/// Homology groups from cluster tables.
///
/// One table is used as is. Several tables are read as consecutive
/// refinement steps and the groups are the roots of the hierarchy.
fn homology_groups(cluster_tables: &[ClusterTable]) -> Result<Vec<Vec<String>>> {
    match cluster_tables {
        [] => Err(AzulejoError::InvalidInput(
            "no cluster tables to annotate from".to_string(),
        )),
        [single] => Ok(single
            .clusters()
            .iter()
            .map(|c| c.members.clone())
            .collect()),
        steps => {
            let hierarchy = ClusterHierarchy::from_steps(steps)?;
            Ok(hierarchy
                .roots()
                .into_iter()
                .map(|root| {
                    hierarchy
                        .leaves_of(root)
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                })
                .collect())
        }
    }
}

/// Join homology clusters onto protein records and summarize each cluster.
///
/// Every protein appears exactly once in the result. Proteins absent from the
/// cluster tables become singletons; cluster members that are not proteins are
/// ignored. Clusters are renumbered by size, largest first.
pub fn annotate_homology(
    proteins: &[ProteinRecord],
    cluster_tables: &[ClusterTable],
    config: &HomologyConfig,
    diagnostics: &Diagnostics,
) -> Result<Annotation> {
    let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(proteins.len());
    for (i, p) in proteins.iter().enumerate() {
        if by_id.insert(p.id.as_str(), i).is_some() {
            return Err(AzulejoError::InvalidInput(format!(
                "duplicate protein id {}",
                p.id
            )));
        }
    }

    let mut assigned: HashSet<&str> = HashSet::with_capacity(proteins.len());
    let mut groups = Vec::new();
    let mut foreign = 0usize;
    for group in homology_groups(cluster_tables)? {
        let mut kept = Vec::with_capacity(group.len());
        for id in group {
            match by_id.get_key_value(id.as_str()) {
                Some((&key, _)) => {
                    assigned.insert(key);
                    kept.push(id);
                }
                None => foreign += 1,
            }
        }
        groups.push(kept);
    }
    if foreign > 0 {
        debug!("Ignoring {} clustered ids with no protein record", foreign);
    }
    for p in proteins {
        if !assigned.contains(p.id.as_str()) {
            diagnostics.degenerate(format!(
                "protein {} is in no cluster; treating it as a singleton",
                p.id
            ))?;
            groups.push(vec![p.id.clone()]);
        }
    }

    let lengths: HashMap<String, usize> = proteins.iter().map(|p| (p.id.clone(), p.len)).collect();
    let homology = ClusterTable::from_groups(f64::NAN, groups, &lengths)?;

    let mut outlier = vec![false; proteins.len()];
    let mut stats = Vec::with_capacity(homology.n_clusters());
    let all_proteomes: BTreeSet<&str> = proteins.iter().map(|p| p.proteome.as_str()).collect();

    for cluster in homology.clusters() {
        let rows: Vec<usize> = cluster.members.iter().map(|m| by_id[m.as_str()]).collect();
        let values: Vec<f64> = rows.iter().map(|&r| proteins[r].len as f64).collect();
        let (mean, med, std, mad) = length_stats(&values);
        let category = SizeCategory::classify(cluster.size(), config.small_cluster_max);
        let n_proteomes = rows
            .iter()
            .map(|&r| proteins[r].proteome.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut n_outliers = 0;
        if cluster.size() > 1 {
            if std == 0.0 {
                diagnostics.degenerate(format!(
                    "cluster {} has zero length variance; not testing for outliers",
                    cluster.id
                ))?;
            } else if mad == 0.0 {
                debug!(
                    "cluster {} has zero MAD; not testing for outliers",
                    cluster.id
                );
            } else {
                let limit = config.outlier_mads * mad;
                for &r in &rows {
                    if (proteins[r].len as f64 - med).abs() > limit {
                        outlier[r] = true;
                        n_outliers += 1;
                    }
                }
            }
        }

        stats.push(ClusterStats {
            cluster: cluster.id,
            size: cluster.size(),
            n_proteomes,
            category,
            mean,
            median: med,
            std,
            mad,
            n_outliers,
            members: cluster.members.clone(),
        });
    }

    let annotated = proteins
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let hom_cluster = homology.cluster_of(&p.id).unwrap_or_default();
            let size = stats[hom_cluster].size;
            AnnotatedProtein {
                record: p.clone(),
                hom_cluster,
                cluster_size: size,
                category: stats[hom_cluster].category,
                is_outlier: outlier[i],
            }
        })
        .collect();

    info!(
        "Annotated {} proteins in {} homology clusters ({} outliers)",
        proteins.len(),
        stats.len(),
        outlier.iter().filter(|&&o| o).count()
    );
    Ok(Annotation {
        proteins: annotated,
        stats,
        n_proteomes: all_proteomes.len(),
    })
}

impl Annotation {
    /// One row per protein.
    pub fn proteins_table(&self) -> Result<Table> {
        let p = &self.proteins;
        Table::new()
            .with_key("id")
            .with_column("id", Column::strings(p.iter().map(|a| a.record.id.clone())))?
            .with_column(
                "proteome",
                Column::strings(p.iter().map(|a| a.record.proteome.clone())),
            )?
            .with_column(
                "frag",
                Column::Utf8(p.iter().map(|a| a.record.frag.clone()).collect()),
            )?
            .with_column("pos", Column::Int64(p.iter().map(|a| a.record.pos).collect()))?
            .with_column("len", Column::ints(p.iter().map(|a| a.record.len as i64)))?
            .with_column("hom_cluster", Column::ints(p.iter().map(|a| a.hom_cluster as i64)))?
            .with_column(
                "hom_cluster_size",
                Column::ints(p.iter().map(|a| a.cluster_size as i64)),
            )?
            .with_column("size_category", Column::strings(p.iter().map(|a| a.category.as_str())))?
            .with_column("is_outlier", Column::bools(p.iter().map(|a| a.is_outlier)))
    }

    /// One summary row per cluster.
    pub fn stats_table(&self) -> Result<Table> {
        let s = &self.stats;
        Table::new()
            .with_key("hom_cluster")
            .with_column("hom_cluster", Column::ints(s.iter().map(|c| c.cluster as i64)))?
            .with_column("size", Column::ints(s.iter().map(|c| c.size as i64)))?
            .with_column("n_proteomes", Column::ints(s.iter().map(|c| c.n_proteomes as i64)))?
            .with_column("size_category", Column::strings(s.iter().map(|c| c.category.as_str())))?
            .with_column("len_mean", Column::floats(s.iter().map(|c| c.mean)))?
            .with_column("len_median", Column::floats(s.iter().map(|c| c.median)))?
            .with_column("len_std", Column::floats(s.iter().map(|c| c.std)))?
            .with_column("len_mad", Column::floats(s.iter().map(|c| c.mad)))?
            .with_column("n_outliers", Column::ints(s.iter().map(|c| c.n_outliers as i64)))
    }

    /// Clusters shared by at least two proteomes.
    pub fn any_ids_table(&self) -> Result<Table> {
        self.ids_table(|c| c.n_proteomes >= 2)
    }

    /// Clusters with members in every proteome.
    pub fn all_ids_table(&self) -> Result<Table> {
        let total = self.n_proteomes;
        self.ids_table(move |c| total > 0 && c.n_proteomes == total)
    }

    fn ids_table<F: Fn(&ClusterStats) -> bool>(&self, keep: F) -> Result<Table> {
        let kept: Vec<&ClusterStats> = self.stats.iter().filter(|c| keep(*c)).collect();
        Table::new()
            .with_key("hom_cluster")
            .with_column("hom_cluster", Column::ints(kept.iter().map(|c| c.cluster as i64)))?
            .with_column("size", Column::ints(kept.iter().map(|c| c.size as i64)))?
            .with_column(
                "n_proteomes",
                Column::ints(kept.iter().map(|c| c.n_proteomes as i64)),
            )?
            .with_column("ids", Column::strings(kept.iter().map(|c| c.members.join(","))))
    }
}

/// Rebuild the annotated records from a persisted proteins table.
pub fn annotated_from_table(table: &Table) -> Result<Vec<(ProteinRecord, usize)>> {
    let records = super::proteome::proteins_from_table(table)?;
    let clusters = table.int_values("hom_cluster")?;
    records
        .into_iter()
        .zip(clusters)
        .map(|(r, c)| {
            let c = usize::try_from(c).map_err(|_| {
                AzulejoError::InvalidInput(format!("protein {} has negative cluster id", r.id))
            })?;
            Ok((r, c))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn protein(id: &str, proteome: &str, len: usize) -> ProteinRecord {
        ProteinRecord {
            id: id.to_string(),
            proteome: proteome.to_string(),
            frag: Some("chr1".to_string()),
            pos: Some(1),
            len,
        }
    }

    fn table(groups: &[&[&str]]) -> ClusterTable {
        let groups = groups
            .iter()
            .map(|g| g.iter().map(|s| s.to_string()).collect())
            .collect();
        ClusterTable::from_groups(0.9, groups, &HashMap::new()).unwrap()
    }

    #[rstest]
    #[case(1, SizeCategory::Singleton)]
    #[case(2, SizeCategory::Small)]
    #[case(8, SizeCategory::Small)]
    #[case(9, SizeCategory::Large)]
    fn test_classify(#[case] size: usize, #[case] expected: SizeCategory) {
        assert_eq!(SizeCategory::classify(size, 8), expected);
    }

    #[test]
    fn test_length_stats() {
        let (mean, med, std, mad) = length_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]);
        assert_eq!(mean, 22.0);
        assert_eq!(med, 3.0);
        assert!((std - 43.6176).abs() < 1e-3);
        assert_eq!(mad, 1.0);
    }

    #[test]
    fn test_outlier_flagged() {
        let proteins = vec![
            protein("a", "x", 100),
            protein("b", "y", 101),
            protein("c", "x", 99),
            protein("d", "y", 100),
            protein("e", "x", 400),
        ];
        let clusters = table(&[&["a", "b", "c", "d", "e"]]);
        let annotation = annotate_homology(
            &proteins,
            &[clusters],
            &HomologyConfig::default(),
            &Diagnostics::strict(),
        )
        .unwrap();
        let flagged: Vec<&str> = annotation
            .proteins
            .iter()
            .filter(|p| p.is_outlier)
            .map(|p| p.record.id.as_str())
            .collect();
        assert_eq!(flagged, vec!["e"]);
        assert_eq!(annotation.stats[0].n_outliers, 1);
        assert_eq!(annotation.stats[0].n_proteomes, 2);
    }

    #[test]
    fn test_zero_variance_is_never_flagged() {
        let proteins = vec![protein("a", "x", 50), protein("b", "y", 50)];
        let clusters = table(&[&["a", "b"]]);
        let diagnostics = Diagnostics::lenient();
        let annotation = annotate_homology(
            &proteins,
            &[clusters.clone()],
            &HomologyConfig::default(),
            &diagnostics,
        )
        .unwrap();
        assert!(annotation.proteins.iter().all(|p| !p.is_outlier));
        assert_eq!(annotation.stats[0].std, 0.0);
        assert_eq!(diagnostics.warnings(), 1);

        let strict = annotate_homology(
            &proteins,
            &[clusters],
            &HomologyConfig::default(),
            &Diagnostics::strict(),
        );
        assert!(matches!(strict, Err(AzulejoError::Degenerate(_))));
    }

    #[test]
    fn test_every_protein_once() {
        let proteins = vec![
            protein("a", "x", 10),
            protein("b", "y", 12),
            protein("lost", "y", 30),
        ];
        let clusters = table(&[&["a", "b", "ghost"]]);
        let annotation = annotate_homology(
            &proteins,
            &[clusters],
            &HomologyConfig::default(),
            &Diagnostics::lenient(),
        )
        .unwrap();
        assert_eq!(annotation.proteins.len(), 3);
        assert_eq!(annotation.stats.len(), 2);
        assert_eq!(annotation.proteins[2].category, SizeCategory::Singleton);
        let out = annotation.proteins_table().unwrap();
        assert_eq!(out.n_rows(), 3);
    }

    #[test]
    fn test_refinement_steps_give_root_clusters() {
        let proteins = vec![
            protein("a", "x", 10),
            protein("b", "y", 10),
            protein("c", "y", 11),
        ];
        let step0 = table(&[&["a", "b"], &["c"]]);
        let step1 = table(&[&["a", "c"]]);
        let annotation = annotate_homology(
            &proteins,
            &[step0, step1],
            &HomologyConfig::default(),
            &Diagnostics::lenient(),
        )
        .unwrap();
        assert_eq!(annotation.stats.len(), 1);
        assert_eq!(annotation.stats[0].members, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_any_and_all_tables() {
        let proteins = vec![
            protein("a", "x", 10),
            protein("b", "y", 10),
            protein("c", "z", 10),
            protein("d", "x", 20),
            protein("e", "y", 20),
        ];
        let clusters = table(&[&["a", "b", "c"], &["d", "e"]]);
        let annotation = annotate_homology(
            &proteins,
            &[clusters],
            &HomologyConfig::default(),
            &Diagnostics::lenient(),
        )
        .unwrap();
        assert_eq!(annotation.any_ids_table().unwrap().n_rows(), 2);
        let all = annotation.all_ids_table().unwrap();
        assert_eq!(all.str_values("ids").unwrap(), vec!["a,b,c"]);
    }
}
