//! Synteny mapping: colinear runs of homologous proteins across proteome
//! pairs, and one proxy gene per run.
//!
//! For every proteome pair each protein of one proteome is matched with every
//! protein of the same homology cluster in the other, giving anchors. A
//! [`ColinearityDetector`] chains anchors into runs; runs of at least
//! `min_block_len` anchors become synteny blocks.
use super::config::{Config, DetectorKind, SyntenyConfig};
use super::diagnostics::Diagnostics;
use super::proteome::ProteinRecord;
use crate::storage::{Column, Table};
use crate::tools::{configured_dagchainer, Anchor, Chain, ColinearityDetector, Direction};
use crate::{AzulejoError, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// In-process chainer.
///
/// Per fragment pair, finds the longest chain in either direction by dynamic
/// programming, keeps it, retires every protein it used and repeats until no
/// chain reaches the minimum length. Ties prefer the smaller total gap, then
/// the forward direction, then the earlier anchor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunScanner;

impl RunScanner {
    fn best_chain(
        anchors: &[Anchor],
        group: &[usize],
        active: &[bool],
        direction: Direction,
        max_gap: i64,
    ) -> Option<(usize, i64, Vec<usize>)> {
        let sign = direction.sign();
        // score, total gap, predecessor
        let mut dp: Vec<(usize, i64, Option<usize>)> = vec![(0, 0, None); group.len()];
        let mut best: Option<usize> = None;

        for i in 0..group.len() {
            if !active[i] {
                continue;
            }
            let cur = &anchors[group[i]];
            dp[i] = (1, 0, None);
            for j in (0..i).rev() {
                let prev = &anchors[group[j]];
                let da = cur.a_pos - prev.a_pos;
                if da > max_gap {
                    break;
                }
                if !active[j] || da <= 0 {
                    continue;
                }
                let db = sign * (cur.b_pos - prev.b_pos);
                if db <= 0 || db > max_gap {
                    continue;
                }
                let candidate = (dp[j].0 + 1, dp[j].1 + da + db);
                if candidate.0 > dp[i].0 || (candidate.0 == dp[i].0 && candidate.1 < dp[i].1) {
                    dp[i] = (candidate.0, candidate.1, Some(j));
                }
            }
            best = match best {
                Some(b) if dp[b].0 > dp[i].0 || (dp[b].0 == dp[i].0 && dp[b].1 <= dp[i].1) => {
                    Some(b)
                }
                _ => Some(i),
            };
        }

        let end = best?;
        let (score, gap, _) = dp[end];
        let mut path = vec![end];
        let mut cursor = end;
        while let Some(prev) = dp[cursor].2 {
            path.push(prev);
            cursor = prev;
        }
        path.reverse();
        Some((score, gap, path))
    }
}

impl ColinearityDetector for RunScanner {
    fn chain(&self, anchors: &[Anchor], max_gap: u32, min_len: usize) -> Result<Vec<Chain>> {
        let max_gap = i64::from(max_gap);
        let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for (i, a) in anchors.iter().enumerate() {
            groups
                .entry((a.a_frag.as_str(), a.b_frag.as_str()))
                .or_default()
                .push(i);
        }

        let mut chains = Vec::new();
        for group in groups.values() {
            let mut active = vec![true; group.len()];
            let mut used_a: HashSet<&str> = HashSet::new();
            let mut used_b: HashSet<&str> = HashSet::new();
            loop {
                let forward =
                    Self::best_chain(anchors, group, &active, Direction::Forward, max_gap);
                let reverse =
                    Self::best_chain(anchors, group, &active, Direction::Reverse, max_gap);
                let pick = match (forward, reverse) {
                    (Some(f), Some(r)) => {
                        if r.0 > f.0 || (r.0 == f.0 && r.1 < f.1) {
                            Some((Direction::Reverse, r.2))
                        } else {
                            Some((Direction::Forward, f.2))
                        }
                    }
                    (Some(f), None) => Some((Direction::Forward, f.2)),
                    (None, Some(r)) => Some((Direction::Reverse, r.2)),
                    (None, None) => None,
                };
                let Some((direction, path)) = pick else {
                    break;
                };
                if path.len() < min_len {
                    break;
                }
                for &k in &path {
                    used_a.insert(anchors[group[k]].a_id.as_str());
                    used_b.insert(anchors[group[k]].b_id.as_str());
                }
                for (k, flag) in active.iter_mut().enumerate() {
                    let a = &anchors[group[k]];
                    if used_a.contains(a.a_id.as_str()) || used_b.contains(a.b_id.as_str()) {
                        *flag = false;
                    }
                }
                chains.push(Chain {
                    anchors: path.into_iter().map(|k| group[k]).collect(),
                    direction,
                });
            }
        }
        chains.sort_by_key(|c| c.anchors.first().copied());
        Ok(chains)
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Detector selected by the configuration.
pub fn detector_for(config: &Config) -> Result<Box<dyn ColinearityDetector>> {
    match config.synteny.detector {
        DetectorKind::Native => Ok(Box::new(RunScanner)),
        DetectorKind::Dagchainer => Ok(Box::new(configured_dagchainer(config)?)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntenyBlock {
    pub id: usize,
    pub proteome_a: String,
    pub proteome_b: String,
    pub frag_a: String,
    pub frag_b: String,
    pub direction: Direction,
    /// `(a_id, b_id)` per anchor, in A's positional order.
    pub pairs: Vec<(String, String)>,
    pub clusters: BTreeSet<usize>,
    pub proxy: String,
    pub synthesized: bool,
}

impl SyntenyBlock {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_mixed(&self) -> bool {
        self.clusters.len() > 1
    }

    /// Distinct member ids, sorted.
    pub fn members(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .pairs
            .iter()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSummary {
    pub proteome: String,
    pub frag: String,
    pub n_proteins: usize,
    pub n_blocks: usize,
}

#[derive(Debug, Clone)]
pub struct SyntenyMap {
    pub blocks: Vec<SyntenyBlock>,
    pub fragments: Vec<FragmentSummary>,
}

struct Placed<'a> {
    id: &'a str,
    frag: &'a str,
    pos: i64,
    cluster: usize,
}

/// Raw block from one proteome pair, before ids and proxies exist.
struct PairBlock {
    proteome_a: usize,
    proteome_b: usize,
    frag_a: String,
    frag_b: String,
    direction: Direction,
    pairs: Vec<(String, String)>,
    clusters: BTreeSet<usize>,
}

fn pair_anchors(a: &[Placed<'_>], b: &[Placed<'_>], same: bool) -> Vec<Anchor> {
    let mut by_cluster: HashMap<usize, Vec<&Placed<'_>>> = HashMap::new();
    for p in b {
        by_cluster.entry(p.cluster).or_default().push(p);
    }
    let mut anchors = Vec::new();
    for pa in a {
        let Some(partners) = by_cluster.get(&pa.cluster) else {
            continue;
        };
        for pb in partners {
            // Within one proteome keep each unordered pair once.
            if same && (pa.frag, pa.pos, pa.id) >= (pb.frag, pb.pos, pb.id) {
                continue;
            }
            anchors.push(Anchor {
                a_id: pa.id.to_string(),
                b_id: pb.id.to_string(),
                a_frag: pa.frag.to_string(),
                b_frag: pb.frag.to_string(),
                a_pos: pa.pos,
                b_pos: pb.pos,
                cluster: pa.cluster as i64,
            });
        }
    }
    anchors.sort_by(|x, y| {
        (&x.a_frag, &x.b_frag, x.a_pos, x.b_pos, &x.a_id, &x.b_id)
            .cmp(&(&y.a_frag, &y.b_frag, y.a_pos, y.b_pos, &y.a_id, &y.b_id))
    });
    anchors
}

fn scan_pair(
    ia: usize,
    ib: usize,
    placed: &[Vec<Placed<'_>>],
    config: &SyntenyConfig,
    detector: &dyn ColinearityDetector,
) -> Result<Vec<PairBlock>> {
    let anchors = pair_anchors(&placed[ia], &placed[ib], ia == ib);
    if anchors.is_empty() {
        return Ok(Vec::new());
    }
    let mut chains = detector.chain(&anchors, config.max_gap, config.min_block_len)?;
    chains.retain(|c| !c.anchors.is_empty() && c.anchors.len() >= config.min_block_len);
    chains.sort_by_key(|c| c.anchors.first().copied());

    let lookup = |k: usize| {
        anchors.get(k).ok_or_else(|| {
            AzulejoError::SyntenyTool(format!(
                "{} returned anchor {} out of range",
                detector.name(),
                k
            ))
        })
    };
    let mut blocks = Vec::with_capacity(chains.len());
    for chain in chains {
        let first = lookup(chain.anchors[0])?;
        let mut pairs = Vec::with_capacity(chain.anchors.len());
        let mut clusters = BTreeSet::new();
        for &k in &chain.anchors {
            let anchor = lookup(k)?;
            if anchor.a_frag != first.a_frag || anchor.b_frag != first.b_frag {
                return Err(AzulejoError::SyntenyTool(format!(
                    "{} chained anchors across fragments",
                    detector.name()
                )));
            }
            pairs.push((anchor.a_id.clone(), anchor.b_id.clone()));
            clusters.insert(anchor.cluster as usize);
        }
        blocks.push(PairBlock {
            proteome_a: ia,
            proteome_b: ib,
            frag_a: first.a_frag.clone(),
            frag_b: first.b_frag.clone(),
            direction: chain.direction,
            pairs,
            clusters,
        });
    }
    Ok(blocks)
}

/// Picks proxy ids that are unique across the run.
struct ProxyNamer<'a> {
    real_ids: &'a HashSet<&'a str>,
    used: HashSet<String>,
}

impl<'a> ProxyNamer<'a> {
    fn new(real_ids: &'a HashSet<&'a str>) -> Self {
        Self {
            real_ids,
            used: HashSet::new(),
        }
    }

    fn name(
        &mut self,
        block: usize,
        members: &[&str],
        clusters: &BTreeSet<usize>,
    ) -> (String, bool) {
        if clusters.len() == 1 {
            if let Some(member) = members.iter().find(|m| !self.used.contains(**m)) {
                self.used.insert(member.to_string());
                return (member.to_string(), false);
            }
        }
        let cluster = clusters.iter().next().copied().unwrap_or_default();
        let base = format!("syn{}.{}", block, cluster);
        let mut candidate = base.clone();
        let mut n = 0;
        while self.real_ids.contains(candidate.as_str()) || self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", base, n);
        }
        self.used.insert(candidate.clone());
        (candidate, true)
    }
}

/// Detect synteny blocks between every pair of proteomes.
///
/// `proteins` pairs each protein record with its homology cluster. Proteomes
/// without any positioned protein are skipped as degenerate input; proteins
/// without a position in a positioned proteome are left out of the scan.
pub fn map_synteny(
    proteins: &[(ProteinRecord, usize)],
    config: &SyntenyConfig,
    detector: &dyn ColinearityDetector,
    diagnostics: &Diagnostics,
) -> Result<SyntenyMap> {
    let mut by_proteome: BTreeMap<&str, Vec<Placed<'_>>> = BTreeMap::new();
    let mut unplaced: BTreeMap<&str, usize> = BTreeMap::new();
    let mut seen = HashSet::with_capacity(proteins.len());
    for (record, cluster) in proteins {
        if !seen.insert(record.id.as_str()) {
            return Err(AzulejoError::InvalidInput(format!(
                "duplicate protein id {}",
                record.id
            )));
        }
        let entry = by_proteome.entry(record.proteome.as_str()).or_default();
        match (&record.frag, record.pos) {
            (Some(frag), Some(pos)) => entry.push(Placed {
                id: &record.id,
                frag,
                pos,
                cluster: *cluster,
            }),
            _ => *unplaced.entry(record.proteome.as_str()).or_insert(0) += 1,
        }
    }

    let mut names = Vec::new();
    let mut placed = Vec::new();
    for (name, mut list) in by_proteome {
        if list.is_empty() {
            diagnostics.degenerate(format!(
                "proteome {} has no fragment positions; skipping it for synteny",
                name
            ))?;
            continue;
        }
        if let Some(n) = unplaced.get(name) {
            debug!("{}: {} proteins without positions left out", name, n);
        }
        list.sort_by(|x, y| (x.frag, x.pos, x.id).cmp(&(y.frag, y.pos, y.id)));
        names.push(name);
        placed.push(list);
    }

    let mut pairs = Vec::new();
    for i in 0..names.len() {
        if config.self_synteny {
            pairs.push((i, i));
        }
        for j in i + 1..names.len() {
            pairs.push((i, j));
        }
    }

    let per_pair: Vec<Vec<PairBlock>> = pairs
        .par_iter()
        .map(|&(i, j)| scan_pair(i, j, &placed, config, detector))
        .collect::<Result<Vec<_>>>()?;

    let real_ids: HashSet<&str> = proteins.iter().map(|(r, _)| r.id.as_str()).collect();
    let mut namer = ProxyNamer::new(&real_ids);
    let mut blocks = Vec::new();
    for raw in per_pair.into_iter().flatten() {
        let id = blocks.len();
        let mut members: Vec<&str> = raw
            .pairs
            .iter()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        members.sort_unstable();
        members.dedup();
        let (proxy, synthesized) = namer.name(id, &members, &raw.clusters);
        blocks.push(SyntenyBlock {
            id,
            proteome_a: names[raw.proteome_a].to_string(),
            proteome_b: names[raw.proteome_b].to_string(),
            frag_a: raw.frag_a,
            frag_b: raw.frag_b,
            direction: raw.direction,
            pairs: raw.pairs,
            clusters: raw.clusters,
            proxy,
            synthesized,
        });
    }

    let mut block_counts: HashMap<(&str, &str), BTreeSet<usize>> = HashMap::new();
    for block in &blocks {
        block_counts
            .entry((block.proteome_a.as_str(), block.frag_a.as_str()))
            .or_default()
            .insert(block.id);
        block_counts
            .entry((block.proteome_b.as_str(), block.frag_b.as_str()))
            .or_default()
            .insert(block.id);
    }
    let mut fragments = Vec::new();
    for (name, list) in names.iter().zip(&placed) {
        let mut per_frag: BTreeMap<&str, usize> = BTreeMap::new();
        for p in list {
            *per_frag.entry(p.frag).or_insert(0) += 1;
        }
        for (frag, n_proteins) in per_frag {
            fragments.push(FragmentSummary {
                proteome: name.to_string(),
                frag: frag.to_string(),
                n_proteins,
                n_blocks: block_counts.get(&(*name, frag)).map_or(0, BTreeSet::len),
            });
        }
    }

    info!(
        "Found {} synteny blocks over {} proteome pairs using {}",
        blocks.len(),
        pairs.len(),
        detector.name()
    );
    Ok(SyntenyMap { blocks, fragments })
}

impl SyntenyMap {
    /// One row per block with its proxy gene.
    pub fn proxy_table(&self) -> Result<Table> {
        let b = &self.blocks;
        Table::new()
            .with_key("block")
            .with_column("block", Column::ints(b.iter().map(|x| x.id as i64)))?
            .with_column("proxy_id", Column::strings(b.iter().map(|x| x.proxy.clone())))?
            .with_column("synthesized", Column::bools(b.iter().map(|x| x.synthesized)))?
            .with_column("mixed", Column::bools(b.iter().map(|x| x.is_mixed())))?
            .with_column("direction", Column::strings(b.iter().map(|x| x.direction.as_str())))?
            .with_column("length", Column::ints(b.iter().map(|x| x.len() as i64)))?
            .with_column(
                "hom_cluster",
                Column::ints(
                    b.iter()
                        .map(|x| x.clusters.iter().next().copied().unwrap_or_default() as i64),
                ),
            )?
            .with_column("proteome_a", Column::strings(b.iter().map(|x| x.proteome_a.clone())))?
            .with_column("frag_a", Column::strings(b.iter().map(|x| x.frag_a.clone())))?
            .with_column("proteome_b", Column::strings(b.iter().map(|x| x.proteome_b.clone())))?
            .with_column("frag_b", Column::strings(b.iter().map(|x| x.frag_b.clone())))?
            .with_column("members", Column::strings(b.iter().map(|x| x.members().join(","))))
    }

    /// One row per fragment with protein and block counts.
    pub fn fragments_table(&self) -> Result<Table> {
        let f = &self.fragments;
        Table::new()
            .with_column("proteome", Column::strings(f.iter().map(|x| x.proteome.clone())))?
            .with_column("frag", Column::strings(f.iter().map(|x| x.frag.clone())))?
            .with_column("n_proteins", Column::ints(f.iter().map(|x| x.n_proteins as i64)))?
            .with_column("n_blocks", Column::ints(f.iter().map(|x| x.n_blocks as i64)))
    }
}
