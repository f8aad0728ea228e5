pub mod align;
pub mod cluster_builder;
pub mod compare;
pub mod config;
pub mod diagnostics;
pub mod homology;
pub mod paths;
pub mod proteome;
pub mod refiner;
pub mod synteny;

pub use align::align_clusters;
pub use cluster_builder::{
    adjacency_to_clusters, build_clusters, clusters_to_histograms, combine_clusters, Cluster,
    ClusterTable,
};
pub use compare::{compare_clusters, ComparisonReport};
pub use config::Config;
pub use diagnostics::Diagnostics;
pub use homology::{annotate_homology, Annotation, SizeCategory};
pub use proteome::{ingest, Manifest, ProteinRecord};
pub use refiner::{refine_in_steps, ClusterHierarchy, Refinement};
pub use synteny::{map_synteny, RunScanner, SyntenyBlock, SyntenyMap};
