pub mod adjacency_to_clusters;
pub mod align;
pub mod annotate_homology;
pub mod cluster;
pub mod cluster_in_steps;
pub mod combine_clusters;
pub mod compare_clusters;
pub mod config;
pub mod index;
pub mod ingest;
pub mod synteny;
pub mod tools;
