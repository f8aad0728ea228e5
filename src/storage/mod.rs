//! Persistence helpers: tabular datasets and memory-mapped sequence files.

pub mod mmap;
pub mod table;

pub use mmap::TrimmableMap;
pub use table::{
    read_table, write_table, write_table_with, Codec, Column, DType, Table, TableFormat,
};
