pub mod fasta;
pub mod index;
pub mod sequence;

pub use fasta::{parse_fasta, parse_fasta_from_bytes, write_fasta};
pub use index::{fasta_records, split_fasta, trim_fasta, FastaIndex};
pub use sequence::Sequence;
