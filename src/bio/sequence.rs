use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Stable content hash of the residues, ignoring case and any trailing
    /// stop codon, as 16 hex characters.
    pub fn content_hash(&self) -> String {
        let residues = self.sequence.strip_suffix(b"*").unwrap_or(&self.sequence);
        let mut hasher = Sha256::new();
        for &c in residues {
            hasher.update([c.to_ascii_uppercase()]);
        }
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }

    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!(">{} {}", self.id, desc),
            None => format!(">{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_ignores_case_and_stop() {
        let a = Sequence::new("a".to_string(), b"MKV*".to_vec());
        let b = Sequence::new("b".to_string(), b"mkv".to_vec());
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 16);
    }

    #[test]
    fn test_header() {
        let seq =
            Sequence::new("p1".to_string(), b"M".to_vec()).with_description("kinase".to_string());
        assert_eq!(seq.header(), ">p1 kinase");
    }
}
