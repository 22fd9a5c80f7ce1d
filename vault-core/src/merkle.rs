//! Merkle commitments over shard sets
//!
//! Builds a binary SHA-256 tree whose leaves are the hashes of the ordered
//! shard list. A missing shard hashes as the empty byte string so the same
//! geometry always yields the same tree shape. When a level holds an odd
//! number of nodes, the last node is paired with itself.
//!
//! Proofs are ordered sibling lists from leaf to root, each step tagged with
//! the side the sibling sits on. The textual form is deterministic (`L:`/`R:`
//! plus lowercase hex, comma-joined, no whitespace) so a proof recomputed
//! over unchanged shards compares equal as a string after round-tripping
//! through a manifest.

use crate::error::{Result, VaultError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

type Hash = [u8; 32];

fn leaf_hash(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Which side of the concatenation a sibling hash occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One step of a Merkle inclusion proof: a sibling hash and its side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub side: Side,
    pub hash: Hash,
}

/// Inclusion proof for a single shard against the tree root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardProof {
    steps: Vec<ProofStep>,
}

impl ShardProof {
    /// The sibling steps, leaf to root
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Fold the shard bytes through the proof, yielding the root this proof
    /// commits to
    pub fn compute_root(&self, shard: &[u8]) -> Hash {
        let mut acc = leaf_hash(shard);
        for step in &self.steps {
            acc = match step.side {
                Side::Left => node_hash(&step.hash, &acc),
                Side::Right => node_hash(&acc, &step.hash),
            };
        }
        acc
    }

    /// Check the shard bytes against an expected root
    pub fn verify(&self, shard: &[u8], root: &Hash) -> bool {
        self.compute_root(shard) == *root
    }
}

impl fmt::Display for ShardProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let side = match step.side {
                Side::Left => 'L',
                Side::Right => 'R',
            };
            write!(f, "{side}:{}", hex::encode(step.hash))?;
        }
        Ok(())
    }
}

impl FromStr for ShardProof {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self { steps: Vec::new() });
        }
        let mut steps = Vec::new();
        for part in s.split(',') {
            let (side, hash_hex) = part
                .split_once(':')
                .ok_or_else(|| VaultError::ManifestParse(format!("malformed proof step: {part}")))?;
            let side = match side {
                "L" => Side::Left,
                "R" => Side::Right,
                other => {
                    return Err(VaultError::ManifestParse(format!(
                        "unknown proof side: {other}"
                    )))
                }
            };
            let bytes = hex::decode(hash_hex)
                .map_err(|e| VaultError::ManifestParse(format!("proof hash not hex: {e}")))?;
            if bytes.len() != 32 {
                return Err(VaultError::ManifestParse(format!(
                    "proof hash wrong length: {}",
                    bytes.len()
                )));
            }
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&bytes);
            steps.push(ProofStep { side, hash });
        }
        Ok(Self { steps })
    }
}

/// Binary SHA-256 Merkle tree over an ordered shard list
pub struct MerkleTree {
    /// levels[0] = leaf hashes, last level = [root]
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over the ordered shard list. Missing shards hash as the
    /// empty byte string; an empty iterator is treated as one empty leaf.
    pub fn build<'a, I>(shards: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a [u8]>>,
    {
        let mut level: Vec<Hash> = shards
            .into_iter()
            .map(|s| leaf_hash(s.unwrap_or(b"")))
            .collect();
        if level.is_empty() {
            level.push(leaf_hash(b""));
        }

        let mut levels = vec![level];
        while levels[levels.len() - 1].len() > 1 {
            let current = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                let left = &pair[0];
                // Duplicate the last node when the level is odd
                let right = pair.get(1).unwrap_or(left);
                next.push(node_hash(left, right));
            }
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of leaves the tree was built over
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The Merkle root
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Inclusion proof for the leaf at `index`
    pub fn proof(&self, index: usize) -> Result<ShardProof> {
        if index >= self.leaf_count() {
            return Err(VaultError::InvalidShardIndex {
                index,
                max: self.leaf_count() - 1,
            });
        }

        let mut steps = Vec::with_capacity(self.levels.len() - 1);
        let mut index = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling, side) = if index % 2 == 0 {
                // Even index: sibling on the right, or the node itself when
                // it is the duplicated last node of an odd level
                (if index + 1 < level.len() { index + 1 } else { index }, Side::Right)
            } else {
                (index - 1, Side::Left)
            };
            steps.push(ProofStep {
                side,
                hash: level[sibling],
            });
            index /= 2;
        }
        Ok(ShardProof { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shards(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 64]).collect()
    }

    fn build_over(shards: &[Vec<u8>]) -> MerkleTree {
        MerkleTree::build(shards.iter().map(|s| Some(s.as_slice())))
    }

    #[test]
    fn test_root_deterministic() {
        let shards = sample_shards(14);
        let tree1 = build_over(&shards);
        let tree2 = build_over(&shards);
        assert_eq!(tree1.root(), tree2.root());

        // Any leaf change moves the root
        let mut changed = shards.clone();
        changed[4][0] ^= 0xFF;
        let tree3 = build_over(&changed);
        assert_ne!(tree1.root(), tree3.root());
    }

    #[test]
    fn test_all_proofs_verify() {
        let shards = sample_shards(14);
        let tree = build_over(&shards);
        let root = tree.root();

        for (i, shard) in shards.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(proof.verify(shard, &root), "proof failed for leaf {i}");
        }
    }

    #[test]
    fn test_proofs_verify_odd_counts() {
        // Odd level shapes: exercises the duplicated-last-node rule
        for n in [1, 2, 3, 5, 7, 13, 14] {
            let shards = sample_shards(n);
            let tree = build_over(&shards);
            let root = tree.root();
            for (i, shard) in shards.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(proof.verify(shard, &root), "n={n} leaf {i}");
            }
        }
    }

    #[test]
    fn test_tampered_shard_fails_proof() {
        let shards = sample_shards(14);
        let tree = build_over(&shards);
        let root = tree.root();

        let proof = tree.proof(4).unwrap();
        let mut tampered = shards[4].clone();
        tampered[0] ^= 0x01;
        assert!(!proof.verify(&tampered, &root));
    }

    #[test]
    fn test_absent_shard_hashes_as_empty() {
        let shards = sample_shards(14);
        let with_hole: Vec<Option<&[u8]>> = shards
            .iter()
            .enumerate()
            .map(|(i, s)| if i == 3 { None } else { Some(s.as_slice()) })
            .collect();
        let tree = MerkleTree::build(with_hole);

        let mut replaced = shards.clone();
        replaced[3] = Vec::new();
        let tree2 = build_over(&replaced);
        assert_eq!(tree.root(), tree2.root());
    }

    #[test]
    fn test_proof_string_roundtrip() {
        let shards = sample_shards(14);
        let tree = build_over(&shards);

        for i in 0..14 {
            let proof = tree.proof(i).unwrap();
            let text = proof.to_string();
            // Single line, no whitespace
            assert!(!text.contains(char::is_whitespace));
            let parsed: ShardProof = text.parse().unwrap();
            assert_eq!(proof, parsed);
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_proof_parse_rejects_garbage() {
        assert!("X:00".parse::<ShardProof>().is_err());
        assert!("L:zz".parse::<ShardProof>().is_err());
        assert!("L:00ff".parse::<ShardProof>().is_err());
        assert!("noseparator".parse::<ShardProof>().is_err());
    }

    #[test]
    fn test_proof_index_out_of_range() {
        let shards = sample_shards(14);
        let tree = build_over(&shards);
        assert!(matches!(
            tree.proof(14),
            Err(VaultError::InvalidShardIndex { index: 14, max: 13 })
        ));
    }

    #[test]
    fn test_single_leaf_tree() {
        let shard = vec![9u8; 16];
        let tree = MerkleTree::build([Some(shard.as_slice())]);
        assert_eq!(tree.root(), leaf_hash(&shard));
        let proof = tree.proof(0).unwrap();
        assert!(proof.steps().is_empty());
        assert!(proof.verify(&shard, &tree.root()));
    }
}
