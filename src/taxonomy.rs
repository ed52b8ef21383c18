//src/taxonomy.rs

use ahash::AHashSet;

use crate::rank::TaxonomicRank;
use crate::taxdb::{NameMap, ParentMap, RankMap};
use crate::types::TaxonRecord;

/// Taxonomy tree rebuilt from lineage chains (or read from a taxDB file).
/// The root is its own parent.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    parent_map: ParentMap,
    name_map: NameMap,
    rank_map: RankMap,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(parent_map: ParentMap, name_map: NameMap, rank_map: RankMap) -> Self {
        Self {
            parent_map,
            name_map,
            rank_map,
        }
    }

    /// Builds the tree from consecutive chain pairs. The first time a taxid is
    /// seen decides its parent, name and rank.
    pub fn from_records(records: &[TaxonRecord]) -> Self {
        let mut taxonomy = Self::new();
        for record in records {
            let mut parent = None;
            for entry in &record.lineage {
                taxonomy.insert(
                    entry.tax_id,
                    parent.unwrap_or(entry.tax_id),
                    &entry.scientific_name,
                    &entry.rank,
                );
                parent = Some(entry.tax_id);
            }
        }
        log::debug!(
            "Built taxonomy with {} nodes from {} records",
            taxonomy.len(),
            records.len()
        );
        taxonomy
    }

    /// Adds a node unless the taxid is already known.
    pub fn insert(&mut self, tax_id: u32, parent_id: u32, name: &str, rank: &str) -> bool {
        if self.parent_map.contains_key(&tax_id) {
            return false;
        }
        self.parent_map.insert(tax_id, parent_id);
        self.name_map.insert(tax_id, name.to_string());
        self.rank_map.insert(tax_id, rank.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }

    pub fn contains(&self, tax_id: u32) -> bool {
        self.parent_map.contains_key(&tax_id)
    }

    pub fn parent(&self, tax_id: u32) -> Option<u32> {
        self.parent_map.get(&tax_id).copied()
    }

    pub fn name(&self, tax_id: u32) -> Option<&str> {
        self.name_map.get(&tax_id).map(String::as_str)
    }

    pub fn rank_str(&self, tax_id: u32) -> Option<&str> {
        self.rank_map.get(&tax_id).map(String::as_str)
    }

    pub fn rank(&self, tax_id: u32) -> Option<TaxonomicRank> {
        self.rank_str(tax_id).map(TaxonomicRank::parse)
    }

    pub fn parent_map(&self) -> &ParentMap {
        &self.parent_map
    }

    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    pub fn rank_map(&self) -> &RankMap {
        &self.rank_map
    }

    /// All taxids, ascending.
    pub fn tax_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.parent_map.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Root-to-node path. Empty for unknown taxids. Stops at a self-parented
    /// node, a missing parent, or a cycle.
    pub fn lineage(&self, tax_id: u32) -> Vec<u32> {
        if !self.contains(tax_id) {
            return Vec::new();
        }
        let mut path = Vec::new();
        let mut seen = AHashSet::with_capacity(32);
        let mut node = tax_id;
        while seen.insert(node) {
            path.push(node);
            match self.parent_map.get(&node) {
                Some(&p) if p != node => node = p,
                _ => break,
            }
        }
        path.reverse();
        path
    }

    /// Lowest common ancestor of `a` and `b`.
    /// If either is `0`, treat it as unclassified => return the other.
    /// Returns `0` if the two nodes share no ancestor.
    pub fn lca(&self, a: u32, b: u32) -> u32 {
        if a == 0 || b == 0 {
            return if a == 0 { b } else { a };
        }

        // Collect ancestors of a
        let a_anc: AHashSet<u32> = self.lineage(a).into_iter().collect();

        // Climb b upward until we find a common ancestor
        for &node in self.lineage(b).iter().rev() {
            if a_anc.contains(&node) {
                return node;
            }
        }
        0
    }

    /// Closest ancestor (or the node itself) carrying `rank`.
    pub fn ancestor_at_rank(&self, tax_id: u32, rank: &TaxonomicRank) -> Option<u32> {
        self.lineage(tax_id)
            .into_iter()
            .rev()
            .find(|&id| self.rank(id).as_ref() == Some(rank))
    }

    /// Number of edges between `a` and `b` through their LCA.
    pub fn distance(&self, a: u32, b: u32) -> Option<usize> {
        let lineage_a = self.lineage(a);
        let lineage_b = self.lineage(b);
        let common = self.lca(a, b);
        if common == 0 || lineage_a.is_empty() || lineage_b.is_empty() {
            return None;
        }

        let pos_a = lineage_a.iter().position(|&x| x == common)?;
        let pos_b = lineage_b.iter().position(|&x| x == common)?;
        Some((lineage_a.len() - 1 - pos_a) + (lineage_b.len() - 1 - pos_b))
    }

    /// All taxa at `rank`, ascending.
    pub fn taxa_at_rank(&self, rank: &TaxonomicRank) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .rank_map
            .iter()
            .filter(|(_, r)| &TaxonomicRank::parse(r) == rank)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage_parser::parse_lineage_listing;

    const WRAPPED: &str = include_str!("../testdata/taxid_list_wrapped.txt");

    fn fixture() -> Taxonomy {
        Taxonomy::from_records(&parse_lineage_listing(WRAPPED).unwrap())
    }

    #[test]
    fn test_tree_from_chains() {
        let tax = fixture();
        assert_eq!(tax.len(), 23);
        assert_eq!(tax.parent(1), Some(1));
        assert_eq!(tax.parent(131567), Some(1));
        assert_eq!(tax.parent(1783272), Some(2));
        assert_eq!(tax.name(909768), Some("Acinetobacter calcoaceticus / baumannii complex"));
        assert_eq!(tax.rank(1279), Some(TaxonomicRank::Genus));
    }

    #[test]
    fn test_lineage() {
        let tax = fixture();
        assert_eq!(
            tax.lineage(1282),
            vec![1, 131567, 2, 1783272, 1239, 91061, 1385, 90964, 1279, 1282]
        );
        assert!(tax.lineage(562).is_empty());
    }

    #[test]
    fn test_lineage_survives_cycle() {
        let mut tax = Taxonomy::new();
        tax.insert(10, 11, "a", "genus");
        tax.insert(11, 10, "b", "family");
        assert_eq!(tax.lineage(10), vec![11, 10]);
    }

    #[test]
    fn test_lca() {
        let tax = fixture();
        assert_eq!(tax.lca(1282, 451709), 1385);
        assert_eq!(tax.lca(1370126, 1282), 2);
        assert_eq!(tax.lca(0, 1282), 1282);
        assert_eq!(tax.lca(1396, 451709), 1396);
        assert_eq!(tax.lca(1282, 999), 0);
    }

    #[test]
    fn test_ancestor_at_rank_and_distance() {
        let tax = fixture();
        assert_eq!(tax.ancestor_at_rank(451709, &TaxonomicRank::Genus), Some(1386));
        assert_eq!(tax.ancestor_at_rank(451709, &TaxonomicRank::Species), Some(1396));
        assert_eq!(tax.ancestor_at_rank(1, &TaxonomicRank::Genus), None);
        assert_eq!(tax.distance(1282, 451709), Some(8));
        assert_eq!(tax.distance(1282, 1282), Some(0));
    }

    #[test]
    fn test_taxa_at_rank() {
        let tax = fixture();
        assert_eq!(tax.taxa_at_rank(&TaxonomicRank::Phylum), vec![1224, 1239]);
        assert_eq!(
            tax.taxa_at_rank(&TaxonomicRank::Other("species group".into())),
            vec![86661, 909768]
        );
    }
}
