// src/lineage_stats.rs

use ahash::AHashMap;
use std::fmt::Write as _;

use crate::rank::TaxonomicRank;
use crate::taxdb::{NameMap, ParentMap, RankMap};
use crate::taxonomy::Taxonomy;
use crate::types::{ReportRow, TaxonRecord};

pub const REPORT_HEADER: &str = "%\trecords\ttaxRecords\tleaves\ttaxID\trank\ttaxName\n";

/// Per-node stats that store:
///   - record counts (self & clade)
///   - distinct leaf taxa (self & clade)
#[derive(Default, Debug, Clone)]
pub struct NodeStats {
    /// Records whose leaf is this node
    pub self_records: u64,
    /// Records in node + descendants
    pub clade_records: u64,
    /// 1 if any record ends here
    pub self_leaves: u64,
    /// Distinct leaves in node + descendants
    pub clade_leaves: u64,
}

/// Build a map of `parent -> Vec<child>` for traversing the taxonomy.
pub fn build_children_map(parent_map: &ParentMap) -> AHashMap<u32, Vec<u32>> {
    let mut children_map: AHashMap<u32, Vec<u32>> = AHashMap::new();

    // Initialize every known taxid as a key to avoid missing entries
    for &taxid in parent_map.keys() {
        children_map.entry(taxid).or_default();
    }

    // Populate children
    for (&child, &parent) in parent_map {
        if parent > 0 && child != parent {
            children_map.entry(parent).or_default().push(child);
        }
    }
    children_map
}

/// Where a record lands in the tree: its leaf taxid when the chain holds it,
/// otherwise the last chain entry.
pub fn record_placement(record: &TaxonRecord) -> Option<u32> {
    if record.contains(record.tax_id) {
        Some(record.tax_id)
    } else {
        record.terminal().map(|e| e.tax_id)
    }
}

/// Initialize each NodeStats from the records' placements.
pub fn init_node_stats(records: &[TaxonRecord]) -> AHashMap<u32, NodeStats> {
    let mut stats_map: AHashMap<u32, NodeStats> = AHashMap::new();

    for taxid in records.iter().filter_map(record_placement) {
        let node_stats = stats_map.entry(taxid).or_default();
        node_stats.self_records += 1;
        node_stats.self_leaves = 1;

        // Initially, clade == self
        node_stats.clade_records = node_stats.self_records;
        node_stats.clade_leaves = node_stats.self_leaves;
    }

    stats_map
}

/// Recursively sum children's stats into the parent.
pub fn accumulate_clade_stats(
    taxid: u32,
    children_map: &AHashMap<u32, Vec<u32>>,
    stats_map: &mut AHashMap<u32, NodeStats>,
) -> (u64, u64) {
    let cur = stats_map.entry(taxid).or_default().clone();

    // Start with self
    let mut total_records = cur.self_records;
    let mut total_leaves = cur.self_leaves;

    // Recurse children
    if let Some(kids) = children_map.get(&taxid) {
        for &child in kids {
            let (c_records, c_leaves) = accumulate_clade_stats(child, children_map, stats_map);
            total_records += c_records;
            total_leaves += c_leaves;
        }
    }

    if let Some(node) = stats_map.get_mut(&taxid) {
        node.clade_records = total_records;
        node.clade_leaves = total_leaves;
    }

    (total_records, total_leaves)
}

/// Generate the clade report (both structured rows and text).
pub fn generate_lineage_report(
    root_taxid: u32,
    stats_map: &AHashMap<u32, NodeStats>,
    children_map: &AHashMap<u32, Vec<u32>>,
    name_map: &NameMap,
    rank_map: &RankMap,
    total_records: u64,
    min_records: u64,
) -> (Vec<ReportRow>, String) {
    let mut report_rows = Vec::new();
    let mut report_text = String::from(REPORT_HEADER);

    struct Walk<'a> {
        stats_map: &'a AHashMap<u32, NodeStats>,
        children_map: &'a AHashMap<u32, Vec<u32>>,
        name_map: &'a NameMap,
        rank_map: &'a RankMap,
        total_records: u64,
        min_records: u64,
    }

    fn dfs(
        walk: &Walk,
        taxid: u32,
        parent_taxid: Option<u32>,
        depth: usize,
        report_rows: &mut Vec<ReportRow>,
        report_text: &mut String,
    ) {
        let default_stats = NodeStats::default();
        let stats = walk.stats_map.get(&taxid).unwrap_or(&default_stats);

        if stats.clade_records == 0 || stats.clade_records < walk.min_records || walk.total_records == 0 {
            return;
        }

        let pct = 100.0 * (stats.clade_records as f64) / (walk.total_records as f64);
        let rank_str = walk.rank_map.get(&taxid).cloned().unwrap_or_default();
        let raw_name = walk.name_map.get(&taxid).cloned().unwrap_or_default();

        // Sort children by clade_records desc, then taxid
        let mut kids = walk.children_map.get(&taxid).cloned().unwrap_or_default();
        kids.sort_by_key(|child_id| {
            let cstats = walk.stats_map.get(child_id).unwrap_or(&default_stats);
            (std::cmp::Reverse(cstats.clade_records), *child_id)
        });

        let _ = writeln!(
            report_text,
            "{:.4}\t{}\t{}\t{}\t{}\t{}\t{}{}",
            pct,
            stats.clade_records,
            stats.self_records,
            stats.clade_leaves,
            taxid,
            rank_str,
            "  ".repeat(depth),
            raw_name
        );

        report_rows.push(ReportRow {
            pct,
            clade_records: stats.clade_records,
            self_records: stats.self_records,
            distinct_leaves: stats.clade_leaves,
            tax_id: taxid,
            rank: rank_str,
            tax_name: raw_name,
            depth,
            parent_tax_id: parent_taxid,
            children_tax_ids: kids.clone(),
        });

        // Recurse on children
        for child in kids {
            dfs(walk, child, Some(taxid), depth + 1, report_rows, report_text);
        }
    }

    let walk = Walk {
        stats_map,
        children_map,
        name_map,
        rank_map,
        total_records,
        min_records,
    };
    dfs(&walk, root_taxid, None, 0, &mut report_rows, &mut report_text);

    (report_rows, report_text)
}

/// The main pipeline to build the clade report:
///  1) Build children map
///  2) init_node_stats
///  3) accumulate_clade_stats
///  4) generate_lineage_report
pub fn build_lineage_report(
    records: &[TaxonRecord],
    taxonomy: &Taxonomy,
    root_taxid: u32,
    min_records: u64,
) -> (Vec<ReportRow>, String) {
    let children_map = build_children_map(taxonomy.parent_map());
    let mut stats_map = init_node_stats(records);
    accumulate_clade_stats(root_taxid, &children_map, &mut stats_map);
    generate_lineage_report(
        root_taxid,
        &stats_map,
        &children_map,
        taxonomy.name_map(),
        taxonomy.rank_map(),
        records.len() as u64,
        min_records,
    )
}

/// Distinct taxa per rank, ordered by rank depth then rank name.
pub fn rank_summary(taxonomy: &Taxonomy) -> Vec<(TaxonomicRank, usize)> {
    let mut counts: AHashMap<TaxonomicRank, usize> = AHashMap::new();
    for taxid in taxonomy.tax_ids() {
        if let Some(rank) = taxonomy.rank(taxid) {
            *counts.entry(rank).or_insert(0) += 1;
        }
    }
    let mut summary: Vec<(TaxonomicRank, usize)> = counts.into_iter().collect();
    summary.sort_by(|a, b| {
        a.0.depth()
            .cmp(&b.0.depth())
            .then_with(|| a.0.as_str().cmp(b.0.as_str()))
    });
    summary
}

pub fn format_rank_summary(summary: &[(TaxonomicRank, usize)]) -> String {
    let mut output = String::from("rank\ttaxa\n");
    for (rank, count) in summary {
        let _ = writeln!(output, "{rank}\t{count}");
    }
    output
}
