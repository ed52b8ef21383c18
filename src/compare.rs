// src/compare.rs

use ahash::AHashSet;
use rayon::prelude::*;
use std::fmt::Write as _;

use crate::rank::{TaxonomicRank, STANDARD_RANKS};
use crate::types::TaxonRecord;

/// Presence/absence comparison of two listings at one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankMetrics {
    pub rank: TaxonomicRank,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Truth records with no ancestor at this rank
    pub unresolved_truth: usize,
    /// Predicted records with no ancestor at this rank
    pub unresolved_predicted: usize,
}

impl RankMetrics {
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Closest chain entry (from the leaf up) whose rank is `rank`.
pub fn project_to_rank(record: &TaxonRecord, rank: &TaxonomicRank) -> Option<u32> {
    record
        .lineage
        .iter()
        .rev()
        .find(|e| &TaxonomicRank::parse(&e.rank) == rank)
        .map(|e| e.tax_id)
}

/// Distinct taxa at `rank` across `records`, plus how many records had none.
fn project_listing(records: &[TaxonRecord], rank: &TaxonomicRank) -> (AHashSet<u32>, usize) {
    records
        .par_iter()
        .fold(
            || (AHashSet::new(), 0usize),
            |mut acc, record| {
                match project_to_rank(record, rank) {
                    Some(taxid) => {
                        acc.0.insert(taxid);
                    }
                    None => acc.1 += 1,
                }
                acc
            },
        )
        .reduce(
            || (AHashSet::new(), 0usize),
            |mut a, b| {
                a.0.extend(b.0);
                a.1 += b.1;
                a
            },
        )
}

pub fn compare_at_rank(
    truth: &[TaxonRecord],
    predicted: &[TaxonRecord],
    rank: &TaxonomicRank,
) -> RankMetrics {
    let (truth_set, unresolved_truth) = project_listing(truth, rank);
    let (pred_set, unresolved_predicted) = project_listing(predicted, rank);

    let true_positives = truth_set.intersection(&pred_set).count();
    let metrics = RankMetrics {
        rank: rank.clone(),
        true_positives,
        false_positives: pred_set.len() - true_positives,
        false_negatives: truth_set.len() - true_positives,
        unresolved_truth,
        unresolved_predicted,
    };

    log::debug!(
        "{}: tp={} fp={} fn={} f1={:.4}",
        rank,
        metrics.true_positives,
        metrics.false_positives,
        metrics.false_negatives,
        metrics.f1()
    );
    metrics
}

/// Compares at every standard rank, superkingdom down to species.
pub fn compare_all_ranks(truth: &[TaxonRecord], predicted: &[TaxonRecord]) -> Vec<RankMetrics> {
    log::info!(
        "Comparing {} predicted records against {} truth records",
        predicted.len(),
        truth.len()
    );
    STANDARD_RANKS
        .par_iter()
        .map(|rank| compare_at_rank(truth, predicted, rank))
        .collect()
}

pub fn format_comparison(metrics: &[RankMetrics]) -> String {
    let mut output = String::from("rank\ttp\tfp\tfn\tprecision\trecall\tf1\n");
    for m in metrics {
        let _ = writeln!(
            output,
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}",
            m.rank,
            m.true_positives,
            m.false_positives,
            m.false_negatives,
            m.precision(),
            m.recall(),
            m.f1()
        );
    }
    output
}
