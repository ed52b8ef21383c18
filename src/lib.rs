// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod rank;
pub mod lineage_parser;
pub mod taxdb;
pub mod taxonomy;
pub mod validate;
pub mod lineage_stats;
pub mod compare;

use std::path::Path;

use crate::config::LineageConfig;
use crate::error::{LineageError, Result};
use crate::lineage_parser::{format_listing, read_lineage_listing};
use crate::lineage_stats::{build_lineage_report, format_rank_summary, rank_summary, REPORT_HEADER};
use crate::taxdb::format_taxdb;
use crate::taxonomy::Taxonomy;
use crate::types::{ReportRow, TaxonRecord};
use crate::validate::{count_errors, log_issues, validate_records, LineageIssue};

/// Everything derived from one lineage listing.
/// Only structured data is stored; text is generated on demand.
pub struct LineageResults {
    /// Records in file order
    pub records: Vec<TaxonRecord>,

    /// Tree rebuilt from the chains
    pub taxonomy: Taxonomy,

    /// Shape and consistency findings (warnings included)
    pub issues: Vec<LineageIssue>,

    /// Structured version of the clade report
    pub report_rows: Vec<ReportRow>,
}

impl LineageResults {
    /// Builds results from already-parsed records.
    pub fn from_records(records: Vec<TaxonRecord>, config: &LineageConfig) -> Result<Self> {
        // 1. Rebuild the tree
        let taxonomy = Taxonomy::from_records(&records);

        // 2. Validate
        let issues = validate_records(&records, config);
        log_issues(&issues);
        let errors = count_errors(&issues);
        if config.strict && errors > 0 {
            return Err(LineageError::Invalid { errors });
        }

        // 3. Clade report
        let (report_rows, _) = build_lineage_report(
            &records,
            &taxonomy,
            config.root_taxid,
            config.report_min_records,
        );

        log::info!(
            "{} records, {} taxa, {} issue(s) ({} error(s))",
            records.len(),
            taxonomy.len(),
            issues.len(),
            errors
        );

        Ok(Self {
            records,
            taxonomy,
            issues,
            report_rows,
        })
    }

    pub fn error_count(&self) -> usize {
        count_errors(&self.issues)
    }

    /// Canonical listing text, one record per line.
    pub fn get_listing(&self) -> String {
        format_listing(&self.records)
    }

    /// Clade report text
    pub fn get_report(&self) -> String {
        let mut output = String::from(REPORT_HEADER);
        for row in &self.report_rows {
            output.push_str(&format!(
                "{:.4}\t{}\t{}\t{}\t{}\t{}\t{}{}\n",
                row.pct,
                row.clade_records,
                row.self_records,
                row.distinct_leaves,
                row.tax_id,
                row.rank,
                "  ".repeat(row.depth),
                row.tax_name
            ));
        }
        output
    }

    /// taxDB text (`taxid\tparent\tname\trank`)
    pub fn get_taxdb(&self) -> String {
        format_taxdb(&self.taxonomy)
    }

    pub fn get_rank_summary(&self) -> String {
        format_rank_summary(&rank_summary(&self.taxonomy))
    }

    pub fn get_issues_text(&self) -> String {
        self.issues.iter().map(|i| format!("{i}\n")).collect()
    }
}

/// Reads, checks and summarises a listing file.
pub fn load_lineage_listing<P: AsRef<Path>>(path: P, config: &LineageConfig) -> Result<LineageResults> {
    let records = read_lineage_listing(path)?;
    LineageResults::from_records(records, config)
}
