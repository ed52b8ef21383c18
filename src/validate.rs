//src/validate.rs

use ahash::{AHashMap, AHashSet};
use std::fmt;

use crate::config::LineageConfig;
use crate::types::TaxonRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Chain does not start at the configured root.
    MissingRoot { found: u32 },
    /// Second chain entry is not "cellular organisms" (normal for viruses).
    MissingCellularOrganisms { found: u32 },
    /// Leaf taxid differs from the last chain entry.
    LeafMismatch { terminal: u32 },
    /// Same taxid appears twice in one chain.
    RepeatedAncestor { ancestor: u32 },
    ConflictingName { ancestor: u32, first: String, found: String },
    ConflictingRank { ancestor: u32, first: String, found: String },
    ConflictingParent { ancestor: u32, first: u32, found: u32 },
    /// Leaf already listed by an earlier record.
    DuplicateRecord { first_index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageIssue {
    pub record_index: usize,
    pub tax_id: u32,
    pub severity: Severity,
    pub kind: IssueKind,
}

impl fmt::Display for LineageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: record #{} (taxid {}): ", self.record_index + 1, self.tax_id)?;
        match &self.kind {
            IssueKind::MissingRoot { found } => write!(f, "chain starts at {found}, not the root"),
            IssueKind::MissingCellularOrganisms { found } => {
                write!(f, "chain continues with {found} instead of cellular organisms")
            }
            IssueKind::LeafMismatch { terminal } => write!(f, "chain ends at {terminal}"),
            IssueKind::RepeatedAncestor { ancestor } => {
                write!(f, "taxid {ancestor} appears more than once in the chain")
            }
            IssueKind::ConflictingName { ancestor, first, found } => {
                write!(f, "taxid {ancestor} named '{found}', earlier '{first}'")
            }
            IssueKind::ConflictingRank { ancestor, first, found } => {
                write!(f, "taxid {ancestor} has rank '{found}', earlier '{first}'")
            }
            IssueKind::ConflictingParent { ancestor, first, found } => {
                write!(f, "taxid {ancestor} has parent {found}, earlier {first}")
            }
            IssueKind::DuplicateRecord { first_index } => {
                write!(f, "duplicate of record #{}", first_index + 1)
            }
        }
    }
}

struct FirstSeen<'a> {
    parent: u32,
    name: &'a str,
    rank: &'a str,
}

/// Checks chain shape and cross-record consistency.
pub fn validate_records(records: &[TaxonRecord], config: &LineageConfig) -> Vec<LineageIssue> {
    let mut issues = Vec::new();
    let mut first_seen: AHashMap<u32, FirstSeen> = AHashMap::new();
    let mut leaves: AHashMap<u32, usize> = AHashMap::new();

    for (idx, record) in records.iter().enumerate() {
        let mut push = |severity, kind| {
            issues.push(LineageIssue {
                record_index: idx,
                tax_id: record.tax_id,
                severity,
                kind,
            })
        };

        if let Some(&first_index) = leaves.get(&record.tax_id) {
            push(Severity::Warning, IssueKind::DuplicateRecord { first_index });
        } else {
            leaves.insert(record.tax_id, idx);
        }

        // 1. Chain shape
        if let Some(first) = record.lineage.first() {
            if first.tax_id != config.root_taxid {
                push(Severity::Error, IssueKind::MissingRoot { found: first.tax_id });
            }
        }
        if let Some(second) = record.lineage.get(1) {
            if second.tax_id != config.cellular_organisms_taxid {
                let severity = if config.require_cellular_organisms {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                push(severity, IssueKind::MissingCellularOrganisms { found: second.tax_id });
            }
        }
        if let Some(terminal) = record.terminal() {
            if terminal.tax_id != record.tax_id {
                push(Severity::Warning, IssueKind::LeafMismatch { terminal: terminal.tax_id });
            }
        }

        // 2. Per-node consistency against earlier records
        let mut in_chain = AHashSet::with_capacity(record.lineage.len());
        let mut parent: Option<u32> = None;
        for entry in &record.lineage {
            if !in_chain.insert(entry.tax_id) {
                push(Severity::Error, IssueKind::RepeatedAncestor { ancestor: entry.tax_id });
            }
            let this_parent = parent.unwrap_or(entry.tax_id);
            parent = Some(entry.tax_id);

            match first_seen.get(&entry.tax_id) {
                None => {
                    first_seen.insert(
                        entry.tax_id,
                        FirstSeen {
                            parent: this_parent,
                            name: &entry.scientific_name,
                            rank: &entry.rank,
                        },
                    );
                }
                Some(seen) => {
                    if seen.name != entry.scientific_name {
                        push(
                            Severity::Error,
                            IssueKind::ConflictingName {
                                ancestor: entry.tax_id,
                                first: seen.name.to_string(),
                                found: entry.scientific_name.clone(),
                            },
                        );
                    }
                    if seen.rank != entry.rank {
                        push(
                            Severity::Error,
                            IssueKind::ConflictingRank {
                                ancestor: entry.tax_id,
                                first: seen.rank.to_string(),
                                found: entry.rank.clone(),
                            },
                        );
                    }
                    if seen.parent != this_parent {
                        push(
                            Severity::Error,
                            IssueKind::ConflictingParent {
                                ancestor: entry.tax_id,
                                first: seen.parent,
                                found: this_parent,
                            },
                        );
                    }
                }
            }
        }
    }

    issues
}

pub fn count_errors(issues: &[LineageIssue]) -> usize {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count()
}

pub fn log_issues(issues: &[LineageIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Warning => log::warn!("{issue}"),
            Severity::Error => log::error!("{issue}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage_parser::parse_lineage_listing;

    const WRAPPED: &str = include_str!("../testdata/taxid_list_wrapped.txt");

    fn issues_for(text: &str, config: &LineageConfig) -> Vec<LineageIssue> {
        validate_records(&parse_lineage_listing(text).unwrap(), config)
    }

    #[test]
    fn test_fixture_is_clean() {
        assert!(issues_for(WRAPPED, &LineageConfig::default()).is_empty());
    }

    #[test]
    fn test_missing_root() {
        let issues = issues_for("5\t2;Bacteria(superkingdom)|5;X(species)\n", &LineageConfig::default());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::MissingRoot { found: 2 });
        assert_eq!(issues[0].severity, Severity::Error);
        // The second entry is not cellular organisms either
        assert_eq!(issues[1].kind, IssueKind::MissingCellularOrganisms { found: 5 });
    }

    #[test]
    fn test_virus_chain_severity_follows_config() {
        let text = "10239\t1;root(no rank)|10239;Viruses(superkingdom)\n";
        let issues = issues_for(text, &LineageConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(count_errors(&issues), 0);

        let strict = LineageConfig {
            require_cellular_organisms: true,
            ..LineageConfig::default()
        };
        assert_eq!(count_errors(&issues_for(text, &strict)), 1);
    }

    #[test]
    fn test_leaf_mismatch_and_repeat() {
        let text = "7\t1;root(no rank)|131567;cellular organisms(no rank)|3;A(genus)|3;A(genus)\n";
        let kinds: Vec<IssueKind> = issues_for(text, &LineageConfig::default())
            .into_iter()
            .map(|i| i.kind)
            .collect();
        assert!(kinds.contains(&IssueKind::LeafMismatch { terminal: 3 }));
        assert!(kinds.contains(&IssueKind::RepeatedAncestor { ancestor: 3 }));
    }

    #[test]
    fn test_cross_record_conflicts() {
        let text = "\
            3\t1;root(no rank)|131567;cellular organisms(no rank)|3;Alpha(genus)\n\
            4\t1;root(no rank)|131567;cellular organisms(no rank)|2;Bacteria(superkingdom)|3;Beta(family)|4;Gamma(species)\n";
        let issues = issues_for(text, &LineageConfig::default());
        let kinds: Vec<&IssueKind> = issues.iter().map(|i| &i.kind).collect();
        assert!(kinds.contains(&&IssueKind::ConflictingName {
            ancestor: 3,
            first: "Alpha".into(),
            found: "Beta".into()
        }));
        assert!(kinds.contains(&&IssueKind::ConflictingRank {
            ancestor: 3,
            first: "genus".into(),
            found: "family".into()
        }));
        assert!(kinds.contains(&&IssueKind::ConflictingParent {
            ancestor: 3,
            first: 131567,
            found: 2
        }));
        assert!(issues.iter().all(|i| i.record_index == 1));
    }

    #[test]
    fn test_duplicate_record() {
        let line = "2\t1;root(no rank)|131567;cellular organisms(no rank)|2;Bacteria(superkingdom)\n";
        let issues = issues_for(&format!("{line}{line}"), &LineageConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateRecord { first_index: 0 });
        assert!(issues[0].to_string().contains("duplicate of record #1"));
    }
}
