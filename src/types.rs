//src/types.rs

/// One `(taxid; name(rank))` pair of a lineage chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageEntry {
    pub tax_id: u32,
    pub scientific_name: String,
    pub rank: String,
}

/// A leaf taxid with its ancestry, ordered root-to-leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonRecord {
    pub tax_id: u32,
    pub lineage: Vec<LineageEntry>,
}

impl TaxonRecord {
    /// Last entry of the chain, normally the leaf itself.
    pub fn terminal(&self) -> Option<&LineageEntry> {
        self.lineage.last()
    }

    pub fn contains(&self, tax_id: u32) -> bool {
        self.lineage.iter().any(|e| e.tax_id == tax_id)
    }
}

/// A structured representation of one row in the clade report.
/// For example:
///  %  records  taxRecords  leaves  taxID  rank  taxName
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub pct: f64,
    pub clade_records: u64,
    pub self_records: u64,
    pub distinct_leaves: u64,
    pub tax_id: u32,
    pub rank: String,
    pub tax_name: String,
    pub depth: usize,                // Still needed for indentation
    pub parent_tax_id: Option<u32>,  // Keep for tree structure
    pub children_tax_ids: Vec<u32>,  // Keep for tree structure
}
