//src/taxdb.rs

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LineageError, Result};
use crate::taxonomy::Taxonomy;

pub type ParentMap = HashMap<u32, u32>;
pub type NameMap = HashMap<u32, String>;
pub type RankMap = HashMap<u32, String>;

/// Parses a taxDB file in the format:
/// ```text
/// <taxid>\t<parentid>\t<taxname>\t<rank>
/// ```
/// Returns:
/// - a `ParentMap` mapping child_taxid -> parent_taxid
/// - a `NameMap` mapping taxid -> taxname
/// - a `RankMap` mapping taxid -> rank
pub fn parse_taxdb<P: AsRef<Path>>(filepath: P) -> Result<(ParentMap, NameMap, RankMap)> {
    let file = File::open(&filepath)?;
    let reader = BufReader::new(file);

    let mut parent_map: ParentMap = HashMap::new();
    let mut name_map: NameMap = HashMap::new();
    let mut rank_map: RankMap = HashMap::new();

    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        // Expecting 4 tab-separated fields: taxid, parentid, taxname, rank
        // e.g. "2   131567   Bacteria   superkingdom"
        let parts: Vec<&str> = line.split('\t').collect();

        // Skip malformed lines
        if parts.len() < 4 {
            if !line.trim().is_empty() {
                log::debug!("Skipping taxDB line {}: expected 4 fields", line_no + 1);
            }
            continue;
        }

        let taxid = parse_taxid_field(parts[0])?;
        let parentid = parse_taxid_field(parts[1])?;

        parent_map.insert(taxid, parentid);
        name_map.insert(taxid, parts[2].trim().to_string());
        rank_map.insert(taxid, parts[3].trim().to_string());
    }

    log::info!(
        "Parsed {} taxa from {}",
        parent_map.len(),
        filepath.as_ref().display()
    );
    Ok((parent_map, name_map, rank_map))
}

fn parse_taxid_field(field: &str) -> Result<u32> {
    let field = field.trim();
    field
        .parse()
        .map_err(|_| LineageError::InvalidTaxid(field.to_string()))
}

impl Taxonomy {
    pub fn from_taxdb<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let (parent_map, name_map, rank_map) = parse_taxdb(filepath)?;
        Ok(Taxonomy::from_maps(parent_map, name_map, rank_map))
    }
}

/// Writes the taxonomy in taxDB format, ordered by taxid.
pub fn format_taxdb(taxonomy: &Taxonomy) -> String {
    let mut output = String::new();
    for taxid in taxonomy.tax_ids() {
        writeln!(
            output,
            "{}\t{}\t{}\t{}",
            taxid,
            taxonomy.parent(taxid).unwrap_or(taxid),
            taxonomy.name(taxid).unwrap_or_default(),
            taxonomy.rank_str(taxid).unwrap_or_default()
        )
        .unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage_parser::parse_lineage_listing;
    use std::fs;

    const WRAPPED: &str = include_str!("../testdata/taxid_list_wrapped.txt");

    #[test]
    fn test_format_then_parse_taxdb() {
        let taxonomy = Taxonomy::from_records(&parse_lineage_listing(WRAPPED).unwrap());
        let text = format_taxdb(&taxonomy);
        assert!(text.starts_with("1\t1\troot\tno rank\n2\t131567\tBacteria\tsuperkingdom\n"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxDB");
        fs::write(&path, &text).unwrap();

        let loaded = Taxonomy::from_taxdb(&path).unwrap();
        assert_eq!(loaded.len(), taxonomy.len());
        assert_eq!(loaded.lineage(451709), taxonomy.lineage(451709));
        assert_eq!(loaded.name(86661), Some("Bacillus cereus group"));
    }

    #[test]
    fn test_short_lines_skipped_bad_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxDB");

        fs::write(&path, "1\t1\troot\tno rank\n\n2\t1\tBacteria\n").unwrap();
        let (parents, names, _) = parse_taxdb(&path).unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(names[&1], "root");

        fs::write(&path, "x\t1\troot\tno rank\n").unwrap();
        assert!(matches!(parse_taxdb(&path), Err(LineageError::InvalidTaxid(_))));
    }
}
