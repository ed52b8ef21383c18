//src/rank.rs

use std::fmt;
use std::str::FromStr;

/// Taxonomic ranks from superkingdom to strain. Ranks outside the main
/// ladder (e.g. "species group", "tribe") are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaxonomicRank {
    Superkingdom,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
    Strain,
    NoRank,
    Other(String),
}

/// Ranks evaluated by default when comparing listings.
pub static STANDARD_RANKS: [TaxonomicRank; 7] = [
    TaxonomicRank::Superkingdom,
    TaxonomicRank::Phylum,
    TaxonomicRank::Class,
    TaxonomicRank::Order,
    TaxonomicRank::Family,
    TaxonomicRank::Genus,
    TaxonomicRank::Species,
];

impl TaxonomicRank {
    /// Parse rank from an NCBI rank string. Never fails.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "superkingdom" | "domain" => Self::Superkingdom,
            "kingdom" => Self::Kingdom,
            "phylum" => Self::Phylum,
            "class" => Self::Class,
            "order" => Self::Order,
            "family" => Self::Family,
            "genus" => Self::Genus,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "strain" | "varietas" | "forma" => Self::Strain,
            "no rank" | "norank" | "" => Self::NoRank,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get rank depth for ordering (lower = higher in hierarchy)
    pub fn depth(&self) -> u32 {
        match self {
            Self::Superkingdom => 0,
            Self::Kingdom => 1,
            Self::Phylum => 2,
            Self::Class => 3,
            Self::Order => 4,
            Self::Family => 5,
            Self::Genus => 6,
            Self::Species => 7,
            Self::Subspecies => 8,
            Self::Strain => 9,
            Self::NoRank => 10,
            Self::Other(_) => 11,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Superkingdom => "superkingdom",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Strain => "strain",
            Self::NoRank => "no rank",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for TaxonomicRank {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for TaxonomicRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranks() {
        assert_eq!(TaxonomicRank::parse("Species"), TaxonomicRank::Species);
        assert_eq!(TaxonomicRank::parse("no rank"), TaxonomicRank::NoRank);
        assert_eq!(TaxonomicRank::parse("domain"), TaxonomicRank::Superkingdom);
        assert_eq!(
            TaxonomicRank::parse("species group"),
            TaxonomicRank::Other("species group".to_string())
        );
    }

    #[test]
    fn test_standard_ranks_ordered() {
        let depths: Vec<u32> = STANDARD_RANKS.iter().map(|r| r.depth()).collect();
        assert!(depths.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(TaxonomicRank::Other("tribe".into()).to_string(), "tribe");
    }
}
