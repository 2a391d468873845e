//! Codecs turn one tab-separated line, projected from a table row, into a feature.
//!
//! A codec is picked once per table by [`codec_for_format`] from the table's format
//! name, then handed to the engine.
use std::collections::HashMap;

use thiserror::Error;

use binq_core::models::Region;

use crate::errors::{QueryError, Result};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Expected at least {expected} columns, found {found}: {line:?}")]
    MissingColumns {
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("Error parsing {field} position: {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("Feature end {end} is before start {start}")]
    InvalidInterval { start: u32, end: u32 },
}

pub trait FeatureCodec {
    type Feature;

    fn decode(&self, line: &str) -> std::result::Result<Self::Feature, DecodeError>;
}

///
/// Chromosome name aliases of the active reference genome, e.g. `1 -> chr1`.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromAliases {
    aliases: HashMap<String, String>,
}

impl ChromAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        ChromAliases { aliases }
    }

    /// Canonical name of `chr`, or `chr` itself if it has no alias.
    pub fn canonical<'a>(&'a self, chr: &'a str) -> &'a str {
        self.aliases.get(chr).map(String::as_str).unwrap_or(chr)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl From<HashMap<String, String>> for ChromAliases {
    fn from(aliases: HashMap<String, String>) -> Self {
        ChromAliases::new(aliases)
    }
}

fn parse_position(field: &'static str, value: &str) -> std::result::Result<u32, DecodeError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| DecodeError::InvalidCoordinate {
            field,
            value: value.to_string(),
        })
}

fn checked_interval(start: u32, end: u32) -> std::result::Result<(u32, u32), DecodeError> {
    match end < start {
        true => Err(DecodeError::InvalidInterval { start, end }),
        false => Ok((start, end)),
    }
}

///
/// BED3 and wider: `chrom start end [name score strand ...]`.
/// Everything past the third column is kept verbatim in [`Region::rest`].
///
#[derive(Debug, Clone, Default)]
pub struct BedCodec {
    aliases: ChromAliases,
}

impl BedCodec {
    pub fn new(aliases: ChromAliases) -> Self {
        BedCodec { aliases }
    }
}

impl FeatureCodec for BedCodec {
    type Feature = Region;

    fn decode(&self, line: &str) -> std::result::Result<Region, DecodeError> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(DecodeError::MissingColumns {
                expected: 3,
                found: parts.len(),
                line: line.to_string(),
            });
        }

        let (start, end) = checked_interval(
            parse_position("start", parts[1])?,
            parse_position("end", parts[2])?,
        )?;

        Ok(Region {
            chr: self.aliases.canonical(parts[0]).to_string(),
            start,
            end,
            rest: Some(parts[3..].join("\t")).filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenePredFlavor {
    /// `name chrom strand txStart txEnd cdsStart cdsEnd exonCount exonStarts exonEnds ...`
    GenePred,
    /// refFlat prepends the gene symbol: `geneName name chrom strand txStart ...`
    RefFlat,
}

///
/// UCSC gene prediction tables. The feature spans the transcript and its `rest`
/// is BED6-shaped: `name\t0\tstrand`.
///
#[derive(Debug, Clone)]
pub struct GenePredCodec {
    flavor: GenePredFlavor,
    aliases: ChromAliases,
}

impl GenePredCodec {
    pub fn new(flavor: GenePredFlavor, aliases: ChromAliases) -> Self {
        GenePredCodec { flavor, aliases }
    }

    pub fn flavor(&self) -> GenePredFlavor {
        self.flavor
    }
}

impl FeatureCodec for GenePredCodec {
    type Feature = Region;

    fn decode(&self, line: &str) -> std::result::Result<Region, DecodeError> {
        let offset = match self.flavor {
            GenePredFlavor::GenePred => 0,
            GenePredFlavor::RefFlat => 1,
        };

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < offset + 5 {
            return Err(DecodeError::MissingColumns {
                expected: offset + 5,
                found: parts.len(),
                line: line.to_string(),
            });
        }

        // the gene symbol for refFlat, the transcript name for genePred
        let name = parts[0];
        let chr = parts[offset + 1];
        let strand = parts[offset + 2];
        let (start, end) = checked_interval(
            parse_position("txStart", parts[offset + 3])?,
            parse_position("txEnd", parts[offset + 4])?,
        )?;

        Ok(Region {
            chr: self.aliases.canonical(chr).to_string(),
            start,
            end,
            rest: Some(format!("{}\t0\t{}", name, strand)),
        })
    }
}

/// The codecs shipped with binq, chosen by [`codec_for_format`].
#[derive(Debug, Clone)]
pub enum AnyCodec {
    Bed(BedCodec),
    GenePred(GenePredCodec),
}

impl FeatureCodec for AnyCodec {
    type Feature = Region;

    fn decode(&self, line: &str) -> std::result::Result<Region, DecodeError> {
        match self {
            AnyCodec::Bed(codec) => codec.decode(line),
            AnyCodec::GenePred(codec) => codec.decode(line),
        }
    }
}

///
/// Pick the codec for a format name such as `bed`, `.refGene` or `refFlat`.
///
/// # Arguments
/// - format: format name or file extension, case-insensitive
/// - aliases: chromosome aliases of the active reference genome
///
pub fn codec_for_format(format: &str, aliases: Option<&ChromAliases>) -> Result<AnyCodec> {
    let aliases = aliases.cloned().unwrap_or_default();
    let normalized = format.trim().trim_start_matches('.').to_lowercase();

    match normalized.as_str() {
        "bed" | "narrowpeak" | "broadpeak" => Ok(AnyCodec::Bed(BedCodec::new(aliases))),
        "genepred" | "refgene" | "ucscgene" => Ok(AnyCodec::GenePred(GenePredCodec::new(
            GenePredFlavor::GenePred,
            aliases,
        ))),
        "refflat" => Ok(AnyCodec::GenePred(GenePredCodec::new(
            GenePredFlavor::RefFlat,
            aliases,
        ))),
        _ => Err(QueryError::ConfigurationError(format!(
            "No codec available for format {:?}",
            format
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn aliases() -> ChromAliases {
        ChromAliases::from(HashMap::from([
            ("1".to_string(), "chr1".to_string()),
            ("MT".to_string(), "chrM".to_string()),
        ]))
    }

    #[rstest]
    fn test_bed_decode() {
        let region = BedCodec::default()
            .decode("chr1\t32481\t32787\tSRX4150706.05_peak_1\t92\t.")
            .unwrap();
        assert_eq!(region.chr, "chr1");
        assert_eq!(region.start, 32481);
        assert_eq!(region.end, 32787);
        assert_eq!(region.rest.as_deref(), Some("SRX4150706.05_peak_1\t92\t."));
    }

    #[rstest]
    fn test_bed3_decode_has_no_rest() {
        let region = BedCodec::default().decode("chr2\t0\t10").unwrap();
        assert_eq!(region.rest, None);
    }

    #[rstest]
    #[case("chr1\t100", DecodeError::MissingColumns { expected: 3, found: 2, line: "chr1\t100".to_string() })]
    #[case("chr1\tabc\t200", DecodeError::InvalidCoordinate { field: "start", value: "abc".to_string() })]
    #[case("chr1\t100\t-5", DecodeError::InvalidCoordinate { field: "end", value: "-5".to_string() })]
    #[case("chr1\t300\t200", DecodeError::InvalidInterval { start: 300, end: 200 })]
    fn test_bed_decode_errors(#[case] line: &str, #[case] expected: DecodeError) {
        assert_eq!(BedCodec::default().decode(line).unwrap_err(), expected);
    }

    #[rstest]
    fn test_aliases_canonicalize_chromosomes(aliases: ChromAliases) {
        let codec = BedCodec::new(aliases);
        assert_eq!(codec.decode("1\t5\t10").unwrap().chr, "chr1");
        assert_eq!(codec.decode("MT\t5\t10").unwrap().chr, "chrM");
        assert_eq!(codec.decode("chr7\t5\t10").unwrap().chr, "chr7");
    }

    #[rstest]
    fn test_genepred_decode(aliases: ChromAliases) {
        let codec = GenePredCodec::new(GenePredFlavor::GenePred, aliases);
        let region = codec
            .decode("NM_032291\t1\t+\t66999824\t67210768\t67000041\t67208778\t25\t66999824,\t67000051,")
            .unwrap();
        assert_eq!(
            region,
            Region {
                chr: "chr1".to_string(),
                start: 66999824,
                end: 67210768,
                rest: Some("NM_032291\t0\t+".to_string()),
            }
        );
    }

    #[rstest]
    fn test_refflat_decode() {
        let codec = GenePredCodec::new(GenePredFlavor::RefFlat, ChromAliases::default());
        let region = codec
            .decode("SGIP1\tNM_032291\tchr1\t+\t66999824\t67210768\t67000041\t67208778")
            .unwrap();
        assert_eq!(region.as_string(), "chr1\t66999824\t67210768\tSGIP1\t0\t+");
    }

    #[rstest]
    fn test_genepred_decode_too_short() {
        let codec = GenePredCodec::new(GenePredFlavor::RefFlat, ChromAliases::default());
        assert!(matches!(
            codec.decode("SGIP1\tNM_032291\tchr1\t+\t66999824"),
            Err(DecodeError::MissingColumns { expected: 6, found: 5, .. })
        ));
    }

    #[rstest]
    #[case("bed")]
    #[case(".BED")]
    #[case("narrowPeak")]
    fn test_codec_for_format_bed(#[case] format: &str) {
        assert!(matches!(
            codec_for_format(format, None).unwrap(),
            AnyCodec::Bed(_)
        ));
    }

    #[rstest]
    #[case("refGene", GenePredFlavor::GenePred)]
    #[case(".genePred", GenePredFlavor::GenePred)]
    #[case("ucscgene", GenePredFlavor::GenePred)]
    #[case("refFlat", GenePredFlavor::RefFlat)]
    fn test_codec_for_format_genepred(#[case] format: &str, #[case] flavor: GenePredFlavor) {
        match codec_for_format(format, None).unwrap() {
            AnyCodec::GenePred(codec) => assert_eq!(codec.flavor(), flavor),
            other => panic!("expected a genePred codec, got {:?}", other),
        }
    }

    #[rstest]
    fn test_codec_for_format_unknown() {
        assert!(matches!(
            codec_for_format("wig", None),
            Err(QueryError::ConfigurationError(_))
        ));
    }

    #[rstest]
    fn test_codec_for_format_uses_aliases(aliases: ChromAliases) {
        let codec = codec_for_format("bed", Some(&aliases)).unwrap();
        assert_eq!(codec.decode("1\t0\t1").unwrap().chr, "chr1");
    }
}
