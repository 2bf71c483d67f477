//! Genomic locations carried by Ribo-TISH predictions.

use std::str::FromStr;

use bio::utils::Interval;

use crate::RibotishError;


/// Location of a predicted ORF, parsed from the `GenomePos` column.
///
/// Ribo-TISH writes the column as `chrom:start-end:strand`. Only the sequence name and the strand
/// are needed for placing CDS features, so the middle field is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomePos {
    seq_name: String,
    strand: String,
}

impl GenomePos {

    /// Returns the sequence name, the first colon-delimited field.
    pub fn seq_name(&self) -> &str {
        self.seq_name.as_str()
    }

    /// Returns the strand, the third colon-delimited field.
    pub fn strand(&self) -> &str {
        self.strand.as_str()
    }
}

impl FromStr for GenomePos {

    type Err = RibotishError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut fields = raw.split(':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(seq_name), Some(_), Some(strand)) => Ok(GenomePos {
                seq_name: seq_name.to_owned(),
                strand: strand.to_owned(),
            }),
            _ => Err(RibotishError::InvalidGenomePos(raw.to_owned())),
        }
    }
}

/// A single coding segment of a predicted ORF.
///
/// Coordinates are zero-based, half-open, as written in the `Blocks` column.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    interval: Interval<u64>,
}

impl Block {

    /// Creates a block from zero-based, half-open coordinates.
    ///
    /// An error is returned if the end coordinate is smaller than the start coordinate.
    pub fn new(start: u64, end: u64) -> crate::Result<Self> {
        Interval::new(start..end)
            .map(|interval| Block { interval })
            .map_err(crate::Error::from)
    }

    /// Parses a comma-separated list of `start-end` ranges, keeping their order.
    pub fn parse_list(raw: &str) -> crate::Result<Vec<Self>> {
        raw.split(',').map(Block::from_str).collect()
    }

    pub fn start(&self) -> u64 {
        self.interval.start
    }

    pub fn end(&self) -> u64 {
        self.interval.end
    }

    /// Returns the one-based, fully-closed coordinates used by GTF.
    ///
    /// An error is returned if the start coordinate can not be shifted to one-based.
    pub fn gtf_coord(&self) -> crate::Result<(u64, u64)> {
        let start = self.start().checked_add(1)
            .ok_or_else(|| RibotishError::InvalidBlock(format!("{}-{}", self.start(), self.end())))?;
        Ok((start, self.end()))
    }
}

impl FromStr for Block {

    type Err = crate::Error;

    fn from_str(raw: &str) -> crate::Result<Self> {
        let invalid = || crate::Error::from(RibotishError::InvalidBlock(raw.to_owned()));
        let (raw_start, raw_end) = raw.split_once('-').ok_or_else(invalid)?;
        let start = raw_start.trim().parse::<u64>().map_err(|_| invalid())?;
        let end = raw_end.trim().parse::<u64>().map_err(|_| invalid())?;
        Block::new(start, end)
    }
}


#[cfg(test)]
mod test_block {
    use super::*;

    #[test]
    fn from_str() {
        let block = "10-50".parse::<Block>().unwrap();
        assert_eq!(block.start(), 10);
        assert_eq!(block.end(), 50);
        assert_eq!(block.gtf_coord().unwrap(), (11, 50));
    }

    #[test]
    fn gtf_coord_max_start() {
        let block = "18446744073709551615-18446744073709551615".parse::<Block>().unwrap();
        let res = block.gtf_coord();
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::InvalidBlock(_)))));
    }

    #[test]
    fn from_str_no_separator() {
        let res = "1050".parse::<Block>();
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::InvalidBlock(_)))));
    }

    #[test]
    fn from_str_not_a_number() {
        let res = "a-50".parse::<Block>();
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::InvalidBlock(_)))));
        let res = "10-20-30".parse::<Block>();
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::InvalidBlock(_)))));
    }

    #[test]
    fn from_str_inverted() {
        let res = "50-10".parse::<Block>();
        assert!(matches!(res, Err(crate::Error::Interval(_))));
    }

    #[test]
    fn parse_list() {
        let blocks = Block::parse_list("10-50,60-80").unwrap();
        let coords = blocks.iter().map(|b| (b.start(), b.end())).collect::<Vec<_>>();
        assert_eq!(coords, vec![(10, 50), (60, 80)]);
    }

    #[test]
    fn parse_list_keeps_order() {
        let blocks = Block::parse_list("60-80,10-50").unwrap();
        assert_eq!(blocks[0].start(), 60);
        assert_eq!(blocks[1].start(), 10);
    }

    #[test]
    fn parse_list_empty() {
        assert!(Block::parse_list("").is_err());
    }
}
