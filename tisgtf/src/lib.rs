//! Filtering of Ribo-TISH ORF predictions and their conversion into GTF annotations.
//!
//! The crate is organized around a single pass: a prediction table is read with
//! [`RibotishReader`], narrowed down with [`Criteria`], and merged into a reference annotation
//! with [`merge_annotations`].
#![deny(
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unstable_features,
        unused_import_braces)]
#![warn(unused_results)]

#[macro_use]
extern crate quick_error;

use std::io;

use bio::utils::IntervalError;
use csv::Error as CsvError;
use regex::Error as RegexError;

mod model;
pub use crate::model::{Block, GenomePos};

mod io_ribotish;
pub use crate::io_ribotish::{Reader as RibotishReader, Writer as RibotishWriter,
                             PredictionRecord, PredictionTable, RibotishError};

mod select;
pub use crate::select::{Criteria, QvalueColumns, SelectColumn};

mod io_gtf;
pub use crate::io_gtf::{Reader as GtfReader, Writer as GtfWriter,
                        GtfError, GtfRecord, GtfRecordsStream};

mod merge;
pub use crate::merge::{merge_annotations, MergeSummary};


quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Ribotish(err: RibotishError) {
            display("{}", err)
            from()
            cause(err)
        }
        Gtf(err: GtfError) {
            display("{}", err)
            from()
            cause(err)
        }
        Interval(err: IntervalError) {
            display("{}", err)
            from()
            cause(err)
        }
        Regex(err: RegexError) {
            display("{}", err)
            from()
            cause(err)
        }
        Csv(err: CsvError) {
            display("{}", err)
            from()
            cause(err)
        }
        Io(err: io::Error) {
            display("{}", err)
            from()
            cause(err)
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

// Crate-wide constants
mod consts {
    // Feature column values of reference lines that are carried over.
    pub(crate) const TRANSCRIPT_STR: &str = "transcript";
    pub(crate) const EXON_STR: &str = "exon";

    // Column values of synthesized CDS lines.
    pub(crate) const CDS_STR: &str = "CDS";
    pub(crate) const CDS_SOURCE_STR: &str = "ribotish";
    pub(crate) const CDS_FRAME_STR: &str = "0";

    // Value for unknown columns.
    pub(crate) const UNK_STR: &str = ".";

    // Commonly-used attribute keys.
    pub(crate) const GENE_ID_STR: &str = "gene_id";
    pub(crate) const TRANSCRIPT_ID_STR: &str = "transcript_id";
    pub(crate) const GENE_NAME_STR: &str = "gene_name";
    pub(crate) const GENE_TYPE_STR: &str = "gene_type";

    // Gene type written when the prediction does not carry one.
    pub(crate) const UNK_GENE_TYPE: &str = "unknown";
}
