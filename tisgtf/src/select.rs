//! Filtering of prediction records and selection of one record per transcript and TIS type.
//!
//! Filtering happens in two phases. The whole table is first scanned once to find out which
//! q-value columns hold any value at all; a q-value threshold only takes effect when its column
//! does. Each record is then checked against all thresholds independently.
//!
//! After filtering, records are sorted by the selection column in descending order and the first
//! record of each (transcript identifier, TIS type) pair is kept.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use log::{debug, info};

use crate::{PredictionRecord, PredictionTable, RibotishError};


/// Columns that records can be selected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectColumn {
    AaLen,
    InFrameCount,
    TisQvalue,
    FrameQvalue,
    FisherQvalue,
}

impl SelectColumn {

    /// Column names, as they appear in the prediction table header.
    pub const NAMES: [&'static str; 5] =
        ["AALen", "InFrameCount", "TISQvalue", "FrameQvalue", "FisherQvalue"];

    /// The q-value columns.
    pub const QVALUES: [SelectColumn; 3] =
        [SelectColumn::TisQvalue, SelectColumn::FrameQvalue, SelectColumn::FisherQvalue];

    /// Returns the column name, as it appears in the prediction table header.
    pub fn name(&self) -> &'static str {
        match self {
            SelectColumn::AaLen => Self::NAMES[0],
            SelectColumn::InFrameCount => Self::NAMES[1],
            SelectColumn::TisQvalue => Self::NAMES[2],
            SelectColumn::FrameQvalue => Self::NAMES[3],
            SelectColumn::FisherQvalue => Self::NAMES[4],
        }
    }

    /// Whether the column holds q-values, which may be missing.
    pub fn is_qvalue(&self) -> bool {
        !matches!(self, SelectColumn::AaLen | SelectColumn::InFrameCount)
    }

    /// Returns the value of the column in the given record.
    pub fn value(&self, record: &PredictionRecord) -> Option<f64> {
        match self {
            SelectColumn::AaLen => Some(record.aa_len() as f64),
            SelectColumn::InFrameCount => Some(record.in_frame_count() as f64),
            SelectColumn::TisQvalue => record.tis_qvalue(),
            SelectColumn::FrameQvalue => record.frame_qvalue(),
            SelectColumn::FisherQvalue => record.fisher_qvalue(),
        }
    }
}

impl FromStr for SelectColumn {

    type Err = RibotishError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "AALen" => Ok(SelectColumn::AaLen),
            "InFrameCount" => Ok(SelectColumn::InFrameCount),
            "TISQvalue" => Ok(SelectColumn::TisQvalue),
            "FrameQvalue" => Ok(SelectColumn::FrameQvalue),
            "FisherQvalue" => Ok(SelectColumn::FisherQvalue),
            other => Err(RibotishError::UnknownSelectColumn(other.to_owned())),
        }
    }
}

impl fmt::Display for SelectColumn {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which q-value columns hold at least one value in a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QvalueColumns {
    tis: bool,
    frame: bool,
    fisher: bool,
}

impl QvalueColumns {

    /// Scans all records once.
    pub fn scan(records: &[PredictionRecord]) -> Self {
        records.iter().fold(QvalueColumns::default(), |acc, rec| QvalueColumns {
            tis: acc.tis || rec.tis_qvalue().is_some(),
            frame: acc.frame || rec.frame_qvalue().is_some(),
            fisher: acc.fisher || rec.fisher_qvalue().is_some(),
        })
    }

    /// Whether the given column holds any value.
    ///
    /// Columns that can not be missing are always active.
    pub fn is_active(&self, column: SelectColumn) -> bool {
        match column {
            SelectColumn::TisQvalue => self.tis,
            SelectColumn::FrameQvalue => self.frame,
            SelectColumn::FisherQvalue => self.fisher,
            SelectColumn::AaLen | SelectColumn::InFrameCount => true,
        }
    }
}

/// Filtering thresholds and the selection column.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    min_aa_len: i64,
    min_in_frame_count: i64,
    max_tis_qvalue: f64,
    max_frame_qvalue: f64,
    max_fisher_qvalue: f64,
    gene_type: Option<String>,
    tis_type: Option<String>,
    select_on: SelectColumn,
}

impl Criteria {

    /// Creates criteria that select on the given column.
    ///
    /// The minimum amino acid length and in-frame count default to 1, all maximum q-values
    /// default to 1.0, and records of any gene or TIS type are accepted.
    pub fn new(select_on: SelectColumn) -> Self {
        Criteria {
            min_aa_len: 1,
            min_in_frame_count: 1,
            max_tis_qvalue: 1.0,
            max_frame_qvalue: 1.0,
            max_fisher_qvalue: 1.0,
            gene_type: None,
            tis_type: None,
            select_on,
        }
    }

    /// Sets the minimum amino acid length.
    pub fn min_aa_len(&mut self, value: i64) -> &mut Self {
        self.min_aa_len = value;
        self
    }

    /// Sets the minimum in-frame count.
    pub fn min_in_frame_count(&mut self, value: i64) -> &mut Self {
        self.min_in_frame_count = value;
        self
    }

    /// Sets the maximum TIS q-value.
    pub fn max_tis_qvalue(&mut self, value: f64) -> &mut Self {
        self.max_tis_qvalue = value;
        self
    }

    /// Sets the maximum frame q-value.
    pub fn max_frame_qvalue(&mut self, value: f64) -> &mut Self {
        self.max_frame_qvalue = value;
        self
    }

    /// Sets the maximum Fisher's q-value.
    pub fn max_fisher_qvalue(&mut self, value: f64) -> &mut Self {
        self.max_fisher_qvalue = value;
        self
    }

    /// Sets the gene type records must have, or accepts any gene type if `None`.
    pub fn gene_type<T>(&mut self, gene_type: Option<T>) -> &mut Self
        where T: Into<String>
    {
        self.gene_type = gene_type.map(|v| v.into());
        self
    }

    /// Sets the TIS type records must have, or accepts any TIS type if `None`.
    pub fn tis_type<T>(&mut self, tis_type: Option<T>) -> &mut Self
        where T: Into<String>
    {
        self.tis_type = tis_type.map(|v| v.into());
        self
    }

    /// Returns the maximum value allowed for the given q-value column.
    fn max_qvalue(&self, column: SelectColumn) -> f64 {
        match column {
            SelectColumn::TisQvalue => self.max_tis_qvalue,
            SelectColumn::FrameQvalue => self.max_frame_qvalue,
            SelectColumn::FisherQvalue => self.max_fisher_qvalue,
            SelectColumn::AaLen | SelectColumn::InFrameCount => ::std::f64::INFINITY,
        }
    }

    /// Whether the record passes all thresholds, given which q-value columns are active.
    ///
    /// A record with a missing q-value fails the threshold of an active column.
    pub fn passes(&self, record: &PredictionRecord, active: &QvalueColumns) -> bool {
        if record.aa_len() < self.min_aa_len {
            return false;
        }
        if record.in_frame_count() < self.min_in_frame_count {
            return false;
        }
        let qvalues_pass = SelectColumn::QVALUES.iter()
            .filter(|col| active.is_active(**col))
            .all(|col| col.value(record).map_or(false, |v| v <= self.max_qvalue(*col)));
        if !qvalues_pass {
            return false;
        }
        if let Some(ref gene_type) = self.gene_type {
            if record.gene_type() != Some(gene_type.as_str()) {
                return false;
            }
        }
        if let Some(ref tis_type) = self.tis_type {
            if record.tis_type() != tis_type.as_str() {
                return false;
            }
        }
        true
    }

    /// Keeps the records that pass all thresholds, in their original order.
    ///
    /// Q-value column activity is determined from all given records.
    pub fn filter(&self, records: Vec<PredictionRecord>) -> Vec<PredictionRecord> {
        let active = QvalueColumns::scan(&records);
        for col in SelectColumn::QVALUES.iter().filter(|col| !active.is_active(**col)) {
            info!("Column {} has no values, skipping its threshold", col);
        }
        records.into_iter()
            .filter(|rec| self.passes(rec, &active))
            .collect()
    }

    /// Keeps the record with the largest selection column value for each transcript identifier
    /// and TIS type pair.
    ///
    /// Records are returned sorted by the selection column in descending order, with missing
    /// values last. Ties keep their input order, so the earliest record of a tied group wins.
    pub fn select(&self, mut records: Vec<PredictionRecord>) -> Vec<PredictionRecord> {
        let column = self.select_on;
        records.sort_by(|a, b| descending(column.value(a), column.value(b)));
        records.into_iter()
            .unique_by(|rec| (rec.transcript_id().to_owned(), rec.tis_type().to_owned()))
            .collect()
    }

    /// Filters the table and selects its best records.
    ///
    /// An error is returned if a gene type is required but the table has no gene type column.
    pub fn apply(&self, table: PredictionTable) -> crate::Result<PredictionTable> {
        if self.gene_type.is_some() && !table.has_gene_type() {
            let err = RibotishError::MissingColumn("GeneType".to_owned());
            return Err(crate::Error::from(err));
        }
        let (headers, records) = table.into_parts();
        let num_input = records.len();

        let filtered = self.filter(records);
        info!("{} of {} predictions passed the filters", filtered.len(), num_input);

        let selected = self.select(filtered);
        debug!("Selected on {}", self.select_on);
        info!("{} predictions selected", selected.len());

        Ok(PredictionTable::new(headers, selected))
    }
}

/// Orders values from largest to smallest, with missing values last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
