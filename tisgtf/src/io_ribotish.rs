/*! Reader and writer for Ribo-TISH prediction tables.

The prediction table is the tab-separated output of `ribotish predict`, in which each candidate ORF
is denoted in a single row. A description of the columns can be found in the
[Ribo-TISH documentation](https://github.com/zhpn1024/ribotish).

Only the columns needed for filtering and for building CDS features are interpreted. All other
columns are kept as raw values, so that the filtered table can be written back out.
*/
use std::fs;
use std::io;
use std::iter;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::{Block, GenomePos, SelectColumn};


/// Name of the transcript identifier column.
const TID_STR: &str = "Tid";

/// Name of the TIS type column.
const TIS_TYPE_STR: &str = "TisType";

/// Name of the gene identifier column.
const GID_STR: &str = "Gid";

/// Name of the gene symbol column.
const SYMBOL_STR: &str = "Symbol";

/// Name of the optional gene type column.
const GENE_TYPE_STR: &str = "GeneType";

/// Name of the amino acid length column.
const AA_LEN_STR: &str = "AALen";

/// Name of the in-frame count column.
const IN_FRAME_COUNT_STR: &str = "InFrameCount";

/// Name of the TIS q-value column.
const TIS_QVALUE_STR: &str = "TISQvalue";

/// Name of the frame q-value column.
const FRAME_QVALUE_STR: &str = "FrameQvalue";

/// Name of the Fisher's q-value column.
const FISHER_QVALUE_STR: &str = "FisherQvalue";

/// Name of the genome position column.
const GENOME_POS_STR: &str = "GenomePos";

/// Name of the blocks column.
const BLOCKS_STR: &str = "Blocks";

/// Columns that must be present in the header.
const REQUIRED_COLUMNS: [&str; 11] = [
    TID_STR, TIS_TYPE_STR, GID_STR, SYMBOL_STR, AA_LEN_STR, IN_FRAME_COUNT_STR,
    TIS_QVALUE_STR, FRAME_QVALUE_STR, FISHER_QVALUE_STR, GENOME_POS_STR, BLOCKS_STR,
];

quick_error! {
    /// Errors that occur when reading or writing Ribo-TISH prediction tables.
    #[derive(Debug)]
    pub enum RibotishError {
        /// Occurs when a column required for filtering or conversion is absent from the header.
        MissingColumn(name: String) {
            display("required column '{}' not found in header", name)
        }
        /// Occurs when a column name is not one of the columns predictions can be selected on.
        UnknownSelectColumn(name: String) {
            display("column '{}' can not be used for selection", name)
        }
        /// Occurs when the genome position value does not have three colon-delimited fields.
        InvalidGenomePos(value: String) {
            display("genome position '{}' is not in the 'chrom:span:strand' form", value)
        }
        /// Occurs when a blocks entry is not a 'start-end' pair of coordinates.
        InvalidBlock(value: String) {
            display("block '{}' is not in the 'start-end' form", value)
        }
        /// Errors propagated from the underlying `csv` crate.
        Csv(err: csv::Error) {
            display("{}", err)
            from()
            cause(err)
        }
    }
}

/// Raw prediction row type.
///
/// This is the type the `csv` crate deserializes each row into, before it is turned into a
/// `PredictionRecord`. Q-value columns that do not hold a number, such as `None`, are read as
/// missing values.
#[derive(Debug, Deserialize)]
struct PredictionRow {
    #[serde(rename = "Tid")]
    transcript_id: String,
    #[serde(rename = "TisType")]
    tis_type: String,
    #[serde(rename = "Gid")]
    gene_id: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "GeneType", default)]
    gene_type: Option<String>,
    #[serde(rename = "AALen")]
    aa_len: i64,
    #[serde(rename = "InFrameCount")]
    in_frame_count: i64,
    #[serde(rename = "TISQvalue", deserialize_with = "csv::invalid_option")]
    tis_qvalue: Option<f64>,
    #[serde(rename = "FrameQvalue", deserialize_with = "csv::invalid_option")]
    frame_qvalue: Option<f64>,
    #[serde(rename = "FisherQvalue", deserialize_with = "csv::invalid_option")]
    fisher_qvalue: Option<f64>,
    #[serde(rename = "GenomePos")]
    genome_pos: String,
    #[serde(rename = "Blocks")]
    blocks: String,
}

/// Ribo-TISH prediction record.
///
/// Besides the interpreted column values, a record keeps its zero-based row index in the input
/// table and all of its raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    index: usize,
    transcript_id: String,
    tis_type: String,
    gene_id: String,
    symbol: String,
    gene_type: Option<String>,
    aa_len: i64,
    in_frame_count: i64,
    tis_qvalue: Option<f64>,
    frame_qvalue: Option<f64>,
    fisher_qvalue: Option<f64>,
    genome_pos: String,
    blocks: String,
    fields: csv::StringRecord,
}

impl PredictionRecord {

    /// Creates a record from a deserialized row and the raw values it was read from.
    fn from_row(index: usize, row: PredictionRow, fields: csv::StringRecord) -> Self {
        PredictionRecord {
            index,
            transcript_id: row.transcript_id,
            tis_type: row.tis_type,
            gene_id: row.gene_id,
            symbol: row.symbol,
            gene_type: row.gene_type.filter(|v| !v.is_empty()),
            aa_len: row.aa_len,
            in_frame_count: row.in_frame_count,
            tis_qvalue: row.tis_qvalue.filter(|v| !v.is_nan()),
            frame_qvalue: row.frame_qvalue.filter(|v| !v.is_nan()),
            fisher_qvalue: row.fisher_qvalue.filter(|v| !v.is_nan()),
            genome_pos: row.genome_pos,
            blocks: row.blocks,
            fields,
        }
    }

    /// Returns the zero-based index of the row in the input table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the transcript identifier.
    pub fn transcript_id(&self) -> &str {
        self.transcript_id.as_str()
    }

    /// Returns the TIS type, e.g. `Annotated` or `5'UTR`.
    pub fn tis_type(&self) -> &str {
        self.tis_type.as_str()
    }

    /// Returns the gene identifier.
    pub fn gene_id(&self) -> &str {
        self.gene_id.as_str()
    }

    /// Returns the gene symbol.
    pub fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    /// Returns the gene type, if the table has the column and the row has a value.
    pub fn gene_type(&self) -> Option<&str> {
        self.gene_type.as_deref()
    }

    /// Returns the length of the ORF in amino acids.
    pub fn aa_len(&self) -> i64 {
        self.aa_len
    }

    /// Returns the number of in-frame reads.
    pub fn in_frame_count(&self) -> i64 {
        self.in_frame_count
    }

    pub fn tis_qvalue(&self) -> Option<f64> {
        self.tis_qvalue
    }

    pub fn frame_qvalue(&self) -> Option<f64> {
        self.frame_qvalue
    }

    pub fn fisher_qvalue(&self) -> Option<f64> {
        self.fisher_qvalue
    }

    /// Returns the unparsed genome position value.
    pub fn raw_genome_pos(&self) -> &str {
        self.genome_pos.as_str()
    }

    /// Parses the genome position value.
    pub fn genome_pos(&self) -> crate::Result<GenomePos> {
        GenomePos::from_str(&self.genome_pos).map_err(crate::Error::from)
    }

    /// Returns the unparsed blocks value.
    pub fn raw_blocks(&self) -> &str {
        self.blocks.as_str()
    }

    /// Parses the blocks value, keeping the order in which the blocks are listed.
    pub fn blocks(&self) -> crate::Result<Vec<Block>> {
        Block::parse_list(&self.blocks)
    }

    /// Returns all raw values of the row.
    pub fn fields(&self) -> &csv::StringRecord {
        &self.fields
    }
}

/// In-memory prediction table.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    headers: csv::StringRecord,
    records: Vec<PredictionRecord>,
}

impl PredictionTable {

    /// Creates a table from the given header and records.
    pub fn new(headers: csv::StringRecord, records: Vec<PredictionRecord>) -> Self {
        PredictionTable { headers, records }
    }

    pub fn headers(&self) -> &csv::StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[PredictionRecord] {
        self.records.as_slice()
    }

    /// Splits the table into its header and records.
    pub fn into_parts(self) -> (csv::StringRecord, Vec<PredictionRecord>) {
        (self.headers, self.records)
    }

    /// Whether the optional gene type column is present.
    pub fn has_gene_type(&self) -> bool {
        self.headers.iter().any(|name| name == GENE_TYPE_STR)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ribo-TISH prediction table reader.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl<R: io::Read> Reader<R> {

    /// Creates a prediction table reader from another reader.
    pub fn from_reader(in_reader: R) -> Reader<R> {
        Reader {
            inner: csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .has_headers(true)
                .from_reader(in_reader),
        }
    }

    /// Reads the whole table into memory.
    ///
    /// This method will return an error if:
    /// * any of the required columns is missing from the header, or
    /// * the amino acid length or in-frame count of any row is not an integer.
    ///
    /// No row is dropped, whatever its values are.
    pub fn read_table(&mut self) -> crate::Result<PredictionTable> {
        let headers = self.inner.headers()
            .map_err(|e| crate::Error::from(RibotishError::from(e)))?
            .clone();
        check_headers(&headers)?;

        let mut records = Vec::new();
        for (index, result) in self.inner.records().enumerate() {
            let fields = result.map_err(|e| crate::Error::from(RibotishError::from(e)))?;
            let row: PredictionRow = fields.deserialize(Some(&headers))
                .map_err(|e| crate::Error::from(RibotishError::from(e)))?;
            records.push(PredictionRecord::from_row(index, row, fields));
        }
        Ok(PredictionTable::new(headers, records))
    }
}

impl Reader<fs::File> {

    /// Creates a prediction table reader that reads from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::from_reader)
    }
}

/// Checks that all required columns are present in the header.
fn check_headers(headers: &csv::StringRecord) -> Result<(), RibotishError> {
    for name in REQUIRED_COLUMNS.iter() {
        if !headers.iter().any(|h| h == *name) {
            return Err(RibotishError::MissingColumn((*name).to_owned()));
        }
    }
    Ok(())
}

/// Ribo-TISH prediction table writer.
///
/// Tables are written with a leading, unnamed column holding the input row index of each record.
/// Values are written as they were read, except for q-values that were not numbers, which are
/// written as empty cells.
pub struct Writer<W: io::Write> {
    inner: csv::Writer<W>,
}

impl<W: io::Write> Writer<W> {

    /// Creates a prediction table writer from another writer.
    pub fn from_writer(in_writer: W) -> Writer<W> {
        Writer {
            inner: csv::WriterBuilder::new()
                .delimiter(b'\t')
                .from_writer(in_writer),
        }
    }

    /// Writes the given table, header first.
    pub fn write_table(&mut self, table: &PredictionTable) -> crate::Result<()> {
        let header = iter::once("").chain(table.headers().iter());
        self.inner.write_record(header)
            .map_err(|e| crate::Error::from(RibotishError::from(e)))?;

        let qvalue_columns = table.headers().iter()
            .map(|name| SelectColumn::from_str(name).ok().filter(|col| col.is_qvalue()))
            .collect::<Vec<_>>();

        for record in table.records() {
            let index = record.index().to_string();
            let values = record.fields().iter().zip(qvalue_columns.iter())
                .map(|(field, column)| match column {
                    Some(col) if col.value(record).is_none() => "",
                    _ => field,
                });
            let row = iter::once(index.as_str()).chain(values);
            self.inner.write_record(row)
                .map_err(|e| crate::Error::from(RibotishError::from(e)))?;
        }
        self.inner.flush().map_err(crate::Error::from)
    }
}

impl Writer<fs::File> {

    /// Creates a prediction table writer that writes to the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let f = fs::File::create(path)?;
        Ok(Writer::from_writer(f))
    }
}

impl Writer<Vec<u8>> {

    /// Creates a prediction table writer that writes to an in-memory buffer.
    ///
    /// The initial capacity of the buffer is 64 KiB.
    pub fn from_memory() -> Writer<Vec<u8>> {
        Writer::from_writer(Vec::with_capacity(1024 * 64))
    }

    /// Consumes the writer and returns the contents of the in-memory buffer as a string.
    pub fn into_string(self) -> crate::Result<String> {
        self.inner.into_inner()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .map_err(|e| crate::Error::from(e.into_error()))
    }
}

#[cfg(test)]
mod test_reader {
    use super::*;

    const HEADER: &str = "Gid\tTid\tSymbol\tGeneType\tGenomePos\tStartCodon\tStart\tStop\tTisType\t\
                          TISGroup\tTISCounts\tTISPvalue\tRiboPStatus\tRiboPvalue\tFrameQvalue\t\
                          InFrameCount\tTISQvalue\tFisherQvalue\tAALen\tBlocks";

    fn read(rows: &[&str]) -> crate::Result<PredictionTable> {
        let mut text = HEADER.to_owned();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        Reader::from_reader(text.as_bytes()).read_table()
    }

    #[test]
    fn read_table() {
        let table = read(&[
            "G1\tT1\tABC\tprotein_coding\tchr1:100-200:+\tATG\t10\t80\t5'UTR\t\
             0\t12\t0.001\tT\t0.002\t0.02\t25\t0.01\t0.03\t60\t10-50,60-80",
        ]).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.has_gene_type());
        let rec = &table.records()[0];
        assert_eq!(rec.index(), 0);
        assert_eq!(rec.transcript_id(), "T1");
        assert_eq!(rec.tis_type(), "5'UTR");
        assert_eq!(rec.gene_id(), "G1");
        assert_eq!(rec.symbol(), "ABC");
        assert_eq!(rec.gene_type(), Some("protein_coding"));
        assert_eq!(rec.aa_len(), 60);
        assert_eq!(rec.in_frame_count(), 25);
        assert_eq!(rec.tis_qvalue(), Some(0.01));
        assert_eq!(rec.frame_qvalue(), Some(0.02));
        assert_eq!(rec.fisher_qvalue(), Some(0.03));
        assert_eq!(rec.raw_genome_pos(), "chr1:100-200:+");
        assert_eq!(rec.raw_blocks(), "10-50,60-80");
        assert_eq!(rec.fields().len(), 20);
    }

    #[test]
    fn read_table_unparseable_qvalues() {
        let table = read(&[
            "G1\tT1\tABC\tprotein_coding\tchr1:100-200:+\tATG\t10\t80\tuORF\t\
             0\t12\tNone\tT\tNone\tNone\t25\t\t0.5\t60\t10-50",
            "G1\tT2\tABC\tprotein_coding\tchr1:100-200:+\tATG\t10\t80\tuORF\t\
             0\t12\tNone\tT\tNone\tnan\t25\tabc\tNaN\t60\t10-50",
        ]).unwrap();
        let recs = table.records();
        assert_eq!(recs[0].frame_qvalue(), None);
        assert_eq!(recs[0].tis_qvalue(), None);
        assert_eq!(recs[0].fisher_qvalue(), Some(0.5));
        assert_eq!(recs[1].frame_qvalue(), None);
        assert_eq!(recs[1].tis_qvalue(), None);
        assert_eq!(recs[1].fisher_qvalue(), None);
        assert_eq!(recs[1].index(), 1);
    }

    #[test]
    fn read_table_empty_gene_type() {
        let table = read(&[
            "G1\tT1\tABC\t\tchr1:100-200:+\tATG\t10\t80\tuORF\t\
             0\t12\t0.1\tT\t0.1\t0.1\t25\t0.1\t0.1\t60\t10-50",
        ]).unwrap();
        assert_eq!(table.records()[0].gene_type(), None);
    }

    #[test]
    fn read_table_no_gene_type_column() {
        let text = "Tid\tTisType\tGid\tSymbol\tAALen\tInFrameCount\tTISQvalue\tFrameQvalue\t\
                    FisherQvalue\tGenomePos\tBlocks\n\
                    T1\tuORF\tG1\tABC\t30\t5\t0.1\t0.1\t0.1\tchr2:1-91:-\t0-90\n";
        let table = Reader::from_reader(text.as_bytes()).read_table().unwrap();
        assert!(!table.has_gene_type());
        assert_eq!(table.records()[0].gene_type(), None);
    }

    #[test]
    fn read_table_missing_column() {
        let text = "Tid\tTisType\tGid\tSymbol\tInFrameCount\tTISQvalue\tFrameQvalue\t\
                    FisherQvalue\tGenomePos\tBlocks\n";
        let res = Reader::from_reader(text.as_bytes()).read_table();
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::MissingColumn(ref c)))
                         if c == "AALen"));
    }

    #[test]
    fn read_table_invalid_integer() {
        let res = read(&[
            "G1\tT1\tABC\tprotein_coding\tchr1:100-200:+\tATG\t10\t80\tuORF\t\
             0\t12\t0.1\tT\t0.1\t0.1\tmany\t0.1\t0.1\t60\t10-50",
        ]);
        assert!(matches!(res, Err(crate::Error::Ribotish(RibotishError::Csv(_)))));
    }

    #[test]
    fn read_table_no_rows() {
        let table = read(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 20);
    }
}
