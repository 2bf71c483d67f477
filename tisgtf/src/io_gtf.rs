/*! Reader and writer for GTF annotation lines.

The GTF format is a feature-oriented format that is commonly used to store gene annotation data.
An unofficial specification of the format can be found [here](http://mblab.wustl.edu/GTF22.html).

Records are handled line by line: apart from the coordinates and the transcript identifier, no
column is interpreted, so lines read by the reader are written back unchanged.
*/
use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::Path;

use regex::Regex;

use crate::consts::{EXON_STR, TRANSCRIPT_ID_STR, TRANSCRIPT_STR, UNK_STR};


quick_error! {
    /// Errors that occur when reading or writing GTF files.
    #[derive(Debug)]
    pub enum GtfError {
        /// Occurs when a line has fewer than nine columns.
        ColumnCount(num: usize, line: u64) {
            display("expected 9 columns, found {}, line: {}", num, line)
        }
        /// Occurs when the start or end coordinate is not a valid u64 value.
        InvalidCoord(err: ParseIntError, line: u64) {
            display("invalid coordinate: {}, line: {}", err, line)
            cause(err)
        }
        /// Occurs when a transcript or exon line has no transcript identifier attribute.
        MissingTranscriptId(line: u64) {
            display("transcript identifier attribute not found, line: {}", line)
        }
        /// Errors propagated from the underlying `csv` crate.
        Csv(err: csv::Error) {
            display("{}", err)
            from()
            cause(err)
        }
    }
}

/// A single GTF line.
///
/// Coordinates are kept as written, i.e. one-based and fully-closed.
#[derive(Debug, Clone, PartialEq)]
pub struct GtfRecord {
    seq_name: String,
    source: String,
    feature: String,
    start: u64,
    end: u64,
    score: String,
    strand: String,
    frame: String,
    attributes: String,
    transcript_id: Option<String>,
}

impl GtfRecord {

    /// Creates a record with the given sequence name and coordinates.
    ///
    /// All other columns are set to `.` and the attributes are left empty.
    pub fn new<T>(seq_name: T, start: u64, end: u64) -> Self
        where T: Into<String>
    {
        GtfRecord {
            seq_name: seq_name.into(),
            source: UNK_STR.to_owned(),
            feature: UNK_STR.to_owned(),
            start,
            end,
            score: UNK_STR.to_owned(),
            strand: UNK_STR.to_owned(),
            frame: UNK_STR.to_owned(),
            attributes: String::new(),
            transcript_id: None,
        }
    }

    /// Sets the source column.
    pub fn source<T: Into<String>>(mut self, source: T) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the feature column.
    pub fn feature<T: Into<String>>(mut self, feature: T) -> Self {
        self.feature = feature.into();
        self
    }

    /// Sets the strand column.
    pub fn strand<T: Into<String>>(mut self, strand: T) -> Self {
        self.strand = strand.into();
        self
    }

    /// Sets the frame column.
    pub fn frame<T: Into<String>>(mut self, frame: T) -> Self {
        self.frame = frame.into();
        self
    }

    /// Sets the raw attributes column and the transcript identifier it refers to.
    pub fn attributes<T, U>(mut self, attributes: T, transcript_id: Option<U>) -> Self
        where T: Into<String>, U: Into<String>
    {
        self.attributes = attributes.into();
        self.transcript_id = transcript_id.map(|v| v.into());
        self
    }

    pub fn seq_name(&self) -> &str {
        self.seq_name.as_str()
    }

    pub fn source_name(&self) -> &str {
        self.source.as_str()
    }

    pub fn feature_name(&self) -> &str {
        self.feature.as_str()
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn score(&self) -> &str {
        self.score.as_str()
    }

    pub fn strand_name(&self) -> &str {
        self.strand.as_str()
    }

    pub fn frame_name(&self) -> &str {
        self.frame.as_str()
    }

    /// Returns the raw attributes column.
    pub fn raw_attributes(&self) -> &str {
        self.attributes.as_str()
    }

    /// Returns the transcript identifier found in the attributes column.
    pub fn transcript_id(&self) -> Option<&str> {
        self.transcript_id.as_deref()
    }

    /// Whether the record is a transcript or an exon feature.
    pub fn is_transcript_part(&self) -> bool {
        self.feature == TRANSCRIPT_STR || self.feature == EXON_STR
    }

    /// Creates a record from a raw row and the transcript identifier regex.
    ///
    /// Columns beyond the ninth are ignored. The transcript identifier is required only for
    /// transcript and exon features.
    fn try_from_row(row: &csv::StringRecord, tid_regex: &Regex) -> Result<Self, GtfError> {
        let line = row.position().map(|pos| pos.line()).unwrap_or(0);
        if row.len() < 9 {
            return Err(GtfError::ColumnCount(row.len(), line));
        }
        let parse_coord = |raw: &str| raw.trim().parse::<u64>()
            .map_err(|e| GtfError::InvalidCoord(e, line));

        let transcript_id = tid_regex.captures(&row[8])
            .and_then(|cap| cap.name("value"))
            .map(|v| v.as_str().to_owned());

        let record = GtfRecord {
            seq_name: row[0].to_owned(),
            source: row[1].to_owned(),
            feature: row[2].to_owned(),
            start: parse_coord(&row[3])?,
            end: parse_coord(&row[4])?,
            score: row[5].to_owned(),
            strand: row[6].to_owned(),
            frame: row[7].to_owned(),
            attributes: row[8].to_owned(),
            transcript_id,
        };
        if record.is_transcript_part() && record.transcript_id.is_none() {
            return Err(GtfError::MissingTranscriptId(line));
        }
        Ok(record)
    }
}

/// GTF reader.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl<R: io::Read> Reader<R> {

    /// Creates a GTF reader from another reader.
    ///
    /// Lines starting with `#` and empty lines are skipped.
    pub fn from_reader(in_reader: R) -> Reader<R> {
        Reader {
            inner: csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .comment(Some(b'#'))
                .quoting(false)
                .flexible(true)
                .from_reader(in_reader),
        }
    }

    /// Creates an iterator of GTF records.
    pub fn records_stream(&mut self) -> crate::Result<GtfRecordsStream<R>> {
        let tid_regex = make_gtf_id_regex(TRANSCRIPT_ID_STR)?;
        Ok(GtfRecordsStream {
            inner: self.inner.records(),
            tid_regex,
        })
    }

    /// Reads all records into memory, keeping their order.
    pub fn read_all(&mut self) -> crate::Result<Vec<GtfRecord>> {
        self.records_stream()?.collect()
    }
}

impl Reader<fs::File> {

    /// Creates a GTF reader that reads from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::from_reader)
    }
}

/// Iterator over GTF records.
pub struct GtfRecordsStream<'a, R: 'a> where R: io::Read {
    inner: csv::StringRecordsIter<'a, R>,
    tid_regex: Regex,
}

impl<'a, R> Iterator for GtfRecordsStream<'a, R> where R: io::Read {

    type Item = crate::Result<GtfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let tid_regex = &self.tid_regex;
        self.inner.next()
            .map(|row| {
                row
                    .map_err(|e| crate::Error::from(GtfError::from(e)))
                    .and_then(|row| GtfRecord::try_from_row(&row, tid_regex)
                              .map_err(crate::Error::from))
            })
    }
}

/// GTF writer.
pub struct Writer<W: io::Write> {
    inner: csv::Writer<W>,
}

impl<W: io::Write> Writer<W> {

    /// Creates a GTF writer from another writer.
    pub fn from_writer(in_writer: W) -> Writer<W> {
        Writer {
            inner: csv::WriterBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .quote_style(csv::QuoteStyle::Never)
                .from_writer(in_writer),
        }
    }

    /// Writes the given record.
    pub fn write_record(&mut self, record: &GtfRecord) -> crate::Result<()> {
        let start = record.start.to_string();
        let end = record.end.to_string();
        self.inner
            .write_record(&[
                record.seq_name.as_str(), record.source.as_str(), record.feature.as_str(),
                start.as_str(), end.as_str(), record.score.as_str(), record.strand.as_str(),
                record.frame.as_str(), record.attributes.as_str(),
            ])
            .map_err(|e| crate::Error::from(GtfError::from(e)))
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> crate::Result<()> {
        self.inner.flush().map_err(crate::Error::from)
    }
}

impl Writer<fs::File> {

    /// Creates a GTF writer that writes to the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let f = fs::File::create(path)?;
        Ok(Writer::from_writer(f))
    }
}

impl Writer<Vec<u8>> {

    /// Creates a GTF writer that writes to an in-memory buffer.
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

/// Helper function to create the regex for parsing GTF attribute values.
fn make_gtf_id_regex(attr_name: &str) -> crate::Result<Regex> {
    let pat = format!(r#"\b{attr_name} "(?P<value>[^"]+)""#,
                      attr_name = regex::escape(attr_name));
    Regex::new(&pat).map_err(crate::Error::from)
}

#[cfg(test)]
mod test_reader {
    use super::*;

    static GTF: &str = "##description: test\n\
        chr1\tHAVANA\tgene\t11\t500\t.\t+\t.\tgene_id \"G1\"; gene_name \"ABC\";\n\
        chr1\tHAVANA\ttranscript\t11\t500\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
        \n\
        chr1\tHAVANA\texon\t11\t60\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; exon_number 1;\n\
        # interspersed comment\n\
        chr1\tHAVANA\tCDS\t30\t60\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\";\n";

    #[test]
    fn read_all() {
        let records = Reader::from_reader(GTF.as_bytes()).read_all().unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].feature_name(), "gene");
        assert_eq!(records[0].transcript_id(), None);
        assert!(!records[0].is_transcript_part());

        let trx = &records[1];
        assert_eq!(trx.seq_name(), "chr1");
        assert_eq!(trx.source_name(), "HAVANA");
        assert_eq!(trx.feature_name(), "transcript");
        assert_eq!(trx.start(), 11);
        assert_eq!(trx.end(), 500);
        assert_eq!(trx.score(), ".");
        assert_eq!(trx.strand_name(), "+");
        assert_eq!(trx.frame_name(), ".");
        assert_eq!(trx.raw_attributes(), "gene_id \"G1\"; transcript_id \"T1\";");
        assert_eq!(trx.transcript_id(), Some("T1"));
        assert!(trx.is_transcript_part());

        assert!(records[2].is_transcript_part());
        assert!(!records[3].is_transcript_part());
        assert_eq!(records[3].frame_name(), "0");
    }

    #[test]
    fn read_extra_columns() {
        let gtf = "chr1\tsrc\texon\t1\t10\t.\t-\t.\ttranscript_id \"T9\";\textra\n";
        let records = Reader::from_reader(gtf.as_bytes()).read_all().unwrap();
        assert_eq!(records[0].transcript_id(), Some("T9"));
        assert_eq!(records[0].raw_attributes(), "transcript_id \"T9\";");
    }

    #[test]
    fn read_similar_attribute_names() {
        let gtf = "chr1\tsrc\texon\t1\t10\t.\t-\t.\tref_transcript_id \"R1\"; transcript_id \"T9\";\n";
        let records = Reader::from_reader(gtf.as_bytes()).read_all().unwrap();
        assert_eq!(records[0].transcript_id(), Some("T9"));
    }

    #[test]
    fn read_missing_transcript_id() {
        let gtf = "chr1\tsrc\tgene\t1\t10\t.\t-\t.\tgene_id \"G1\";\n\
                   chr1\tsrc\texon\t1\t10\t.\t-\t.\tgene_id \"G1\";\n";
        let res = Reader::from_reader(gtf.as_bytes()).read_all();
        assert!(matches!(res, Err(crate::Error::Gtf(GtfError::MissingTranscriptId(2)))));
    }

    #[test]
    fn read_unquoted_transcript_id() {
        let gtf = "chr1\tsrc\ttranscript\t1\t10\t.\t-\t.\ttranscript_id T1;\n";
        let res = Reader::from_reader(gtf.as_bytes()).read_all();
        assert!(matches!(res, Err(crate::Error::Gtf(GtfError::MissingTranscriptId(_)))));
    }

    #[test]
    fn read_too_few_columns() {
        let gtf = "chr1\tsrc\texon\t1\t10\n";
        let res = Reader::from_reader(gtf.as_bytes()).read_all();
        assert!(matches!(res, Err(crate::Error::Gtf(GtfError::ColumnCount(5, 1)))));
    }

    #[test]
    fn read_invalid_coord() {
        let gtf = "chr1\tsrc\texon\tone\t10\t.\t-\t.\ttranscript_id \"T1\";\n";
        let res = Reader::from_reader(gtf.as_bytes()).read_all();
        assert!(matches!(res, Err(crate::Error::Gtf(GtfError::InvalidCoord(_, 1)))));
    }

    #[test]
    fn read_empty() {
        let records = Reader::from_reader("#only a comment\n".as_bytes()).read_all().unwrap();
        assert!(records.is_empty());
    }
}
