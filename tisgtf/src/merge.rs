//! Merging of selected predictions into a reference annotation.

use std::collections::HashSet;
use std::io;

use log::debug;

use crate::consts::{CDS_FRAME_STR, CDS_SOURCE_STR, CDS_STR, GENE_ID_STR, GENE_NAME_STR,
                    GENE_TYPE_STR, TRANSCRIPT_ID_STR, UNK_GENE_TYPE};
use crate::{GtfRecord, GtfWriter, PredictionRecord};


/// Number of lines written by `merge_annotations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Transcript and exon lines copied from the reference.
    pub copied: usize,
    /// CDS lines created from the predictions.
    pub synthesized: usize,
}

impl PredictionRecord {

    /// Returns the attributes column of the CDS lines of the prediction.
    fn cds_attributes(&self) -> String {
        format!(r#"{} "{}"; {} "{}"; {} "{}"; {} "{}";"#,
                GENE_ID_STR, self.gene_id(),
                TRANSCRIPT_ID_STR, self.transcript_id(),
                GENE_NAME_STR, self.symbol(),
                GENE_TYPE_STR, self.gene_type().unwrap_or(UNK_GENE_TYPE))
    }

    /// Transforms the prediction into GTF records, one CDS per block.
    ///
    /// This method will return an error if the genome position or any of the blocks is malformed.
    pub fn to_cds_records(&self) -> crate::Result<Vec<GtfRecord>> {
        let pos = self.genome_pos()?;
        let attributes = self.cds_attributes();
        self.blocks()?.iter()
            .map(|block| {
                let (start, end) = block.gtf_coord()?;
                let rec = GtfRecord::new(pos.seq_name(), start, end)
                    .source(CDS_SOURCE_STR)
                    .feature(CDS_STR)
                    .strand(pos.strand())
                    .frame(CDS_FRAME_STR)
                    .attributes(attributes.as_str(), Some(self.transcript_id()));
                Ok(rec)
            })
            .collect()
    }
}

/// Writes the reference lines of the selected transcripts, followed by CDS lines of the
/// predictions.
///
/// Transcript and exon lines whose transcript identifier belongs to any of the predictions are
/// written first, in reference order. CDS lines of each prediction follow, in prediction order.
/// All CDS lines are created before anything is written, so a malformed prediction leaves the
/// writer untouched.
pub fn merge_annotations<W: io::Write>(
    reference: &[GtfRecord],
    predictions: &[PredictionRecord],
    writer: &mut GtfWriter<W>,
) -> crate::Result<MergeSummary> {

    let mut cds_records = Vec::new();
    for prediction in predictions {
        cds_records.append(&mut prediction.to_cds_records()?);
    }

    let tids = predictions.iter()
        .map(|p| p.transcript_id())
        .collect::<HashSet<&str>>();
    debug!("Looking up {} transcripts in {} reference lines", tids.len(), reference.len());

    let mut summary = MergeSummary::default();
    for record in reference.iter().filter(|rec| rec.is_transcript_part()) {
        if record.transcript_id().map_or(false, |tid| tids.contains(tid)) {
            writer.write_record(record)?;
            summary.copied += 1;
        }
    }
    for record in cds_records.iter() {
        writer.write_record(record)?;
        summary.synthesized += 1;
    }
    writer.flush()?;

    Ok(summary)
}
