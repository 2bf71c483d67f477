use clap::{App, Arg, ArgMatches};
use log::info;

use tisgtf::{merge_annotations, Criteria, GtfReader, GtfWriter,
             RibotishReader, RibotishWriter, SelectColumn};

use crate::utils::{filtered_path, resolve_reader, resolve_writer};
use crate::{Error, Result};

const TEMPLATE: &str = "
{bin} {version}
{about}


USAGE:
    {usage}

OPTIONS:
{unified}";

const ABOUT: &str = "
ribogtf filters Ribo-TISH ORF predictions, keeps the best prediction of each
transcript and TIS type, and writes them as CDS features next to the reference
transcripts and exons they belong to.";

/// Constructs a new `clap::App` for argument parsing.
pub fn build_cli() -> App<'static, 'static> {
    App::new("ribogtf")
        .version(crate_version!())
        .author(crate_authors!())
        .about(ABOUT)
        .template(TEMPLATE)
        .max_term_width(80)
        .arg(Arg::with_name("ribotish")
                 .short("r")
                 .long("ribotish")
                 .value_name("path")
                 .help("Path to the Ribo-TISH predict table")
                 .takes_value(true)
                 .required(true))
        .arg(Arg::with_name("input_gtf")
                 .short("i")
                 .long("input_gtf")
                 .value_name("path")
                 .help("Path to the reference annotation file or '-' for stdin")
                 .takes_value(true)
                 .required(true))
        .arg(Arg::with_name("output_gtf")
                 .short("o")
                 .long("output_gtf")
                 .value_name("path")
                 .help("Path to the output annotation file or '-' for stdout")
                 .takes_value(true)
                 .required(true))
        .arg(Arg::with_name("min_aalen")
                 .long("min_aalen")
                 .value_name("int")
                 .help("Minimum amino acid length")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .default_value("1"))
        .arg(Arg::with_name("min_inframecount")
                 .long("min_inframecount")
                 .value_name("int")
                 .help("Minimum in-frame count")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .default_value("1"))
        .arg(Arg::with_name("max_tisqvalue")
                 .long("max_tisqvalue")
                 .value_name("float")
                 .help("Maximum TIS q-value")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .default_value("1.0"))
        .arg(Arg::with_name("max_frameqvalue")
                 .long("max_frameqvalue")
                 .value_name("float")
                 .help("Maximum frame q-value")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .default_value("1.0"))
        .arg(Arg::with_name("max_fisherqvalue")
                 .long("max_fisherqvalue")
                 .value_name("float")
                 .help("Maximum Fisher's q-value")
                 .takes_value(true)
                 .allow_hyphen_values(true)
                 .default_value("1.0"))
        .arg(Arg::with_name("select_based_on")
                 .long("select_based_on")
                 .value_name("column")
                 .help("Column to select the best prediction of each transcript and TIS type on")
                 .takes_value(true)
                 .possible_values(&SelectColumn::NAMES)
                 .required(true))
        .arg(Arg::with_name("genetype")
                 .long("genetype")
                 .value_name("type")
                 .help("Gene type predictions must have")
                 .takes_value(true))
        .arg(Arg::with_name("tistype")
                 .long("tistype")
                 .value_name("type")
                 .help("TIS type predictions must have")
                 .takes_value(true)
                 .required(true))
}

/// Returns the value of an argument that is required to be present.
fn required_value<'a>(args: &'a ArgMatches, name: &'static str) -> Result<&'a str> {
    args.value_of(name).ok_or(Error::MissingArgument(name))
}

/// Returns the value of an argument, treating an empty value as absent.
fn non_empty_value<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a str> {
    args.value_of(name).filter(|v| !v.is_empty())
}

/// Creates the filtering and selection criteria from the argument matches.
pub fn criteria_from_args(args: &ArgMatches) -> Result<Criteria> {
    let select_on = value_t!(args, "select_based_on", SelectColumn)?;
    let mut criteria = Criteria::new(select_on);
    let _ = criteria
        .min_aa_len(value_t!(args, "min_aalen", i64)?)
        .min_in_frame_count(value_t!(args, "min_inframecount", i64)?)
        .max_tis_qvalue(value_t!(args, "max_tisqvalue", f64)?)
        .max_frame_qvalue(value_t!(args, "max_frameqvalue", f64)?)
        .max_fisher_qvalue(value_t!(args, "max_fisherqvalue", f64)?)
        .gene_type(non_empty_value(args, "genetype"))
        .tis_type(Some(required_value(args, "tistype")?).filter(|v| !v.is_empty()));
    Ok(criteria)
}

/// Runs the conversion given the argument matches.
pub fn run(args: &ArgMatches) -> Result<()> {
    let criteria = criteria_from_args(args)?;
    let ribotish = required_value(args, "ribotish")?;
    let input_gtf = required_value(args, "input_gtf")?;
    let output_gtf = required_value(args, "output_gtf")?;

    let table = RibotishReader::from_file(ribotish)?.read_table()?;
    info!("Loaded {} predictions from {}", table.len(), ribotish);

    let selected = criteria.apply(table)?;

    let dump_path = filtered_path(ribotish);
    RibotishWriter::from_file(&dump_path)?.write_table(&selected)?;
    info!("Wrote selected predictions to {}", dump_path.display());

    let reference = GtfReader::from_reader(resolve_reader(input_gtf)?).read_all()?;
    info!("Loaded {} reference annotation lines", reference.len());

    let mut writer = GtfWriter::from_writer(resolve_writer(output_gtf)?);
    let summary = merge_annotations(&reference, selected.records(), &mut writer)?;
    info!("Wrote {} transcript and exon lines and {} CDS lines",
          summary.copied, summary.synthesized);

    Ok(())
}

#[cfg(test)]
mod test_cli {
    use super::*;

    const REQUIRED: [&str; 9] = ["ribogtf", "-r", "orfs.tsv", "-i", "ref.gtf", "-o", "out.gtf",
                                 "--select_based_on", "AALen"];

    fn parse(extra: &[&str]) -> ::std::result::Result<ArgMatches<'static>, clap::Error> {
        let args = REQUIRED.iter().chain(extra.iter());
        build_cli().get_matches_from_safe(args)
    }

    #[test]
    fn parse_defaults() {
        let matches = parse(&["--tistype", "5'UTR"]).unwrap();
        assert_eq!(matches.value_of("ribotish"), Some("orfs.tsv"));
        assert_eq!(matches.value_of("input_gtf"), Some("ref.gtf"));
        assert_eq!(matches.value_of("output_gtf"), Some("out.gtf"));
        assert_eq!(matches.value_of("genetype"), None);

        let criteria = criteria_from_args(&matches).unwrap();
        let mut expected = Criteria::new(SelectColumn::AaLen);
        let _ = expected.tis_type(Some("5'UTR"));
        assert_eq!(criteria, expected);
    }

    #[test]
    fn parse_thresholds() {
        let matches = parse(&["--tistype", "uORF", "--min_aalen", "50",
                              "--min_inframecount", "20", "--max_tisqvalue", "0.1",
                              "--max_frameqvalue", "0.05", "--max_fisherqvalue", "0.2",
                              "--genetype", "protein_coding"]).unwrap();
        let criteria = criteria_from_args(&matches).unwrap();
        let mut expected = Criteria::new(SelectColumn::AaLen);
        let _ = expected
            .min_aa_len(50)
            .min_in_frame_count(20)
            .max_tis_qvalue(0.1)
            .max_frame_qvalue(0.05)
            .max_fisher_qvalue(0.2)
            .gene_type(Some("protein_coding"))
            .tis_type(Some("uORF"));
        assert_eq!(criteria, expected);
    }

    #[test]
    fn parse_empty_type_filters() {
        let matches = parse(&["--tistype", "", "--genetype", ""]).unwrap();
        let criteria = criteria_from_args(&matches).unwrap();
        assert_eq!(criteria, Criteria::new(SelectColumn::AaLen));
    }

    #[test]
    fn parse_negative_thresholds() {
        let matches = parse(&["--tistype", "uORF", "--min_aalen", "-5",
                              "--min_inframecount", "-1", "--max_tisqvalue", "-0.5"]).unwrap();
        let criteria = criteria_from_args(&matches).unwrap();
        let mut expected = Criteria::new(SelectColumn::AaLen);
        let _ = expected
            .min_aa_len(-5)
            .min_in_frame_count(-1)
            .max_tis_qvalue(-0.5)
            .tis_type(Some("uORF"));
        assert_eq!(criteria, expected);
    }

    #[test]
    fn parse_missing_tistype() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn parse_unknown_select_column() {
        let args = ["ribogtf", "-r", "orfs.tsv", "-i", "ref.gtf", "-o", "out.gtf",
                    "--select_based_on", "Tid", "--tistype", "uORF"];
        assert!(build_cli().get_matches_from_safe(args.iter()).is_err());
    }

    #[test]
    fn parse_invalid_integer() {
        let matches = parse(&["--tistype", "uORF", "--min_aalen", "fifty"]).unwrap();
        assert!(matches!(criteria_from_args(&matches), Err(Error::Clap(_))));
    }
}
