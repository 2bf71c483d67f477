use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};


const STREAM_ARG: &str = "-";

const FILTERED_PREFIX: &str = "filtered_";


/// Opens the given path for buffered reading, or stdin when the argument is `-`.
pub fn resolve_reader(raw_arg: &str) -> crate::Result<Box<dyn Read>> {
    if raw_arg == STREAM_ARG {
        return Ok(Box::new(io::stdin()));
    }
    let file = fs::File::open(raw_arg)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Creates the given path for buffered writing, or writes to stdout when the argument is `-`.
pub fn resolve_writer(raw_arg: &str) -> crate::Result<Box<dyn Write>> {
    if raw_arg == STREAM_ARG {
        return Ok(Box::new(io::stdout()));
    }
    let file = fs::File::create(raw_arg)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Returns the path of the filtered prediction table, next to the input table.
pub fn filtered_path<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let name = input.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", FILTERED_PREFIX, name))
}
