//! Delimited-text I/O: delimiter resolution, input decoding and CSV writers.
//!
//! Workbook files never pass through here; see [`crate::sheet`]. Legacy
//! Turkish exports are often `windows-1254`, so input text is decoded through
//! `encoding_rs` before it reaches the header normalizer. Output is always
//! UTF-8. The `-` path means stdin for input and stdout for output.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| {
        if has_extension(path, &["tsv"]) {
            DEFAULT_TSV_DELIMITER
        } else {
            DEFAULT_CSV_DELIMITER
        }
    })
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        // Hand-edited sheets often have ragged trailing columns.
        .flexible(true);
    Ok(builder.from_reader(reader))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    let mut decoded = decode_record(&headers, encoding)?;
    // Excel prefixes UTF-8 CSV exports with a BOM that would hide the first header.
    if let Some(first) = decoded.first_mut()
        && let Some(stripped) = first.strip_prefix('\u{feff}')
    {
        *first = stripped.to_string();
    }
    Ok(decoded)
}

/// CSV writer for ledger output. `bom` prepends a UTF-8 byte order mark so
/// Excel opens the file with the right code page.
pub fn open_csv_writer(path: Option<&Path>, bom: bool) -> Result<csv::Writer<Box<dyn Write>>> {
    let mut base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    if bom {
        base.write_all(UTF8_BOM)
            .context("Writing byte order mark")?;
    }

    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(DEFAULT_CSV_DELIMITER).double_quote(true);
    Ok(builder.from_writer(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1254;
    use std::path::PathBuf;

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn windows_1254_headers_decode_to_turkish() {
        let (bytes, _, _) = WINDOWS_1254.encode("BÖLGE;TARİH\n");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(bytes.as_ref());
        let headers = reader_headers(&mut reader, WINDOWS_1254).unwrap();
        assert_eq!(headers, vec!["BÖLGE", "TARİH"]);
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let data = "\u{feff}PLAKA,KM\n34 ABC 12,1000\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let headers = reader_headers(&mut reader, UTF_8).unwrap();
        assert_eq!(headers[0], "PLAKA");
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }
}
