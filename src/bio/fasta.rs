use crate::bio::sequence::Sequence;
use crate::storage::TrimmableMap;
use crate::{AzulejoError, Result};
use flate2::read::GzDecoder;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::{map, opt},
    sequence::preceded,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parse a FASTA header line
fn parse_header(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = map(
        take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'),
        |s| std::str::from_utf8(s).unwrap_or(""),
    )(input)?;
    let (input, description) = opt(preceded(
        take_till(|c: u8| c != b' ' && c != b'\t'),
        map(not_line_ending, |s| std::str::from_utf8(s).unwrap_or("")),
    ))(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, (id, description.filter(|d| !d.is_empty()))))
}

/// Residue lines until the next line starting with '>' or EOF
fn parse_residues(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut residues = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;
        // A lone '\r' is not a line ending to nom; step over it.
        let rest = rest.strip_prefix(b"\r").unwrap_or(rest);

        residues.extend(
            line.iter()
                .filter(|c| !c.is_ascii_whitespace())
                .map(|c| c.to_ascii_uppercase()),
        );
        remaining = rest;
    }

    Ok((remaining, residues))
}

fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, residues) = parse_residues(input)?;

    let mut seq = Sequence::new(id.to_string(), residues);
    if let Some(desc) = description {
        seq = seq.with_description(desc.to_string());
    }
    Ok((input, seq))
}

/// Parse FASTA records from a byte buffer. Records with no residues are kept.
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>> {
    let mut input = data;
    let mut sequences = Vec::new();

    loop {
        while let Some(first) = input.first() {
            if first.is_ascii_whitespace() {
                input = &input[1..];
            } else {
                break;
            }
        }
        if input.is_empty() {
            break;
        }
        if input[0] != b'>' {
            return Err(AzulejoError::Parse(format!(
                "expected '>' at start of record {}",
                sequences.len() + 1
            )));
        }

        let (rest, seq) = parse_record(input)
            .map_err(|e| AzulejoError::Parse(format!("Failed to parse FASTA: {:?}", e)))?;
        if seq.id.is_empty() {
            return Err(AzulejoError::Parse(format!(
                "record {} has an empty identifier",
                sequences.len() + 1
            )));
        }
        sequences.push(seq);
        input = rest;
    }

    Ok(sequences)
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AzulejoError::InputNotFound(path.to_path_buf()));
    }

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;
        parse_fasta_from_bytes(&buffer)
    } else {
        let map = TrimmableMap::open(path)?;
        let sequences = parse_fasta_from_bytes(map.as_bytes());
        map.close()?;
        sequences
    }
}

/// Write sequences to a FASTA file (supports .gz compression)
pub fn write_fasta<P: AsRef<Path>>(path: P, sequences: &[Sequence]) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, sequences)?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    }

    Ok(())
}

fn write_fasta_to_writer<W: Write>(writer: &mut W, sequences: &[Sequence]) -> Result<()> {
    for seq in sequences {
        writeln!(writer, "{}", seq.header())?;
        for chunk in seq.sequence.chunks(80) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
