use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Read};
use tracing::{debug, info, warn};
use ventlink_core::backend::CHUNK_MAX_SIZE;
use ventlink_core::{MessageType, StateSegment};
use ventlink_protocol::datagrams::HEADER_SIZE;
use ventlink_protocol::{
    cobs, ByteBuffer, ChunkInputStatus, ChunkSplitter, CobsError, Crc32c, CrcElement, Datagram,
    Message, MessageError, OutputStatus,
};

/// Checksum carried by a frame and the one computed over its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcReport {
    pub transmitted: u32,
    pub computed: u32,
}

impl CrcReport {
    pub fn is_valid(&self) -> bool {
        self.transmitted == self.computed
    }
}

/// Datagram header as read from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramReport {
    pub seq: u8,
    pub length: u8,
    /// Payload bytes actually present after the header
    pub payload_len: usize,
    /// Sequence number the previous datagram implied, if any
    pub expected_seq: Option<u8>,
}

impl DatagramReport {
    pub fn length_mismatch(&self) -> bool {
        usize::from(self.length) != self.payload_len
    }

    pub fn sequence_gap(&self) -> bool {
        self.expected_seq.is_some_and(|expected| expected != self.seq)
    }
}

/// Why a chunk could not be taken apart completely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameIssue {
    /// Chunk exceeded the maximum size before its delimiter
    OverLength,
    /// Chunk is not valid byte stuffing
    Unstuffing(CobsError),
    /// Body too short for the checksum field
    ShortBody,
    /// Checksum payload too short for the datagram header
    ShortDatagram,
}

/// Everything that could be read from one delimited chunk
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub index: usize,
    pub chunk_len: usize,
    pub body: Vec<u8>,
    pub issue: Option<FrameIssue>,
    pub crc: Option<CrcReport>,
    pub datagram: Option<DatagramReport>,
    pub tag_byte: Option<u8>,
    pub message: Option<Result<StateSegment, MessageError>>,
}

impl FrameReport {
    fn new(index: usize, chunk_len: usize) -> Self {
        Self {
            index,
            chunk_len,
            body: Vec::new(),
            issue: None,
            crc: None,
            datagram: None,
            tag_byte: None,
            message: None,
        }
    }

    /// True if the frame would be accepted by a receiver
    pub fn is_valid(&self) -> bool {
        self.issue.is_none()
            && self.crc.is_some_and(|crc| crc.is_valid())
            && self.datagram.is_some_and(|datagram| !datagram.length_mismatch())
            && matches!(self.message, Some(Ok(_)))
    }
}

/// Split a captured byte stream into chunks and inspect every layer of each
///
/// Checksums are parsed and compared separately so mismatching frames are
/// still shown in full. Bytes after the last delimiter are ignored.
pub fn decode_stream(data: &[u8]) -> Vec<FrameReport> {
    let mut splitter = ChunkSplitter::<CHUNK_MAX_SIZE>::default();
    let mut chunk = ByteBuffer::<CHUNK_MAX_SIZE>::new();
    let mut expected_seq = None;
    let mut reports = Vec::new();
    // Bytes seen since the last delimiter, including any the splitter dropped
    let mut received = 0;

    for &byte in data {
        if splitter.input(byte) != Ok(ChunkInputStatus::OutputReady) {
            received += 1;
            continue;
        }
        let chunk_len = std::mem::take(&mut received);

        let index = reports.len();
        match splitter.output(&mut chunk) {
            Ok(OutputStatus::Available) if chunk.is_empty() => {}
            Ok(OutputStatus::Available) => {
                reports.push(inspect_chunk(index, &chunk, &mut expected_seq));
            }
            Ok(OutputStatus::Waiting) => {}
            Err(_) => {
                let mut report = FrameReport::new(index, chunk_len);
                report.issue = Some(FrameIssue::OverLength);
                reports.push(report);
            }
        }
    }

    reports
}

fn inspect_chunk(index: usize, chunk: &[u8], expected_seq: &mut Option<u8>) -> FrameReport {
    let mut report = FrameReport::new(index, chunk.len());

    let mut body = ByteBuffer::<CHUNK_MAX_SIZE>::new();
    if let Err(err) = cobs::decode(chunk, &mut body) {
        report.issue = Some(FrameIssue::Unstuffing(err));
        return report;
    }
    report.body = body.to_vec();

    let mut element = CrcElement::<CHUNK_MAX_SIZE>::new();
    if element.parse(&body).is_err() {
        report.issue = Some(FrameIssue::ShortBody);
        return report;
    }
    report.crc = Some(CrcReport {
        transmitted: element.crc(),
        computed: CrcElement::<CHUNK_MAX_SIZE>::compute_body_crc(element.payload(), &mut Crc32c),
    });

    let mut datagram = Datagram::<CHUNK_MAX_SIZE>::new();
    if datagram.parse(element.payload()).is_err() {
        report.issue = Some(FrameIssue::ShortDatagram);
        return report;
    }
    report.datagram = Some(DatagramReport {
        seq: datagram.seq(),
        length: datagram.length(),
        payload_len: element.payload().len() - HEADER_SIZE,
        expected_seq: *expected_seq,
    });
    *expected_seq = Some(datagram.seq().wrapping_add(1));

    report.tag_byte = datagram.payload().first().copied();
    let mut message = Message::<StateSegment>::new();
    report.message = Some(
        message
            .parse(datagram.payload())
            .and_then(|()| message.take_payload().ok_or(MessageError::InvalidType)),
    );

    report
}

fn describe_tag(byte: u8) -> String {
    match MessageType::from_byte(byte) {
        MessageType::Unrecognized => format!("unrecognized (0x{:02x})", byte),
        tag => tag.name().to_string(),
    }
}

fn print_report(report: &FrameReport) {
    println!("\nframe {}: {} bytes", report.index, report.chunk_len);

    if let Some(issue) = report.issue {
        warn!("Frame {}: {:?}", report.index, issue);
    }
    if !report.body.is_empty() {
        println!("  body:     {}", hex::encode(&report.body));
    }

    if let Some(crc) = report.crc {
        let status = if crc.is_valid() { "ok" } else { "MISMATCH" };
        println!(
            "  crc:      0x{:08x} (computed 0x{:08x}) {}",
            crc.transmitted, crc.computed, status
        );
        if !crc.is_valid() {
            warn!("Frame {}: checksum mismatch", report.index);
        }
    }

    if let Some(datagram) = report.datagram {
        println!(
            "  datagram: seq {}, length {} ({} present)",
            datagram.seq, datagram.length, datagram.payload_len
        );
        if datagram.length_mismatch() {
            warn!(
                "Frame {}: length field {} but {} bytes present",
                report.index, datagram.length, datagram.payload_len
            );
        }
        if let (true, Some(expected)) = (datagram.sequence_gap(), datagram.expected_seq) {
            warn!(
                "Frame {}: sequence gap, expected {} got {}",
                report.index, expected, datagram.seq
            );
        }
    }

    match (&report.message, report.tag_byte) {
        (Some(Ok(segment)), Some(byte)) => {
            println!("  message:  {} {:?}", describe_tag(byte), segment);
        }
        (Some(Err(err)), Some(byte)) => {
            println!("  message:  {} {:?}", describe_tag(byte), err);
        }
        (Some(Err(err)), None) => println!("  message:  {:?}", err),
        _ => {}
    }
}

pub fn execute(hex_input: Option<&str>, input: Option<&str>) -> Result<()> {
    let data = match (hex_input, input) {
        (Some(text), _) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ':')
                .collect();
            hex::decode(&cleaned).context("Invalid hex input")?
        }
        (None, Some("-")) => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
        (None, Some(path)) => {
            fs::read(path).with_context(|| format!("Failed to read input file: {}", path))?
        }
        (None, None) => bail!("Either a hex string or --input must be given"),
    };
    info!("Decoding {} bytes", data.len());

    let reports = decode_stream(&data);
    if reports.is_empty() {
        println!("No frames found");
        return Ok(());
    }
    for report in &reports {
        print_report(report);
    }

    let valid = reports.iter().filter(|report| report.is_valid()).count();
    debug!("{} of {} frames valid", valid, reports.len());
    println!("\n=== Summary ===");
    println!("Frames:         {}", reports.len());
    println!("Valid frames:   {}", valid);
    println!("Invalid frames: {}", reports.len() - valid);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_tag() {
        assert_eq!(describe_tag(6), "ping");
        assert_eq!(describe_tag(0x2a), "unrecognized (0x2a)");
    }
}
