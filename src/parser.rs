use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::provider::{Md, DIGEST_SIZE};

/// Largest message a `Len` line may declare, in bytes.
pub const MAX_MESSAGE_LEN: usize = 1 << 24;

/// What to do with a `Len` record that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LenPolicy {
    /// Drop the record, log it and keep scanning.
    #[default]
    Skip,
    /// Fail the run with a format error.
    Reject,
}

/// One `Len`/`Msg` record of a ShortMsg or LongMsg file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVectorRecord {
    /// Declared message length in bits.
    pub length_bits: u64,
    /// Message bytes, `ceil(length_bits / 8)` of them (none when `length_bits` is 0).
    pub message: Vec<u8>,
    /// The `Msg` line(s) exactly as read, each newline terminated.
    pub msg_lines: String,
}

impl TestVectorRecord {
    /// write_header writes the `Len` line and the original `Msg` line(s).
    pub fn write_header<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Len = {}", self.length_bits).map_err(Error::write)?;
        out.write_all(self.msg_lines.as_bytes()).map_err(Error::write)?;
        Ok(())
    }
}

/// byte_len converts a bit count to the number of bytes holding it.
pub fn byte_len(length_bits: u64) -> u64 {
    length_bits / 8 + u64::from(length_bits % 8 != 0)
}

/// VectorParser scans a request file line by line.
///
/// A single line of look-ahead lets the parser give back a line that turned
/// out to belong to the next record.
pub struct VectorParser<R> {
    reader: R,
    pending: Option<String>,
    line_no: usize,
    policy: LenPolicy,
    skipped: usize,
}

impl<R: BufRead> VectorParser<R> {
    /// new returns a parser using the lenient `LenPolicy::Skip`.
    pub fn new(reader: R) -> Self {
        Self::with_policy(reader, LenPolicy::default())
    }

    /// with_policy returns a parser handling malformed `Len` lines per `policy`.
    pub fn with_policy(reader: R, policy: LenPolicy) -> Self {
        Self {
            reader,
            pending: None,
            line_no: 0,
            policy,
            skipped: 0,
        }
    }

    /// skipped is the number of records dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// line_no is the number of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line).map_err(Error::read)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(line))
    }

    // Only the most recently read line is ever pushed back, so line_no
    // still refers to it.
    fn push_back(&mut self, line: String) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(line);
    }

    /// copy_header writes every line verbatim to `out` until one starts with
    /// `key`. That line is kept for the next read. Returns false on EOF.
    pub fn copy_header<W: Write>(&mut self, out: &mut W, key: &str) -> Result<bool> {
        while let Some(line) = self.next_line()? {
            if line.starts_with(key) {
                self.push_back(line);
                return Ok(true);
            }
            out.write_all(line.as_bytes()).map_err(Error::write)?;
        }
        Ok(false)
    }

    fn reject(&mut self, line: usize, reason: String) -> Result<()> {
        match self.policy {
            LenPolicy::Skip => {
                warn!(line, %reason, "skipping malformed record");
                self.skipped += 1;
                Ok(())
            }
            LenPolicy::Reject => Err(Error::Format { line, reason }),
        }
    }

    /// next_record returns the next `Len`/`Msg` record, or None at EOF.
    ///
    /// Lines between records other than `Len` lines are ignored. Hex decode
    /// errors end the scan with an error.
    pub fn next_record(&mut self) -> Result<Option<TestVectorRecord>> {
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            if !line.starts_with("Len") {
                continue;
            }
            let len_line = self.line_no;

            let length_bits = match parse_len(&line) {
                Ok(n) => n,
                Err(reason) => {
                    self.reject(len_line, reason)?;
                    continue;
                }
            };
            let message_len = match usize::try_from(byte_len(length_bits)) {
                Ok(n) if n <= MAX_MESSAGE_LEN => n,
                _ => {
                    self.reject(
                        len_line,
                        format!("Len = {} exceeds the message size limit", length_bits),
                    )?;
                    continue;
                }
            };

            let Some(msg_line) = self.next_line()? else {
                self.reject(len_line, "request file ends after a Len line".into())?;
                return Ok(None);
            };
            if !msg_line.starts_with("Msg") {
                self.push_back(msg_line);
                self.reject(len_line, "Len line is not followed by a Msg line".into())?;
                continue;
            }
            let Some((_, value)) = msg_line.split_once('=') else {
                self.reject(self.line_no, "Msg line has no '='".into())?;
                continue;
            };

            let expected_hex = message_len * 2;
            let mut hex_text = String::with_capacity(expected_hex);
            hex_text.push_str(value.trim());
            let mut msg_lines = with_newline(msg_line);

            // The payload may wrap over several physical lines.
            while hex_text.len() < expected_hex {
                let Some(next) = self.next_line()? else {
                    break;
                };
                if next.starts_with("Len") {
                    self.push_back(next);
                    break;
                }
                let piece = next.trim();
                if piece.is_empty() {
                    continue;
                }
                hex_text.reserve(piece.len());
                hex_text.push_str(piece);
                msg_lines.push_str(&with_newline(next));
            }

            let message = decode_message(length_bits, message_len, &hex_text, len_line)?;
            debug!(
                line = len_line,
                length_bits,
                bytes = message.len(),
                "parsed record"
            );
            return Ok(Some(TestVectorRecord {
                length_bits,
                message,
                msg_lines,
            }));
        }
    }

    /// read_seed reads the `Seed` line left by `copy_header` and decodes it.
    pub fn read_seed(&mut self) -> Result<Md> {
        let line = match self.next_line()? {
            Some(line) if line.starts_with("Seed") => line,
            _ => {
                return Err(Error::Format {
                    line: self.line_no,
                    reason: "missing Seed line".into(),
                })
            }
        };
        let Some((_, value)) = line.split_once('=') else {
            return Err(Error::Format {
                line: self.line_no,
                reason: "Seed line has no '='".into(),
            });
        };

        let bytes = codec::decode(value.trim(), DIGEST_SIZE)?;
        if bytes.len() != DIGEST_SIZE {
            return Err(Error::Format {
                line: self.line_no,
                reason: format!("Seed is {} bytes, want {}", bytes.len(), DIGEST_SIZE),
            });
        }
        let mut seed = [0u8; DIGEST_SIZE];
        seed.copy_from_slice(&bytes);
        Ok(seed)
    }
}

impl<R: BufRead> Iterator for VectorParser<R> {
    type Item = Result<TestVectorRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn parse_len(line: &str) -> std::result::Result<u64, String> {
    let rest = line["Len".len()..].trim_start();
    let value = rest
        .strip_prefix('=')
        .ok_or_else(|| format!("malformed Len line {:?}", line.trim_end()))?
        .trim();
    let n: i64 = value
        .parse()
        .map_err(|_| format!("Len value {:?} is not an integer", value))?;
    u64::try_from(n).map_err(|_| format!("negative Len value {}", n))
}

fn decode_message(
    length_bits: u64,
    message_len: usize,
    hex_text: &str,
    line: usize,
) -> Result<Vec<u8>> {
    // NIST writes the empty message as "00".
    if length_bits == 0 && (hex_text.is_empty() || hex_text == "00") {
        return Ok(Vec::new());
    }

    let mut message = codec::decode(hex_text, message_len)?;
    if message.len() != message_len {
        warn!(
            line,
            decoded = message.len(),
            expected = message_len,
            "Msg byte count differs from Len, zero padding"
        );
        message.resize(message_len, 0);
    }
    Ok(message)
}

fn with_newline(mut line: String) -> String {
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}
