use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three CAVP hash test protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Messages shorter than one block, `Len`/`Msg` records.
    ShortMsg,
    /// Multi-block messages, same record layout as ShortMsg.
    LongMsg,
    /// Iterated hashing from a single `Seed`.
    MonteCarlo,
}

impl Protocol {
    /// All protocols in menu order.
    pub const ALL: [Protocol; 3] = [Protocol::ShortMsg, Protocol::LongMsg, Protocol::MonteCarlo];

    /// detect classifies a request file by its file name.
    pub fn detect(path: &Path) -> Self {
        match path.file_name() {
            Some(name) => Self::classify(&name.to_string_lossy()),
            None => Self::classify(&path.to_string_lossy()),
        }
    }

    /// classify maps a name to a protocol: "monte" wins over "long",
    /// anything else is ShortMsg. Matching ignores case.
    pub fn classify(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("monte") {
            Protocol::MonteCarlo
        } else if name.contains("long") {
            Protocol::LongMsg
        } else {
            Protocol::ShortMsg
        }
    }

    /// file_stem is the protocol part of a request file name,
    /// as in `SHA256ShortMsg.req`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Protocol::ShortMsg => "ShortMsg",
            Protocol::LongMsg => "LongMsg",
            Protocol::MonteCarlo => "Monte",
        }
    }

    /// is_message reports whether the protocol uses `Len`/`Msg` records.
    pub fn is_message(self) -> bool {
        !matches!(self, Protocol::MonteCarlo)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" | "shortmsg" => Ok(Protocol::ShortMsg),
            "long" | "longmsg" => Ok(Protocol::LongMsg),
            "monte" | "montecarlo" | "mct" => Ok(Protocol::MonteCarlo),
            other => Err(format!(
                "unknown protocol {:?} (expected short, long or monte)",
                other
            )),
        }
    }
}
