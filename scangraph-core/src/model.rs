use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Host,
    Ip,
    Tech,
    Asn,
}

impl NodeLabel {
    /// The label as written in Cypher.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Host => "Host",
            NodeLabel::Ip => "IP",
            NodeLabel::Tech => "Tech",
            NodeLabel::Asn => "ASN",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelType {
    ResolvesTo, // Host -> IP
    Uses,       // Host -> Tech
    BelongsTo,  // Host -> ASN
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::ResolvesTo => "RESOLVES_TO",
            RelType::Uses => "USES",
            RelType::BelongsTo => "BELONGS_TO",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar attributes of a `Host` node. Overwritten wholesale on every upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostProps {
    pub input: String,
    pub port: String,
    pub title: String,
    pub scheme: String,
    pub webserver: String,
    pub status: i64,
    pub words: i64,
    pub lines: i64,
}

/// Identity and attributes of an `ASN` node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsnProps {
    pub number: String,
    pub name: String,
    pub country: String,
}
