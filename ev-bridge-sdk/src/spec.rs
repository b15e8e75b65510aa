//! Per-version attribute tables.
//!
//! Each schema version is described by one static table of [`Attribute`]
//! descriptors. Attributes are looked up by [`AttributeKind`], not by wire
//! name, so version migration can rename a field without breaking callers.
//! Adding a version means adding one table plus one conversion pair on the
//! context, not a new type hierarchy.

use crate::error::EventResult;
use crate::event::EventContext;
use crate::value::EvValue;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Supported metadata schema revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecVersion {
    #[serde(rename = "0.1")]
    V01,
    #[serde(rename = "0.2")]
    V02,
    #[serde(rename = "0.3")]
    V03,
    #[serde(rename = "1.0")]
    V10,
}

impl SpecVersion {
    /// Stable wire string for this version.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V01 => "0.1",
            SpecVersion::V02 => "0.2",
            SpecVersion::V03 => "0.3",
            SpecVersion::V10 => "1.0",
        }
    }

    /// Parse a wire string. Unknown strings yield `None`; callers on the
    /// translation path treat that as a no-op version switch.
    pub fn parse(s: &str) -> Option<SpecVersion> {
        match s {
            "0.1" => Some(SpecVersion::V01),
            "0.2" => Some(SpecVersion::V02),
            "0.3" => Some(SpecVersion::V03),
            "1.0" => Some(SpecVersion::V10),
            _ => None,
        }
    }

    /// All versions, oldest first.
    pub const fn all() -> [SpecVersion; 4] {
        [
            SpecVersion::V01,
            SpecVersion::V02,
            SpecVersion::V03,
            SpecVersion::V10,
        ]
    }
}

impl Display for SpecVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind tag identifying a logical metadata field across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    SpecVersion,
    Type,
    Source,
    Subject,
    Id,
    Time,
    SchemaUrl,
    DataContentType,
    DataContentEncoding,
}

/// Immutable per-version descriptor of a single metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    kind: AttributeKind,
    name: &'static str,
    version: SpecVersion,
}

impl Attribute {
    #[inline]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Wire name of this field in its version (also the binary header name).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// Read this attribute's value from a context. `None` when unset.
    pub fn get(&self, ctx: &EventContext) -> Option<EvValue> {
        ctx.attribute(self.kind)
    }

    /// Write this attribute's value on a context, coercing as needed.
    pub fn set(&self, ctx: &mut EventContext, value: EvValue) -> EventResult<()> {
        ctx.set_attribute(self.kind, value)
    }
}

const fn attr(kind: AttributeKind, name: &'static str, version: SpecVersion) -> Attribute {
    Attribute {
        kind,
        name,
        version,
    }
}

/// v0.1 attribute table. Spec version first; iteration order is the
/// version's declaration order used by the binary decomposition.
static V01_ATTRIBUTES: &[Attribute] = &[
    attr(
        AttributeKind::SpecVersion,
        "cloudEventsVersion",
        SpecVersion::V01,
    ),
    attr(AttributeKind::Type, "eventType", SpecVersion::V01),
    attr(AttributeKind::Source, "source", SpecVersion::V01),
    attr(AttributeKind::Id, "eventID", SpecVersion::V01),
    attr(AttributeKind::Time, "eventTime", SpecVersion::V01),
    attr(AttributeKind::SchemaUrl, "schemaURL", SpecVersion::V01),
    attr(
        AttributeKind::DataContentType,
        "contentType",
        SpecVersion::V01,
    ),
];

static V02_ATTRIBUTES: &[Attribute] = &[
    attr(AttributeKind::SpecVersion, "specversion", SpecVersion::V02),
    attr(AttributeKind::Type, "type", SpecVersion::V02),
    attr(AttributeKind::Source, "source", SpecVersion::V02),
    attr(AttributeKind::Id, "id", SpecVersion::V02),
    attr(AttributeKind::Time, "time", SpecVersion::V02),
    attr(AttributeKind::SchemaUrl, "schemaurl", SpecVersion::V02),
    attr(
        AttributeKind::DataContentType,
        "contenttype",
        SpecVersion::V02,
    ),
];

static V03_ATTRIBUTES: &[Attribute] = &[
    attr(AttributeKind::SpecVersion, "specversion", SpecVersion::V03),
    attr(AttributeKind::Type, "type", SpecVersion::V03),
    attr(AttributeKind::Source, "source", SpecVersion::V03),
    attr(AttributeKind::Subject, "subject", SpecVersion::V03),
    attr(AttributeKind::Id, "id", SpecVersion::V03),
    attr(AttributeKind::Time, "time", SpecVersion::V03),
    attr(AttributeKind::SchemaUrl, "schemaurl", SpecVersion::V03),
    attr(
        AttributeKind::DataContentType,
        "datacontenttype",
        SpecVersion::V03,
    ),
    attr(
        AttributeKind::DataContentEncoding,
        "datacontentencoding",
        SpecVersion::V03,
    ),
];

static V10_ATTRIBUTES: &[Attribute] = &[
    attr(AttributeKind::SpecVersion, "specversion", SpecVersion::V10),
    attr(AttributeKind::Type, "type", SpecVersion::V10),
    attr(AttributeKind::Source, "source", SpecVersion::V10),
    attr(AttributeKind::Subject, "subject", SpecVersion::V10),
    attr(AttributeKind::Id, "id", SpecVersion::V10),
    attr(AttributeKind::Time, "time", SpecVersion::V10),
    attr(AttributeKind::SchemaUrl, "dataschema", SpecVersion::V10),
    attr(
        AttributeKind::DataContentType,
        "datacontenttype",
        SpecVersion::V10,
    ),
];

/// Attribute table for a version, in declaration order (spec version first).
pub fn attributes(version: SpecVersion) -> &'static [Attribute] {
    match version {
        SpecVersion::V01 => V01_ATTRIBUTES,
        SpecVersion::V02 => V02_ATTRIBUTES,
        SpecVersion::V03 => V03_ATTRIBUTES,
        SpecVersion::V10 => V10_ATTRIBUTES,
    }
}

/// Look up a version's attribute by kind.
pub fn attribute(version: SpecVersion, kind: AttributeKind) -> Option<Attribute> {
    attributes(version).iter().find(|a| a.kind == kind).copied()
}

/// Look up a version's attribute by wire name (case-insensitive).
pub fn attribute_by_name(version: SpecVersion, name: &str) -> Option<Attribute> {
    attributes(version)
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .copied()
}

/// Whether a name collides with a reserved attribute name of the version.
/// Extension keys are case-insensitive, so the comparison is too.
pub fn is_reserved_name(version: SpecVersion, name: &str) -> bool {
    attributes(version)
        .iter()
        .any(|a| a.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strings_round_trip() {
        for v in SpecVersion::all() {
            assert_eq!(SpecVersion::parse(v.as_str()), Some(v));
        }
        assert_eq!(SpecVersion::parse("2.0"), None);
    }

    #[test]
    fn tables_start_with_spec_version() {
        for v in SpecVersion::all() {
            assert_eq!(attributes(v)[0].kind(), AttributeKind::SpecVersion);
        }
    }

    #[test]
    fn kind_lookup_follows_renames() {
        assert_eq!(
            attribute(SpecVersion::V01, AttributeKind::Type)
                .unwrap()
                .name(),
            "eventType"
        );
        assert_eq!(
            attribute(SpecVersion::V10, AttributeKind::Type)
                .unwrap()
                .name(),
            "type"
        );
        assert_eq!(
            attribute(SpecVersion::V10, AttributeKind::SchemaUrl)
                .unwrap()
                .name(),
            "dataschema"
        );
    }

    #[test]
    fn version_only_kinds_are_absent_elsewhere() {
        assert!(attribute(SpecVersion::V01, AttributeKind::Subject).is_none());
        assert!(attribute(SpecVersion::V10, AttributeKind::DataContentEncoding).is_none());
        assert!(attribute(SpecVersion::V03, AttributeKind::DataContentEncoding).is_some());
    }

    #[test]
    fn reserved_names_are_case_insensitive() {
        assert!(is_reserved_name(SpecVersion::V01, "eventtype"));
        assert!(is_reserved_name(SpecVersion::V10, "SpecVersion"));
        assert!(!is_reserved_name(SpecVersion::V10, "priority"));
    }
}
