use crate::error::{BindingError, BindingResult};
use crate::spec::{self, Attribute, AttributeKind, SpecVersion};
use crate::value::EvValue;
use bytes::Bytes;

/// One element of the decomposed message stream.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// Metadata attribute in the source version's declaration order.
    Attribute(Attribute, EvValue),
    /// Extension pair.
    Extension(String, EvValue),
    /// Payload chunk. At most one per translation.
    Payload(Bytes),
}

/// Rewriting stage scoped to one translation pass.
///
/// A transformer may veto an item (`Ok(None)`), rewrite it, or pass it
/// through unchanged. Stages run in the order their factories were supplied.
pub trait Transformer {
    fn transform(&mut self, item: StreamItem) -> BindingResult<Option<StreamItem>>;
}

/// Produces a fresh [`Transformer`] per translation. Factories are supplied
/// by the caller of `translate` and outlive a single call.
pub trait TransformerFactory: Send + Sync {
    /// Stage name used in error reports.
    fn name(&self) -> &'static str;

    fn transformer(&self) -> Box<dyn Transformer>;

    /// Whether direct structured passthrough must be bypassed so this stage
    /// sees the decomposed stream. Defaults to true; a stage that only
    /// observes may override.
    fn requires_decomposition(&self) -> bool {
        true
    }
}

/// Forces every translated message to a target spec version.
///
/// Attributes are re-mapped to the target version's descriptor of the same
/// kind; kinds absent from the target are dropped (migration is lossy on
/// downgrade by design). Extensions and payload pass through untouched.
#[derive(Debug, Clone, Copy)]
pub struct VersionTranslator {
    target: SpecVersion,
}

impl VersionTranslator {
    pub fn new(target: SpecVersion) -> Self {
        VersionTranslator { target }
    }

    pub fn factory(target: SpecVersion) -> Box<dyn TransformerFactory> {
        Box::new(VersionTranslator::new(target))
    }
}

impl TransformerFactory for VersionTranslator {
    fn name(&self) -> &'static str {
        "version"
    }

    fn transformer(&self) -> Box<dyn Transformer> {
        Box::new(VersionTransform {
            target: self.target,
        })
    }
}

struct VersionTransform {
    target: SpecVersion,
}

impl Transformer for VersionTransform {
    fn transform(&mut self, item: StreamItem) -> BindingResult<Option<StreamItem>> {
        match item {
            StreamItem::Attribute(attr, value) => {
                if attr.kind() == AttributeKind::SpecVersion {
                    let target_attr = spec::attribute(self.target, AttributeKind::SpecVersion)
                        .ok_or(BindingError::Transform {
                            name: "version",
                            reason: "target version table has no spec version attribute"
                                .to_string(),
                        })?;
                    return Ok(Some(StreamItem::Attribute(
                        target_attr,
                        EvValue::String(self.target.as_str().to_string()),
                    )));
                }
                match spec::attribute(self.target, attr.kind()) {
                    Some(target_attr) => Ok(Some(StreamItem::Attribute(target_attr, value))),
                    // Kind does not exist in the target version; drop it.
                    None => Ok(None),
                }
            }
            other => Ok(Some(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_translator_rewrites_spec_version() {
        let factory = VersionTranslator::new(SpecVersion::V10);
        let mut t = factory.transformer();
        let src = spec::attribute(SpecVersion::V01, AttributeKind::SpecVersion).unwrap();
        let out = t
            .transform(StreamItem::Attribute(src, EvValue::String("0.1".into())))
            .unwrap()
            .unwrap();
        match out {
            StreamItem::Attribute(attr, value) => {
                assert_eq!(attr.version(), SpecVersion::V10);
                assert_eq!(value, EvValue::String("1.0".into()));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn version_translator_remaps_renamed_attributes() {
        let factory = VersionTranslator::new(SpecVersion::V10);
        let mut t = factory.transformer();
        let src = spec::attribute(SpecVersion::V01, AttributeKind::Type).unwrap();
        let out = t
            .transform(StreamItem::Attribute(src, EvValue::String("t".into())))
            .unwrap()
            .unwrap();
        match out {
            StreamItem::Attribute(attr, _) => assert_eq!(attr.name(), "type"),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn version_translator_drops_kinds_absent_from_target() {
        let factory = VersionTranslator::new(SpecVersion::V01);
        let mut t = factory.transformer();
        let src = spec::attribute(SpecVersion::V03, AttributeKind::Subject).unwrap();
        let out = t
            .transform(StreamItem::Attribute(src, EvValue::String("s".into())))
            .unwrap();
        assert!(out.is_none());
    }
}
