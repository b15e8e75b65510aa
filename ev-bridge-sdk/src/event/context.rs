use crate::error::{EventError, EventResult};
use crate::event::versions::{ContextV01, ContextV02, ContextV03, ContextV10, Extensions};
use crate::spec::{self, AttributeKind, SpecVersion};
use crate::value::{EvValue, EvValueCastError};
use chrono::{DateTime, Utc};
use url::Url;

/// Versioned metadata attribute set attached to an event.
///
/// A context always knows its own version and can produce a structurally
/// equivalent context of any other version. Migration is total but lossy in
/// one direction: fields absent in an older version are dropped on
/// downgrade, and fields new in a later version are left unset (never
/// inferred).
#[derive(Debug, Clone, PartialEq)]
pub enum EventContext {
    V01(ContextV01),
    V02(ContextV02),
    V03(ContextV03),
    V10(ContextV10),
}

impl Default for EventContext {
    fn default() -> Self {
        EventContext::new(SpecVersion::V10)
    }
}

impl EventContext {
    /// Empty context of the given version.
    pub fn new(version: SpecVersion) -> Self {
        match version {
            SpecVersion::V01 => EventContext::V01(ContextV01::default()),
            SpecVersion::V02 => EventContext::V02(ContextV02::default()),
            SpecVersion::V03 => EventContext::V03(ContextV03::default()),
            SpecVersion::V10 => EventContext::V10(ContextV10::default()),
        }
    }

    #[inline]
    pub fn spec_version(&self) -> SpecVersion {
        match self {
            EventContext::V01(_) => SpecVersion::V01,
            EventContext::V02(_) => SpecVersion::V02,
            EventContext::V03(_) => SpecVersion::V03,
            EventContext::V10(_) => SpecVersion::V10,
        }
    }

    /// Read an attribute value by kind. `None` when the kind is unset or not
    /// defined in this version. `SpecVersion` is answered from the variant
    /// tag itself.
    pub fn attribute(&self, kind: AttributeKind) -> Option<EvValue> {
        if kind == AttributeKind::SpecVersion {
            return Some(EvValue::String(self.spec_version().as_str().to_string()));
        }
        match self {
            EventContext::V01(c) => c.attribute(kind),
            EventContext::V02(c) => c.attribute(kind),
            EventContext::V03(c) => c.attribute(kind),
            EventContext::V10(c) => c.attribute(kind),
        }
    }

    /// Write an attribute value by kind, coercing as needed.
    ///
    /// Setting `SpecVersion` migrates the whole context to the named
    /// version. An unrecognized version string is a **no-op version
    /// switch**: the context keeps its current version and data. This is a
    /// deliberate compatibility choice, not a bug.
    pub fn set_attribute(&mut self, kind: AttributeKind, value: EvValue) -> EventResult<()> {
        if kind == AttributeKind::SpecVersion {
            if let Some(version) = SpecVersion::parse(&value.to_string_repr()) {
                *self = self.as_version(version);
            }
            return Ok(());
        }
        match self {
            EventContext::V01(c) => c.set_attribute(kind, value),
            EventContext::V02(c) => c.set_attribute(kind, value),
            EventContext::V03(c) => c.set_attribute(kind, value),
            EventContext::V10(c) => c.set_attribute(kind, value),
        }
    }

    /// Produce a context of `target` version.
    ///
    /// Every attribute defined in both versions is copied verbatim;
    /// attributes unique to the source are dropped; attributes unique to the
    /// target stay unset. Extensions are copied as-is, except an extension
    /// whose key collides with a reserved attribute name of the target
    /// version: that one is dropped rather than failing, so migration stays
    /// total. Converting to the current version returns an equivalent copy
    /// (idempotence).
    pub fn as_version(&self, target: SpecVersion) -> EventContext {
        if self.spec_version() == target {
            return self.clone();
        }
        let mut out = EventContext::new(target);
        for attr in spec::attributes(target) {
            if attr.kind() == AttributeKind::SpecVersion {
                continue;
            }
            if spec::attribute(self.spec_version(), attr.kind()).is_some() {
                if let Some(value) = self.attribute(attr.kind()) {
                    // Values read from a canonical context cannot fail
                    // coercion into another canonical context.
                    let _ = attr.set(&mut out, value);
                }
            }
        }
        for (name, value) in self.extensions() {
            let _ = out.set_extension_value(name, value.clone());
        }
        out
    }

    pub fn as_v01(&self) -> EventContext {
        self.as_version(SpecVersion::V01)
    }

    pub fn as_v02(&self) -> EventContext {
        self.as_version(SpecVersion::V02)
    }

    pub fn as_v03(&self) -> EventContext {
        self.as_version(SpecVersion::V03)
    }

    pub fn as_v10(&self) -> EventContext {
        self.as_version(SpecVersion::V10)
    }

    // ===== extensions =====

    fn extensions_map(&self) -> &Extensions {
        match self {
            EventContext::V01(c) => &c.extensions,
            EventContext::V02(c) => &c.extensions,
            EventContext::V03(c) => &c.extensions,
            EventContext::V10(c) => &c.extensions,
        }
    }

    fn extensions_map_mut(&mut self) -> &mut Extensions {
        match self {
            EventContext::V01(c) => &mut c.extensions,
            EventContext::V02(c) => &mut c.extensions,
            EventContext::V03(c) => &mut c.extensions,
            EventContext::V10(c) => &mut c.extensions,
        }
    }

    /// Iterate extensions in deterministic (lexicographic) order.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &EvValue)> {
        self.extensions_map().iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read an extension by case-insensitive name.
    pub fn extension(&self, name: &str) -> Option<&EvValue> {
        self.extensions_map().get(&name.to_lowercase())
    }

    /// Set an extension from a typed value.
    ///
    /// Keys are case-insensitive (stored lowercased) and must not collide
    /// with reserved attribute names of this context's version.
    pub fn set_extension_value(&mut self, name: &str, value: EvValue) -> EventResult<()> {
        let version = self.spec_version();
        if spec::is_reserved_name(version, name) {
            return Err(EventError::ReservedExtensionName {
                name: name.to_string(),
                version,
            });
        }
        self.extensions_map_mut().insert(name.to_lowercase(), value);
        Ok(())
    }

    /// Set an extension from arbitrary JSON, canonicalizing the value first.
    pub fn set_extension(&mut self, name: &str, value: serde_json::Value) -> EventResult<()> {
        let value =
            EvValue::validate(value).map_err(|source| EventError::InvalidExtensionValue {
                name: name.to_string(),
                source,
            })?;
        self.set_extension_value(name, value)
    }

    /// Remove an extension by case-insensitive name.
    pub fn remove_extension(&mut self, name: &str) -> Option<EvValue> {
        self.extensions_map_mut().remove(&name.to_lowercase())
    }

    // ===== convenience accessors =====

    pub fn event_type(&self) -> Option<String> {
        self.attribute(AttributeKind::Type).map(|v| v.to_string_repr())
    }

    pub fn set_event_type(&mut self, event_type: impl Into<String>) -> EventResult<()> {
        self.set_attribute(AttributeKind::Type, EvValue::String(event_type.into()))
    }

    pub fn source(&self) -> Option<Url> {
        self.attribute(AttributeKind::Source)
            .and_then(|v| v.to_uri().ok())
    }

    pub fn set_source(&mut self, source: &str) -> EventResult<()> {
        let url = Url::parse(source).map_err(|_| EventError::AttributeCoercion {
            kind: AttributeKind::Source,
            source: EvValueCastError::Parse {
                target: "uri",
                value: source.to_string(),
            },
        })?;
        self.set_attribute(AttributeKind::Source, EvValue::Uri(url))
    }

    pub fn id(&self) -> Option<String> {
        self.attribute(AttributeKind::Id).map(|v| v.to_string_repr())
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> EventResult<()> {
        self.set_attribute(AttributeKind::Id, EvValue::String(id.into()))
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.attribute(AttributeKind::Time)
            .and_then(|v| v.to_timestamp().ok())
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) -> EventResult<()> {
        self.set_attribute(AttributeKind::Time, EvValue::Timestamp(time))
    }

    pub fn data_content_type(&self) -> Option<String> {
        self.attribute(AttributeKind::DataContentType)
            .map(|v| v.to_string_repr())
    }

    pub fn set_data_content_type(&mut self, content_type: impl Into<String>) -> EventResult<()> {
        self.set_attribute(
            AttributeKind::DataContentType,
            EvValue::String(content_type.into()),
        )
    }

    pub fn subject(&self) -> Option<String> {
        self.attribute(AttributeKind::Subject)
            .map(|v| v.to_string_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_v03() -> EventContext {
        let mut ctx = EventContext::new(SpecVersion::V03);
        ctx.set_event_type("com.example.test").unwrap();
        ctx.set_source("urn:test").unwrap();
        ctx.set_id("1").unwrap();
        ctx.set_time("2024-03-01T12:00:00Z".parse().unwrap()).unwrap();
        ctx.set_extension("priority", json!(5)).unwrap();
        ctx
    }

    #[test]
    fn conversion_is_idempotent() {
        let ctx = sample_v03();
        assert_eq!(ctx.as_v03(), ctx);
    }

    #[test]
    fn shared_subset_survives_round_trip() {
        for target in SpecVersion::all() {
            let ctx = sample_v03();
            let back = ctx.as_version(target).as_v03();
            assert_eq!(back.event_type(), ctx.event_type(), "via {target}");
            assert_eq!(back.source(), ctx.source(), "via {target}");
            assert_eq!(back.id(), ctx.id(), "via {target}");
            assert_eq!(back.time(), ctx.time(), "via {target}");
        }
    }

    #[test]
    fn extension_survives_v10_round_trip() {
        let ctx = sample_v03();
        let back = ctx.as_v10().as_v03();
        assert_eq!(back.extension("priority"), Some(&EvValue::Integer(5)));
    }

    #[test]
    fn downgrade_drops_newer_fields() {
        let mut ctx = EventContext::new(SpecVersion::V03);
        ctx.set_attribute(AttributeKind::Subject, EvValue::String("s".into()))
            .unwrap();
        let old = ctx.as_v01();
        assert_eq!(old.subject(), None);
        // and the dropped field is not resurrected on upgrade
        assert_eq!(old.as_v03().subject(), None);
    }

    #[test]
    fn extension_colliding_with_target_attribute_is_dropped() {
        // "subject" is a valid extension key on v0.1 but a reserved
        // attribute name from v0.3 on.
        let mut ctx = EventContext::new(SpecVersion::V01);
        ctx.set_extension("subject", json!("orders")).unwrap();
        let upgraded = ctx.as_v03();
        assert_eq!(upgraded.extension("subject"), None);
        assert_eq!(upgraded.attribute(AttributeKind::Subject), None);
    }

    #[test]
    fn spec_version_attribute_migrates_context() {
        let mut ctx = sample_v03();
        ctx.set_attribute(AttributeKind::SpecVersion, EvValue::String("1.0".into()))
            .unwrap();
        assert_eq!(ctx.spec_version(), SpecVersion::V10);
        assert_eq!(ctx.event_type().as_deref(), Some("com.example.test"));
    }

    #[test]
    fn unknown_spec_version_is_a_no_op_switch() {
        let mut ctx = sample_v03();
        ctx.set_attribute(AttributeKind::SpecVersion, EvValue::String("9.9".into()))
            .unwrap();
        assert_eq!(ctx.spec_version(), SpecVersion::V03);
        assert_eq!(ctx.id().as_deref(), Some("1"));
    }

    #[test]
    fn reserved_extension_names_rejected() {
        let mut ctx = EventContext::new(SpecVersion::V10);
        assert!(matches!(
            ctx.set_extension("specversion", json!("x")),
            Err(EventError::ReservedExtensionName { .. })
        ));
    }

    #[test]
    fn extension_keys_are_case_insensitive() {
        let mut ctx = EventContext::new(SpecVersion::V10);
        ctx.set_extension("Priority", json!(5)).unwrap();
        assert_eq!(ctx.extension("PRIORITY"), Some(&EvValue::Integer(5)));
    }

    #[test]
    fn clone_is_deep_for_extensions() {
        let original = sample_v03();
        let mut copy = original.clone();
        copy.set_extension("priority", json!(9)).unwrap();
        assert_eq!(original.extension("priority"), Some(&EvValue::Integer(5)));
    }
}
