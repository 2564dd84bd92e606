//! Template parsing, composition, and rendering.
//!
//! Hole syntax:
//!
//! - `{{ name }}` is replaced by the value of `name`; unknown or empty is an error
//! - `{{ name? }}` tolerates absence and renders as the empty string
//! - `{{> slot }}` marks a composition point filled by [`ConfigTemplate::compose`]
//!
//! The engine's own `${...}` interpolation passes through untouched.

use std::collections::BTreeMap;

use otc_acc_env::{EnvKey, EnvRegistry};

use crate::error::RenderError;

/// Result of resolving a hole name against a value source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// The name is known and has a value.
    Value(&'a str),
    /// The name is known but unset or empty.
    Unset,
    /// The name is not part of the vocabulary.
    Unknown,
}

/// Something holes can be resolved against.
pub trait ValueSource {
    /// Resolve a hole name.
    fn resolve(&self, name: &str) -> Resolved<'_>;
}

impl ValueSource for EnvRegistry {
    fn resolve(&self, name: &str) -> Resolved<'_> {
        match EnvKey::from_name(name) {
            Some(key) => self.get(key).map_or(Resolved::Unset, Resolved::Value),
            None => Resolved::Unknown,
        }
    }
}

/// Values visible to a render: case parameters layered over the registry.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    registry: &'a EnvRegistry,
    params: BTreeMap<String, String>,
}

impl<'a> RenderContext<'a> {
    /// Create a context backed by the registry alone.
    pub fn new(registry: &'a EnvRegistry) -> Self {
        Self {
            registry,
            params: BTreeMap::new(),
        }
    }

    /// Add a case parameter. Parameters shadow registry keys of the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add several case parameters.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The registry behind this context.
    pub fn registry(&self) -> &'a EnvRegistry {
        self.registry
    }
}

impl ValueSource for RenderContext<'_> {
    fn resolve(&self, name: &str) -> Resolved<'_> {
        match self.params.get(name) {
            Some(value) if value.is_empty() => Resolved::Unset,
            Some(value) => Resolved::Value(value),
            None => self.registry.resolve(name),
        }
    }
}

/// A configuration document with named holes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigTemplate {
    source: String,
}

impl ConfigTemplate {
    /// Wrap a template source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The unrendered source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of every value hole, in order of first appearance.
    ///
    /// # Errors
    ///
    /// Fails when the template is syntactically invalid.
    pub fn holes(&self) -> Result<Vec<String>, RenderError> {
        let mut names: Vec<String> = Vec::new();
        for segment in parse(&self.source)? {
            if let Segment::Value { name, .. } = segment {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Names of unfilled composition slots.
    ///
    /// # Errors
    ///
    /// Fails when the template is syntactically invalid.
    pub fn slots(&self) -> Result<Vec<String>, RenderError> {
        Ok(parse(&self.source)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Slot { name, .. } => Some(name.to_string()),
                _ => None,
            })
            .collect())
    }

    /// Inline `child` at every `{{> slot }}` marker.
    ///
    /// Composition is textual, so rendering a composed template yields the
    /// same bytes as rendering a template written with the child inlined.
    ///
    /// # Errors
    ///
    /// Fails when the parent has no such slot or is syntactically invalid.
    pub fn compose(&self, slot: &str, child: &ConfigTemplate) -> Result<Self, RenderError> {
        let segments = parse(&self.source)?;
        let mut found = false;
        let mut out = String::with_capacity(self.source.len() + child.source.len());
        for segment in &segments {
            match segment {
                Segment::Slot { name, .. } if *name == slot => {
                    found = true;
                    out.push_str(&child.source);
                }
                other => out.push_str(other.raw()),
            }
        }
        if !found {
            return Err(RenderError::MissingSlot {
                slot: slot.to_string(),
            });
        }
        Ok(Self::new(out))
    }

    /// Concatenate two templates, separated by a newline.
    #[must_use]
    pub fn then(&self, next: &ConfigTemplate) -> Self {
        let mut out = self.source.clone();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&next.source);
        Self::new(out)
    }

    /// Render against a value source.
    ///
    /// Rendering is pure: identical inputs give byte-identical output.
    ///
    /// # Errors
    ///
    /// Fails on unknown or empty holes (unless tolerant), unfilled slots, or
    /// invalid syntax.
    pub fn render(&self, values: &dyn ValueSource) -> Result<String, RenderError> {
        let segments = parse(&self.source)?;
        let mut out = String::with_capacity(self.source.len());
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Value {
                    name,
                    tolerant,
                    line,
                    ..
                } => match values.resolve(name) {
                    Resolved::Value(value) => out.push_str(value),
                    _ if tolerant => {}
                    Resolved::Unset => {
                        return Err(RenderError::EmptyHole {
                            name: name.to_string(),
                            line,
                        })
                    }
                    Resolved::Unknown => {
                        return Err(RenderError::UnknownHole {
                            name: name.to_string(),
                            line,
                        })
                    }
                },
                Segment::Slot { name, .. } => {
                    return Err(RenderError::UnfilledSlot {
                        slot: name.to_string(),
                    })
                }
            }
        }
        Ok(out)
    }
}

impl From<&str> for ConfigTemplate {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for ConfigTemplate {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Value {
        raw: &'a str,
        name: &'a str,
        tolerant: bool,
        line: usize,
    },
    Slot {
        raw: &'a str,
        name: &'a str,
        line: usize,
    },
}

impl<'a> Segment<'a> {
    fn raw(&self) -> &'a str {
        match self {
            Segment::Text(raw) | Segment::Value { raw, .. } | Segment::Slot { raw, .. } => *raw,
        }
    }
}

fn parse(source: &str) -> Result<Vec<Segment<'_>>, RenderError> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut consumed = 0usize;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        let line = line_of(source, consumed + open);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(RenderError::Unterminated { line })?;
        let raw = &rest[open..open + 2 + close + 2];
        let inner = after_open[..close].trim();

        segments.push(classify(raw, inner, line)?);

        let advance = open + 2 + close + 2;
        consumed += advance;
        rest = &rest[advance..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

fn classify<'a>(raw: &'a str, inner: &'a str, line: usize) -> Result<Segment<'a>, RenderError> {
    let invalid = || RenderError::InvalidHole {
        raw: raw.to_string(),
        line,
    };
    if let Some(slot) = inner.strip_prefix('>') {
        let name = slot.trim();
        if !is_valid_name(name) {
            return Err(invalid());
        }
        return Ok(Segment::Slot { raw, name, line });
    }
    let (name, tolerant) = match inner.strip_suffix('?') {
        Some(name) => (name.trim_end(), true),
        None => (inner, false),
    };
    if !is_valid_name(name) {
        return Err(invalid());
    }
    Ok(Segment::Value {
        raw,
        name,
        tolerant,
        line,
    })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn registry() -> EnvRegistry {
        EnvRegistry::from_pairs([
            ("OS_REGION_NAME", "eu-de"),
            ("OS_VPC_ID", "vpc-123"),
            ("OS_SUBNET_ID", "subnet-456"),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_substitutes_registry_values() {
        let reg = registry();
        let tpl = ConfigTemplate::new("vpc_id = \"{{ vpc_id }}\"\nsubnet = \"{{subnet_id}}\"");
        assert_eq!(
            tpl.render(&reg).unwrap(),
            "vpc_id = \"vpc-123\"\nsubnet = \"subnet-456\""
        );
    }

    #[test]
    fn test_engine_interpolation_passes_through() {
        let reg = registry();
        let tpl = ConfigTemplate::new("id = \"${opentelekomcloud_vpc_v1.vpc_1.id}\"");
        assert_eq!(tpl.render(&reg).unwrap(), tpl.source());
    }

    #[test]
    fn test_unknown_hole_is_an_error() {
        let reg = registry();
        let err = ConfigTemplate::new("a\n{{ no_such }}").render(&reg).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownHole {
                name: "no_such".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_empty_registry_value_is_an_error() {
        let reg = registry();
        let err = ConfigTemplate::new("{{ image_id }}").render(&reg).unwrap_err();
        assert!(matches!(err, RenderError::EmptyHole { name, .. } if name == "image_id"));
    }

    #[rstest]
    #[case("{{ image_id? }}")]
    #[case("{{ no_such? }}")]
    fn test_tolerant_hole_renders_empty(#[case] source: &str) {
        let reg = registry();
        assert_eq!(ConfigTemplate::new(source).render(&reg).unwrap(), "");
    }

    #[test]
    fn test_params_shadow_registry() {
        let reg = registry();
        let ctx = RenderContext::new(&reg)
            .with("vpc_id", "override")
            .with("zone_name", "acpttest.com.");
        let tpl = ConfigTemplate::new("{{vpc_id}} {{zone_name}} {{region}}");
        assert_eq!(tpl.render(&ctx).unwrap(), "override acpttest.com. eu-de");
    }

    #[test]
    fn test_empty_param_is_an_error() {
        let reg = registry();
        let ctx = RenderContext::new(&reg).with("name", "");
        assert!(matches!(
            ConfigTemplate::new("{{name}}").render(&ctx),
            Err(RenderError::EmptyHole { .. })
        ));
    }

    #[rstest]
    #[case("{{ vpc_id ")]
    #[case("{{ two words }}")]
    #[case("{{}}")]
    fn test_syntax_errors(#[case] source: &str) {
        let reg = registry();
        assert!(ConfigTemplate::new(source).render(&reg).is_err());
    }

    #[test]
    fn test_unfilled_slot_is_an_error() {
        let reg = registry();
        let err = ConfigTemplate::new("{{> network }}").render(&reg).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnfilledSlot {
                slot: "network".into()
            }
        );
    }

    #[test]
    fn test_compose_missing_slot() {
        let parent = ConfigTemplate::new("nothing here");
        let child = ConfigTemplate::new("x");
        assert!(matches!(
            parent.compose("network", &child),
            Err(RenderError::MissingSlot { .. })
        ));
    }

    #[test]
    fn test_compose_is_associative() {
        let reg = registry();
        let a = ConfigTemplate::new("# a\n{{> b }}\n# end a {{region}}");
        let b = ConfigTemplate::new("vpc = \"{{vpc_id}}\"\n{{> c }}");
        let c = ConfigTemplate::new("subnet = \"{{subnet_id}}\"");

        let left = a.compose("b", &b).unwrap().compose("c", &c).unwrap();
        let right = a.compose("b", &b.compose("c", &c).unwrap()).unwrap();
        assert_eq!(left, right);

        let inlined = ConfigTemplate::new(
            "# a\nvpc = \"{{vpc_id}}\"\nsubnet = \"{{subnet_id}}\"\n# end a {{region}}",
        );
        assert_eq!(left.render(&reg).unwrap(), inlined.render(&reg).unwrap());
    }

    #[test]
    fn test_holes_and_slots_listing() {
        let tpl = ConfigTemplate::new("{{vpc_id}} {{> extra }} {{vpc_id}} {{region?}}");
        assert_eq!(tpl.holes().unwrap(), vec!["vpc_id", "region"]);
        assert_eq!(tpl.slots().unwrap(), vec!["extra"]);
    }

    #[test]
    fn test_then_joins_with_newline() {
        let a = ConfigTemplate::new("a");
        let b = ConfigTemplate::new("b");
        assert_eq!(a.then(&b).source(), "a\nb");
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(text in "[a-z ={}\\n\"]{0,64}", vpc in "[a-z0-9-]{1,16}") {
            let reg = EnvRegistry::from_pairs([
                ("OS_REGION_NAME", "eu-de".to_string()),
                ("OS_VPC_ID", vpc),
            ]).unwrap();
            let tpl = ConfigTemplate::new(format!("{text}{{{{vpc_id}}}}{text}"));
            let first = tpl.render(&reg);
            let second = tpl.render(&reg);
            prop_assert_eq!(first, second);
        }
    }
}
