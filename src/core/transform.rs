//! Text-level cleanup applied to the raw export before it is parsed.
//!
//! Transforms are registered once, in a fixed order. A [`TransformSelection`]
//! only switches them on or off; it never changes the order they run in.

use crate::domain::model::RawDocument;
use crate::utils::error::{Result, TidyError};
use im::OrdMap;
use std::collections::HashSet;
use std::fmt;

pub type TransformFn = fn(&str) -> String;

#[derive(Clone, Copy)]
pub struct TransformDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub apply: TransformFn,
}

impl fmt::Debug for TransformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Drops line 0. A single-line document becomes empty.
pub fn remove_first_line(input: &str) -> String {
    input.split('\n').skip(1).collect::<Vec<_>>().join("\n")
}

pub fn remove_decimals(input: &str) -> String {
    map_lines(input, |line| line.replace(",00", ""))
}

pub fn round_amounts(input: &str) -> String {
    map_lines(input, |line| {
        line.replace("112,50", "112").replace("262,50", "262")
    })
}

fn map_lines(input: &str, f: impl Fn(&str) -> String) -> String {
    input.split('\n').map(f).collect::<Vec<_>>().join("\n")
}

const STANDARD_TRANSFORMS: [TransformDescriptor; 3] = [
    TransformDescriptor {
        id: "remove-first-line",
        label: "Remove first line",
        apply: remove_first_line,
    },
    TransformDescriptor {
        id: "remove-decimals",
        label: "Remove all ,00",
        apply: remove_decimals,
    },
    TransformDescriptor {
        id: "round-amounts",
        label: "Change 112,50 to 112 and 262,50 to 262",
        apply: round_amounts,
    },
];

#[derive(Debug, Clone)]
pub struct TransformRegistry {
    descriptors: Vec<TransformDescriptor>,
}

impl TransformRegistry {
    pub fn standard() -> Self {
        Self {
            descriptors: STANDARD_TRANSFORMS.to_vec(),
        }
    }

    /// Builds a registry in the given order. Ids must be unique.
    pub fn new(descriptors: Vec<TransformDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.id) {
                return Err(TidyError::ConfigError {
                    message: format!("Transform '{}' registered twice", descriptor.id),
                });
            }
        }
        Ok(Self { descriptors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformDescriptor> {
        self.descriptors.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|d| d.id)
    }

    pub fn get(&self, id: &str) -> Option<&TransformDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Which registered transforms are switched on.
///
/// Backed by a persistent map: toggling returns a new selection and leaves
/// every existing copy untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSelection {
    enabled: OrdMap<String, bool>,
}

impl TransformSelection {
    pub fn all_enabled(registry: &TransformRegistry) -> Self {
        Self {
            enabled: registry.ids().map(|id| (id.to_string(), true)).collect(),
        }
    }

    pub fn with(&self, id: &str, enabled: bool) -> Result<Self> {
        if !self.enabled.contains_key(id) {
            return Err(TidyError::UnknownTransform { id: id.to_string() });
        }
        Ok(Self {
            enabled: self.enabled.update(id.to_string(), enabled),
        })
    }

    pub fn without<I, S>(&self, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .try_fold(self.clone(), |selection, id| selection.with(id.as_ref(), false))
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.get(id).copied().unwrap_or(false)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.enabled.iter().map(|(id, on)| (id.as_str(), *on))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    registry: TransformRegistry,
}

impl TransformPipeline {
    pub fn new(registry: TransformRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    pub fn default_selection(&self) -> TransformSelection {
        TransformSelection::all_enabled(&self.registry)
    }

    /// Runs every enabled transform in registry order, each on the previous output.
    pub fn apply(&self, document: &RawDocument, selection: &TransformSelection) -> String {
        self.registry
            .iter()
            .filter(|descriptor| selection.is_enabled(descriptor.id))
            .fold(document.as_str().to_string(), |text, descriptor| {
                tracing::debug!("Applying transform '{}'", descriptor.id);
                (descriptor.apply)(&text)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(id: &str) -> TransformSelection {
        let registry = TransformRegistry::standard();
        let others: Vec<&str> = registry.ids().filter(|other| *other != id).collect();
        TransformSelection::all_enabled(&registry)
            .without(others)
            .unwrap()
    }

    #[test]
    fn test_remove_first_line() {
        assert_eq!(remove_first_line("h\na\nb\nc"), "a\nb\nc");
        assert_eq!(remove_first_line("only"), "");
        assert_eq!(remove_first_line(""), "");
    }

    #[test]
    fn test_remove_decimals_on_every_line() {
        assert_eq!(remove_decimals("NOK 200,00\nNOK 2 500,00,x"), "NOK 200\nNOK 2 500,x");
    }

    #[test]
    fn test_round_amounts() {
        assert_eq!(
            round_amounts("NOK 112,50\nNOK 262,50;NOK 112,50"),
            "NOK 112\nNOK 262;NOK 112"
        );
        assert_eq!(round_amounts("NOK 113,50"), "NOK 113,50");
    }

    #[test]
    fn test_pipeline_only_decimals_enabled() {
        let pipeline = TransformPipeline::default();
        let doc = RawDocument::from_text("PRICE\nNOK 200,00");
        assert_eq!(
            pipeline.apply(&doc, &only("remove-decimals")),
            "PRICE\nNOK 200"
        );
    }

    #[test]
    fn test_pipeline_only_header_removal_enabled() {
        let pipeline = TransformPipeline::default();
        let doc = RawDocument::from_text("title\nA,B\n1,00\n112,50");
        assert_eq!(
            pipeline.apply(&doc, &only("remove-first-line")),
            "A,B\n1,00\n112,50"
        );
    }

    #[test]
    fn test_pipeline_runs_in_registry_order() {
        let pipeline = TransformPipeline::default();
        let doc = RawDocument::from_text("header\nx 112,5,000");
        let selection = pipeline.default_selection();
        // Removing ",00" first exposes "112,50" to the rounding step.
        assert_eq!(pipeline.apply(&doc, &selection), "x 112");
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let pipeline = TransformPipeline::default();
        let doc = RawDocument::from_text("h\nNOK 262,50\nNOK 1,00");
        let selection = pipeline
            .default_selection()
            .with("remove-first-line", false)
            .unwrap();
        let first = pipeline.apply(&doc, &selection);
        let second = pipeline.apply(&doc, &selection);
        assert_eq!(first, second);
        assert_eq!(first, "h\nNOK 262\nNOK 1");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let pipeline = TransformPipeline::default();
        let doc = RawDocument::from_text("");
        assert_eq!(pipeline.apply(&doc, &pipeline.default_selection()), "");
    }

    #[test]
    fn test_selection_toggle_returns_new_value() {
        let registry = TransformRegistry::standard();
        let original = TransformSelection::all_enabled(&registry);
        let toggled = original.with("round-amounts", false).unwrap();

        assert!(original.is_enabled("round-amounts"));
        assert!(!toggled.is_enabled("round-amounts"));
        assert_eq!(toggled.entries().count(), registry.len());
    }

    #[test]
    fn test_selection_rejects_unknown_id() {
        let selection = TransformSelection::all_enabled(&TransformRegistry::standard());
        assert!(matches!(
            selection.with("reverse", true),
            Err(TidyError::UnknownTransform { .. })
        ));
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let duplicate = vec![STANDARD_TRANSFORMS[0], STANDARD_TRANSFORMS[0]];
        assert!(TransformRegistry::new(duplicate).is_err());
    }
}
