use gtrack_core::models::Feature;

/// One key/value row of a feature detail popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupEntry {
    pub name: String,
    pub value: String,
}

impl PopupEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        PopupEntry {
            name: name.into(),
            value: value.into(),
        }
    }
}

///
/// Renders detail rows for a feature. Derived features (whole-genome
/// projections) are always rendered from the feature they were made from.
///
pub trait PopupFormatter: Send + Sync {
    fn format(&self, feature: &Feature) -> Vec<PopupEntry>;

    fn popup_data(&self, feature: &Feature) -> Vec<PopupEntry> {
        self.format(feature.original())
    }
}

/// Name, gene, type, location, then the remaining attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPopupFormatter;

impl PopupFormatter for DefaultPopupFormatter {
    fn format(&self, feature: &Feature) -> Vec<PopupEntry> {
        let mut rows = Vec::new();
        if let Some(name) = &feature.name {
            rows.push(PopupEntry::new("Name", name));
        }
        if let Some(gene) = &feature.gene {
            rows.push(PopupEntry::new("Gene", gene));
        }
        if let Some(feature_type) = &feature.feature_type {
            rows.push(PopupEntry::new("Type", feature_type));
        }
        rows.push(PopupEntry::new("Location", feature.locus_string()));
        for (key, value) in feature.attributes.iter() {
            rows.push(PopupEntry::new(key, value));
        }
        rows
    }
}
