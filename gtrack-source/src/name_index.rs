use std::sync::Arc;

use fxhash::FxHashMap as HashMap;

use gtrack_core::models::Feature;

///
/// Name to feature lookup, filled by searchable sources. The index is owned
/// by the caller and handed to the source when features are ingested, so
/// several sources can share one index.
///
/// Keys are upper-cased; lookups are case-insensitive.
///
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    features: HashMap<String, Arc<Feature>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Index each feature under its name and its gene name. A later feature
    /// with the same name replaces an earlier one.
    ///
    pub fn insert_features<'a, I>(&mut self, features: I)
    where
        I: IntoIterator<Item = &'a Arc<Feature>>,
    {
        for feature in features {
            for key in [feature.name.as_deref(), feature.gene.as_deref()]
                .into_iter()
                .flatten()
            {
                self.features
                    .insert(key.to_uppercase(), Arc::clone(feature));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Feature>> {
        self.features.get(&name.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
