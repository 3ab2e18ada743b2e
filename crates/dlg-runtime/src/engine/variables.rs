use std::collections::BTreeMap;

/// String-valued variable store. Keys are always stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn from_defaults(defaults: BTreeMap<String, String>) -> Self {
        let mut store = Self::default();
        store.seed(defaults);
        store
    }

    /// Inserts pairs whose key is not already present.
    pub fn seed<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.values
                .entry(name.as_ref().to_lowercase())
                .or_insert_with(|| value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_lowercase())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_lowercase(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}
