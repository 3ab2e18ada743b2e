use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::lifecycle::Localization;
use super::path_tracker::PathTracker;
use super::variables::VariableStore;

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{%([^{}%\s]+)%\}").expect("placeholder regex must compile")
    })
}

pub(crate) struct TextTemplater<'a> {
    localization: &'a dyn Localization,
    variables: &'a VariableStore,
    paths: &'a PathTracker,
}

impl<'a> TextTemplater<'a> {
    pub(crate) fn new(
        localization: &'a dyn Localization,
        variables: &'a VariableStore,
        paths: &'a PathTracker,
    ) -> Self {
        Self {
            localization,
            variables,
            paths,
        }
    }

    /// Localize, interpolate `{%name%}`, then pick the `|` variant for the node's visit count.
    pub(crate) fn render(&self, id: &str, raw: &str, node_index: usize) -> String {
        let source = self.localization.lookup(id).unwrap_or(raw);

        let text = placeholder_regex()
            .replace_all(source, |captures: &Captures<'_>| {
                match self.variables.get(&captures[1]) {
                    Some(value) => value.to_string(),
                    None => captures[0].to_string(),
                }
            })
            .into_owned();

        if !text.contains('|') {
            return text;
        }

        let variants = text
            .split('|')
            .filter(|variant| !variant.is_empty())
            .collect::<Vec<_>>();
        if variants.is_empty() {
            return String::new();
        }
        let visits = self.paths.departures_from(node_index) as usize;
        variants[visits % variants.len()].trim().to_string()
    }
}
