use std::collections::HashSet;

/// Case-insensitive set of billing identities that must never be updated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    members: HashSet<String>,
}

impl ExclusionSet {
    /// Build from raw lines; each entry may itself hold several newline-separated values
    pub fn build<I, S>(raw_lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members = raw_lines
            .into_iter()
            .flat_map(|raw| {
                raw.as_ref()
                    .lines()
                    .filter_map(normalize)
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { members }
    }

    /// Build from a single newline-separated block of text
    pub fn from_text(text: &str) -> Self {
        Self::build([text])
    }

    pub fn contains(&self, identity: Option<&str>) -> bool {
        identity
            .and_then(normalize)
            .map(|normalized| self.members.contains(&normalized))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
