/// Content type attached to every signed request.
pub const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");

/// Ordered header set produced by a signer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders {
    entries: Vec<(&'static str, String)>,
}

impl SignedHeaders {
    pub(crate) fn new() -> Self {
        Self {
            entries: vec![(CONTENT_TYPE_JSON.0, CONTENT_TYPE_JSON.1.to_string())],
        }
    }

    pub(crate) fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.entries.push((name, value.into()));
        self
    }

    /// Looks up a header value, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns headers as tuples for reqwest.
    pub fn as_tuples(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(n, v)| (*n, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
