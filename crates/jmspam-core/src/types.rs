/// One outbound API operation: method, path, and query parameters.
///
/// The query keeps its insertion order. The order is part of the signed
/// request-target, so reordering parameters changes the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    method: String,
    path: String,
    query: Vec<(String, String)>,
}

impl Operation {
    /// The method is stored in its lowercase canonical form.
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_lowercase(),
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("get", path)
    }

    /// Append a query parameter, preserving insertion order.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.query
    }
}
