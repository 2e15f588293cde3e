//! Builder for the files.list `q` filter.
//!
//! Only conjunctions are produced; lookups here never need `or`/`not`.

/// A conjunction of filter clauses.
#[derive(Debug, Clone, Default)]
pub struct Query {
    clauses: Vec<String>,
}

impl Query {
    /// Start an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup of `name` under `parent_id`, or anywhere when there is no parent.
    pub fn lookup(name: &str, parent_id: Option<&str>, skip_trashed: bool) -> String {
        Self::new()
            .name_eq(name)
            .in_parent_opt(parent_id)
            .not_trashed_if(skip_trashed)
            .build()
    }

    /// `name = '<name>'`
    pub fn name_eq(mut self, name: &str) -> Self {
        self.clauses.push(format!("name = '{}'", escape(name)));
        self
    }

    /// `'<parent_id>' in parents`
    pub fn in_parents(mut self, parent_id: &str) -> Self {
        self.clauses.push(format!("'{}' in parents", escape(parent_id)));
        self
    }

    /// Adds `in_parents` only when a parent is known.
    pub fn in_parent_opt(self, parent_id: Option<&str>) -> Self {
        match parent_id {
            Some(id) => self.in_parents(id),
            None => self,
        }
    }

    /// `trashed = false`
    pub fn not_trashed(mut self) -> Self {
        self.clauses.push("trashed = false".to_string());
        self
    }

    /// Adds `not_trashed` when `skip_trashed` is set.
    pub fn not_trashed_if(self, skip_trashed: bool) -> Self {
        if skip_trashed {
            self.not_trashed()
        } else {
            self
        }
    }

    /// Join the clauses with `and`.
    pub fn build(&self) -> String {
        self.clauses.join(" and ")
    }
}

/// Escape a string literal for the query language.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
