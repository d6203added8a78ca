//! Purpose: Translate structured query options into PostgREST URL parameters.
//! Exports: `QuerySpec`, `QueryParams`, `Filter`, `PREFER_PARAM`.
//! Role: Shared by select/update/delete paths so every service speaks the same dialect.
//! Invariants: Emission order is select, filters (insertion order), order, limit, offset, prefer.
//! Invariants: Absent options emit nothing; filter expressions pass through verbatim.
//! Invariants: Building never fails.

use std::fmt::Display;

/// Parameter name the transport routes to the `Prefer` header.
pub const PREFER_PARAM: &str = "prefer";

const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySpec {
    select: Vec<String>,
    filters: Vec<(String, String)>,
    order_by: Option<String>,
    ascending: Option<bool>,
    limit: Option<u64>,
    offset: Option<u64>,
    return_representation: bool,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds a pre-formatted filter such as `eq.5`. Re-filtering a column
    /// replaces its earlier expression.
    pub fn filter(mut self, column: impl Into<String>, expression: impl Into<String>) -> Self {
        let column = column.into();
        let expression = expression.into();
        match self.filters.iter_mut().find(|(existing, _)| *existing == column) {
            Some(slot) => slot.1 = expression,
            None => self.filters.push((column, expression)),
        }
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Display) -> Self {
        self.filter(column, Filter::eq(value))
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = Some(ascending);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn return_representation(mut self, enabled: bool) -> Self {
        self.return_representation = enabled;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.select
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .map(|(column, expression)| (column.as_str(), expression.as_str()))
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn wants_representation(&self) -> bool {
        self.return_representation
    }

    pub fn build(&self) -> QueryParams {
        let mut params = QueryParams::default();
        if !self.select.is_empty() {
            params.push("select", self.select.join(","));
        }
        for (column, expression) in &self.filters {
            params.push(column.clone(), expression.clone());
        }
        if let Some(column) = &self.order_by {
            let order = match self.ascending {
                Some(true) => format!("{column}.asc"),
                Some(false) => format!("{column}.desc"),
                None => column.clone(),
            };
            params.push("order", order);
        }
        if let Some(limit) = self.limit {
            params.push("limit", limit.to_string());
        }
        if let Some(offset) = self.offset {
            params.push("offset", offset.to_string());
        }
        if self.return_representation {
            params.push(PREFER_PARAM, RETURN_REPRESENTATION);
        }
        params
    }
}

/// Ordered `(name, value)` pairs ready for URL encoding by the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Value for the `Prefer` header, if requested.
    pub fn prefer(&self) -> Option<&str> {
        self.get(PREFER_PARAM)
    }

    /// Every pair except `prefer`, i.e. what belongs in the URL query string.
    pub fn url_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(key, _)| *key != PREFER_PARAM)
    }
}

impl IntoIterator for QueryParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// Formatters for PostgREST operator expressions.
pub struct Filter;

impl Filter {
    pub fn eq(value: impl Display) -> String {
        format!("eq.{value}")
    }

    pub fn neq(value: impl Display) -> String {
        format!("neq.{value}")
    }

    pub fn gt(value: impl Display) -> String {
        format!("gt.{value}")
    }

    pub fn gte(value: impl Display) -> String {
        format!("gte.{value}")
    }

    pub fn lt(value: impl Display) -> String {
        format!("lt.{value}")
    }

    pub fn lte(value: impl Display) -> String {
        format!("lte.{value}")
    }

    /// `*` is the PostgREST wildcard.
    pub fn like(pattern: &str) -> String {
        format!("like.{pattern}")
    }

    pub fn ilike(pattern: &str) -> String {
        format!("ilike.{pattern}")
    }

    pub fn is_null() -> String {
        "is.null".to_string()
    }

    pub fn not_null() -> String {
        "not.is.null".to_string()
    }

    /// `in.(a,b)`; members containing reserved characters are double-quoted.
    pub fn in_list<I, T>(values: I) -> String
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        let members: Vec<String> = values
            .into_iter()
            .map(|value| quote_list_member(&value.to_string()))
            .collect();
        format!("in.({})", members.join(","))
    }
}

fn quote_list_member(member: &str) -> String {
    let reserved = member.is_empty()
        || member
            .chars()
            .any(|ch| matches!(ch, ',' | '(' | ')' | '"' | '\\') || ch.is_whitespace());
    if !reserved {
        return member.to_string();
    }
    let mut quoted = String::with_capacity(member.len() + 2);
    quoted.push('"');
    for ch in member.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
