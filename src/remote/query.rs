//! Table query builder for the remote REST API.
//!
//! Builds the `select`/filter/`order`/`limit` query-string pairs the table
//! endpoint expects. Filters use the `column=op.value` form; `in` lists
//! are rendered as `(a,b,"c,d")` with values quoted when they contain
//! reserved characters.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ilike,
    In,
}

impl Op {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Ilike => "ilike",
            Self::In => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    /// Rendered operand, already list-formatted for [`Op::In`].
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_owned());
        self
    }

    fn filter(mut self, column: &str, op: Op, value: String) -> Self {
        self.filters.push(Filter { column: column.to_owned(), op, value });
        self
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Eq, value.to_string())
    }

    #[must_use]
    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Neq, value.to_string())
    }

    #[must_use]
    pub fn gt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Gt, value.to_string())
    }

    #[must_use]
    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Gte, value.to_string())
    }

    #[must_use]
    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Lt, value.to_string())
    }

    #[must_use]
    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, Op::Lte, value.to_string())
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    #[must_use]
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, Op::Ilike, pattern.to_owned())
    }

    #[must_use]
    pub fn in_list<T: ToString>(self, column: &str, values: &[T]) -> Self {
        let mut rendered = String::from("(");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                rendered.push(',');
            }
            push_list_item(&mut rendered, &value.to_string());
        }
        rendered.push(')');
        self.filter(column, Op::In, rendered)
    }

    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order { column: column.to_owned(), ascending });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in the order the remote API documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        pairs.push(("select".to_owned(), self.select.clone().unwrap_or_else(|| "*".to_owned())));
        for f in &self.filters {
            pairs.push((f.column.clone(), format!("{}.{}", f.op.as_str(), f.value)));
        }
        if !self.order.is_empty() {
            let mut order = String::new();
            for (i, o) in self.order.iter().enumerate() {
                if i > 0 {
                    order.push(',');
                }
                let _ = write!(order, "{}.{}", o.column, if o.ascending { "asc" } else { "desc" });
            }
            pairs.push(("order".to_owned(), order));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_owned(), limit.to_string()));
        }
        pairs
    }

    /// Filter-only pairs, used by mutations that must not carry `order`/`limit`.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), f.value)))
            .collect()
    }
}

fn push_list_item(out: &mut String, value: &str) {
    let needs_quotes = value.is_empty() || value.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' '));
    if !needs_quotes {
        out.push_str(value);
        return;
    }
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
