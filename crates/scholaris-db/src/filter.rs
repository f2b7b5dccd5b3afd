//! Column filters rendered into `WHERE` clauses.
//!
//! A [`Filter`] is an ordered list of `column -> value` conditions with unique
//! keys, joined with `AND`. Column names are `&'static str`, so only names
//! written in code can reach the SQL text; values are always bound
//! parameters.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Uuid(Uuid),
    Bool(bool),
    Text(String),
    /// `column = ANY($n)`
    UuidList(Vec<Uuid>),
    /// `column IS NULL`
    Null,
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Vec<Uuid>> for FilterValue {
    fn from(value: Vec<Uuid>) -> Self {
        FilterValue::UuidList(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(&'static str, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`, replacing an existing condition on the same
    /// column in place.
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.set(column, value.into());
        self
    }

    #[must_use]
    pub fn any_of<I, T>(self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Uuid>,
    {
        let ids: Vec<Uuid> = values.into_iter().map(Into::into).collect();
        self.eq(column, FilterValue::UuidList(ids))
    }

    #[must_use]
    pub fn is_null(self, column: &'static str) -> Self {
        self.eq(column, FilterValue::Null)
    }

    /// Puts `column` first, dropping any existing condition on it.
    #[must_use]
    pub fn with_leading(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.remove(column);
        self.conditions.insert(0, (column, value.into()));
        self
    }

    pub fn set(&mut self, column: &'static str, value: FilterValue) {
        match self.conditions.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.conditions.push((column, value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<FilterValue> {
        let idx = self.conditions.iter().position(|(c, _)| *c == column)?;
        Some(self.conditions.remove(idx).1)
    }

    pub fn get(&self, column: &str) -> Option<&FilterValue> {
        self.conditions
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conditions.iter().map(|(c, _)| *c)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Appends ` WHERE ...` for every condition. An empty filter renders as
    /// ` WHERE TRUE` so callers can keep appending ` AND ...`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        self.push_where_on(qb, None);
    }

    /// Same as [`Filter::push_where`] with every column qualified by `alias`.
    pub fn push_where_on(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: Option<&str>) {
        qb.push(" WHERE ");
        if self.conditions.is_empty() {
            qb.push("TRUE");
            return;
        }

        for (i, (column, value)) in self.conditions.iter().enumerate() {
            if i > 0 {
                qb.push(" AND ");
            }
            if let Some(alias) = alias {
                qb.push(alias).push(".");
            }
            qb.push(*column);
            match value {
                FilterValue::Uuid(v) => {
                    qb.push(" = ").push_bind(*v);
                }
                FilterValue::Bool(v) => {
                    qb.push(" = ").push_bind(*v);
                }
                FilterValue::Text(v) => {
                    qb.push(" = ").push_bind(v.clone());
                }
                FilterValue::UuidList(v) => {
                    qb.push(" = ANY(").push_bind(v.clone()).push(")");
                }
                FilterValue::Null => {
                    qb.push(" IS NULL");
                }
            }
        }
    }
}
