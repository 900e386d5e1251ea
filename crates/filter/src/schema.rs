//! Per-record field schemas and predicate compilation.

use rust_decimal::Decimal;

use greengrocer_core::{DomainError, DomainResult};

use crate::clause::{Clause, FilterOp, scan};

type BoxPred<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Typed accessor for one filterable field.
enum Field<T> {
    Text(fn(&T) -> String),
    OptText(fn(&T) -> Option<String>),
    Number(fn(&T) -> Decimal),
    Unsigned(fn(&T) -> u64),
    Bool(fn(&T) -> bool),
    Keyword {
        get: fn(&T) -> &'static str,
        parse: fn(&str) -> Option<&'static str>,
    },
}

/// Whitelist of filterable fields for one record kind.
///
/// Built once per kind with the fluent constructors; unknown field names and
/// uncoercible value tokens surface as [`DomainError::Parse`] when a filter
/// is compiled, before any record is touched.
pub struct Schema<T> {
    record: &'static str,
    fields: Vec<(&'static str, Field<T>)>,
}

/// Compiled filter: the AND of every clause's check.
pub struct Predicate<T> {
    clauses: Vec<BoxPred<T>>,
}

impl<T> std::fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field("clauses", &self.clauses.len())
            .finish()
    }
}

impl<T> Predicate<T> {
    pub fn matches(&self, record: &T) -> bool {
        self.clauses.iter().all(|clause| clause(record))
    }

    /// True when compiled from an empty filter; matches every record.
    pub fn is_unrestricted(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl<T: 'static> Schema<T> {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            fields: Vec::new(),
        }
    }

    /// Required text field: `:` is a case-insensitive substring match,
    /// bounds compare lexicographically.
    pub fn text(mut self, name: &'static str, get: fn(&T) -> String) -> Self {
        self.fields.push((name, Field::Text(get)));
        self
    }

    /// Optional text field; an absent value matches no clause.
    pub fn opt_text(mut self, name: &'static str, get: fn(&T) -> Option<String>) -> Self {
        self.fields.push((name, Field::OptText(get)));
        self
    }

    /// Decimal field; the value token must parse as a number.
    pub fn number(mut self, name: &'static str, get: fn(&T) -> Decimal) -> Self {
        self.fields.push((name, Field::Number(get)));
        self
    }

    /// Unsigned integer field (e.g. a document number).
    pub fn unsigned(mut self, name: &'static str, get: fn(&T) -> u64) -> Self {
        self.fields.push((name, Field::Unsigned(get)));
        self
    }

    /// Boolean field; only `:` with `true`/`false` tokens is meaningful.
    pub fn boolean(mut self, name: &'static str, get: fn(&T) -> bool) -> Self {
        self.fields.push((name, Field::Bool(get)));
        self
    }

    /// Closed-enumeration field; the token is coerced through `parse` to the
    /// canonical spelling and compared for equality.
    pub fn keyword(
        mut self,
        name: &'static str,
        get: fn(&T) -> &'static str,
        parse: fn(&str) -> Option<&'static str>,
    ) -> Self {
        self.fields.push((name, Field::Keyword { get, parse }));
        self
    }

    /// Compile a filter string into a predicate over this record kind.
    ///
    /// An empty or absent filter compiles to an unrestricted predicate.
    pub fn compile(&self, search: Option<&str>) -> DomainResult<Predicate<T>> {
        let clauses = scan(search.unwrap_or_default())?;
        let mut compiled = Vec::with_capacity(clauses.len());
        for clause in &clauses {
            compiled.push(self.compile_clause(clause)?);
        }
        Ok(Predicate { clauses: compiled })
    }

    fn compile_clause(&self, clause: &Clause) -> DomainResult<BoxPred<T>> {
        let Some((_, field)) = self.fields.iter().find(|(name, _)| *name == clause.field) else {
            return Err(DomainError::parse(format!(
                "unknown {} field \"{}\"",
                self.record, clause.field
            )));
        };

        match field {
            Field::Text(get) => Ok(text_pred(*get, clause)),
            Field::OptText(get) => Ok(opt_text_pred(*get, clause)),
            Field::Number(get) => {
                let bound: Decimal = clause.value.parse().map_err(|_| {
                    self.coercion_error(clause, "a numeric value")
                })?;
                let get = *get;
                Ok(match clause.op {
                    FilterOp::Match => Box::new(move |r| get(r) == bound),
                    FilterOp::AtMost => Box::new(move |r| get(r) <= bound),
                    FilterOp::AtLeast => Box::new(move |r| get(r) >= bound),
                })
            }
            Field::Unsigned(get) => {
                let bound: u64 = clause.value.parse().map_err(|_| {
                    self.coercion_error(clause, "an unsigned integer")
                })?;
                let get = *get;
                Ok(match clause.op {
                    FilterOp::Match => Box::new(move |r| get(r) == bound),
                    FilterOp::AtMost => Box::new(move |r| get(r) <= bound),
                    FilterOp::AtLeast => Box::new(move |r| get(r) >= bound),
                })
            }
            Field::Bool(get) => {
                if clause.op != FilterOp::Match {
                    return Err(DomainError::parse(format!(
                        "operator '{}' is not supported for boolean field \"{}\"",
                        clause.op.symbol(),
                        clause.field
                    )));
                }
                let bound: bool = clause.value.parse().map_err(|_| {
                    self.coercion_error(clause, "true or false")
                })?;
                let get = *get;
                Ok(Box::new(move |r| get(r) == bound))
            }
            Field::Keyword { get, parse } => {
                if clause.op != FilterOp::Match {
                    return Err(DomainError::parse(format!(
                        "operator '{}' is not supported for keyword field \"{}\"",
                        clause.op.symbol(),
                        clause.field
                    )));
                }
                let canonical = parse(&clause.value).ok_or_else(|| {
                    self.coercion_error(clause, "a known keyword")
                })?;
                let get = *get;
                Ok(Box::new(move |r| get(r) == canonical))
            }
        }
    }

    fn coercion_error(&self, clause: &Clause, expected: &str) -> DomainError {
        DomainError::parse(format!(
            "{} field \"{}\" expects {expected}, got \"{}\"",
            self.record, clause.field, clause.value
        ))
    }
}

fn text_pred<T: 'static>(get: fn(&T) -> String, clause: &Clause) -> BoxPred<T> {
    match clause.op {
        FilterOp::Match => {
            let needle = clause.value.to_lowercase();
            Box::new(move |r| get(r).to_lowercase().contains(&needle))
        }
        FilterOp::AtMost => {
            let bound = clause.value.clone();
            Box::new(move |r| get(r) <= bound)
        }
        FilterOp::AtLeast => {
            let bound = clause.value.clone();
            Box::new(move |r| get(r) >= bound)
        }
    }
}

fn opt_text_pred<T: 'static>(get: fn(&T) -> Option<String>, clause: &Clause) -> BoxPred<T> {
    match clause.op {
        FilterOp::Match => {
            let needle = clause.value.to_lowercase();
            Box::new(move |r| {
                get(r).is_some_and(|v| v.to_lowercase().contains(&needle))
            })
        }
        FilterOp::AtMost => {
            let bound = clause.value.clone();
            Box::new(move |r| get(r).is_some_and(|v| v <= bound))
        }
        FilterOp::AtLeast => {
            let bound = clause.value.clone();
            Box::new(move |r| get(r).is_some_and(|v| v >= bound))
        }
    }
}
