//! Comparison vocabulary shared by query handles, criteria and repositories.

use crate::repo::error::{RepoError, RepoResult};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Binary comparison supported by the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    /// Matches any element of an array value.
    In,
}

impl Operator {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
        }
    }
}

impl FromStr for Operator {
    type Err = RepoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "like" => Ok(Self::Like),
            "not like" => Ok(Self::NotLike),
            "in" => Ok(Self::In),
            _ => Err(RepoError::InvalidOperator(value.to_string())),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parses `asc`/`desc` case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `column <op> value` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    /// `LIKE` pattern whose literal `%`, `_` and `\` are escaped with `\`.
    pub escaped: bool,
}

impl Comparison {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            escaped: false,
        }
    }

    /// Substring match on `term` taken literally: wildcards in `term` match
    /// only themselves.
    pub fn contains(column: impl Into<String>, term: &str) -> Self {
        Self {
            escaped: true,
            ..Self::new(column, Operator::Like, format!("%{}%", escape_like(term)))
        }
    }
}

/// Escapes `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Filter predicate held by a query handle. Conditions on one handle are
/// AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparison),
    /// OR-group; an empty group matches nothing.
    Any(Vec<Comparison>),
    /// At least one row of `relation` satisfies the comparison.
    Has {
        relation: String,
        comparison: Comparison,
    },
}

/// Ad-hoc condition accepted by `Repository::find_where`.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Eq(String, Value),
    Op(String, Operator, Value),
}

impl WhereClause {
    /// Builds clauses from a JSON object.
    ///
    /// `{"status": "active"}` is an equality test. `{"age": [">", 18]}` and
    /// `{"k": ["age", ">", 18]}` carry an explicit operator.
    pub fn from_json(conditions: &Value) -> RepoResult<Vec<Self>> {
        let Some(map) = conditions.as_object() else {
            return Err(RepoError::InvalidCondition(
                "conditions must be a JSON object".to_string(),
            ));
        };

        map.iter()
            .map(|(field, value)| match value {
                Value::Array(items) => Self::from_array(field, items),
                other => Ok(Self::Eq(field.clone(), other.clone())),
            })
            .collect()
    }

    fn from_array(field: &str, items: &[Value]) -> RepoResult<Self> {
        match items {
            [Value::String(op), value] => Ok(Self::Op(field.to_string(), op.parse()?, value.clone())),
            [Value::String(column), Value::String(op), value] => {
                Ok(Self::Op(column.clone(), op.parse()?, value.clone()))
            }
            _ => Err(RepoError::InvalidCondition(format!(
                "`{field}` expects [operator, value] or [field, operator, value]"
            ))),
        }
    }

    pub(crate) fn into_comparison(self) -> Comparison {
        match self {
            Self::Eq(column, value) => Comparison::new(column, Operator::Eq, value),
            Self::Op(column, operator, value) => Comparison::new(column, operator, value),
        }
    }
}

/// Column projection for read operations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    #[default]
    All,
    Only(Vec<String>),
}

impl Columns {
    pub fn only<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(columns.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparison, Direction, Operator, WhereClause};
    use serde_json::json;

    #[test]
    fn contains_escapes_like_wildcards() {
        let comparison = Comparison::contains("name", r"50%_off\now");
        assert!(comparison.escaped);
        assert_eq!(comparison.operator, Operator::Like);
        assert_eq!(comparison.value, json!(r"%50\%\_off\\now%"));
    }

    #[test]
    fn operator_parses_symbols_and_words() {
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Gte);
        assert_eq!(" LIKE ".parse::<Operator>().unwrap(), Operator::Like);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEq);
        assert!("~=".parse::<Operator>().is_err());
    }

    #[test]
    fn direction_parse_is_case_insensitive() {
        assert_eq!(Direction::parse("DESC"), Some(Direction::Desc));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn where_clauses_accept_both_array_shapes() {
        let clauses = WhereClause::from_json(&json!({
            "status": "active",
            "age": [">", 18],
            "x": ["title", "like", "%rust%"],
        }))
        .unwrap();

        assert!(clauses.contains(&WhereClause::Eq("status".into(), json!("active"))));
        assert!(clauses.contains(&WhereClause::Op("age".into(), Operator::Gt, json!(18))));
        assert!(clauses.contains(&WhereClause::Op(
            "title".into(),
            Operator::Like,
            json!("%rust%")
        )));
    }

    #[test]
    fn where_clauses_reject_bad_shapes() {
        assert!(WhereClause::from_json(&json!(["status"])).is_err());
        assert!(WhereClause::from_json(&json!({"age": [18]})).is_err());
        assert!(WhereClause::from_json(&json!({"age": ["~", 18]})).is_err());
    }
}
