// dqx-core/src/domain/compiler/builder.rs

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;

use crate::domain::compiler::dialect::Dialect;
use crate::domain::error::DomainError;
use crate::domain::value::Param;

#[allow(clippy::expect_used)]
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier regex"))
}

/// A whitelisted SQL identifier (schema, table or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if identifier_pattern().is_match(&name) {
            Ok(Self(name))
        } else {
            Err(DomainError::InvalidIdentifier(name))
        }
    }

    /// For names fixed in the source (column contracts, default catalog).
    pub(crate) fn trusted(name: &'static str) -> Self {
        debug_assert!(identifier_pattern().is_match(name), "bad static identifier {name}");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `schema.table`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Ident,
    pub name: Ident,
}

impl TableRef {
    pub fn new(schema: Ident, name: Ident) -> Self {
        Self { schema, name }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A rendered statement: SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Sql {
    text: String,
    params: Vec<Param>,
}

impl Sql {
    /// Caller-supplied SQL, passed through verbatim.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(text: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Assembles statements for one dialect. Identifiers only enter the text via
/// [`Dialect::quote_ident`]; values only via placeholders.
pub struct SqlBuilder {
    dialect: Dialect,
    text: String,
    params: Vec<Param>,
}

impl SqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::new(),
            params: Vec::new(),
        }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        let quoted = self.dialect.quote_ident(ident.as_str());
        self.text.push_str(&quoted);
        self
    }

    pub fn push_table(&mut self, table: &TableRef) -> &mut Self {
        self.push_ident(&table.schema).push(".").push_ident(&table.name)
    }

    /// `alias.column`
    pub fn push_qualified(&mut self, alias: &Ident, column: &Ident) -> &mut Self {
        self.push_ident(alias).push(".").push_ident(column)
    }

    /// Comma separated quoted identifiers.
    pub fn push_ident_list(&mut self, idents: &[Ident]) -> &mut Self {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(ident);
        }
        self
    }

    pub fn push_param(&mut self, param: impl Into<Param>) -> &mut Self {
        self.params.push(param.into());
        let placeholder = self.dialect.placeholder(self.params.len());
        self.text.push_str(&placeholder);
        self
    }

    /// Timestamps travel as text and are cast server-side.
    pub fn push_timestamp(&mut self, ts: NaiveDateTime) -> &mut Self {
        self.push("CAST(");
        self.params.push(Param::Timestamp(ts));
        let placeholder = self.dialect.placeholder(self.params.len());
        self.text.push_str(&placeholder);
        self.push(" AS TIMESTAMP)")
    }

    pub fn build(self) -> Sql {
        Sql {
            text: self.text,
            params: self.params,
        }
    }
}
