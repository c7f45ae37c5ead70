//! Default constraint identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A default-value constraint on a table column.
///
/// `constraint_name` is `None` for constraints that were never explicitly
/// named; the schema tooling cannot reproduce their name in drop statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefaultConstraint {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub constraint_name: Option<String>,
}

impl DefaultConstraint {
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        constraint_name: Option<String>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
            constraint_name,
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.constraint_name.is_none()
    }

    /// True if the constraint belongs to `[schema].[table]`.
    pub fn is_on_table(&self, schema_name: &str, table_name: &str) -> bool {
        self.schema_name == schema_name && self.table_name == table_name
    }
}

impl fmt::Display for DefaultConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}].[{}].[{}]",
            self.schema_name, self.table_name, self.column_name
        )?;
        if let Some(name) = &self.constraint_name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_constraints_on_same_column_are_equal() {
        let a = DefaultConstraint::new("dbo", "Author", "Birthday", None);
        let b = DefaultConstraint::new("dbo", "Author", "Birthday", None);
        assert_eq!(a, b);
        assert!(a.is_unnamed());
    }

    #[test]
    fn test_name_participates_in_equality() {
        let a = DefaultConstraint::new("dbo", "Author", "Birthday", None);
        let b = DefaultConstraint::new("dbo", "Author", "Birthday", Some("DF_Birthday".into()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let named = DefaultConstraint::new("dbo", "Book", "Price", Some("DF_Price".into()));
        assert_eq!(named.to_string(), "[dbo].[Book].[Price] (DF_Price)");
        let unnamed = DefaultConstraint::new("dbo", "Book", "Price", None);
        assert_eq!(unnamed.to_string(), "[dbo].[Book].[Price]");
    }
}
