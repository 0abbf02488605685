//! Column type hints for ORM layers.

use std::{fmt, str::FromStr};

use crate::{nullable::Nullable, payload::Payload};

/// SQL dialect used to choose column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite.
    Sqlite,
    /// MySQL / MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
}

impl Dialect {
    const ALL: [Self; 3] = [Self::Sqlite, Self::Mysql, Self::Postgres];

    const fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Sqlite => &["sqlite3"],
            Self::Mysql => &["mariadb"],
            Self::Postgres => &["postgresql", "pg", "pgx"],
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Error parsing a [`Dialect`] from a driver name.
#[derive(Debug, Clone)]
pub struct UnknownDialect(String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "unknown SQL dialect `{}`; expected one of sqlite, mysql or postgres",
            self.0
        )
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dialect| {
                dialect.name().eq_ignore_ascii_case(s)
                    || dialect.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| UnknownDialect(s.to_owned()))
    }
}

impl<T: Payload> Nullable<T> {
    /// Returns the generic data type of the payload, such as `json` for user-defined types.
    pub fn data_type() -> &'static str {
        T::DATA_TYPE
    }

    /// Returns the column type for the payload in the specified dialect.
    pub fn column_type(dialect: Dialect) -> &'static str {
        T::column_type(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Int, StringArray, Time, Type};

    #[test]
    fn parsing_dialects() {
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);

        let err = "oracle".parse::<Dialect>().unwrap_err();
        assert!(err.to_string().contains("`oracle`"), "{err}");
    }

    #[test]
    fn column_types() {
        assert_eq!(StringArray::data_type(), "json");
        assert_eq!(StringArray::column_type(Dialect::Sqlite), "JSON");
        assert_eq!(StringArray::column_type(Dialect::Mysql), "JSON");
        assert_eq!(StringArray::column_type(Dialect::Postgres), "text[]");

        assert_eq!(Type::<serde_json::Value>::data_type(), "json");
        assert_eq!(Type::<serde_json::Value>::column_type(Dialect::Mysql), "JSON");
        assert_eq!(
            Type::<serde_json::Value>::column_type(Dialect::Postgres),
            "JSONB"
        );

        assert_eq!(Int::column_type(Dialect::Postgres), "BIGINT");
        assert_eq!(Time::data_type(), "time");
    }
}
