use snafu::location;
use sqlparser::ast::Statement;
use sqlparser::{dialect::GenericDialect, parser::Parser, tokenizer::Tokenizer};

use crate::error::{Error, Result};

pub struct WrappedParser<'a> {
    inner: Parser<'a>,
}

/// A thin wrapper around the `Parser` from the `sqlparser` crate
/// to provide easier initialization and parsing of SQL statements.
impl<'a> WrappedParser<'a> {
    /// Creates a new instance of `WrappedParser` by tokenizing the provided SQL string.
    pub fn try_new(sql: &str) -> Result<Self> {
        let dialect = &GenericDialect {};
        let mut tokenizer = Tokenizer::new(dialect, sql);
        let tokens = tokenizer.tokenize()?;

        Ok(Self {
            inner: Parser::new(dialect).with_tokens(tokens),
        })
    }

    /// Parses exactly one SQL statement from the tokenized input.
    pub fn try_parse(&mut self) -> Result<Statement> {
        let mut statements = self.inner.parse_statements()?;
        match statements.len() {
            1 => Ok(statements.remove(0)),
            0 => Err(Error::Syntax {
                message: "empty query".to_string(),
                location: location!(),
            }),
            _ => Err(Error::Unsupported {
                construct: "multiple statements".to_string(),
                location: location!(),
            }),
        }
    }
}

/// Parses `sql` into a single statement, reporting tokenizer and
/// parser failures as syntax errors.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    WrappedParser::try_new(sql)
        .and_then(|mut parser| parser.try_parse())
        .map_err(|e| match e {
            Error::SqlParser { message, location } | Error::SqlTokenizer { message, location } => {
                Error::Syntax { message, location }
            }
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use core::panic;

    use sqlparser::ast::{SetExpr, Statement};

    use crate::error::Error;

    use super::{parse_sql, WrappedParser};

    #[test]
    fn test_sql_parser_parse() {
        let sql = "SELECT * FROM transit_cost";
        let mut parser = WrappedParser::try_new(sql).unwrap();
        let statement = parser.try_parse().unwrap();

        if let Statement::Query(query) = statement {
            if let SetExpr::Select(select) = *query.body {
                return assert_eq!(format!("{select}"), "SELECT * FROM transit_cost");
            };
        }
        panic!()
    }

    #[test]
    fn test_sql_parser_errors() {
        let result = parse_sql("SELEC country FROM transit_cost");
        assert!(matches!(result, Err(Error::Syntax { .. })));

        let result = parse_sql("SELECT 'unterminated FROM transit_cost");
        assert!(matches!(result, Err(Error::Syntax { .. })));

        let result = parse_sql("SELECT 1; SELECT 2");
        assert!(matches!(result, Err(Error::Unsupported { .. })));

        assert!(parse_sql("SELECT city FROM transit_cost;").is_ok());
    }
}
