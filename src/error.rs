use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure of the crate, one variant per kind.
///
/// Errors from the store are sorted into [`Error::Syntax`] and
/// [`Error::Reference`] where the SQLite message allows it, the translator
/// reports constructs outside its subset as [`Error::Unsupported`].
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("InvalidDataError: {message}, {location}"))]
    InvalidData {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("InvalidOperationError: {message}, {location}"))]
    InvalidOperation {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("IoError: {message}, {location}"))]
    Io {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("HttpError: {message}, {location}"))]
    Http {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("ArrowError: {message}, {location}"))]
    Arrow {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("SqliteError: {message}, {location}"))]
    Sqlite {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("SchemaError: {message}, {location}"))]
    Schema {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("SyntaxError: {message}, {location}"))]
    Syntax {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("ReferenceError: {message}, {location}"))]
    Reference {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("UnsupportedError: {construct} is not supported, {location}"))]
    Unsupported {
        construct: String,
        location: snafu::Location,
    },
    #[snafu(display("SqlParserError: {message}, {location}"))]
    SqlParser {
        message: String,
        location: snafu::Location,
    },
    #[snafu(display("SqlTokenizerError: {message}, {location}"))]
    SqlTokenizer {
        message: String,
        location: snafu::Location,
    },
}

trait ToSnafuLocation {
    fn to_snafu_location(&'static self) -> snafu::Location;
}

impl ToSnafuLocation for std::panic::Location<'static> {
    fn to_snafu_location(&'static self) -> snafu::Location {
        snafu::Location::new(self.file(), self.line(), self.column())
    }
}

macro_rules! make_error_from {
    ($from:ty, $to:ident) => {
        impl From<$from> for Error {
            #[track_caller]
            fn from(value: $from) -> Self {
                Self::$to {
                    message: value.to_string(),
                    location: std::panic::Location::caller().to_snafu_location(),
                }
            }
        }
    };
}

make_error_from!(std::io::Error, Io);
make_error_from!(arrow::error::ArrowError, Arrow);
make_error_from!(sqlparser::tokenizer::TokenizerError, SqlTokenizer);
make_error_from!(sqlparser::parser::ParserError, SqlParser);
make_error_from!(rusqlite::Error, Sqlite);
make_error_from!(reqwest::Error, Http);
