use thiserror::Error;
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed airline table line {line}: {content:?}")]
    MalformedAirlineLine { line: usize, content: String },
    #[error("Duplicate airline name {name:?} (codes {first} and {second})")]
    DuplicateAirline {
        name: String,
        first: String,
        second: String,
    },
    #[error("Std Io Error!")]
    StdIo(#[from] std::io::Error),
}
