use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Certificate template not found: {0}")]
    UnknownTemplate(String),

    #[error("Certificate generation error: {0}")]
    CertGen(String),

    #[error("Certificate store error: {0}")]
    Store(String),

    #[error("Unable to remove store entry {name}: {message}")]
    StoreRemoval { name: String, message: String },

    #[error("Certificate enrollment failed for {name}: {message}")]
    Issue { name: String, message: String },

    #[error("Bundle export failed for {name}: {message}")]
    Export { name: String, message: String },

    #[error("PKCS12 export error: {0}")]
    Pkcs12(String),

    #[error("PEM parsing error: {0}")]
    Pem(String),
}

impl From<rcgen::RcgenError> for Error {
    fn from(err: rcgen::RcgenError) -> Self {
        Error::CertGen(err.to_string())
    }
}

impl From<pem::PemError> for Error {
    fn from(err: pem::PemError) -> Self {
        Error::Pem(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
