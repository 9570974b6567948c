use std::fmt;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::Document;
use crate::error::EditError;
use crate::tree::{Language, Path, Subtree};

/// Errors from loading, saving, importing and exporting documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document does not fit its language: {0}")]
    Schema(#[from] EditError),

    #[error("document is in language '{found}', expected '{expected}'")]
    LanguageMismatch { expected: String, found: String },

    #[error("format '{0}' cannot be imported")]
    Unsupported(Format),
}

/// On-disk and exchange formats.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// The JSON document file: language name, root and cursor.
    #[default]
    Json,
    /// S-expressions; export only.
    Sexpr,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sexpr => write!(f, "sexpr"),
        }
    }
}

/// Serialized form of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub language: String,
    pub root: Subtree,
    #[serde(default)]
    pub cursor: Path,
}

/// Loading and saving documents.
pub trait Persistence {
    fn load(&self) -> Result<Document, DocumentError>;
    fn save(&self, doc: &Document) -> Result<(), DocumentError>;
    fn import(&self, format: Format, bytes: &[u8]) -> Result<Document, DocumentError>;
    fn export(&self, doc: &Document, format: Format) -> Result<Vec<u8>, DocumentError>;
}

/// A document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    lang: Arc<Language>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>, lang: Arc<Language>) -> Self {
        Self {
            path: path.into(),
            lang,
        }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DocumentError {
        DocumentError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Persistence for JsonStore {
    fn load(&self) -> Result<Document, DocumentError> {
        let bytes = fs::read(&self.path).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "loading document");
        self.import(Format::Json, &bytes)
    }

    fn save(&self, doc: &Document) -> Result<(), DocumentError> {
        let bytes = self.export(doc, Format::Json)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::write(&self.path, bytes).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), "saved document");
        Ok(())
    }

    fn import(&self, format: Format, bytes: &[u8]) -> Result<Document, DocumentError> {
        match format {
            Format::Json => {
                let file: DocumentFile = serde_json::from_slice(bytes)?;
                if file.language != self.lang.name() {
                    return Err(DocumentError::LanguageMismatch {
                        expected: self.lang.name().to_string(),
                        found: file.language,
                    });
                }
                let doc = Document::from_subtree(Arc::clone(&self.lang), &file.root)?;
                Ok(doc.with_cursor(file.cursor))
            }
            Format::Sexpr => Err(DocumentError::Unsupported(format)),
        }
    }

    fn export(&self, doc: &Document, format: Format) -> Result<Vec<u8>, DocumentError> {
        match format {
            Format::Json => {
                let file = DocumentFile {
                    language: doc.language().name().to_string(),
                    root: doc.to_subtree(),
                    cursor: doc.cursor().path().clone(),
                };
                let mut bytes = serde_json::to_vec_pretty(&file)?;
                bytes.push(b'\n');
                Ok(bytes)
            }
            Format::Sexpr => Ok(format!("{}\n", doc.to_subtree()).into_bytes()),
        }
    }
}
