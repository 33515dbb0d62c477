//! Document discovery and reading.
//!
//! [`DocumentLoader`] walks a directory, hands each file to the
//! [`DocumentReader`] registered for its extension, and normalizes the text.
//! A file that fails to read is logged and skipped; it never aborts the run.
//!
//! Plain text and Markdown are always supported. PDF and DOCX readers are
//! available behind the `pdf` and `docx` features and are registered by
//! [`DocumentLoader::default`] when enabled.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Extracts plain text from one document format.
pub trait DocumentReader: Send + Sync {
    /// Lowercase file extensions this reader handles, without the dot.
    fn extensions(&self) -> &[&str];

    /// Read the raw text of the file at `path`.
    fn read(&self, path: &Path) -> Result<String>;
}

/// Reads UTF-8 text files. Invalid byte sequences are replaced, not rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }

    fn read(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Extracts the text layer of PDF files.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

#[cfg(feature = "pdf")]
impl DocumentReader for PdfReader {
    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn read(&self, path: &Path) -> Result<String> {
        // pdf-extract panics on some malformed files.
        match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(read_error(path, e)),
            Err(_) => Err(read_error(path, "PDF parser panicked")),
        }
    }
}

/// Extracts paragraph text from Word `.docx` files.
#[cfg(feature = "docx")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

#[cfg(feature = "docx")]
impl DocumentReader for DocxReader {
    fn extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn read(&self, path: &Path) -> Result<String> {
        use std::io::Read;

        let file = fs::File::open(path).map_err(|e| read_error(path, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| read_error(path, e))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| read_error(path, e))?
            .read_to_string(&mut xml)
            .map_err(|e| read_error(path, e))?;
        Ok(docx_xml_text(&xml))
    }
}

/// Text runs, paragraph ends, tabs and line breaks in WordprocessingML.
#[cfg(feature = "docx")]
static DOCX_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:tab\s*/>|<w:br\s*/>")
        .expect("docx text pattern is valid")
});

/// Plain text of a `word/document.xml` body, one line per paragraph.
#[cfg(feature = "docx")]
pub fn docx_xml_text(xml: &str) -> String {
    let mut text = String::new();
    for caps in DOCX_TEXT.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None if caps[0].starts_with("</w:p") => text.push('\n'),
            None => text.push(' '),
        }
    }
    text
}

#[cfg(feature = "docx")]
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> RagError {
    RagError::DocumentRead { path: path.to_path_buf(), message: e.to_string() }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Loads every readable document under a directory.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::DocumentLoader;
///
/// let documents = DocumentLoader::default().load("data")?;
/// ```
pub struct DocumentLoader {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        let loader = Self::new().with_reader(PlainTextReader);
        #[cfg(feature = "pdf")]
        let loader = loader.with_reader(PdfReader);
        #[cfg(feature = "docx")]
        let loader = loader.with_reader(DocxReader);
        loader
    }
}

impl DocumentLoader {
    /// Create a loader with no readers registered.
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Register a reader. Earlier readers win when extensions overlap.
    pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    /// Recursively load documents under `dir`, sorted by path.
    ///
    /// Files with no registered reader are ignored. Files that fail to read
    /// or contain only whitespace are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoDocuments`] if nothing could be loaded.
    pub fn load(&self, dir: impl AsRef<Path>) -> Result<Vec<Document>> {
        let dir = dir.as_ref();
        let mut paths = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping path that could not be walked");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>();
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let Some(reader) = self.reader_for(&path) else {
                debug!(path = %path.display(), "no reader for file type");
                continue;
            };
            match reader.read(&path) {
                Ok(text) if text.trim().is_empty() => {
                    warn!(path = %path.display(), "skipping empty document");
                }
                Ok(text) => {
                    info!(path = %path.display(), chars = text.len(), "loaded document");
                    documents.push(Document::new(path.display().to_string(), clean_text(&text)));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                }
            }
        }

        if documents.is_empty() {
            return Err(RagError::NoDocuments {
                dir: dir.to_path_buf(),
                extensions: self.extensions_label(),
            });
        }
        Ok(documents)
    }

    /// Supported extensions in registration order, as `.txt/.md/...`.
    pub fn extensions_label(&self) -> String {
        self.readers
            .iter()
            .flat_map(|reader| reader.extensions())
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join("/")
    }

    fn reader_for(&self, path: &Path) -> Option<&dyn DocumentReader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.readers
            .iter()
            .find(|reader| reader.extensions().contains(&ext.as_str()))
            .map(|reader| reader.as_ref())
    }
}
