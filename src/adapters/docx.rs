//! Word (.docx) template merging.
//!
//! A .docx file is a zip container. The main body, headers and footers are
//! XML parts; placeholders inside them use tera syntax (`{{ purchaser }}`,
//! `{% if carrier %}...{% endif %}`). Word frequently splits a placeholder
//! across several runs, so tags inside a placeholder are removed before the
//! part is rendered. Everything else in the container is copied untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::{Context, ContextValue, DocumentError, DocumentPort, DocumentResult};

/// MIME type of the generated document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const BODY_PART: &str = "word/document.xml";

static SPLIT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?:<[^>]*>)+([{%])").expect("static regex is valid"));
static SPLIT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([}%])(?:<[^>]*>)+\}").expect("static regex is valid"));
static TAG_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("static regex is valid"));
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex is valid"));

/// A .docx template on disk. The file is re-read for every render.
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    path: PathBuf,
}

impl DocxTemplate {
    /// Fails when the template file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> DocumentResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(DocumentError::TemplateNotFound(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge `context` into the template bytes and return a new container.
    pub fn merge(template: &[u8], context: &Context) -> DocumentResult<Vec<u8>> {
        let tera_context = to_tera_context(context);

        let mut archive = ZipArchive::new(Cursor::new(template)).map_err(container_error)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut saw_body = false;

        for i in 0..archive.len() {
            let name = archive
                .by_index_raw(i)
                .map_err(container_error)?
                .name()
                .to_string();

            if is_template_part(&name) {
                saw_body |= name == BODY_PART;
                let mut xml = String::new();
                archive
                    .by_index(i)
                    .map_err(container_error)?
                    .read_to_string(&mut xml)?;
                let rendered = render_part(&name, &xml, &tera_context)?;
                writer.start_file(name, options).map_err(container_error)?;
                writer.write_all(rendered.as_bytes())?;
            } else {
                let entry = archive.by_index_raw(i).map_err(container_error)?;
                writer.raw_copy_file(entry).map_err(container_error)?;
            }
        }

        if !saw_body {
            return Err(DocumentError::MissingPart(BODY_PART.to_string()));
        }

        let out = writer.finish().map_err(container_error)?;
        Ok(out.into_inner())
    }
}

impl DocumentPort for DocxTemplate {
    fn render(&self, context: &Context) -> DocumentResult<Vec<u8>> {
        if !self.path.is_file() {
            return Err(DocumentError::TemplateNotFound(self.path.clone()));
        }
        let template = std::fs::read(&self.path)?;
        Self::merge(&template, context)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

fn container_error(err: zip::result::ZipError) -> DocumentError {
    DocumentError::Container(err.to_string())
}

fn is_template_part(name: &str) -> bool {
    name == BODY_PART
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

/// Remove run boundaries Word inserted inside `{{ }}` and `{% %}` tags.
pub(crate) fn repair_placeholders(xml: &str) -> String {
    let xml = SPLIT_OPEN.replace_all(xml, "{${1}");
    let xml = SPLIT_CLOSE.replace_all(&xml, "${1}}");
    TAG_BODY
        .replace_all(&xml, |caps: &Captures| {
            let inner = XML_TAG.replace_all(&caps[0], "");
            unescape_xml(&inner)
        })
        .into_owned()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

fn render_part(name: &str, xml: &str, context: &tera::Context) -> DocumentResult<String> {
    let repaired = repair_placeholders(xml);
    tera::Tera::one_off(&repaired, context, false).map_err(|e| DocumentError::Merge {
        part: name.to_string(),
        message: error_chain(&e),
    })
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Escaped text is made XML-safe, with newlines turned into line breaks;
/// plain text goes in as given.
fn to_tera_context(context: &Context) -> tera::Context {
    let mut out = tera::Context::new();
    for (name, value) in context.iter() {
        match value {
            ContextValue::Text(s) => out.insert(name.as_str(), s),
            ContextValue::Escaped(t) => out.insert(name.as_str(), &escaped_runs(t.as_str())),
            ContextValue::Integer(i) => out.insert(name.as_str(), i),
            ContextValue::Float(f) => out.insert(name.as_str(), f),
        }
    }
    out
}

fn escaped_runs(text: &str) -> String {
    text.split('\n')
        .map(tera::escape_html)
        .collect::<Vec<_>>()
        .join("</w:t><w:br/><w:t xml:space=\"preserve\">")
}
