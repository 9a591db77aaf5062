//! OPF schema reader/writer
//!
//! A deliberately narrow view of Calibre's per-book `metadata.opf`
//! documents: the one field this pipeline touches is
//! `<dc:identifier opf:scheme="AMAZON">…</dc:identifier>` inside the
//! `<metadata>` block. Reads stream the document; rewrites pass every
//! unrelated event through unchanged so the rest of the file survives
//! byte-for-byte.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::MetadataError;

/// One loaded metadata document.
pub struct OpfDocument {
    path: PathBuf,
    raw: String,
}

impl OpfDocument {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let raw = fs::read_to_string(path).map_err(|e| MetadataError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            raw,
        })
    }

    /// The AMAZON identifier currently recorded, if any. An absent field
    /// is `Ok(None)`, not an error.
    pub fn identifier(&self) -> Result<Option<String>, MetadataError> {
        read_identifier(&self.raw).map_err(|reason| MetadataError::Parse {
            path: self.path.clone(),
            reason,
        })
    }

    /// The document text with the AMAZON identifier replaced by `new_id`,
    /// or with a new identifier element inserted before `</metadata>` when
    /// the field is absent. Every other event passes through unchanged.
    pub fn with_identifier(&self, new_id: &str) -> Result<String, MetadataError> {
        rewrite_identifier(&self.raw, new_id).map_err(|reason| MetadataError::Parse {
            path: self.path.clone(),
            reason,
        })
    }

    /// Atomically replace the file on disk with `contents` (temp file,
    /// then rename into place).
    pub fn save(&self, contents: &str) -> Result<(), MetadataError> {
        let unwritable = |reason: String| MetadataError::Unwritable {
            path: self.path.clone(),
            reason,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| unwritable(e.to_string()))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| unwritable(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| unwritable(e.to_string()))?;
        Ok(())
    }
}

/// True for `<dc:identifier opf:scheme="AMAZON">` (any namespace prefixes).
fn is_amazon_identifier(element: &BytesStart) -> bool {
    if element.name().local_name().as_ref() != b"identifier" {
        return false;
    }
    element.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"scheme" && attr.value.as_ref() == b"AMAZON"
    })
}

fn read_identifier(xml: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut in_amazon = false;
    let mut value = String::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) => {
                if is_amazon_identifier(&e) {
                    in_amazon = true;
                    value.clear();
                }
            }
            Event::Empty(e) => {
                if is_amazon_identifier(&e) {
                    return Ok(Some(String::new()));
                }
            }
            Event::Text(t) if in_amazon => {
                value.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::End(_) if in_amazon => {
                return Ok(Some(value.trim().to_string()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn rewrite_identifier(xml: &str, new_id: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut in_amazon = false;
    let mut replaced = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let matched = is_amazon_identifier(&e);
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| e.to_string())?;
                if matched {
                    in_amazon = true;
                    replaced = true;
                    writer
                        .write_event(Event::Text(BytesText::new(new_id)))
                        .map_err(|e| e.to_string())?;
                }
            }
            Event::Empty(e) => {
                if is_amazon_identifier(&e) {
                    // Expand the self-closing element so it can hold text
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    writer
                        .write_event(Event::Start(e))
                        .map_err(|e| e.to_string())?;
                    writer
                        .write_event(Event::Text(BytesText::new(new_id)))
                        .map_err(|e| e.to_string())?;
                    writer
                        .write_event(Event::End(BytesEnd::new(name)))
                        .map_err(|e| e.to_string())?;
                    replaced = true;
                } else {
                    writer
                        .write_event(Event::Empty(e))
                        .map_err(|e| e.to_string())?;
                }
            }
            Event::Text(_) if in_amazon => {} // old value dropped
            Event::End(e) => {
                if in_amazon && e.name().local_name().as_ref() == b"identifier" {
                    in_amazon = false;
                } else if !replaced && e.name().local_name().as_ref() == b"metadata" {
                    let mut elem = BytesStart::new("dc:identifier");
                    elem.push_attribute(("opf:scheme", "AMAZON"));
                    writer
                        .write_event(Event::Start(elem))
                        .map_err(|e| e.to_string())?;
                    writer
                        .write_event(Event::Text(BytesText::new(new_id)))
                        .map_err(|e| e.to_string())?;
                    writer
                        .write_event(Event::End(BytesEnd::new("dc:identifier")))
                        .map_err(|e| e.to_string())?;
                    replaced = true;
                }
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| e.to_string())?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(|e| e.to_string())?,
        }
        buf.clear();
    }

    if !replaced {
        return Err("no <metadata> element to insert the identifier into".to_string());
    }
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}
