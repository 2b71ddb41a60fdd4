use crate::error::{Result, TableError};
use crate::format::{read_table_text, ResourceTable};
use crate::types::ResourceEntry;
use crate::write::write_atomic;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

const BOM: char = '\u{feff}';

/// .NET `.resx` table backed by [`ResxDocument`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ResxTable;

impl ResourceTable for ResxTable {
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>> {
        Ok(ResxDocument::open(path)?.entries())
    }

    /// Rewrites the document already at `path`, dropping every string node
    /// that is not part of `entries`.
    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<()> {
        let document = ResxDocument::open(path)?;
        let rendered = document.render_retaining(entries)?;
        write_atomic(path, &rendered.into_bytes())?;
        Ok(())
    }
}

/// A parsed `.resx` file that remembers where each string node lives.
///
/// Only `<data>` nodes without `type`/`mimetype` attributes are string
/// entries. Everything else (schema, headers, typed nodes, comments) is
/// carried through untouched.
#[derive(Debug, Clone)]
pub struct ResxDocument {
    path: PathBuf,
    source: String,
    bom: bool,
    nodes: Vec<StringNode>,
}

#[derive(Debug, Clone)]
struct StringNode {
    entry: ResourceEntry,
    span: Range<usize>,
}

#[derive(Debug)]
struct PendingNode {
    key: String,
    is_string: bool,
    start: usize,
    value: Option<String>,
    in_value: bool,
}

impl ResxDocument {
    /// Read and parse the document at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_table_text(path)?;
        Self::parse(path, text)
    }

    /// Parse `text` as the content of `path`
    pub fn parse(path: impl Into<PathBuf>, text: String) -> Result<Self> {
        let path = path.into();
        let (bom, source) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest.to_string()),
            None => (false, text),
        };

        let nodes = scan_string_nodes(&path, &source)?;
        log::debug!(
            "Parsed {} string resources from {}",
            nodes.len(),
            path.display()
        );

        Ok(Self {
            path,
            source,
            bom,
            nodes,
        })
    }

    /// String entries in document order
    pub fn entries(&self) -> Vec<ResourceEntry> {
        self.nodes.iter().map(|node| node.entry.clone()).collect()
    }

    /// Render the document keeping only the string nodes listed in `entries`.
    ///
    /// `entries` must be an in-order subsequence of [`Self::entries`] with
    /// unchanged values. A removed node takes its indentation and the line
    /// break before it along.
    pub fn render_retaining(&self, entries: &[ResourceEntry]) -> Result<String> {
        let mut wanted = entries.iter().peekable();
        let mut removed: Vec<Range<usize>> = Vec::new();

        for node in &self.nodes {
            match wanted.peek() {
                Some(next) if next.key == node.entry.key => {
                    if next.value != node.entry.value {
                        return Err(TableError::unsupported(format!(
                            "value of '{}' differs from {}",
                            next.key,
                            self.path.display()
                        )));
                    }
                    wanted.next();
                }
                _ => removed.push(self.removal_span(&node.span)),
            }
        }

        if let Some(extra) = wanted.next() {
            let known: HashSet<&str> = self.nodes.iter().map(|n| n.entry.key.as_str()).collect();
            let reason = if known.contains(extra.key.as_str()) {
                "is out of document order"
            } else {
                "does not exist in the document"
            };
            return Err(TableError::unsupported(format!(
                "entry '{}' {reason} ({})",
                extra.key,
                self.path.display()
            )));
        }

        let mut out = String::with_capacity(self.source.len() + BOM.len_utf8());
        if self.bom {
            out.push(BOM);
        }
        let mut cursor = 0;
        for span in removed {
            out.push_str(&self.source[cursor..span.start]);
            cursor = span.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }

    /// Node span widened over its leading indentation and line break
    fn removal_span(&self, span: &Range<usize>) -> Range<usize> {
        let bytes = self.source.as_bytes();
        let mut start = span.start;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        if start > 0 && bytes[start - 1] == b'\n' {
            start -= 1;
            if start > 0 && bytes[start - 1] == b'\r' {
                start -= 1;
            }
        } else {
            // not on a line of its own; cut the node only
            start = span.start;
        }
        start..span.end
    }
}

fn scan_string_nodes(path: &Path, source: &str) -> Result<Vec<StringNode>> {
    let mut reader = Reader::from_str(source);
    let mut nodes: Vec<StringNode> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending: Option<PendingNode> = None;

    let xml_err = |reader: &Reader<&[u8]>, err: &dyn std::fmt::Display| {
        TableError::parse(
            path,
            format!("at byte {}: {err}", reader.error_position()),
        )
    };

    loop {
        let start = position(&reader);
        let event = reader.read_event().map_err(|err| xml_err(&reader, &err))?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"data" => {
                pending = Some(open_node(path, &e, start)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"data" => {
                let mut node = open_node(path, &e, start)?;
                node.value = Some(String::new());
                push_node(path, &mut nodes, &mut seen, node, position(&reader))?;
            }
            Event::Start(e) if e.name().as_ref() == b"value" => {
                if let Some(node) = pending.as_mut() {
                    node.in_value = true;
                    node.value.get_or_insert_with(String::new);
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                if let Some(node) = pending.as_mut() {
                    node.value.get_or_insert_with(String::new);
                }
            }
            Event::Text(text) => {
                if let Some(node) = pending.as_mut().filter(|n| n.in_value) {
                    let text = text.unescape().map_err(|err| xml_err(&reader, &err))?;
                    node.value.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = pending.as_mut().filter(|n| n.in_value) {
                    let raw = data.into_inner();
                    let text = std::str::from_utf8(&raw).map_err(|err| xml_err(&reader, &err))?;
                    node.value.get_or_insert_with(String::new).push_str(text);
                }
            }
            Event::End(e) if e.name().as_ref() == b"value" => {
                if let Some(node) = pending.as_mut() {
                    node.in_value = false;
                }
            }
            Event::End(e) if e.name().as_ref() == b"data" => {
                if let Some(node) = pending.take() {
                    push_node(path, &mut nodes, &mut seen, node, position(&reader))?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(node) = pending {
        return Err(TableError::parse(
            path,
            format!("unterminated <data name=\"{}\">", node.key),
        ));
    }

    Ok(nodes)
}

fn open_node(path: &Path, element: &BytesStart<'_>, start: usize) -> Result<PendingNode> {
    let attr_err = |err: &dyn std::fmt::Display| TableError::parse(path, err.to_string());

    let name = element
        .try_get_attribute("name")
        .map_err(|err| attr_err(&err))?
        .ok_or_else(|| TableError::parse(path, "<data> element without a name attribute"))?;
    let key = name
        .unescape_value()
        .map_err(|err| attr_err(&err))?
        .into_owned();

    let typed = element
        .try_get_attribute("type")
        .map_err(|err| attr_err(&err))?
        .is_some()
        || element
            .try_get_attribute("mimetype")
            .map_err(|err| attr_err(&err))?
            .is_some();

    Ok(PendingNode {
        key,
        is_string: !typed,
        start,
        value: None,
        in_value: false,
    })
}

fn push_node(
    path: &Path,
    nodes: &mut Vec<StringNode>,
    seen: &mut HashSet<String>,
    node: PendingNode,
    end: usize,
) -> Result<()> {
    if !seen.insert(node.key.clone()) {
        return Err(TableError::duplicate_key(path, node.key));
    }
    if !node.is_string {
        log::debug!("Keeping typed resource '{}' untouched", node.key);
        return Ok(());
    }

    nodes.push(StringNode {
        entry: ResourceEntry {
            key: node.key,
            value: node.value.unwrap_or_default(),
        },
        span: node.start..end,
    });
    Ok(())
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}
