//! Turns text into trees of nodes.
//!
//! A streaming bridge over `quick_xml`: events arrive in document order
//! and are assembled through the same checked adds the rest of the crate
//! uses, so an ill-shaped document (a second root element, say) surfaces
//! as a parse error. Construction is routed through a
//! [`NodeFactory`](crate::factory::NodeFactory) so callers can intercept
//! it.

use std::fs;
use std::path::Path;

use log::{trace, warn};
use quick_xml::errors::IllFormedError;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::dom::{Document, Element, Root};
use crate::factory::{DocumentFactory, NodeFactory};
use crate::str::XmlChar;
use crate::{Namespace, Package};

/// Result type for the reader.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Failures while turning text into a tree.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed markup reported by the underlying scanner.
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),

    /// A well-formed event arrived that the tree cannot accept.
    #[error(transparent)]
    Tree(#[from] crate::Error),

    /// The document used a prefix it never declared.
    #[error("the prefix '{prefix}' is not bound to a namespace")]
    UnboundPrefix { prefix: String },

    /// Character data outside the root element.
    #[error("character data outside the root element")]
    TextOutsideRoot,

    /// A character reference that does not name a character.
    #[error("invalid character reference '&{reference};'")]
    InvalidCharacterReference { reference: String },

    /// The document ended before the element was closed.
    #[error("the element '{name}' is never closed")]
    UnclosedElement { name: String },

    /// The document type declaration could not be understood.
    #[error("malformed document type declaration: {0}")]
    MalformedDocType(String),

    /// I/O while reading the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses a complete document into a fresh package.
pub fn parse(xml: &str) -> ParseResult<Package> {
    let package = Package::new();
    {
        let factory = DocumentFactory::new(package.as_document());
        parse_with(&factory, xml)?;
    }
    Ok(package)
}

/// Parses a UTF-8 file into a fresh package.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Package> {
    let xml = fs::read_to_string(path)?;
    parse(&xml)
}

/// Parses a complete document into the factory's document, creating
/// every node through the factory.
pub fn parse_with<'d, F>(factory: &F, xml: &str) -> ParseResult<()>
where
    F: NodeFactory<'d> + ?Sized,
{
    let root = factory.document().root();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Element<'d>> = Vec::new();
    let mut pending_text: Option<String> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            // Unify the scanner's own unclosed-tag report with ours.
            Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name))) => {
                return Err(ParseError::UnclosedElement { name })
            }
            Err(e) => return Err(e.into()),
        };
        match event {
            Event::Start(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                let element = start_element(factory, &reader, root, &stack, &e)?;
                stack.push(element);
            }
            Event::End(_) => {
                flush_text(factory, &stack, &mut pending_text)?;
                stack.pop();
            }
            Event::Empty(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                start_element(factory, &reader, root, &stack, &e)?;
            }
            Event::Text(e) => {
                let raw = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(quick_xml::Error::from)?;
                let text = unescape(&raw).map_err(quick_xml::Error::from)?;
                pending_text.get_or_insert_with(String::new).push_str(&text);
            }
            Event::GeneralRef(e) => {
                let reference = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                if let Some(resolved) = resolve_predefined(&reference) {
                    pending_text.get_or_insert_with(String::new).push_str(resolved);
                } else if let Some(digits) = reference.strip_prefix('#') {
                    let c = resolve_char_ref(digits)
                        .ok_or(ParseError::InvalidCharacterReference { reference })?;
                    pending_text.get_or_insert_with(String::new).push(c);
                } else {
                    flush_text(factory, &stack, &mut pending_text)?;
                    match stack.last() {
                        Some(parent) => {
                            warn!(
                                "the entity '&{};' is not defined; keeping an empty reference",
                                reference
                            );
                            let node = factory.create_entity(&reference, "");
                            parent.append_child(node)?;
                        }
                        None => return Err(ParseError::TextOutsideRoot),
                    }
                }
            }
            Event::CData(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                let text = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(quick_xml::Error::from)?;
                match stack.last() {
                    Some(parent) => {
                        let node = factory.create_cdata(&text);
                        parent.append_child(node)?;
                    }
                    None => return Err(ParseError::TextOutsideRoot),
                }
            }
            Event::Comment(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                let text = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(quick_xml::Error::from)?;
                let node = factory.create_comment(&text);
                match stack.last() {
                    Some(parent) => parent.append_child(node)?,
                    None => root.append_child(node)?,
                }
            }
            Event::PI(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                let target = reader
                    .decoder()
                    .decode(e.target())
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                let content = reader
                    .decoder()
                    .decode(e.content())
                    .map_err(quick_xml::Error::from)?;
                let value = content.trim_start_matches(|c: char| c.is_space_char());
                let value = if value.is_empty() { None } else { Some(value) };
                let node = factory.create_processing_instruction(&target, value);
                match stack.last() {
                    Some(parent) => parent.append_child(node)?,
                    None => root.append_child(node)?,
                }
            }
            Event::DocType(e) => {
                flush_text(factory, &stack, &mut pending_text)?;
                if !stack.is_empty() {
                    return Err(ParseError::MalformedDocType(String::from(
                        "declaration inside the root element",
                    )));
                }
                let text = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(quick_xml::Error::from)?;
                let (name, public_id, system_id) = parse_doc_type(&text)?;
                let node = factory.create_doc_type(name, public_id, system_id);
                root.append_child(node)?;
            }
            Event::Decl(_) => {}
            Event::Eof => {
                flush_text(factory, &stack, &mut pending_text)?;
                if let Some(unclosed) = stack.last() {
                    return Err(ParseError::UnclosedElement {
                        name: unclosed.name().qualified_name().to_owned(),
                    });
                }
                break;
            }
        }
    }

    trace!(
        "parsed a document with {} top-level nodes",
        root.child_count()
    );
    Ok(())
}

// Creates the element for a start tag, attaches it, declares its
// namespaces, and resolves and sets its attributes.
fn start_element<'d, F>(
    factory: &F,
    reader: &Reader<&[u8]>,
    root: Root<'d>,
    stack: &[Element<'d>],
    e: &BytesStart<'_>,
) -> ParseResult<Element<'d>>
where
    F: NodeFactory<'d> + ?Sized,
{
    let doc = factory.document();
    let qname = e.name();
    let name = reader
        .decoder()
        .decode(qname.as_ref())
        .map_err(quick_xml::Error::from)?;

    let mut declarations: Vec<(String, String)> = Vec::new();
    let mut plain: Vec<(String, String)> = Vec::new();
    for attribute in e.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = reader
            .decoder()
            .decode(attribute.key.as_ref())
            .map_err(quick_xml::Error::from)?
            .into_owned();
        let value = attribute
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_owned(), value));
        } else {
            plain.push((key, value));
        }
    }

    let parent = stack.last().copied();
    let (prefix, local_name) = split_name(&name);
    let element_name = match lookup_namespace(doc, prefix, &declarations, parent)? {
        Some(namespace) => doc.qname_with_namespace(local_name, namespace)?,
        None if prefix.is_empty() => doc.qname(local_name)?,
        None => {
            return Err(ParseError::UnboundPrefix {
                prefix: prefix.to_owned(),
            })
        }
    };

    let element = factory.create_element(element_name);
    match parent {
        Some(parent) => parent.append_child(element)?,
        None => root.append_child(element)?,
    }

    for (prefix, uri) in &declarations {
        element.add_namespace(prefix, uri)?;
    }

    for (key, value) in &plain {
        let (prefix, local_name) = split_name(key);
        let attribute_name = if prefix.is_empty() {
            // Unprefixed attributes are in no namespace, default or not.
            doc.qname(local_name)?
        } else {
            match element.namespace_for_prefix(prefix) {
                Some(namespace) => doc.qname_with_namespace(local_name, namespace)?,
                None => {
                    return Err(ParseError::UnboundPrefix {
                        prefix: prefix.to_owned(),
                    })
                }
            }
        };
        let attribute = factory.create_attribute(attribute_name, value);
        element.add_attribute(attribute)?;
    }

    Ok(element)
}

fn flush_text<'d, F>(
    factory: &F,
    stack: &[Element<'d>],
    pending: &mut Option<String>,
) -> ParseResult<()>
where
    F: NodeFactory<'d> + ?Sized,
{
    let text = match pending.take() {
        Some(text) => text,
        None => return Ok(()),
    };
    match stack.last() {
        Some(parent) => {
            let node = factory.create_text(&text);
            parent.append_child(node)?;
        }
        None => {
            if !text.chars().all(|c| c.is_space_char()) {
                return Err(ParseError::TextOutsideRoot);
            }
        }
    }
    Ok(())
}

// The nearest binding for the prefix: the start tag's own declarations,
// then the scope of the enclosing element.
fn lookup_namespace<'d>(
    doc: Document<'d>,
    prefix: &str,
    declarations: &[(String, String)],
    parent: Option<Element<'d>>,
) -> ParseResult<Option<Namespace<'d>>> {
    if prefix == "xml" {
        return Ok(Some(Namespace::xml()));
    }
    if let Some((_, uri)) = declarations.iter().find(|(p, _)| p == prefix) {
        if uri.is_empty() {
            return Ok(None);
        }
        return Ok(Some(doc.namespace(prefix, uri)?));
    }
    Ok(match parent {
        Some(parent) => parent.namespace_for_prefix(prefix),
        None => None,
    })
}

fn split_name(name: &str) -> (&str, &str) {
    match name.find(':') {
        Some(index) => (&name[..index], &name[index + 1..]),
        None => ("", name),
    }
}

fn resolve_predefined(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

fn resolve_char_ref(digits: &str) -> Option<char> {
    let (digits, radix) = match digits.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}

// The text between `<!DOCTYPE` and `>`: a name, optional PUBLIC/SYSTEM
// identifiers, and an optional internal subset we do not model.
fn parse_doc_type(text: &str) -> ParseResult<(&str, Option<&str>, Option<&str>)> {
    let trimmed = text.trim_matches(|c: char| c.is_space_char());
    let name_end = trimmed
        .find(|c: char| c.is_space_char() || c == '[')
        .unwrap_or(trimmed.len());
    let (name, after_name) = trimmed.split_at(name_end);
    if name.is_empty() {
        return Err(ParseError::MalformedDocType(String::from("missing name")));
    }

    let mut rest = after_name.trim_start_matches(|c: char| c.is_space_char());
    let mut public_id = None;
    let mut system_id = None;
    if let Some(after_keyword) = rest.strip_prefix("PUBLIC") {
        let (public, after_public) = quoted_literal(after_keyword)?;
        public_id = Some(public);
        rest = after_public;
        let at_literal = rest.trim_start_matches(|c: char| c.is_space_char());
        if at_literal.starts_with('"') || at_literal.starts_with('\'') {
            let (system, after_system) = quoted_literal(at_literal)?;
            system_id = Some(system);
            rest = after_system;
        }
    } else if let Some(after_keyword) = rest.strip_prefix("SYSTEM") {
        let (system, after_system) = quoted_literal(after_keyword)?;
        system_id = Some(system);
        rest = after_system;
    }

    let rest = rest.trim_start_matches(|c: char| c.is_space_char());
    if rest.starts_with('[') {
        warn!("ignoring the internal subset of the document type declaration");
    } else if !rest.is_empty() {
        return Err(ParseError::MalformedDocType(format!(
            "unexpected trailing '{}'",
            rest
        )));
    }

    Ok((name, public_id, system_id))
}

fn quoted_literal(text: &str) -> ParseResult<(&str, &str)> {
    let text = text.trim_start_matches(|c: char| c.is_space_char());
    let quote = match text.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            return Err(ParseError::MalformedDocType(String::from(
                "expected a quoted identifier",
            )))
        }
    };
    let body = &text[1..];
    match body.find(quote) {
        Some(end) => Ok((&body[..end], &body[end + 1..])),
        None => Err(ParseError::MalformedDocType(String::from(
            "unterminated identifier",
        ))),
    }
}
