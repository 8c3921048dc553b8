//! Writes a document back out as text.
//!
//! Traversal is iterative with an explicit stack. Namespace declarations
//! are emitted only where the in-scope bindings do not already cover
//! them, so inherited declarations are not repeated on every descendant;
//! a namespaced attribute below an element that never declared its
//! prefix gets the declaration on demand.

use std::io::{self, Write};

use quick_xml::escape::{escape, partial_escape};

use crate::dom::{
    Cdata, ChildOfElement, ChildOfRoot, Comment, DocType, Document, Element, Entity,
    ProcessingInstruction, Text,
};
use crate::{Namespace, XML_NAMESPACE_URI};

enum Content<'d> {
    Element(Element<'d>),
    ElementEnd { element: Element<'d>, pushed: usize },
    Text(Text<'d>),
    Cdata(Cdata<'d>),
    Comment(Comment<'d>),
    ProcessingInstruction(ProcessingInstruction<'d>),
    Entity(Entity<'d>),
}

/// Serialization options.
pub struct Writer {
    single_quotes: bool,
    write_declaration: bool,
    encoding: Option<String>,
}

impl Writer {
    pub fn new() -> Writer {
        Writer {
            single_quotes: true,
            write_declaration: true,
            encoding: None,
        }
    }

    pub fn set_single_quotes(self, single_quotes: bool) -> Writer {
        Writer {
            single_quotes,
            ..self
        }
    }

    pub fn set_write_declaration(self, write_declaration: bool) -> Writer {
        Writer {
            write_declaration,
            ..self
        }
    }

    /// An encoding name for the XML declaration. The output itself is
    /// whatever the destination makes of the written bytes; this only
    /// labels it.
    pub fn set_encoding(self, encoding: Option<&str>) -> Writer {
        Writer {
            encoding: encoding.map(str::to_owned),
            ..self
        }
    }

    fn quote_char(&self) -> &'static str {
        if self.single_quotes {
            "'"
        } else {
            "\""
        }
    }

    /// Writes the whole document: declaration, document type, the root
    /// element's tree, and any top-level comments and processing
    /// instructions.
    pub fn format_document<'d, W>(&self, document: &Document<'d>, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        if self.write_declaration {
            self.format_declaration(writer)?;
        }

        for child in document.root().children() {
            match child {
                ChildOfRoot::DocType(doc_type) => self.format_doc_type(doc_type, writer)?,
                ChildOfRoot::Element(element) => self.format_body(element, writer)?,
                ChildOfRoot::Comment(comment) => write!(writer, "<!--{}-->", comment.text())?,
                ChildOfRoot::ProcessingInstruction(pi) => {
                    self.format_processing_instruction(pi.target(), pi.value(), writer)?;
                }
            }
        }
        Ok(())
    }

    fn format_declaration<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        let q = self.quote_char();
        write!(writer, "<?xml version={}1.0{}", q, q)?;
        if let Some(encoding) = &self.encoding {
            write!(writer, " encoding={}{}{}", q, encoding, q)?;
        }
        write!(writer, "?>")
    }

    fn format_doc_type<W>(&self, doc_type: DocType<'_>, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        let q = self.quote_char();
        write!(writer, "<!DOCTYPE {}", doc_type.name())?;
        match (doc_type.public_id(), doc_type.system_id()) {
            (Some(public), Some(system)) => {
                write!(writer, " PUBLIC {}{}{} {}{}{}", q, public, q, q, system, q)?;
            }
            (Some(public), None) => {
                write!(writer, " PUBLIC {}{}{}", q, public, q)?;
            }
            (None, Some(system)) => {
                write!(writer, " SYSTEM {}{}{}", q, system, q)?;
            }
            (None, None) => {}
        }
        write!(writer, ">")
    }

    fn format_body<'d, W>(&self, element: Element<'d>, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        let mut todo = vec![Content::Element(element)];
        let mut scope: Vec<(String, String)> = Vec::new();

        while let Some(content) = todo.pop() {
            self.format_one(content, &mut todo, &mut scope, writer)?;
        }
        Ok(())
    }

    fn format_one<'d, W>(
        &self,
        content: Content<'d>,
        todo: &mut Vec<Content<'d>>,
        scope: &mut Vec<(String, String)>,
        writer: &mut W,
    ) -> io::Result<()>
    where
        W: Write,
    {
        match content {
            Content::Element(element) => self.format_element(element, todo, scope, writer),
            Content::ElementEnd { element, pushed } => {
                write!(writer, "</{}>", element.name().qualified_name())?;
                scope.truncate(scope.len() - pushed);
                Ok(())
            }
            Content::Text(text) => write!(writer, "{}", partial_escape(text.text())),
            Content::Cdata(cdata) => self.format_cdata(cdata.text(), writer),
            Content::Comment(comment) => write!(writer, "<!--{}-->", comment.text()),
            Content::ProcessingInstruction(pi) => {
                self.format_processing_instruction(pi.target(), pi.value(), writer)
            }
            Content::Entity(entity) => write!(writer, "&{};", entity.name()),
        }
    }

    fn format_element<'d, W>(
        &self,
        element: Element<'d>,
        todo: &mut Vec<Content<'d>>,
        scope: &mut Vec<(String, String)>,
        writer: &mut W,
    ) -> io::Result<()>
    where
        W: Write,
    {
        let q = self.quote_char();
        write!(writer, "<{}", element.name().qualified_name())?;

        let mut pushed = 0;
        let mut declared_default = false;
        for namespace in element.declared_namespaces() {
            // The xml prefix is bound by definition and never written out.
            if namespace.prefix() == "xml" && namespace.uri() == XML_NAMESPACE_URI {
                continue;
            }
            let current = bound_uri(scope, namespace.prefix());
            let effective = if namespace.prefix().is_empty() {
                Some(current.unwrap_or(""))
            } else {
                current
            };
            if effective == Some(namespace.uri()) {
                continue;
            }
            if namespace.prefix().is_empty() {
                write!(writer, " xmlns={}{}{}", q, escape(namespace.uri()), q)?;
                declared_default = true;
            } else {
                write!(
                    writer,
                    " xmlns:{}={}{}{}",
                    namespace.prefix(),
                    q,
                    escape(namespace.uri()),
                    q
                )?;
            }
            scope.push((namespace.prefix().to_owned(), namespace.uri().to_owned()));
            pushed += 1;
        }

        // An element in no namespace below an in-scope default binding
        // needs the binding cancelled.
        if !declared_default
            && element.name().namespace_uri().is_empty()
            && bound_uri(scope, "").map_or(false, |uri| !uri.is_empty())
        {
            write!(writer, " xmlns={}{}", q, q)?;
            scope.push((String::new(), String::new()));
            pushed += 1;
        }

        for attribute in element.attributes() {
            let name = attribute.name();
            let namespace = name.namespace();
            if namespace.uri().is_empty() {
                write!(writer, " {}", name.local_name())?;
            } else {
                let prefix = self.attribute_prefix(namespace, scope, &mut pushed, writer)?;
                write!(writer, " {}:{}", prefix, name.local_name())?;
            }
            write!(writer, "={}{}{}", q, escape(attribute.value()), q)?;
        }

        let mut children = element.children();
        if children.is_empty() {
            write!(writer, "/>")?;
            scope.truncate(scope.len() - pushed);
        } else {
            write!(writer, ">")?;
            todo.push(Content::ElementEnd { element, pushed });
            children.reverse();
            todo.extend(children.into_iter().map(|child| match child {
                ChildOfElement::Element(n) => Content::Element(n),
                ChildOfElement::Text(n) => Content::Text(n),
                ChildOfElement::Cdata(n) => Content::Cdata(n),
                ChildOfElement::Comment(n) => Content::Comment(n),
                ChildOfElement::ProcessingInstruction(n) => Content::ProcessingInstruction(n),
                ChildOfElement::Entity(n) => Content::Entity(n),
            }));
        }
        Ok(())
    }

    // Ensures the attribute's namespace is bound to a usable prefix,
    // declaring or generating one when the scope does not cover it.
    fn attribute_prefix<W>(
        &self,
        namespace: Namespace<'_>,
        scope: &mut Vec<(String, String)>,
        pushed: &mut usize,
        writer: &mut W,
    ) -> io::Result<String>
    where
        W: Write,
    {
        let q = self.quote_char();
        let preferred = namespace.prefix();
        if preferred == "xml" && namespace.uri() == XML_NAMESPACE_URI {
            return Ok(preferred.to_owned());
        }
        if !preferred.is_empty() {
            match bound_uri(scope, preferred) {
                Some(uri) if uri == namespace.uri() => return Ok(preferred.to_owned()),
                Some(_) => {}
                None => {
                    write!(
                        writer,
                        " xmlns:{}={}{}{}",
                        preferred,
                        q,
                        escape(namespace.uri()),
                        q
                    )?;
                    scope.push((preferred.to_owned(), namespace.uri().to_owned()));
                    *pushed += 1;
                    return Ok(preferred.to_owned());
                }
            }
        }
        let generated = generate_prefix(scope);
        write!(
            writer,
            " xmlns:{}={}{}{}",
            generated,
            q,
            escape(namespace.uri()),
            q
        )?;
        scope.push((generated.clone(), namespace.uri().to_owned()));
        *pushed += 1;
        Ok(generated)
    }

    fn format_processing_instruction<W>(
        &self,
        target: &str,
        value: Option<&str>,
        writer: &mut W,
    ) -> io::Result<()>
    where
        W: Write,
    {
        match value {
            Some(value) => write!(writer, "<?{} {}?>", target, value),
            None => write!(writer, "<?{}?>", target),
        }
    }

    fn format_cdata<W>(&self, text: &str, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        // A ]]> inside the data must not close the section early.
        write!(writer, "<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
    }
}

impl Default for Writer {
    fn default() -> Writer {
        Writer::new()
    }
}

/// Writes the document with default options.
pub fn format_document<'d, W>(document: &Document<'d>, writer: &mut W) -> io::Result<()>
where
    W: Write,
{
    Writer::new().format_document(document, writer)
}

fn bound_uri<'a>(scope: &'a [(String, String)], prefix: &str) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn generate_prefix(scope: &[(String, String)]) -> String {
    let mut n = 0;
    loop {
        let candidate = format!("ns{}", n);
        if bound_uri(scope, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}
