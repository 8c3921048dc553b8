//! A traditional mutable tree interface for navigating and manipulating
//! documents.
//!
//! Handles are small `Copy` values borrowing the `Package` they were
//! created from; two handles are equal when they point at the same node.
//! Mutations that could violate the tree shape return a `Result`; see
//! [`Error`](crate::Error) for the failure taxonomy.

use std::any::Any;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::raw;
use crate::str::{is_ncname, XmlChar};
use crate::{Namespace, QName};

/// A handle used to create and locate nodes of one document.
#[derive(Copy, Clone)]
pub struct Document<'d> {
    storage: &'d raw::Storage,
    connections: &'d raw::Connections,
}

impl<'d> PartialEq for Document<'d> {
    fn eq(&self, other: &Document<'d>) -> bool {
        self.storage as *const raw::Storage == other.storage as *const raw::Storage
            && self.connections as *const raw::Connections
                == other.connections as *const raw::Connections
    }
}

impl<'d> Eq for Document<'d> {}

macro_rules! wrapper {
    ($name:ident, $wrapper:ident, $inner:ty) => {
        fn $name(self, node: *mut $inner) -> $wrapper<'d> {
            $wrapper {
                document: self,
                node,
            }
        }
    };
}

impl<'d> Document<'d> {
    #[doc(hidden)]
    pub fn new(storage: &'d raw::Storage, connections: &'d raw::Connections) -> Document<'d> {
        Document {
            storage,
            connections,
        }
    }

    pub fn root(self) -> Root<'d> {
        self.wrap_root(self.connections.root())
    }

    /// Interns a namespace value. The prefix must be empty or an NCName.
    pub fn namespace(self, prefix: &str, uri: &str) -> Result<Namespace<'d>> {
        if !prefix.is_empty() && !is_ncname(prefix) {
            return Err(Error::InvalidQualifiedName {
                name: prefix.to_owned(),
            });
        }
        Ok(self.wrap_namespace(self.storage.intern_namespace(prefix, uri)))
    }

    /// Interns a name in no namespace. The local name must be an NCName.
    pub fn qname(self, local_name: &str) -> Result<QName<'d>> {
        if !is_ncname(local_name) {
            return Err(Error::InvalidQualifiedName {
                name: local_name.to_owned(),
            });
        }
        let namespace = self.storage.no_namespace();
        Ok(self.wrap_qname(self.storage.intern_qname(namespace, local_name)))
    }

    /// Interns a name in the given namespace. The local name must be an
    /// NCName.
    pub fn qname_with_namespace(
        self,
        local_name: &str,
        namespace: Namespace<'d>,
    ) -> Result<QName<'d>> {
        if !is_ncname(local_name) {
            return Err(Error::InvalidQualifiedName {
                name: local_name.to_owned(),
            });
        }
        let namespace = self
            .storage
            .intern_namespace(namespace.prefix(), namespace.uri());
        Ok(self.wrap_qname(self.storage.intern_qname(namespace, local_name)))
    }

    pub fn create_element(self, name: QName<'d>) -> Element<'d> {
        self.wrap_element(self.storage.create_element(self.raw_qname(name)))
    }

    /// Creates a detached attribute; attach it with
    /// [`Element::add_attribute`].
    pub fn create_attribute(self, name: QName<'d>, value: &str) -> Attribute<'d> {
        self.wrap_attribute(self.storage.create_attribute(self.raw_qname(name), value))
    }

    pub fn create_text(self, text: &str) -> Text<'d> {
        self.wrap_text(self.storage.create_text(text))
    }

    pub fn create_cdata(self, text: &str) -> Cdata<'d> {
        self.wrap_cdata(self.storage.create_cdata(text))
    }

    pub fn create_comment(self, text: &str) -> Comment<'d> {
        self.wrap_comment(self.storage.create_comment(text))
    }

    pub fn create_entity(self, name: &str, text: &str) -> Entity<'d> {
        self.wrap_entity(self.storage.create_entity(name, text))
    }

    pub fn create_processing_instruction(
        self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        self.wrap_pi(self.storage.create_processing_instruction(target, value))
    }

    /// Creates a processing instruction whose value is rendered from
    /// `key="value"` pairs.
    pub fn create_processing_instruction_with_values(
        self,
        target: &str,
        values: &[(&str, &str)],
    ) -> ProcessingInstruction<'d> {
        let value = format_pi_values(values);
        self.wrap_pi(
            self.storage
                .create_processing_instruction(target, Some(&value)),
        )
    }

    pub fn create_doc_type(
        self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DocType<'d> {
        self.wrap_doc_type(self.storage.create_doc_type(name, public_id, system_id))
    }

    fn raw_qname(self, name: QName<'d>) -> *const raw::QName {
        let namespace = self
            .storage
            .intern_namespace(name.namespace().prefix(), name.namespace().uri());
        self.storage.intern_qname(namespace, name.local_name())
    }

    fn wrap_namespace(self, namespace: *const raw::Namespace) -> Namespace<'d> {
        let namespace_r: &'d raw::Namespace = unsafe { &*namespace };
        Namespace {
            prefix: namespace_r.prefix(),
            uri: namespace_r.uri(),
        }
    }

    fn wrap_qname(self, name: *const raw::QName) -> QName<'d> {
        let name_r: &'d raw::QName = unsafe { &*name };
        let namespace = name_r.namespace();
        QName {
            local_name: name_r.local_name(),
            qualified_name: name_r.qualified_name(),
            namespace: Namespace {
                prefix: namespace.prefix(),
                uri: namespace.uri(),
            },
        }
    }

    fn wrap_child_of_root(self, child: raw::ChildOfRoot) -> ChildOfRoot<'d> {
        match child {
            raw::ChildOfRoot::Element(n) => ChildOfRoot::Element(self.wrap_element(n)),
            raw::ChildOfRoot::Comment(n) => ChildOfRoot::Comment(self.wrap_comment(n)),
            raw::ChildOfRoot::ProcessingInstruction(n) => {
                ChildOfRoot::ProcessingInstruction(self.wrap_pi(n))
            }
            raw::ChildOfRoot::DocType(n) => ChildOfRoot::DocType(self.wrap_doc_type(n)),
        }
    }

    fn wrap_child_of_element(self, child: raw::ChildOfElement) -> ChildOfElement<'d> {
        match child {
            raw::ChildOfElement::Element(n) => ChildOfElement::Element(self.wrap_element(n)),
            raw::ChildOfElement::Text(n) => ChildOfElement::Text(self.wrap_text(n)),
            raw::ChildOfElement::Cdata(n) => ChildOfElement::Cdata(self.wrap_cdata(n)),
            raw::ChildOfElement::Comment(n) => ChildOfElement::Comment(self.wrap_comment(n)),
            raw::ChildOfElement::ProcessingInstruction(n) => {
                ChildOfElement::ProcessingInstruction(self.wrap_pi(n))
            }
            raw::ChildOfElement::Entity(n) => ChildOfElement::Entity(self.wrap_entity(n)),
        }
    }

    fn wrap_parent_of_child(self, parent: raw::ParentOfChild) -> ParentOfChild<'d> {
        match parent {
            raw::ParentOfChild::Root(n) => ParentOfChild::Root(self.wrap_root(n)),
            raw::ParentOfChild::Element(n) => ParentOfChild::Element(self.wrap_element(n)),
        }
    }

    wrapper!(wrap_root, Root, raw::Root);
    wrapper!(wrap_element, Element, raw::Element);
    wrapper!(wrap_attribute, Attribute, raw::Attribute);
    wrapper!(wrap_text, Text, raw::Text);
    wrapper!(wrap_cdata, Cdata, raw::Cdata);
    wrapper!(wrap_comment, Comment, raw::Comment);
    wrapper!(wrap_entity, Entity, raw::Entity);
    wrapper!(wrap_pi, ProcessingInstruction, raw::ProcessingInstruction);
    wrapper!(wrap_doc_type, DocType, raw::DocType);
}

impl<'d> fmt::Debug for Document<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document {{ {:p} }}", self.storage)
    }
}

macro_rules! node {
    ($name:ident, $raw:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Copy, Clone)]
        pub struct $name<'d> {
            document: Document<'d>,
            node: *mut $raw,
        }

        impl<'d> $name<'d> {
            fn node(&self) -> &'d $raw {
                unsafe { &*self.node }
            }

            /// The document this node was created for.
            pub fn document(&self) -> Document<'d> {
                self.document
            }
        }

        impl<'d> PartialEq for $name<'d> {
            fn eq(&self, other: &$name<'d>) -> bool {
                self.node == other.node
            }
        }

        impl<'d> Eq for $name<'d> {}

        impl<'d> ::std::hash::Hash for $name<'d> {
            fn hash<H>(&self, state: &mut H)
            where
                H: ::std::hash::Hasher,
            {
                self.node.hash(state)
            }
        }
    };
}

node!(Root, raw::Root, "The top-most node of a document");

impl<'d> Root<'d> {
    /// Adds the child as the last child of the document.
    ///
    /// Fails when the child already has a parent, was created by another
    /// document, or would be a second root element or document type.
    pub fn append_child<C>(&self, child: C) -> Result<()>
    where
        C: Into<ChildOfRoot<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        self.document.connections.append_root_child(child.as_raw())
    }

    /// Adds each child in order, stopping at the first failure. Children
    /// added before the failure stay added.
    pub fn append_children<C>(&self, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfRoot<'d>> + Copy,
    {
        for &child in children {
            self.append_child(child)?;
        }
        Ok(())
    }

    pub fn insert_child_at<C>(&self, index: usize, child: C) -> Result<()>
    where
        C: Into<ChildOfRoot<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        self.document
            .connections
            .insert_root_child_at(index, child.as_raw())
    }

    pub fn insert_children_at<C>(&self, index: usize, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfRoot<'d>> + Copy,
    {
        for (offset, &child) in children.iter().enumerate() {
            self.insert_child_at(index + offset, child)?;
        }
        Ok(())
    }

    /// Puts the child at the index, returning the detached node it
    /// displaced.
    pub fn replace_child_at<C>(&self, index: usize, child: C) -> Result<ChildOfRoot<'d>>
    where
        C: Into<ChildOfRoot<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        let displaced = self
            .document
            .connections
            .replace_root_child_at(index, child.as_raw())?;
        Ok(self.document.wrap_child_of_root(displaced))
    }

    pub fn replace_children<C>(&self, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfRoot<'d>> + Copy,
    {
        self.clear_children();
        self.append_children(children)
    }

    /// Detaches the child, reporting whether it was found here.
    pub fn remove_child<C>(&self, child: C) -> bool
    where
        C: Into<ChildOfRoot<'d>>,
    {
        let child = child.into();
        self.document.connections.remove_root_child(child.as_raw())
    }

    pub fn remove_child_at(&self, index: usize) -> Result<ChildOfRoot<'d>> {
        let removed = self.document.connections.remove_root_child_at(index)?;
        Ok(self.document.wrap_child_of_root(removed))
    }

    /// Detaches each child that was present, counting the ones found.
    pub fn remove_children<C>(&self, children: &[C]) -> usize
    where
        C: Into<ChildOfRoot<'d>> + Copy,
    {
        children
            .iter()
            .filter(|&&child| self.remove_child(child))
            .count()
    }

    pub fn clear_children(&self) {
        self.document.connections.clear_root_children();
    }

    pub fn children(&self) -> Vec<ChildOfRoot<'d>> {
        // Safe because we copy the children and the nodes themselves are
        // never deallocated while the document is alive.
        let children = unsafe { self.document.connections.root_children() };
        children
            .iter()
            .map(|&c| self.document.wrap_child_of_root(c))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        unsafe { self.document.connections.root_children() }.len()
    }

    pub fn child(&self, index: usize) -> Option<ChildOfRoot<'d>> {
        let children = unsafe { self.document.connections.root_children() };
        children
            .get(index)
            .map(|&c| self.document.wrap_child_of_root(c))
    }

    pub fn index_of<C>(&self, child: C) -> Option<usize>
    where
        C: Into<ChildOfRoot<'d>>,
    {
        let child = child.into().as_raw();
        let children = unsafe { self.document.connections.root_children() };
        children.iter().position(|c| *c == child)
    }

    pub fn contains<C>(&self, child: C) -> bool
    where
        C: Into<ChildOfRoot<'d>>,
    {
        self.index_of(child).is_some()
    }

    pub fn root_element(&self) -> Option<Element<'d>> {
        let children = unsafe { self.document.connections.root_children() };
        children.iter().find_map(|c| match *c {
            raw::ChildOfRoot::Element(n) => Some(self.document.wrap_element(n)),
            _ => None,
        })
    }

    /// Puts the element in place of the current root element, detaching
    /// the old one. Setting the current root element again is a no-op.
    pub fn set_root_element(&self, element: Element<'d>) -> Result<()> {
        self.check_same_document(ChildOfRoot::Element(element))?;
        if let Some(current) = self.root_element() {
            if current == element {
                return Ok(());
            }
            if let Some(index) = self.index_of(current) {
                return self
                    .document
                    .connections
                    .replace_root_child_at(index, raw::ChildOfRoot::Element(element.node))
                    .map(|_| ());
            }
        }
        self.document
            .connections
            .append_root_child(raw::ChildOfRoot::Element(element.node))
    }

    pub fn doc_type(&self) -> Option<DocType<'d>> {
        let children = unsafe { self.document.connections.root_children() };
        children.iter().find_map(|c| match *c {
            raw::ChildOfRoot::DocType(n) => Some(self.document.wrap_doc_type(n)),
            _ => None,
        })
    }

    /// Puts the document type in place of the current one, detaching the
    /// old one.
    pub fn set_doc_type(&self, doc_type: DocType<'d>) -> Result<()> {
        self.check_same_document(ChildOfRoot::DocType(doc_type))?;
        if let Some(current) = self.doc_type() {
            if current == doc_type {
                return Ok(());
            }
            if let Some(index) = self.index_of(current) {
                return self
                    .document
                    .connections
                    .replace_root_child_at(index, raw::ChildOfRoot::DocType(doc_type.node))
                    .map(|_| ());
            }
        }
        self.document
            .connections
            .append_root_child(raw::ChildOfRoot::DocType(doc_type.node))
    }

    /// Creates an element with the name and appends it, failing when a
    /// root element already exists.
    pub fn add_element(&self, name: QName<'d>) -> Result<Element<'d>> {
        let element = self.document.create_element(name);
        self.document
            .connections
            .append_root_child(raw::ChildOfRoot::Element(element.node))?;
        Ok(element)
    }

    pub fn add_comment(&self, text: &str) -> Comment<'d> {
        let comment = self.document.create_comment(text);
        self.document
            .connections
            .attach_root_child(raw::ChildOfRoot::Comment(comment.node));
        comment
    }

    pub fn add_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        let pi = self.document.create_processing_instruction(target, value);
        self.document
            .connections
            .attach_root_child(raw::ChildOfRoot::ProcessingInstruction(pi.node));
        pi
    }

    /// The document node has no character-data children.
    pub fn text(&self) -> String {
        String::new()
    }

    /// The string value of the root element, or empty without one.
    pub fn string_value(&self) -> String {
        self.root_element()
            .map(|e| e.string_value())
            .unwrap_or_default()
    }

    fn check_same_document(&self, child: ChildOfRoot<'d>) -> Result<()> {
        if child.document() == self.document {
            Ok(())
        } else {
            Err(Error::ForeignDocument {
                node: child.as_raw().describe(),
                target: String::from("the document"),
            })
        }
    }
}

impl<'d> fmt::Debug for Root<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root")
    }
}

node!(Element, raw::Element, "A named container of content");

impl<'d> Element<'d> {
    pub fn name(&self) -> QName<'d> {
        self.document.wrap_qname(self.node().name())
    }

    pub fn set_name(&self, name: QName<'d>) {
        let name = self.document.raw_qname(name);
        self.document.storage.element_set_name(self.node, name);
    }

    /// The namespace of the element's own name.
    pub fn namespace(&self) -> Namespace<'d> {
        self.name().namespace()
    }

    pub fn parent(&self) -> Option<ParentOfChild<'d>> {
        self.document
            .connections
            .element_parent(self.node)
            .map(|n| self.document.wrap_parent_of_child(n))
    }

    pub fn is_root_element(&self) -> bool {
        matches!(self.parent(), Some(ParentOfChild::Root(_)))
    }

    /// Removes the element from its parent. Does nothing when it has no
    /// parent.
    pub fn detach(&self) {
        match self.document.connections.element_parent(self.node) {
            Some(raw::ParentOfChild::Root(_)) => {
                self.document
                    .connections
                    .remove_root_child(raw::ChildOfRoot::Element(self.node));
            }
            Some(raw::ParentOfChild::Element(parent)) => {
                self.document
                    .connections
                    .remove_element_child(parent, raw::ChildOfElement::Element(self.node));
            }
            None => {}
        }
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::Element(*self)).0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::Element(*self)).1
    }

    /// Adds the child as the last child of this element.
    ///
    /// Fails when the child already has a parent, was created by another
    /// document, or is this element or one of its ancestors.
    pub fn append_child<C>(&self, child: C) -> Result<()>
    where
        C: Into<ChildOfElement<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        self.document
            .connections
            .append_element_child(self.node, child.as_raw())
    }

    /// Adds each child in order, stopping at the first failure. Children
    /// added before the failure stay added.
    pub fn append_children<C>(&self, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfElement<'d>> + Copy,
    {
        for &child in children {
            self.append_child(child)?;
        }
        Ok(())
    }

    pub fn insert_child_at<C>(&self, index: usize, child: C) -> Result<()>
    where
        C: Into<ChildOfElement<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        self.document
            .connections
            .insert_element_child_at(self.node, index, child.as_raw())
    }

    pub fn insert_children_at<C>(&self, index: usize, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfElement<'d>> + Copy,
    {
        for (offset, &child) in children.iter().enumerate() {
            self.insert_child_at(index + offset, child)?;
        }
        Ok(())
    }

    /// Puts the child at the index, returning the detached node it
    /// displaced.
    pub fn replace_child_at<C>(&self, index: usize, child: C) -> Result<ChildOfElement<'d>>
    where
        C: Into<ChildOfElement<'d>>,
    {
        let child = child.into();
        self.check_same_document(child)?;
        let displaced = self
            .document
            .connections
            .replace_element_child_at(self.node, index, child.as_raw())?;
        Ok(self.document.wrap_child_of_element(displaced))
    }

    pub fn replace_children<C>(&self, children: &[C]) -> Result<()>
    where
        C: Into<ChildOfElement<'d>> + Copy,
    {
        self.clear_children();
        self.append_children(children)
    }

    /// Detaches the child, reporting whether it was found here.
    pub fn remove_child<C>(&self, child: C) -> bool
    where
        C: Into<ChildOfElement<'d>>,
    {
        let child = child.into();
        self.document
            .connections
            .remove_element_child(self.node, child.as_raw())
    }

    pub fn remove_child_at(&self, index: usize) -> Result<ChildOfElement<'d>> {
        let removed = self
            .document
            .connections
            .remove_element_child_at(self.node, index)?;
        Ok(self.document.wrap_child_of_element(removed))
    }

    /// Detaches each child that was present, counting the ones found.
    pub fn remove_children<C>(&self, children: &[C]) -> usize
    where
        C: Into<ChildOfElement<'d>> + Copy,
    {
        children
            .iter()
            .filter(|&&child| self.remove_child(child))
            .count()
    }

    pub fn clear_children(&self) {
        self.document.connections.clear_element_children(self.node);
    }

    pub fn children(&self) -> Vec<ChildOfElement<'d>> {
        // Safe because we copy the children and the nodes themselves are
        // never deallocated while the document is alive.
        let children = unsafe { self.document.connections.element_children(self.node) };
        children
            .iter()
            .map(|&c| self.document.wrap_child_of_element(c))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        unsafe { self.document.connections.element_children(self.node) }.len()
    }

    pub fn child(&self, index: usize) -> Option<ChildOfElement<'d>> {
        let children = unsafe { self.document.connections.element_children(self.node) };
        children
            .get(index)
            .map(|&c| self.document.wrap_child_of_element(c))
    }

    pub fn index_of<C>(&self, child: C) -> Option<usize>
    where
        C: Into<ChildOfElement<'d>>,
    {
        let child = child.into().as_raw();
        let children = unsafe { self.document.connections.element_children(self.node) };
        children.iter().position(|c| *c == child)
    }

    pub fn contains<C>(&self, child: C) -> bool
    where
        C: Into<ChildOfElement<'d>>,
    {
        self.index_of(child).is_some()
    }

    /// The first child element with the local name.
    pub fn element(&self, local_name: &str) -> Option<Element<'d>> {
        self.elements()
            .into_iter()
            .find(|e| e.name().local_name() == local_name)
    }

    /// Every child element, in order.
    pub fn elements(&self) -> Vec<Element<'d>> {
        self.children()
            .into_iter()
            .filter_map(|c| c.element())
            .collect()
    }

    /// Every child element with the local name, in order.
    pub fn elements_named(&self, local_name: &str) -> Vec<Element<'d>> {
        self.elements()
            .into_iter()
            .filter(|e| e.name().local_name() == local_name)
            .collect()
    }

    /// The text of the first child element with the local name.
    pub fn element_text(&self, local_name: &str) -> Option<String> {
        self.element(local_name).map(|e| e.text())
    }

    pub fn add_element(&self, name: QName<'d>) -> Element<'d> {
        let element = self.document.create_element(name);
        self.document
            .connections
            .attach_element_child(self.node, raw::ChildOfElement::Element(element.node));
        element
    }

    pub fn add_text(&self, text: &str) -> Text<'d> {
        let text = self.document.create_text(text);
        self.document
            .connections
            .attach_element_child(self.node, raw::ChildOfElement::Text(text.node));
        text
    }

    pub fn add_cdata(&self, text: &str) -> Cdata<'d> {
        let cdata = self.document.create_cdata(text);
        self.document
            .connections
            .attach_element_child(self.node, raw::ChildOfElement::Cdata(cdata.node));
        cdata
    }

    pub fn add_comment(&self, text: &str) -> Comment<'d> {
        let comment = self.document.create_comment(text);
        self.document
            .connections
            .attach_element_child(self.node, raw::ChildOfElement::Comment(comment.node));
        comment
    }

    pub fn add_entity(&self, name: &str, text: &str) -> Entity<'d> {
        let entity = self.document.create_entity(name, text);
        self.document
            .connections
            .attach_element_child(self.node, raw::ChildOfElement::Entity(entity.node));
        entity
    }

    pub fn add_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        let pi = self.document.create_processing_instruction(target, value);
        self.document.connections.attach_element_child(
            self.node,
            raw::ChildOfElement::ProcessingInstruction(pi.node),
        );
        pi
    }

    /// The concatenated character data of the direct children.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for child in self.children() {
            match child {
                ChildOfElement::Text(n) => result.push_str(n.text()),
                ChildOfElement::Cdata(n) => result.push_str(n.text()),
                ChildOfElement::Entity(n) => result.push_str(n.text()),
                _ => {}
            }
        }
        result
    }

    /// [`text`](Self::text) with surrounding whitespace removed and
    /// interior runs collapsed to single spaces.
    pub fn text_trim(&self) -> String {
        self.text().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Removes the character-data children, keeps everything else, and
    /// appends one text node.
    pub fn set_text(&self, text: &str) -> Text<'d> {
        for child in self.children() {
            match child {
                ChildOfElement::Text(_) | ChildOfElement::Cdata(_) | ChildOfElement::Entity(_) => {
                    self.document
                        .connections
                        .remove_element_child(self.node, child.as_raw());
                }
                _ => {}
            }
        }
        self.add_text(text)
    }

    /// The concatenated character data of the whole subtree; comments
    /// and processing instructions contribute nothing.
    pub fn string_value(&self) -> String {
        fn collect(element: &Element<'_>, result: &mut String) {
            for child in element.children() {
                match child {
                    ChildOfElement::Element(n) => collect(&n, result),
                    ChildOfElement::Text(n) => result.push_str(n.text()),
                    ChildOfElement::Cdata(n) => result.push_str(n.text()),
                    ChildOfElement::Entity(n) => result.push_str(n.text()),
                    ChildOfElement::Comment(_) | ChildOfElement::ProcessingInstruction(_) => {}
                }
            }
        }

        let mut result = String::new();
        collect(self, &mut result);
        result
    }

    /// True when the children span two or more node kinds.
    pub fn has_mixed_content(&self) -> bool {
        let children = self.children();
        match children.first() {
            Some(first) => {
                let first = mem::discriminant(first);
                children.iter().any(|c| mem::discriminant(c) != first)
            }
            None => false,
        }
    }

    /// True when every child is character data. An empty element counts.
    pub fn is_text_only(&self) -> bool {
        self.children().iter().all(|c| {
            matches!(
                *c,
                ChildOfElement::Text(_) | ChildOfElement::Cdata(_) | ChildOfElement::Entity(_)
            )
        })
    }

    pub fn attributes(&self) -> Vec<Attribute<'d>> {
        // Safe because we copy the attributes and the nodes themselves
        // are never deallocated while the document is alive.
        let attributes = unsafe { self.document.connections.attributes(self.node) };
        attributes
            .iter()
            .map(|&a| self.document.wrap_attribute(a))
            .collect()
    }

    pub fn attribute_count(&self) -> usize {
        unsafe { self.document.connections.attributes(self.node) }.len()
    }

    pub fn attribute_at(&self, index: usize) -> Option<Attribute<'d>> {
        let attributes = unsafe { self.document.connections.attributes(self.node) };
        attributes
            .get(index)
            .map(|&a| self.document.wrap_attribute(a))
    }

    /// The first attribute with the local name, in any namespace.
    pub fn attribute(&self, local_name: &str) -> Option<Attribute<'d>> {
        self.document
            .connections
            .attribute_by_local_name(self.node, local_name)
            .map(|a| self.document.wrap_attribute(a))
    }

    pub fn attribute_value(&self, local_name: &str) -> Option<&'d str> {
        self.attribute(local_name).map(|a| a.value())
    }

    /// The first attribute with exactly this name.
    pub fn attribute_named(&self, name: QName<'d>) -> Option<Attribute<'d>> {
        let name = self.document.raw_qname(name);
        self.document
            .connections
            .attribute_by_qname(self.node, name)
            .map(|a| self.document.wrap_attribute(a))
    }

    pub fn attribute_value_named(&self, name: QName<'d>) -> Option<&'d str> {
        self.attribute_named(name).map(|a| a.value())
    }

    /// Updates the attribute with this name in place, or appends a new
    /// one. The existing instance and its position are kept.
    pub fn set_attribute_value(&self, name: QName<'d>, value: &str) -> Attribute<'d> {
        let raw_name = self.document.raw_qname(name);
        match self
            .document
            .connections
            .attribute_by_qname(self.node, raw_name)
        {
            Some(attribute) => {
                self.document.storage.attribute_set_value(attribute, value);
                self.document.wrap_attribute(attribute)
            }
            None => {
                let attribute = self.document.storage.create_attribute(raw_name, value);
                self.document
                    .connections
                    .attach_attribute(self.node, attribute);
                self.document.wrap_attribute(attribute)
            }
        }
    }

    /// Appends the attribute without replacing one of the same name.
    ///
    /// Fails when the attribute already belongs to an element or was
    /// created by another document.
    pub fn add_attribute(&self, attribute: Attribute<'d>) -> Result<()> {
        if attribute.document() != self.document {
            return Err(Error::ForeignDocument {
                node: raw::describe_attribute(attribute.node),
                target: raw::describe_element(self.node),
            });
        }
        self.document
            .connections
            .add_attribute(self.node, attribute.node)
    }

    /// Detaches the attribute, reporting whether it was found here.
    pub fn remove_attribute(&self, attribute: Attribute<'d>) -> bool {
        self.document
            .connections
            .remove_attribute(self.node, attribute.node)
    }

    /// Detaches and returns the first attribute with exactly this name.
    pub fn remove_attribute_named(&self, name: QName<'d>) -> Option<Attribute<'d>> {
        let name = self.document.raw_qname(name);
        let found = self
            .document
            .connections
            .attribute_by_qname(self.node, name)?;
        self.document.connections.remove_attribute(self.node, found);
        Some(self.document.wrap_attribute(found))
    }

    /// Appends value copies of every attribute of the other element.
    pub fn append_attributes(&self, other: Element<'d>) {
        for attribute in other.attributes() {
            let copy = self
                .document
                .create_attribute(attribute.name(), attribute.value());
            self.document
                .connections
                .attach_attribute(self.node, copy.node);
        }
    }

    /// Interns and declares a namespace on this element.
    pub fn add_namespace(&self, prefix: &str, uri: &str) -> Result<Namespace<'d>> {
        let namespace = self.document.namespace(prefix, uri)?;
        self.declare_namespace(namespace);
        Ok(namespace)
    }

    pub fn declare_namespace(&self, namespace: Namespace<'d>) {
        let namespace = self
            .document
            .storage
            .intern_namespace(namespace.prefix(), namespace.uri());
        self.document
            .connections
            .declare_namespace(self.node, namespace);
    }

    pub fn remove_namespace(&self, namespace: Namespace<'d>) -> bool {
        let namespace = self
            .document
            .storage
            .intern_namespace(namespace.prefix(), namespace.uri());
        self.document
            .connections
            .remove_namespace(self.node, namespace)
    }

    /// The namespaces declared on this element other than its own.
    pub fn additional_namespaces(&self) -> Vec<Namespace<'d>> {
        // Safe because we copy the declarations and interned namespaces
        // are never deallocated while the document is alive.
        let declared = unsafe { self.document.connections.element_namespaces(self.node) };
        declared
            .iter()
            .map(|&ns| self.document.wrap_namespace(ns))
            .collect()
    }

    /// The element's own namespace (when it has one) followed by the
    /// additional declarations, in declaration order.
    pub fn declared_namespaces(&self) -> Vec<Namespace<'d>> {
        let own = self.namespace();
        let additional = self.additional_namespaces();
        let mut result = Vec::new();
        if own != Namespace::none() && !additional.contains(&own) {
            result.push(own);
        }
        result.extend(additional);
        result
    }

    /// Resolves a prefix against this element's scope: its own name,
    /// its declarations, then the ancestors; the nearest binding wins.
    /// The `xml` prefix is bound everywhere. `None` means unbound.
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<Namespace<'d>> {
        if prefix == "xml" {
            return Some(Namespace::xml());
        }

        let mut found = None;
        self.walk_namespace_bindings(|ns, own| {
            // An element name in no namespace is not a declaration and
            // cannot cancel an inherited default; an explicit one can.
            if own && ns.is_no_namespace() {
                return false;
            }
            if ns.prefix() == prefix {
                found = Some(ns);
                true
            } else {
                false
            }
        });
        match found {
            Some(ns) if !ns.is_no_namespace() => Some(Namespace {
                prefix: ns.prefix(),
                uri: ns.uri(),
            }),
            _ => None,
        }
    }

    /// The nearest in-scope binding for the URI, if any. Multiple
    /// prefixes may be bound to one URI; this returns the first.
    pub fn namespace_for_uri(&self, uri: &str) -> Option<Namespace<'d>> {
        self.namespaces_in_scope()
            .into_iter()
            .find(|ns| ns.uri() == uri)
    }

    /// Every in-scope binding for the URI, nearest first.
    pub fn namespaces_for_uri(&self, uri: &str) -> Vec<Namespace<'d>> {
        self.namespaces_in_scope()
            .into_iter()
            .filter(|ns| ns.uri() == uri)
            .collect()
    }

    /// Every binding visible at this element, one per prefix, nearest
    /// declaration first, including the built-in `xml` binding.
    pub fn namespaces_in_scope(&self) -> Vec<Namespace<'d>> {
        let mut seen: Vec<&'d str> = Vec::new();
        let mut result = Vec::new();
        self.walk_namespace_bindings(|ns, own| {
            // An element whose own name is in no namespace does not
            // cancel an inherited default binding; a declared
            // no-namespace value does.
            if own && ns.is_no_namespace() {
                return false;
            }
            let prefix = ns.prefix();
            if seen.iter().any(|&p| p == prefix) {
                return false;
            }
            seen.push(prefix);
            if !ns.is_no_namespace() {
                result.push(Namespace {
                    prefix: ns.prefix(),
                    uri: ns.uri(),
                });
            }
            false
        });
        if !seen.iter().any(|&p| p == "xml") {
            result.push(Namespace::xml());
        }
        result
    }

    // Visits every binding visible from this element, nearest first: the
    // element's own namespace, then its declarations, then the same for
    // each ancestor. The callback returns true to stop the walk.
    fn walk_namespace_bindings<F>(&self, mut visit: F)
    where
        F: FnMut(&'d raw::Namespace, bool) -> bool,
    {
        let connections = self.document.connections;
        let mut current = self.node;
        loop {
            let element_r: &'d raw::Element = unsafe { &*current };
            if visit(element_r.name().namespace(), true) {
                return;
            }
            let declared = unsafe { connections.element_namespaces(current) };
            for &ns in declared {
                if visit(unsafe { &*ns }, false) {
                    return;
                }
            }
            match connections.element_parent(current) {
                Some(raw::ParentOfChild::Element(parent)) => current = parent,
                _ => return,
            }
        }
    }

    /// Resolves `prefix:local` or `local` against this element's scope.
    /// An unbound prefix falls back to no namespace.
    pub fn resolve_qname(&self, qualified_name: &str) -> Result<QName<'d>> {
        self.resolve_qname_impl(qualified_name, false)
    }

    /// Like [`resolve_qname`](Self::resolve_qname), but an unbound
    /// prefix is an error.
    pub fn resolve_qname_strict(&self, qualified_name: &str) -> Result<QName<'d>> {
        self.resolve_qname_impl(qualified_name, true)
    }

    fn resolve_qname_impl(&self, qualified_name: &str, strict: bool) -> Result<QName<'d>> {
        let (prefix, local_name) = match qualified_name.find(':') {
            Some(index) => (&qualified_name[..index], &qualified_name[index + 1..]),
            None => ("", qualified_name),
        };
        if (!prefix.is_empty() && !is_ncname(prefix)) || !is_ncname(local_name) {
            return Err(Error::InvalidQualifiedName {
                name: qualified_name.to_owned(),
            });
        }
        match self.namespace_for_prefix(prefix) {
            Some(namespace) => self.document.qname_with_namespace(local_name, namespace),
            None if strict && !prefix.is_empty() => Err(Error::UnboundPrefix {
                prefix: prefix.to_owned(),
            }),
            None => self.document.qname(local_name),
        }
    }

    /// A detached structural copy: name, attributes, declarations, and
    /// the whole subtree.
    pub fn create_copy(&self) -> Element<'d> {
        let copy = self.document.create_element(self.name());
        for namespace in self.additional_namespaces() {
            copy.declare_namespace(namespace);
        }
        for attribute in self.attributes() {
            let attribute_copy = self
                .document
                .create_attribute(attribute.name(), attribute.value());
            self.document
                .connections
                .attach_attribute(copy.node, attribute_copy.node);
        }
        for child in self.children() {
            let child_copy = match child {
                ChildOfElement::Element(n) => raw::ChildOfElement::Element(n.create_copy().node),
                ChildOfElement::Text(n) => {
                    raw::ChildOfElement::Text(self.document.storage.create_text(n.text()))
                }
                ChildOfElement::Cdata(n) => {
                    raw::ChildOfElement::Cdata(self.document.storage.create_cdata(n.text()))
                }
                ChildOfElement::Comment(n) => {
                    raw::ChildOfElement::Comment(self.document.storage.create_comment(n.text()))
                }
                ChildOfElement::ProcessingInstruction(n) => {
                    raw::ChildOfElement::ProcessingInstruction(
                        self.document
                            .storage
                            .create_processing_instruction(n.target(), n.value()),
                    )
                }
                ChildOfElement::Entity(n) => raw::ChildOfElement::Entity(
                    self.document.storage.create_entity(n.name(), n.text()),
                ),
            };
            self.document
                .connections
                .attach_element_child(copy.node, child_copy);
        }
        copy
    }

    /// Attaches an arbitrary typed value to this element.
    pub fn set_data(&self, data: Rc<dyn Any>) {
        self.document.storage.element_set_data(self.node, data);
    }

    pub fn data(&self) -> Option<Rc<dyn Any>> {
        self.document.storage.element_data(self.node)
    }

    pub fn take_data(&self) -> Option<Rc<dyn Any>> {
        self.document.storage.element_take_data(self.node)
    }

    /// The location path of this element, like `/shelf/book`. A detached
    /// element yields a relative path.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = *self;
        let mut attached = false;
        loop {
            names.push(current.name().qualified_name());
            match current.parent() {
                Some(ParentOfChild::Element(parent)) => current = parent,
                Some(ParentOfChild::Root(_)) => {
                    attached = true;
                    break;
                }
                None => break,
            }
        }
        names.reverse();
        let joined = names.join("/");
        if attached {
            format!("/{}", joined)
        } else {
            joined
        }
    }

    fn check_same_document(&self, child: ChildOfElement<'d>) -> Result<()> {
        if child.document() == self.document {
            Ok(())
        } else {
            Err(Error::ForeignDocument {
                node: child.as_raw().describe(),
                target: raw::describe_element(self.node),
            })
        }
    }
}

impl<'d> fmt::Debug for Element<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element {{ name: {} }}", self.name())
    }
}

node!(
    Attribute,
    raw::Attribute,
    "A name/value pair belonging to an element"
);

impl<'d> Attribute<'d> {
    pub fn name(&self) -> QName<'d> {
        self.document.wrap_qname(self.node().name())
    }

    pub fn value(&self) -> &'d str {
        self.node().value()
    }

    pub fn set_value(&self, value: &str) {
        self.document.storage.attribute_set_value(self.node, value);
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.document
            .connections
            .attribute_parent(self.node)
            .map(|n| self.document.wrap_element(n))
    }

    /// Removes the attribute from its element. Does nothing when it has
    /// no parent.
    pub fn detach(&self) {
        self.document.connections.detach_attribute(self.node);
    }

    pub fn string_value(&self) -> String {
        self.value().to_owned()
    }

    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}/@{}", parent.path(), self.name().qualified_name()),
            None => format!("@{}", self.name().qualified_name()),
        }
    }
}

impl<'d> fmt::Debug for Attribute<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute {{ name: {}, value: {:?} }}",
            self.name(),
            self.value()
        )
    }
}

node!(Text, raw::Text, "Character data");

impl<'d> Text<'d> {
    pub fn text(&self) -> &'d str {
        self.node().text()
    }

    pub fn set_text(&self, text: &str) {
        self.document.storage.text_set_text(self.node, text);
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.document
            .connections
            .text_parent(self.node)
            .map(|n| self.document.wrap_element(n))
    }

    pub fn detach(&self) {
        if let Some(parent) = self.document.connections.text_parent(self.node) {
            self.document
                .connections
                .remove_element_child(parent, raw::ChildOfElement::Text(self.node));
        }
    }

    pub fn string_value(&self) -> String {
        self.text().to_owned()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent().map(ParentOfChild::Element), Node::Text(*self)).0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent().map(ParentOfChild::Element), Node::Text(*self)).1
    }
}

impl<'d> fmt::Debug for Text<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text {{ text: {:?} }}", self.text())
    }
}

node!(Cdata, raw::Cdata, "Character data exempt from escaping");

impl<'d> Cdata<'d> {
    pub fn text(&self) -> &'d str {
        self.node().text()
    }

    pub fn set_text(&self, text: &str) {
        self.document.storage.cdata_set_text(self.node, text);
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.document
            .connections
            .cdata_parent(self.node)
            .map(|n| self.document.wrap_element(n))
    }

    pub fn detach(&self) {
        if let Some(parent) = self.document.connections.cdata_parent(self.node) {
            self.document
                .connections
                .remove_element_child(parent, raw::ChildOfElement::Cdata(self.node));
        }
    }

    pub fn string_value(&self) -> String {
        self.text().to_owned()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(
            self.parent().map(ParentOfChild::Element),
            Node::Cdata(*self),
        )
        .0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(
            self.parent().map(ParentOfChild::Element),
            Node::Cdata(*self),
        )
        .1
    }
}

impl<'d> fmt::Debug for Cdata<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cdata {{ text: {:?} }}", self.text())
    }
}

node!(Comment, raw::Comment, "Human-readable commentary");

impl<'d> Comment<'d> {
    pub fn text(&self) -> &'d str {
        self.node().text()
    }

    pub fn set_text(&self, text: &str) {
        self.document.storage.comment_set_text(self.node, text);
    }

    pub fn parent(&self) -> Option<ParentOfChild<'d>> {
        self.document
            .connections
            .comment_parent(self.node)
            .map(|n| self.document.wrap_parent_of_child(n))
    }

    pub fn detach(&self) {
        match self.document.connections.comment_parent(self.node) {
            Some(raw::ParentOfChild::Root(_)) => {
                self.document
                    .connections
                    .remove_root_child(raw::ChildOfRoot::Comment(self.node));
            }
            Some(raw::ParentOfChild::Element(parent)) => {
                self.document
                    .connections
                    .remove_element_child(parent, raw::ChildOfElement::Comment(self.node));
            }
            None => {}
        }
    }

    pub fn string_value(&self) -> String {
        self.text().to_owned()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::Comment(*self)).0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::Comment(*self)).1
    }
}

impl<'d> fmt::Debug for Comment<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comment {{ text: {:?} }}", self.text())
    }
}

node!(Entity, raw::Entity, "A general entity reference");

impl<'d> Entity<'d> {
    pub fn name(&self) -> &'d str {
        self.node().name()
    }

    /// The replacement text; empty when the reference was never
    /// resolved.
    pub fn text(&self) -> &'d str {
        self.node().text()
    }

    pub fn set_text(&self, text: &str) {
        self.document.storage.entity_set_text(self.node, text);
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.document
            .connections
            .entity_parent(self.node)
            .map(|n| self.document.wrap_element(n))
    }

    pub fn detach(&self) {
        if let Some(parent) = self.document.connections.entity_parent(self.node) {
            self.document
                .connections
                .remove_element_child(parent, raw::ChildOfElement::Entity(self.node));
        }
    }

    pub fn string_value(&self) -> String {
        self.text().to_owned()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(
            self.parent().map(ParentOfChild::Element),
            Node::Entity(*self),
        )
        .0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(
            self.parent().map(ParentOfChild::Element),
            Node::Entity(*self),
        )
        .1
    }
}

impl<'d> fmt::Debug for Entity<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity {{ name: {:?} }}", self.name())
    }
}

node!(
    ProcessingInstruction,
    raw::ProcessingInstruction,
    "Instructions for an external application"
);

impl<'d> ProcessingInstruction<'d> {
    pub fn target(&self) -> &'d str {
        self.node().target()
    }

    pub fn value(&self) -> Option<&'d str> {
        self.node().value()
    }

    pub fn set_target(&self, new_target: &str) {
        self.document
            .storage
            .processing_instruction_set_target(self.node, new_target);
    }

    pub fn set_value(&self, new_value: Option<&str>) {
        self.document
            .storage
            .processing_instruction_set_value(self.node, new_value);
    }

    /// The value parsed as ordered `key="value"` pairs. Anything that
    /// does not follow that shape ends the parse.
    pub fn values(&self) -> Vec<(&'d str, &'d str)> {
        parse_pi_values(self.value().unwrap_or(""))
    }

    /// The value of the first pair with this key.
    pub fn value_for(&self, key: &str) -> Option<&'d str> {
        self.values()
            .into_iter()
            .find(|&(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Replaces the value with rendered `key="value"` pairs.
    pub fn set_values(&self, values: &[(&str, &str)]) {
        let value = format_pi_values(values);
        self.document
            .storage
            .processing_instruction_set_value(self.node, Some(&value));
    }

    pub fn parent(&self) -> Option<ParentOfChild<'d>> {
        self.document
            .connections
            .processing_instruction_parent(self.node)
            .map(|n| self.document.wrap_parent_of_child(n))
    }

    pub fn detach(&self) {
        match self
            .document
            .connections
            .processing_instruction_parent(self.node)
        {
            Some(raw::ParentOfChild::Root(_)) => {
                self.document
                    .connections
                    .remove_root_child(raw::ChildOfRoot::ProcessingInstruction(self.node));
            }
            Some(raw::ParentOfChild::Element(parent)) => {
                self.document.connections.remove_element_child(
                    parent,
                    raw::ChildOfElement::ProcessingInstruction(self.node),
                );
            }
            None => {}
        }
    }

    pub fn string_value(&self) -> String {
        self.value().unwrap_or("").to_owned()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::ProcessingInstruction(*self)).0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent(), Node::ProcessingInstruction(*self)).1
    }
}

impl<'d> fmt::Debug for ProcessingInstruction<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessingInstruction {{ target: {:?}, value: {:?} }}",
            self.target(),
            self.value()
        )
    }
}

node!(DocType, raw::DocType, "A document type declaration");

impl<'d> DocType<'d> {
    pub fn name(&self) -> &'d str {
        self.node().name()
    }

    pub fn public_id(&self) -> Option<&'d str> {
        self.node().public_id()
    }

    pub fn system_id(&self) -> Option<&'d str> {
        self.node().system_id()
    }

    pub fn set_name(&self, new_name: &str) {
        self.document.storage.doc_type_set_name(self.node, new_name);
    }

    pub fn set_public_id(&self, new_id: Option<&str>) {
        self.document
            .storage
            .doc_type_set_public_id(self.node, new_id);
    }

    pub fn set_system_id(&self, new_id: Option<&str>) {
        self.document
            .storage
            .doc_type_set_system_id(self.node, new_id);
    }

    pub fn parent(&self) -> Option<Root<'d>> {
        self.document
            .connections
            .doc_type_parent(self.node)
            .map(|n| self.document.wrap_root(n))
    }

    pub fn detach(&self) {
        if self
            .document
            .connections
            .doc_type_parent(self.node)
            .is_some()
        {
            self.document
                .connections
                .remove_root_child(raw::ChildOfRoot::DocType(self.node));
        }
    }

    pub fn string_value(&self) -> String {
        String::new()
    }

    pub fn preceding_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent().map(ParentOfChild::Root), Node::DocType(*self)).0
    }

    pub fn following_siblings(&self) -> Vec<Node<'d>> {
        split_siblings(self.parent().map(ParentOfChild::Root), Node::DocType(*self)).1
    }
}

impl<'d> fmt::Debug for DocType<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocType {{ name: {:?} }}", self.name())
    }
}

fn format_pi_values(values: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for &(key, value) in values {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    out
}

fn parse_pi_values(text: &str) -> Vec<(&str, &str)> {
    let mut values = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_space_char());
        if rest.is_empty() {
            break;
        }
        let eq = match rest.find('=') {
            Some(index) => index,
            None => break,
        };
        let key = rest[..eq].trim_end_matches(|c: char| c.is_space_char());
        if key.is_empty() {
            break;
        }
        let after = rest[eq + 1..].trim_start_matches(|c: char| c.is_space_char());
        let quote = match after.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => break,
        };
        let value_and_rest = &after[1..];
        let end = match value_and_rest.find(quote) {
            Some(index) => index,
            None => break,
        };
        values.push((key, &value_and_rest[..end]));
        rest = &value_and_rest[end + 1..];
    }

    values
}

// Splits the node's parent's children around the node itself.
fn split_siblings<'d>(
    parent: Option<ParentOfChild<'d>>,
    node: Node<'d>,
) -> (Vec<Node<'d>>, Vec<Node<'d>>) {
    let children: Vec<Node<'d>> = match parent {
        Some(ParentOfChild::Root(root)) => root.children().into_iter().map(Node::from).collect(),
        Some(ParentOfChild::Element(element)) => {
            element.children().into_iter().map(Node::from).collect()
        }
        None => return (Vec::new(), Vec::new()),
    };
    match children.iter().position(|c| *c == node) {
        Some(index) => {
            let mut preceding = children;
            let following = preceding.split_off(index + 1);
            preceding.pop();
            (preceding, following)
        }
        None => (Vec::new(), Vec::new()),
    }
}

macro_rules! unpack {
    ($enum_type:ident, $name:ident, $variant:ident, $inner:ident) => {
        pub fn $name(self) -> Option<$inner<'d>> {
            match self {
                $enum_type::$variant(n) => Some(n),
                _ => None,
            }
        }
    };
}

/// Any node of the document, for code that walks the tree generically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Node<'d> {
    Root(Root<'d>),
    Element(Element<'d>),
    Attribute(Attribute<'d>),
    Text(Text<'d>),
    Cdata(Cdata<'d>),
    Comment(Comment<'d>),
    Entity(Entity<'d>),
    ProcessingInstruction(ProcessingInstruction<'d>),
    DocType(DocType<'d>),
}

impl<'d> Node<'d> {
    unpack!(Node, root, Root, Root);
    unpack!(Node, element, Element, Element);
    unpack!(Node, attribute, Attribute, Attribute);
    unpack!(Node, text, Text, Text);
    unpack!(Node, cdata, Cdata, Cdata);
    unpack!(Node, comment, Comment, Comment);
    unpack!(Node, entity, Entity, Entity);
    unpack!(
        Node,
        processing_instruction,
        ProcessingInstruction,
        ProcessingInstruction
    );
    unpack!(Node, doc_type, DocType, DocType);

    pub fn document(&self) -> Document<'d> {
        match *self {
            Node::Root(n) => n.document(),
            Node::Element(n) => n.document(),
            Node::Attribute(n) => n.document(),
            Node::Text(n) => n.document(),
            Node::Cdata(n) => n.document(),
            Node::Comment(n) => n.document(),
            Node::Entity(n) => n.document(),
            Node::ProcessingInstruction(n) => n.document(),
            Node::DocType(n) => n.document(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match *self {
            Node::Root(_) => "document",
            Node::Element(_) => "element",
            Node::Attribute(_) => "attribute",
            Node::Text(_) => "text",
            Node::Cdata(_) => "CDATA",
            Node::Comment(_) => "comment",
            Node::Entity(_) => "entity",
            Node::ProcessingInstruction(_) => "processing instruction",
            Node::DocType(_) => "document type",
        }
    }

    pub fn parent(&self) -> Option<ParentOfChild<'d>> {
        match *self {
            Node::Root(_) => None,
            Node::Element(n) => n.parent(),
            Node::Attribute(n) => n.parent().map(ParentOfChild::Element),
            Node::Text(n) => n.parent().map(ParentOfChild::Element),
            Node::Cdata(n) => n.parent().map(ParentOfChild::Element),
            Node::Comment(n) => n.parent(),
            Node::Entity(n) => n.parent().map(ParentOfChild::Element),
            Node::ProcessingInstruction(n) => n.parent(),
            Node::DocType(n) => n.parent().map(ParentOfChild::Root),
        }
    }

    /// The name of an element or attribute; other kinds have none.
    pub fn qname(&self) -> Option<QName<'d>> {
        match *self {
            Node::Element(n) => Some(n.name()),
            Node::Attribute(n) => Some(n.name()),
            _ => None,
        }
    }

    pub fn string_value(&self) -> String {
        match *self {
            Node::Root(n) => n.string_value(),
            Node::Element(n) => n.string_value(),
            Node::Attribute(n) => n.string_value(),
            Node::Text(n) => n.string_value(),
            Node::Cdata(n) => n.string_value(),
            Node::Comment(n) => n.string_value(),
            Node::Entity(n) => n.string_value(),
            Node::ProcessingInstruction(n) => n.string_value(),
            Node::DocType(n) => n.string_value(),
        }
    }

    pub fn detach(&self) {
        match *self {
            Node::Root(_) => {}
            Node::Element(n) => n.detach(),
            Node::Attribute(n) => n.detach(),
            Node::Text(n) => n.detach(),
            Node::Cdata(n) => n.detach(),
            Node::Comment(n) => n.detach(),
            Node::Entity(n) => n.detach(),
            Node::ProcessingInstruction(n) => n.detach(),
            Node::DocType(n) => n.detach(),
        }
    }

    pub fn path(&self) -> String {
        fn parent_path(parent: Option<ParentOfChild<'_>>, leaf: &str) -> String {
            match parent {
                Some(ParentOfChild::Root(_)) => format!("/{}", leaf),
                Some(ParentOfChild::Element(e)) => format!("{}/{}", e.path(), leaf),
                None => leaf.to_owned(),
            }
        }

        match *self {
            Node::Root(_) => String::from("/"),
            Node::Element(n) => n.path(),
            Node::Attribute(n) => n.path(),
            Node::Text(n) => parent_path(n.parent().map(ParentOfChild::Element), "text()"),
            Node::Cdata(n) => parent_path(n.parent().map(ParentOfChild::Element), "text()"),
            Node::Comment(n) => parent_path(n.parent(), "comment()"),
            Node::Entity(n) => parent_path(n.parent().map(ParentOfChild::Element), "text()"),
            Node::ProcessingInstruction(n) => {
                parent_path(n.parent(), "processing-instruction()")
            }
            Node::DocType(_) => String::new(),
        }
    }
}

/// Nodes that may occur as a child of the document node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChildOfRoot<'d> {
    Element(Element<'d>),
    Comment(Comment<'d>),
    ProcessingInstruction(ProcessingInstruction<'d>),
    DocType(DocType<'d>),
}

impl<'d> ChildOfRoot<'d> {
    unpack!(ChildOfRoot, element, Element, Element);
    unpack!(ChildOfRoot, comment, Comment, Comment);
    unpack!(
        ChildOfRoot,
        processing_instruction,
        ProcessingInstruction,
        ProcessingInstruction
    );
    unpack!(ChildOfRoot, doc_type, DocType, DocType);

    pub fn document(&self) -> Document<'d> {
        match *self {
            ChildOfRoot::Element(n) => n.document(),
            ChildOfRoot::Comment(n) => n.document(),
            ChildOfRoot::ProcessingInstruction(n) => n.document(),
            ChildOfRoot::DocType(n) => n.document(),
        }
    }

    fn as_raw(&self) -> raw::ChildOfRoot {
        match *self {
            ChildOfRoot::Element(n) => raw::ChildOfRoot::Element(n.node),
            ChildOfRoot::Comment(n) => raw::ChildOfRoot::Comment(n.node),
            ChildOfRoot::ProcessingInstruction(n) => {
                raw::ChildOfRoot::ProcessingInstruction(n.node)
            }
            ChildOfRoot::DocType(n) => raw::ChildOfRoot::DocType(n.node),
        }
    }
}

/// Nodes that may occur as a child of an element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChildOfElement<'d> {
    Element(Element<'d>),
    Text(Text<'d>),
    Cdata(Cdata<'d>),
    Comment(Comment<'d>),
    ProcessingInstruction(ProcessingInstruction<'d>),
    Entity(Entity<'d>),
}

impl<'d> ChildOfElement<'d> {
    unpack!(ChildOfElement, element, Element, Element);
    unpack!(ChildOfElement, text, Text, Text);
    unpack!(ChildOfElement, cdata, Cdata, Cdata);
    unpack!(ChildOfElement, comment, Comment, Comment);
    unpack!(
        ChildOfElement,
        processing_instruction,
        ProcessingInstruction,
        ProcessingInstruction
    );
    unpack!(ChildOfElement, entity, Entity, Entity);

    pub fn document(&self) -> Document<'d> {
        match *self {
            ChildOfElement::Element(n) => n.document(),
            ChildOfElement::Text(n) => n.document(),
            ChildOfElement::Cdata(n) => n.document(),
            ChildOfElement::Comment(n) => n.document(),
            ChildOfElement::ProcessingInstruction(n) => n.document(),
            ChildOfElement::Entity(n) => n.document(),
        }
    }

    fn as_raw(&self) -> raw::ChildOfElement {
        match *self {
            ChildOfElement::Element(n) => raw::ChildOfElement::Element(n.node),
            ChildOfElement::Text(n) => raw::ChildOfElement::Text(n.node),
            ChildOfElement::Cdata(n) => raw::ChildOfElement::Cdata(n.node),
            ChildOfElement::Comment(n) => raw::ChildOfElement::Comment(n.node),
            ChildOfElement::ProcessingInstruction(n) => {
                raw::ChildOfElement::ProcessingInstruction(n.node)
            }
            ChildOfElement::Entity(n) => raw::ChildOfElement::Entity(n.node),
        }
    }
}

/// Nodes that may occur as the parent of a child node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParentOfChild<'d> {
    Root(Root<'d>),
    Element(Element<'d>),
}

impl<'d> ParentOfChild<'d> {
    unpack!(ParentOfChild, root, Root, Root);
    unpack!(ParentOfChild, element, Element, Element);
}

macro_rules! conversion_trait {
    ($res_type:ident, {
        $($leaf_type:ident => $variant:expr),*
    }) => {
        $(impl<'d> From<$leaf_type<'d>> for $res_type<'d> {
            fn from(v: $leaf_type<'d>) -> $res_type<'d> {
                $variant(v)
            }
        })*

        $(impl<'a, 'd> From<&'a $leaf_type<'d>> for $res_type<'d> {
            fn from(v: &'a $leaf_type<'d>) -> $res_type<'d> {
                $variant(*v)
            }
        })*
    };
}

conversion_trait!(
    ChildOfRoot, {
        Element               => ChildOfRoot::Element,
        Comment               => ChildOfRoot::Comment,
        ProcessingInstruction => ChildOfRoot::ProcessingInstruction,
        DocType               => ChildOfRoot::DocType
    }
);

conversion_trait!(
    ChildOfElement, {
        Element               => ChildOfElement::Element,
        Text                  => ChildOfElement::Text,
        Cdata                 => ChildOfElement::Cdata,
        Comment               => ChildOfElement::Comment,
        ProcessingInstruction => ChildOfElement::ProcessingInstruction,
        Entity                => ChildOfElement::Entity
    }
);

conversion_trait!(
    Node, {
        Root                  => Node::Root,
        Element               => Node::Element,
        Attribute             => Node::Attribute,
        Text                  => Node::Text,
        Cdata                 => Node::Cdata,
        Comment               => Node::Comment,
        Entity                => Node::Entity,
        ProcessingInstruction => Node::ProcessingInstruction,
        DocType               => Node::DocType
    }
);

impl<'d> From<ChildOfRoot<'d>> for Node<'d> {
    fn from(v: ChildOfRoot<'d>) -> Node<'d> {
        match v {
            ChildOfRoot::Element(n) => Node::Element(n),
            ChildOfRoot::Comment(n) => Node::Comment(n),
            ChildOfRoot::ProcessingInstruction(n) => Node::ProcessingInstruction(n),
            ChildOfRoot::DocType(n) => Node::DocType(n),
        }
    }
}

impl<'d> From<ChildOfElement<'d>> for Node<'d> {
    fn from(v: ChildOfElement<'d>) -> Node<'d> {
        match v {
            ChildOfElement::Element(n) => Node::Element(n),
            ChildOfElement::Text(n) => Node::Text(n),
            ChildOfElement::Cdata(n) => Node::Cdata(n),
            ChildOfElement::Comment(n) => Node::Comment(n),
            ChildOfElement::ProcessingInstruction(n) => Node::ProcessingInstruction(n),
            ChildOfElement::Entity(n) => Node::Entity(n),
        }
    }
}

impl<'d> From<ParentOfChild<'d>> for Node<'d> {
    fn from(v: ParentOfChild<'d>) -> Node<'d> {
        match v {
            ParentOfChild::Root(n) => Node::Root(n),
            ParentOfChild::Element(n) => Node::Element(n),
        }
    }
}

impl<'d> TryFrom<Node<'d>> for ChildOfRoot<'d> {
    type Error = Error;

    fn try_from(node: Node<'d>) -> Result<ChildOfRoot<'d>> {
        match node {
            Node::Element(n) => Ok(ChildOfRoot::Element(n)),
            Node::Comment(n) => Ok(ChildOfRoot::Comment(n)),
            Node::ProcessingInstruction(n) => Ok(ChildOfRoot::ProcessingInstruction(n)),
            Node::DocType(n) => Ok(ChildOfRoot::DocType(n)),
            other => Err(Error::InvalidChildKind {
                kind: other.kind(),
                target: "the document",
            }),
        }
    }
}

impl<'d> TryFrom<Node<'d>> for ChildOfElement<'d> {
    type Error = Error;

    fn try_from(node: Node<'d>) -> Result<ChildOfElement<'d>> {
        match node {
            Node::Element(n) => Ok(ChildOfElement::Element(n)),
            Node::Text(n) => Ok(ChildOfElement::Text(n)),
            Node::Cdata(n) => Ok(ChildOfElement::Cdata(n)),
            Node::Comment(n) => Ok(ChildOfElement::Comment(n)),
            Node::ProcessingInstruction(n) => Ok(ChildOfElement::ProcessingInstruction(n)),
            Node::Entity(n) => Ok(ChildOfElement::Entity(n)),
            other => Err(Error::InvalidChildKind {
                kind: other.kind(),
                target: "an element",
            }),
        }
    }
}

/// Capability shared by the two branch nodes, `Root` and `Element`: an
/// ordered, mixed-kind child sequence with checked mutation.
///
/// The generic methods keep this from being a trait object; it is meant
/// for code generic over the two branch kinds.
pub trait Branch<'d>: Copy + PartialEq {
    /// The closed set of node kinds this branch may contain.
    type Child: Copy + PartialEq;

    fn document(&self) -> Document<'d>;
    fn children(&self) -> Vec<Self::Child>;
    fn child_count(&self) -> usize;
    fn child(&self, index: usize) -> Option<Self::Child>;
    fn index_of<C: Into<Self::Child>>(&self, child: C) -> Option<usize>;
    fn append_child<C: Into<Self::Child>>(&self, child: C) -> Result<()>;
    fn append_children<C: Into<Self::Child> + Copy>(&self, children: &[C]) -> Result<()>;
    fn insert_child_at<C: Into<Self::Child>>(&self, index: usize, child: C) -> Result<()>;
    fn replace_child_at<C: Into<Self::Child>>(&self, index: usize, child: C)
        -> Result<Self::Child>;
    fn replace_children<C: Into<Self::Child> + Copy>(&self, children: &[C]) -> Result<()>;
    fn remove_child<C: Into<Self::Child>>(&self, child: C) -> bool;
    fn remove_child_at(&self, index: usize) -> Result<Self::Child>;
    fn remove_children<C: Into<Self::Child> + Copy>(&self, children: &[C]) -> usize;
    fn clear_children(&self);
    fn add_comment(&self, text: &str) -> Comment<'d>;
    fn add_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d>;
    fn text(&self) -> String;
    fn string_value(&self) -> String;

    fn contains<C: Into<Self::Child>>(&self, child: C) -> bool {
        self.index_of(child).is_some()
    }
}

impl<'d> Branch<'d> for Root<'d> {
    type Child = ChildOfRoot<'d>;

    fn document(&self) -> Document<'d> {
        self.document
    }

    fn children(&self) -> Vec<ChildOfRoot<'d>> {
        Root::children(self)
    }

    fn child_count(&self) -> usize {
        Root::child_count(self)
    }

    fn child(&self, index: usize) -> Option<ChildOfRoot<'d>> {
        Root::child(self, index)
    }

    fn index_of<C: Into<ChildOfRoot<'d>>>(&self, child: C) -> Option<usize> {
        Root::index_of(self, child)
    }

    fn append_child<C: Into<ChildOfRoot<'d>>>(&self, child: C) -> Result<()> {
        Root::append_child(self, child)
    }

    fn append_children<C: Into<ChildOfRoot<'d>> + Copy>(&self, children: &[C]) -> Result<()> {
        Root::append_children(self, children)
    }

    fn insert_child_at<C: Into<ChildOfRoot<'d>>>(&self, index: usize, child: C) -> Result<()> {
        Root::insert_child_at(self, index, child)
    }

    fn replace_child_at<C: Into<ChildOfRoot<'d>>>(
        &self,
        index: usize,
        child: C,
    ) -> Result<ChildOfRoot<'d>> {
        Root::replace_child_at(self, index, child)
    }

    fn replace_children<C: Into<ChildOfRoot<'d>> + Copy>(&self, children: &[C]) -> Result<()> {
        Root::replace_children(self, children)
    }

    fn remove_child<C: Into<ChildOfRoot<'d>>>(&self, child: C) -> bool {
        Root::remove_child(self, child)
    }

    fn remove_child_at(&self, index: usize) -> Result<ChildOfRoot<'d>> {
        Root::remove_child_at(self, index)
    }

    fn remove_children<C: Into<ChildOfRoot<'d>> + Copy>(&self, children: &[C]) -> usize {
        Root::remove_children(self, children)
    }

    fn clear_children(&self) {
        Root::clear_children(self)
    }

    fn add_comment(&self, text: &str) -> Comment<'d> {
        Root::add_comment(self, text)
    }

    fn add_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        Root::add_processing_instruction(self, target, value)
    }

    fn text(&self) -> String {
        Root::text(self)
    }

    fn string_value(&self) -> String {
        Root::string_value(self)
    }
}

impl<'d> Branch<'d> for Element<'d> {
    type Child = ChildOfElement<'d>;

    fn document(&self) -> Document<'d> {
        self.document
    }

    fn children(&self) -> Vec<ChildOfElement<'d>> {
        Element::children(self)
    }

    fn child_count(&self) -> usize {
        Element::child_count(self)
    }

    fn child(&self, index: usize) -> Option<ChildOfElement<'d>> {
        Element::child(self, index)
    }

    fn index_of<C: Into<ChildOfElement<'d>>>(&self, child: C) -> Option<usize> {
        Element::index_of(self, child)
    }

    fn append_child<C: Into<ChildOfElement<'d>>>(&self, child: C) -> Result<()> {
        Element::append_child(self, child)
    }

    fn append_children<C: Into<ChildOfElement<'d>> + Copy>(&self, children: &[C]) -> Result<()> {
        Element::append_children(self, children)
    }

    fn insert_child_at<C: Into<ChildOfElement<'d>>>(&self, index: usize, child: C) -> Result<()> {
        Element::insert_child_at(self, index, child)
    }

    fn replace_child_at<C: Into<ChildOfElement<'d>>>(
        &self,
        index: usize,
        child: C,
    ) -> Result<ChildOfElement<'d>> {
        Element::replace_child_at(self, index, child)
    }

    fn replace_children<C: Into<ChildOfElement<'d>> + Copy>(&self, children: &[C]) -> Result<()> {
        Element::replace_children(self, children)
    }

    fn remove_child<C: Into<ChildOfElement<'d>>>(&self, child: C) -> bool {
        Element::remove_child(self, child)
    }

    fn remove_child_at(&self, index: usize) -> Result<ChildOfElement<'d>> {
        Element::remove_child_at(self, index)
    }

    fn remove_children<C: Into<ChildOfElement<'d>> + Copy>(&self, children: &[C]) -> usize {
        Element::remove_children(self, children)
    }

    fn clear_children(&self) {
        Element::clear_children(self)
    }

    fn add_comment(&self, text: &str) -> Comment<'d> {
        Element::add_comment(self, text)
    }

    fn add_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        Element::add_processing_instruction(self, target, value)
    }

    fn text(&self) -> String {
        Element::text(self)
    }

    fn string_value(&self) -> String {
        Element::string_value(self)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::super::{Error, Package, QName};
    use super::{Branch, ChildOfElement, ChildOfRoot, Document, Element, Node, ParentOfChild};

    fn qn<'d>(doc: Document<'d>, local_name: &str) -> QName<'d> {
        doc.qname(local_name).unwrap()
    }

    fn elem<'d>(doc: Document<'d>, local_name: &str) -> Element<'d> {
        doc.create_element(qn(doc, local_name))
    }

    #[test]
    fn the_root_belongs_to_a_document() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();

        assert_eq!(doc, root.document());
    }

    #[test]
    fn root_can_have_an_element_child() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let element = elem(doc, "alpha");

        root.append_child(element).unwrap();

        let children = root.children();
        assert_eq!(1, children.len());
        assert_eq!(children[0], ChildOfRoot::Element(element));
    }

    #[test]
    fn appending_a_second_root_element_fails() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let alpha = elem(doc, "alpha");
        let beta = elem(doc, "beta");

        root.append_child(alpha).unwrap();
        let err = root.append_child(beta).unwrap_err();

        assert!(matches!(err, Error::DuplicateRootElement { .. }));
        assert!(err.is_illegal_add());
        assert_eq!(vec![ChildOfRoot::Element(alpha)], root.children());
        assert!(beta.parent().is_none());
    }

    #[test]
    fn root_can_have_comment_children() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let comment = doc.create_comment("Now is the winter of our discontent.");

        root.append_child(comment).unwrap();

        let children = root.children();
        assert_eq!(1, children.len());
        assert_eq!(children[0], ChildOfRoot::Comment(comment));
    }

    #[test]
    fn root_can_have_processing_instruction_children() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let pi = doc.create_processing_instruction("device", None);

        root.append_child(pi).unwrap();

        let children = root.children();
        assert_eq!(1, children.len());
        assert_eq!(children[0], ChildOfRoot::ProcessingInstruction(pi));
    }

    #[test]
    fn root_can_have_a_doc_type_child() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let doc_type = doc.create_doc_type("shelf", None, Some("shelf.dtd"));

        root.append_child(doc_type).unwrap();

        assert_eq!(Some(doc_type), root.doc_type());
        assert_eq!(Some(root), doc_type.parent());
    }

    #[test]
    fn appending_a_second_doc_type_fails() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let first = doc.create_doc_type("shelf", None, None);
        let second = doc.create_doc_type("book", None, None);

        root.append_child(first).unwrap();
        let err = root.append_child(second).unwrap_err();

        assert!(matches!(err, Error::DuplicateDocType { .. }));
        assert!(err.is_illegal_add());
        assert_eq!(Some(first), root.doc_type());
    }

    #[test]
    fn root_can_append_multiple_children() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let alpha = doc.create_comment("alpha");
        let beta = doc.create_comment("beta");

        root.append_children(&[alpha, beta]).unwrap();

        let children = root.children();
        assert_eq!(2, children.len());
        assert_eq!(children[0], ChildOfRoot::Comment(alpha));
        assert_eq!(children[1], ChildOfRoot::Comment(beta));
    }

    #[test]
    fn root_can_replace_children() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let alpha = doc.create_comment("alpha");
        let beta = doc.create_comment("beta");
        let gamma = doc.create_comment("gamma");
        root.append_child(alpha).unwrap();

        root.replace_children(&[beta, gamma]).unwrap();

        let children = root.children();
        assert_eq!(2, children.len());
        assert_eq!(children[0], ChildOfRoot::Comment(beta));
        assert_eq!(children[1], ChildOfRoot::Comment(gamma));
        assert!(alpha.parent().is_none());
    }

    #[test]
    fn root_child_knows_its_parent() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let alpha = elem(doc, "alpha");

        root.append_child(alpha).unwrap();

        assert_eq!(Some(ParentOfChild::Root(root)), alpha.parent());
    }

    #[test]
    fn appending_an_owned_node_fails_and_leaves_both_branches_alone() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let other = elem(doc, "other");
        let child = doc.create_text("hello");
        parent.append_child(child).unwrap();

        let err = other.append_child(child).unwrap_err();

        assert!(matches!(err, Error::NodeAlreadyOwned { .. }));
        assert!(err.is_illegal_add());
        assert_eq!(vec![ChildOfElement::Text(child)], parent.children());
        assert!(other.children().is_empty());
        assert_eq!(Some(parent), child.parent());
    }

    #[test]
    fn append_children_stops_at_the_first_failure() {
        let package = Package::new();
        let doc = package.as_document();

        let owner = elem(doc, "owner");
        let target = elem(doc, "target");
        let x = doc.create_comment("x");
        let y = doc.create_comment("y");
        let z = doc.create_comment("z");
        owner.append_child(y).unwrap();

        let err = target.append_children(&[x, y, z]).unwrap_err();

        assert!(err.is_illegal_add());
        assert_eq!(vec![ChildOfElement::Comment(x)], target.children());
        assert_eq!(
            Some(owner),
            y.parent().and_then(|p| p.element())
        );
        assert!(z.parent().is_none());
    }

    #[test]
    fn detaching_is_idempotent() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let child = elem(doc, "child");
        parent.append_child(child).unwrap();

        child.detach();
        child.detach();

        assert!(child.parent().is_none());
        assert!(parent.children().is_empty());
    }

    #[test]
    fn a_detached_node_can_be_added_again() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        parent.append_children(&[a, b]).unwrap();

        b.detach();
        parent.append_child(b).unwrap();

        assert_eq!(
            vec![ChildOfElement::Text(a), ChildOfElement::Text(b)],
            parent.children()
        );
        assert_eq!(Some(parent), b.parent());
    }

    #[test]
    fn replacing_a_child_detaches_the_displaced_node() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let old = doc.create_comment("old");
        let new = doc.create_comment("new");
        parent.append_child(old).unwrap();

        let displaced = parent.replace_child_at(0, new).unwrap();

        assert_eq!(ChildOfElement::Comment(old), displaced);
        assert!(old.parent().is_none());
        assert_eq!(vec![ChildOfElement::Comment(new)], parent.children());
    }

    #[test]
    fn set_root_element_replaces_and_detaches_the_old_root() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let before = doc.create_comment("before");
        let old = elem(doc, "old");
        let after = doc.create_comment("after");
        root.append_child(before).unwrap();
        root.append_child(old).unwrap();
        root.append_child(after).unwrap();

        let new = elem(doc, "new");
        root.set_root_element(new).unwrap();

        assert_eq!(Some(new), root.root_element());
        assert!(old.parent().is_none());
        // The replacement takes the old element's position.
        assert_eq!(Some(1), root.index_of(new));
    }

    #[test]
    fn set_doc_type_replaces_in_place() {
        let package = Package::new();
        let doc = package.as_document();

        let root = doc.root();
        let old = doc.create_doc_type("old", None, None);
        root.append_child(old).unwrap();
        root.append_child(elem(doc, "alpha")).unwrap();

        let new = doc.create_doc_type("new", Some("-//X//DTD//EN"), Some("new.dtd"));
        root.set_doc_type(new).unwrap();

        assert_eq!(Some(new), root.doc_type());
        assert_eq!(Some(0), root.index_of(new));
        assert!(old.parent().is_none());
    }

    #[test]
    fn inserting_a_child_at_an_out_of_range_index_fails() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let child = doc.create_text("sometime");

        let err = parent.insert_child_at(1, child).unwrap_err();

        assert_eq!(Error::IndexOutOfBounds { index: 1, len: 0 }, err);
        assert!(!err.is_illegal_add());
        assert!(child.parent().is_none());
    }

    #[test]
    fn reading_a_child_at_an_out_of_range_index_is_none() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        parent.add_text("only");

        assert!(parent.child(0).is_some());
        assert!(parent.child(1).is_none());
    }

    #[test]
    fn inserting_a_child_shifts_the_sequence() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let a = doc.create_comment("a");
        let c = doc.create_comment("c");
        parent.append_children(&[a, c]).unwrap();

        let b = doc.create_comment("b");
        parent.insert_child_at(1, b).unwrap();

        assert_eq!(
            vec![
                ChildOfElement::Comment(a),
                ChildOfElement::Comment(b),
                ChildOfElement::Comment(c),
            ],
            parent.children()
        );
    }

    #[test]
    fn remove_child_reports_whether_it_found_the_node() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let child = doc.create_comment("here");
        let stranger = doc.create_comment("elsewhere");
        parent.append_child(child).unwrap();

        assert!(parent.remove_child(child));
        assert!(!parent.remove_child(stranger));
        assert!(child.parent().is_none());
    }

    #[test]
    fn remove_children_counts_only_nodes_that_were_present() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let a = doc.create_comment("a");
        let b = doc.create_comment("b");
        let stranger = doc.create_comment("stranger");
        parent.append_children(&[a, b]).unwrap();

        let removed = parent.remove_children(&[a, stranger, b]);

        assert_eq!(2, removed);
        assert!(parent.children().is_empty());
    }

    #[test]
    fn clear_children_detaches_every_child() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let element = elem(doc, "child");
        let text = doc.create_text("words");
        parent.append_child(element).unwrap();
        parent.append_child(text).unwrap();

        parent.clear_children();

        assert!(parent.children().is_empty());
        assert!(element.parent().is_none());
        assert!(text.parent().is_none());
    }

    #[test]
    fn an_element_cannot_become_its_own_child() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "ouroboros");

        let err = element.append_child(element).unwrap_err();

        assert!(matches!(err, Error::CyclicAdd { .. }));
        assert!(err.is_illegal_add());
        assert!(element.children().is_empty());
    }

    #[test]
    fn an_element_cannot_be_added_below_its_own_descendant() {
        let package = Package::new();
        let doc = package.as_document();

        let a = elem(doc, "a");
        let b = elem(doc, "b");
        let c = elem(doc, "c");
        a.append_child(b).unwrap();
        b.append_child(c).unwrap();

        let err = c.append_child(a).unwrap_err();

        assert!(matches!(err, Error::CyclicAdd { .. }));
        assert!(a.parent().is_none());
        assert!(c.children().is_empty());
    }

    #[test]
    fn nodes_from_another_document_are_rejected() {
        let package_a = Package::new();
        let package_b = Package::new();
        let doc_a = package_a.as_document();
        let doc_b = package_b.as_document();

        let parent = elem(doc_a, "parent");
        let foreign = doc_b.create_comment("from far away");

        let err = parent.append_child(foreign).unwrap_err();

        assert!(matches!(err, Error::ForeignDocument { .. }));
        assert!(err.is_illegal_add());
        assert!(parent.children().is_empty());
    }

    #[test]
    fn child_and_index_queries_agree() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let a = doc.create_comment("a");
        let b = doc.create_text("b");
        parent.append_child(a).unwrap();
        parent.append_child(b).unwrap();

        assert_eq!(2, parent.child_count());
        assert_eq!(Some(ChildOfElement::Comment(a)), parent.child(0));
        assert_eq!(Some(1), parent.index_of(b));
        assert!(parent.contains(a));
        assert_eq!(None, parent.index_of(doc.create_text("stranger")));
    }

    #[test]
    fn elements_belong_to_a_document() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "alpha");

        assert_eq!(doc, element.document());
    }

    #[test]
    fn elements_can_have_element_children() {
        let package = Package::new();
        let doc = package.as_document();

        let alpha = elem(doc, "alpha");
        let beta = elem(doc, "beta");

        alpha.append_child(beta).unwrap();

        assert_eq!(vec![ChildOfElement::Element(beta)], alpha.children());
        assert_eq!(Some(ParentOfChild::Element(alpha)), beta.parent());
    }

    #[test]
    fn changing_the_name_of_an_element() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "before");
        element.set_name(qn(doc, "after"));

        assert_eq!("after", element.name().local_name());
    }

    #[test]
    fn an_element_can_carry_typed_data() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "measurement");
        assert!(element.data().is_none());

        element.set_data(Rc::new(42_i32));

        let data = element.data().unwrap();
        assert_eq!(Some(&42), data.downcast_ref::<i32>());

        let taken = element.take_data().unwrap();
        assert_eq!(Some(&42), taken.downcast_ref::<i32>());
        assert!(element.data().is_none());
    }

    #[test]
    fn create_copy_builds_a_detached_structural_copy() {
        let package = Package::new();
        let doc = package.as_document();

        let ns = doc.namespace("b", "urn:books").unwrap();
        let original = doc.create_element(doc.qname_with_namespace("book", ns).unwrap());
        original.set_attribute_value(qn(doc, "id"), "42");
        original.add_namespace("x", "urn:extras").unwrap();
        original.add_element(qn(doc, "title")).add_text("Hello");
        doc.root().append_child(original).unwrap();

        let copy = original.create_copy();

        assert_ne!(copy, original);
        assert!(copy.parent().is_none());
        assert_eq!(original.name(), copy.name());
        assert_eq!(Some("42"), copy.attribute_value("id"));
        assert_eq!(original.declared_namespaces(), copy.declared_namespaces());
        assert_eq!("Hello", copy.string_value());
        assert_ne!(original.element("title"), copy.element("title"));
    }

    #[test]
    fn setting_an_attribute_creates_it_once_and_then_updates_in_place() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "book");
        let first = element.set_attribute_value(qn(doc, "id"), "41");
        element.set_attribute_value(qn(doc, "lang"), "en");
        let second = element.set_attribute_value(qn(doc, "id"), "42");

        assert_eq!(first, second);
        assert_eq!("42", first.value());
        assert_eq!(2, element.attribute_count());
        assert_eq!(Some(first), element.attribute_at(0));
    }

    #[test]
    fn attributes_with_equal_names_keep_their_order_and_the_first_wins() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "ok");
        let first = doc.create_attribute(qn(doc, "dup"), "one");
        let second = doc.create_attribute(qn(doc, "dup"), "two");
        element.add_attribute(first).unwrap();
        element.add_attribute(second).unwrap();

        assert_eq!(2, element.attribute_count());
        assert_eq!(Some("one"), element.attribute_value("dup"));
        assert_eq!(Some(first), element.attribute_named(qn(doc, "dup")));
    }

    #[test]
    fn an_attribute_belongs_to_at_most_one_element() {
        let package = Package::new();
        let doc = package.as_document();

        let one = elem(doc, "one");
        let two = elem(doc, "two");
        let attribute = doc.create_attribute(qn(doc, "shared"), "yes");
        one.add_attribute(attribute).unwrap();

        let err = two.add_attribute(attribute).unwrap_err();

        assert!(matches!(err, Error::NodeAlreadyOwned { .. }));
        assert!(err.is_illegal_add());
        assert_eq!(Some(one), attribute.parent());
        assert_eq!(1, one.attribute_count());
        assert_eq!(0, two.attribute_count());
    }

    #[test]
    fn a_detached_attribute_can_move_to_another_element() {
        let package = Package::new();
        let doc = package.as_document();

        let one = elem(doc, "one");
        let two = elem(doc, "two");
        let attribute = doc.create_attribute(qn(doc, "movable"), "yes");
        one.add_attribute(attribute).unwrap();

        attribute.detach();
        two.add_attribute(attribute).unwrap();

        assert_eq!(Some(two), attribute.parent());
        assert_eq!(0, one.attribute_count());
        assert_eq!(Some("yes"), two.attribute_value("movable"));
    }

    #[test]
    fn removing_an_attribute_by_name_returns_the_detached_node() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "book");
        element.set_attribute_value(qn(doc, "id"), "42");

        let removed = element.remove_attribute_named(qn(doc, "id")).unwrap();

        assert_eq!("42", removed.value());
        assert!(removed.parent().is_none());
        assert_eq!(0, element.attribute_count());
        assert!(element.remove_attribute_named(qn(doc, "id")).is_none());
    }

    #[test]
    fn attribute_lookup_by_qname_is_exact() {
        let package = Package::new();
        let doc = package.as_document();

        let ns = doc.namespace("x", "urn:extras").unwrap();
        let plain = qn(doc, "id");
        let namespaced = doc.qname_with_namespace("id", ns).unwrap();

        let element = elem(doc, "book");
        element.set_attribute_value(namespaced, "ns");
        element.set_attribute_value(plain, "plain");

        assert_eq!(Some("plain"), element.attribute_value_named(plain));
        assert_eq!(Some("ns"), element.attribute_value_named(namespaced));
        // Local-name lookup takes the first, in attribute order.
        assert_eq!(Some("ns"), element.attribute_value("id"));
    }

    #[test]
    fn qnames_with_equal_parts_share_one_interned_instance() {
        let package = Package::new();
        let doc = package.as_document();

        let ns1 = doc.namespace("b", "urn:books").unwrap();
        let ns2 = doc.namespace("b", "urn:books").unwrap();
        let q1 = doc.qname_with_namespace("book", ns1).unwrap();
        let q2 = doc.qname_with_namespace("book", ns2).unwrap();

        assert_eq!(q1, q2);
        assert_eq!(q1.local_name().as_ptr(), q2.local_name().as_ptr());
        assert_eq!(q1.qualified_name().as_ptr(), q2.qualified_name().as_ptr());
        assert_eq!(ns1.uri().as_ptr(), ns2.uri().as_ptr());
    }

    #[test]
    fn qname_equality_is_prefix_sensitive() {
        let package = Package::new();
        let doc = package.as_document();

        let ns_a = doc.namespace("a", "urn:same").unwrap();
        let ns_b = doc.namespace("b", "urn:same").unwrap();
        let with_a = doc.qname_with_namespace("thing", ns_a).unwrap();
        let with_b = doc.qname_with_namespace("thing", ns_b).unwrap();

        assert_ne!(with_a, with_b);
        assert_eq!("a:thing", with_a.qualified_name());
        assert_eq!("b:thing", with_b.qualified_name());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let package = Package::new();
        let doc = package.as_document();

        assert!(matches!(
            doc.qname("4wheel"),
            Err(Error::InvalidQualifiedName { .. })
        ));
        assert!(matches!(
            doc.namespace("not a prefix", "urn:x"),
            Err(Error::InvalidQualifiedName { .. })
        ));
        assert!(doc.namespace("", "urn:x").is_ok());
    }

    #[test]
    fn an_element_resolves_prefixes_declared_on_itself() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "book");
        let ns = element.add_namespace("b", "urn:books").unwrap();

        assert_eq!(Some(ns), element.namespace_for_prefix("b"));
        assert_eq!(None, element.namespace_for_prefix("unbound"));
    }

    #[test]
    fn prefix_resolution_walks_toward_the_root_and_the_nearest_wins() {
        let package = Package::new();
        let doc = package.as_document();

        let outer = elem(doc, "outer");
        let middle = elem(doc, "middle");
        let inner = elem(doc, "inner");
        outer.append_child(middle).unwrap();
        middle.append_child(inner).unwrap();

        outer.add_namespace("p", "urn:outer").unwrap();
        let shadow = middle.add_namespace("p", "urn:middle").unwrap();

        assert_eq!(Some(shadow), inner.namespace_for_prefix("p"));
        assert_eq!(
            Some("urn:outer"),
            outer.namespace_for_prefix("p").map(|ns| ns.uri())
        );
    }

    #[test]
    fn sibling_scopes_do_not_leak_declarations() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let left = elem(doc, "left");
        let right = elem(doc, "right");
        parent.append_children(&[left, right]).unwrap();

        left.add_namespace("p", "urn:left").unwrap();
        right.add_namespace("p", "urn:right").unwrap();

        assert_eq!(
            Some("urn:left"),
            left.namespace_for_prefix("p").map(|ns| ns.uri())
        );
        assert_eq!(
            Some("urn:right"),
            right.namespace_for_prefix("p").map(|ns| ns.uri())
        );
        assert_eq!(None, parent.namespace_for_prefix("p"));
    }

    #[test]
    fn the_xml_prefix_is_always_in_scope() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "anything");

        let ns = element.namespace_for_prefix("xml").unwrap();
        assert_eq!("http://www.w3.org/XML/1998/namespace", ns.uri());
        assert!(element
            .namespaces_in_scope()
            .iter()
            .any(|ns| ns.prefix() == "xml"));
    }

    #[test]
    fn namespaces_in_scope_collects_the_nearest_binding_per_prefix() {
        let package = Package::new();
        let doc = package.as_document();

        let outer = elem(doc, "outer");
        let inner = elem(doc, "inner");
        outer.append_child(inner).unwrap();

        outer.add_namespace("a", "urn:outer-a").unwrap();
        outer.add_namespace("b", "urn:outer-b").unwrap();
        inner.add_namespace("a", "urn:inner-a").unwrap();

        let in_scope = inner.namespaces_in_scope();
        assert_eq!(3, in_scope.len()); // a, b, xml
        assert!(in_scope
            .iter()
            .any(|ns| ns.prefix() == "a" && ns.uri() == "urn:inner-a"));
        assert!(in_scope
            .iter()
            .any(|ns| ns.prefix() == "b" && ns.uri() == "urn:outer-b"));
    }

    #[test]
    fn a_no_namespace_declaration_cancels_the_default_below_it() {
        let package = Package::new();
        let doc = package.as_document();

        let outer = elem(doc, "outer");
        let inner = elem(doc, "inner");
        outer.append_child(inner).unwrap();

        outer.add_namespace("", "urn:default").unwrap();
        let cancel = doc.namespace("", "").unwrap();
        inner.declare_namespace(cancel);

        assert_eq!(None, inner.namespace_for_prefix(""));
        assert!(!inner
            .namespaces_in_scope()
            .iter()
            .any(|ns| ns.prefix().is_empty()));
        assert_eq!(
            Some("urn:default"),
            outer.namespace_for_prefix("").map(|ns| ns.uri())
        );
    }

    #[test]
    fn declared_namespaces_lists_the_own_namespace_first() {
        let package = Package::new();
        let doc = package.as_document();

        let ns = doc.namespace("b", "urn:books").unwrap();
        let element = doc.create_element(doc.qname_with_namespace("book", ns).unwrap());
        let extra = element.add_namespace("x", "urn:extras").unwrap();

        assert_eq!(vec![ns, extra], element.declared_namespaces());
        assert_eq!(vec![extra], element.additional_namespaces());
    }

    #[test]
    fn resolve_qname_defaults_unbound_prefixes_to_no_namespace() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "host");
        element.add_namespace("b", "urn:books").unwrap();

        let bound = element.resolve_qname("b:title").unwrap();
        assert_eq!("urn:books", bound.namespace_uri());

        let unbound = element.resolve_qname("nope:title").unwrap();
        assert_eq!("", unbound.namespace_uri());
        assert_eq!("title", unbound.local_name());
    }

    #[test]
    fn resolve_qname_strict_reports_unbound_prefixes() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "host");

        let err = element.resolve_qname_strict("nope:title").unwrap_err();
        assert_eq!(
            Error::UnboundPrefix {
                prefix: String::from("nope")
            },
            err
        );

        assert!(matches!(
            element.resolve_qname("a:b:c"),
            Err(Error::InvalidQualifiedName { .. })
        ));
    }

    #[test]
    fn resolve_qname_uses_the_default_namespace_for_plain_names() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "host");
        element.add_namespace("", "urn:default").unwrap();

        let resolved = element.resolve_qname("title").unwrap();
        assert_eq!("urn:default", resolved.namespace_uri());
        assert_eq!("", resolved.namespace().prefix());
    }

    #[test]
    fn text_gathers_only_direct_character_data() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "mixed");
        element.add_text("one ");
        element.add_cdata("two");
        element.add_comment("not text");
        element.add_element(qn(doc, "child")).add_text("deep");
        element.add_entity("amp", "&");

        assert_eq!("one two&", element.text());
    }

    #[test]
    fn text_trim_collapses_interior_whitespace() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "padded");
        element.add_text("  Hello\n\t  there  ");

        assert_eq!("Hello there", element.text_trim());
    }

    #[test]
    fn set_text_replaces_character_data_but_keeps_markup_children() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "para");
        element.add_text("old");
        let child = element.add_element(qn(doc, "b"));
        element.add_cdata("also old");
        let comment = element.add_comment("kept");

        element.set_text("new");

        assert_eq!("new", element.text());
        let children = element.children();
        assert_eq!(3, children.len());
        assert_eq!(ChildOfElement::Element(child), children[0]);
        assert_eq!(ChildOfElement::Comment(comment), children[1]);
        assert!(matches!(children[2], ChildOfElement::Text(_)));
    }

    #[test]
    fn string_value_concatenates_descendant_character_data() {
        let package = Package::new();
        let doc = package.as_document();

        let book = elem(doc, "book");
        book.add_element(qn(doc, "title")).add_text("Hello");
        book.add_element(qn(doc, "author")).add_text("Ada");

        assert_eq!("HelloAda", book.string_value());
    }

    #[test]
    fn string_value_skips_comments_and_processing_instructions() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "host");
        element.add_text("a");
        element.add_comment("ignored");
        element.add_processing_instruction("skip", Some("me"));
        element.add_cdata("b");
        element.add_entity("x", "c");

        assert_eq!("abc", element.string_value());
        assert_eq!("abc", Node::Element(element).string_value());
    }

    #[test]
    fn root_string_value_is_the_root_elements() {
        let package = Package::new();
        let doc = package.as_document();

        assert_eq!("", doc.root().string_value());

        let hello = elem(doc, "hello");
        hello.add_text("world");
        doc.root().append_child(hello).unwrap();

        assert_eq!("world", doc.root().string_value());
    }

    #[test]
    fn mixed_content_and_text_only_predicates() {
        let package = Package::new();
        let doc = package.as_document();

        let empty = elem(doc, "empty");
        assert!(!empty.has_mixed_content());
        assert!(empty.is_text_only());

        let text_only = elem(doc, "text-only");
        text_only.add_text("a");
        text_only.add_cdata("b");
        assert!(text_only.has_mixed_content());
        assert!(text_only.is_text_only());

        let mixed = elem(doc, "mixed");
        mixed.add_text("a");
        mixed.add_element(qn(doc, "b"));
        assert!(mixed.has_mixed_content());
        assert!(!mixed.is_text_only());
    }

    #[test]
    fn element_lookups_find_children_by_local_name() {
        let package = Package::new();
        let doc = package.as_document();

        let shelf = elem(doc, "shelf");
        let first = shelf.add_element(qn(doc, "book"));
        first.add_text("one");
        let sign = shelf.add_element(qn(doc, "sign"));
        let second = shelf.add_element(qn(doc, "book"));
        second.add_text("two");

        assert_eq!(Some(first), shelf.element("book"));
        assert_eq!(vec![first, sign, second], shelf.elements());
        assert_eq!(vec![first, second], shelf.elements_named("book"));
        assert_eq!(Some(String::from("one")), shelf.element_text("book"));
        assert_eq!(None, shelf.element_text("missing"));
    }

    #[test]
    fn paths_name_each_ancestor() {
        let package = Package::new();
        let doc = package.as_document();

        let shelf = elem(doc, "shelf");
        doc.root().append_child(shelf).unwrap();
        let ns = doc.namespace("b", "urn:books").unwrap();
        let book = shelf.add_element(doc.qname_with_namespace("book", ns).unwrap());
        let id = book.set_attribute_value(qn(doc, "id"), "42");
        let text = book.add_text("words");
        let comment = doc.root().add_comment("top");

        assert_eq!("/shelf/b:book", book.path());
        assert_eq!("/shelf/b:book/@id", id.path());
        assert_eq!("/shelf/b:book/text()", Node::Text(text).path());
        assert_eq!("/comment()", Node::Comment(comment).path());

        let detached = elem(doc, "stray");
        assert_eq!("stray", detached.path());
    }

    #[test]
    fn siblings_split_around_the_node() {
        let package = Package::new();
        let doc = package.as_document();

        let parent = elem(doc, "parent");
        let a = doc.create_comment("a");
        let b = elem(doc, "b");
        let c = doc.create_text("c");
        parent.append_child(a).unwrap();
        parent.append_child(b).unwrap();
        parent.append_child(c).unwrap();

        assert_eq!(vec![Node::Comment(a)], b.preceding_siblings());
        assert_eq!(vec![Node::Text(c)], b.following_siblings());
        assert!(elem(doc, "detached").preceding_siblings().is_empty());
    }

    #[test]
    fn node_conversions_reject_invalid_child_kinds() {
        let package = Package::new();
        let doc = package.as_document();

        let text = doc.create_text("not for the root");
        let err = ChildOfRoot::try_from(Node::Text(text)).unwrap_err();

        assert_eq!(
            Error::InvalidChildKind {
                kind: "text",
                target: "the document"
            },
            err
        );
        assert!(err.is_illegal_add());

        let attribute = doc.create_attribute(qn(doc, "id"), "42");
        assert!(ChildOfElement::try_from(Node::Attribute(attribute)).is_err());
    }

    #[test]
    fn branch_generic_code_works_over_root_and_element() {
        fn count_after_comment<'d, B>(branch: B) -> usize
        where
            B: Branch<'d>,
        {
            branch.add_comment("noted");
            branch.child_count()
        }

        let package = Package::new();
        let doc = package.as_document();

        assert_eq!(1, count_after_comment(doc.root()));
        assert_eq!(1, count_after_comment(elem(doc, "host")));
    }

    #[test]
    fn processing_instruction_values_parse_key_value_runs() {
        let package = Package::new();
        let doc = package.as_document();

        let pi = doc.create_processing_instruction(
            "xml-stylesheet",
            Some("href=\"a.css\" type='text/css'"),
        );

        assert_eq!(vec![("href", "a.css"), ("type", "text/css")], pi.values());
        assert_eq!(Some("a.css"), pi.value_for("href"));
        assert_eq!(None, pi.value_for("media"));

        let broken = doc.create_processing_instruction("x", Some("key=unquoted"));
        assert!(broken.values().is_empty());
    }

    #[test]
    fn set_values_renders_key_value_pairs() {
        let package = Package::new();
        let doc = package.as_document();

        let pi = doc.create_processing_instruction("xml-stylesheet", None);
        pi.set_values(&[("href", "a.css"), ("media", "print")]);

        assert_eq!(Some("href=\"a.css\" media=\"print\""), pi.value());
        assert_eq!(Some("print"), pi.value_for("media"));
    }

    #[test]
    fn doc_type_carries_its_identifiers() {
        let package = Package::new();
        let doc = package.as_document();

        let doc_type = doc.create_doc_type(
            "html",
            Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
            Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"),
        );

        assert_eq!("html", doc_type.name());
        assert_eq!(
            Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
            doc_type.public_id()
        );

        doc_type.set_public_id(None);
        doc_type.set_system_id(Some("local.dtd"));
        assert_eq!(None, doc_type.public_id());
        assert_eq!(Some("local.dtd"), doc_type.system_id());
    }

    #[test]
    fn entity_text_contributes_to_string_values() {
        let package = Package::new();
        let doc = package.as_document();

        let element = elem(doc, "host");
        element.add_text("x");
        let entity = element.add_entity("copy", "\u{a9}");

        assert_eq!("copy", entity.name());
        assert_eq!("x\u{a9}", element.string_value());

        let unresolved = element.add_entity("mystery", "");
        assert_eq!("", unresolved.text());
        assert_eq!("x\u{a9}", element.string_value());
    }
}
