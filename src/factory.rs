//! Pluggable node creation.
//!
//! Code that builds trees through a [`NodeFactory`] can be handed a
//! different implementation to customize construction, for example to
//! annotate or count the nodes it produces. [`DocumentFactory`] is the
//! plain terminal implementation; [`ProxyFactory`] forwards to a target
//! that can be swapped mid-build.

use std::cell::Cell;

use crate::dom::{
    Attribute, Cdata, Comment, DocType, Document, Element, Entity, ProcessingInstruction, Text,
};
use crate::error::Result;
use crate::{Namespace, QName};

/// Creation operations for every node kind.
///
/// Every operation defaults to plain creation on
/// [`document`](Self::document); implementations override the ones they
/// want to intercept.
pub trait NodeFactory<'d> {
    /// The document nodes are created for.
    fn document(&self) -> Document<'d>;

    fn namespace(&self, prefix: &str, uri: &str) -> Result<Namespace<'d>> {
        self.document().namespace(prefix, uri)
    }

    fn qname(&self, local_name: &str) -> Result<QName<'d>> {
        self.document().qname(local_name)
    }

    fn qname_with_namespace(
        &self,
        local_name: &str,
        namespace: Namespace<'d>,
    ) -> Result<QName<'d>> {
        self.document().qname_with_namespace(local_name, namespace)
    }

    fn create_element(&self, name: QName<'d>) -> Element<'d> {
        self.document().create_element(name)
    }

    fn create_attribute(&self, name: QName<'d>, value: &str) -> Attribute<'d> {
        self.document().create_attribute(name, value)
    }

    fn create_text(&self, text: &str) -> Text<'d> {
        self.document().create_text(text)
    }

    fn create_cdata(&self, text: &str) -> Cdata<'d> {
        self.document().create_cdata(text)
    }

    fn create_comment(&self, text: &str) -> Comment<'d> {
        self.document().create_comment(text)
    }

    fn create_entity(&self, name: &str, text: &str) -> Entity<'d> {
        self.document().create_entity(name, text)
    }

    fn create_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        self.document().create_processing_instruction(target, value)
    }

    fn create_doc_type(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DocType<'d> {
        self.document().create_doc_type(name, public_id, system_id)
    }
}

/// The terminal factory: creates plain nodes of its document.
#[derive(Copy, Clone)]
pub struct DocumentFactory<'d> {
    document: Document<'d>,
}

impl<'d> DocumentFactory<'d> {
    pub fn new(document: Document<'d>) -> DocumentFactory<'d> {
        DocumentFactory { document }
    }
}

impl<'d> NodeFactory<'d> for DocumentFactory<'d> {
    fn document(&self) -> Document<'d> {
        self.document
    }
}

/// Forwards every operation to a swappable target factory.
///
/// The target can be re-pointed while a build is in flight; creations
/// after [`set_target`](Self::set_target) go to the new target.
pub struct ProxyFactory<'d, 'f> {
    target: Cell<&'f dyn NodeFactory<'d>>,
}

impl<'d, 'f> ProxyFactory<'d, 'f> {
    pub fn new(target: &'f dyn NodeFactory<'d>) -> ProxyFactory<'d, 'f> {
        ProxyFactory {
            target: Cell::new(target),
        }
    }

    pub fn target(&self) -> &'f dyn NodeFactory<'d> {
        self.target.get()
    }

    pub fn set_target(&self, target: &'f dyn NodeFactory<'d>) {
        self.target.set(target);
    }
}

impl<'d, 'f> NodeFactory<'d> for ProxyFactory<'d, 'f> {
    fn document(&self) -> Document<'d> {
        self.target.get().document()
    }

    fn namespace(&self, prefix: &str, uri: &str) -> Result<Namespace<'d>> {
        self.target.get().namespace(prefix, uri)
    }

    fn qname(&self, local_name: &str) -> Result<QName<'d>> {
        self.target.get().qname(local_name)
    }

    fn qname_with_namespace(
        &self,
        local_name: &str,
        namespace: Namespace<'d>,
    ) -> Result<QName<'d>> {
        self.target.get().qname_with_namespace(local_name, namespace)
    }

    fn create_element(&self, name: QName<'d>) -> Element<'d> {
        self.target.get().create_element(name)
    }

    fn create_attribute(&self, name: QName<'d>, value: &str) -> Attribute<'d> {
        self.target.get().create_attribute(name, value)
    }

    fn create_text(&self, text: &str) -> Text<'d> {
        self.target.get().create_text(text)
    }

    fn create_cdata(&self, text: &str) -> Cdata<'d> {
        self.target.get().create_cdata(text)
    }

    fn create_comment(&self, text: &str) -> Comment<'d> {
        self.target.get().create_comment(text)
    }

    fn create_entity(&self, name: &str, text: &str) -> Entity<'d> {
        self.target.get().create_entity(name, text)
    }

    fn create_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> ProcessingInstruction<'d> {
        self.target.get().create_processing_instruction(target, value)
    }

    fn create_doc_type(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DocType<'d> {
        self.target.get().create_doc_type(name, public_id, system_id)
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::super::dom::{Document, Element};
    use super::super::{Package, QName};
    use super::{DocumentFactory, NodeFactory, ProxyFactory};

    struct CountingFactory<'d> {
        document: Document<'d>,
        elements: Cell<usize>,
    }

    impl<'d> CountingFactory<'d> {
        fn new(document: Document<'d>) -> CountingFactory<'d> {
            CountingFactory {
                document,
                elements: Cell::new(0),
            }
        }
    }

    impl<'d> NodeFactory<'d> for CountingFactory<'d> {
        fn document(&self) -> Document<'d> {
            self.document
        }

        fn create_element(&self, name: QName<'d>) -> Element<'d> {
            self.elements.set(self.elements.get() + 1);
            self.document.create_element(name)
        }
    }

    #[test]
    fn the_terminal_factory_creates_nodes_of_its_document() {
        let package = Package::new();
        let doc = package.as_document();
        let factory = DocumentFactory::new(doc);

        let element = factory.create_element(factory.qname("alpha").unwrap());

        assert_eq!(doc, element.document());
        assert_eq!("alpha", element.name().local_name());
    }

    #[test]
    fn a_factory_can_intercept_creation() {
        let package = Package::new();
        let doc = package.as_document();
        let factory = CountingFactory::new(doc);

        factory.create_element(doc.qname("one").unwrap());
        factory.create_element(doc.qname("two").unwrap());

        assert_eq!(2, factory.elements.get());
    }

    #[test]
    fn a_proxy_forwards_to_its_target() {
        let package = Package::new();
        let doc = package.as_document();
        let counting = CountingFactory::new(doc);
        let proxy = ProxyFactory::new(&counting);

        proxy.create_element(doc.qname("alpha").unwrap());

        assert_eq!(1, counting.elements.get());
    }

    #[test]
    fn re_pointing_a_proxy_affects_later_creations() {
        let package = Package::new();
        let doc = package.as_document();
        let first = CountingFactory::new(doc);
        let second = CountingFactory::new(doc);
        let proxy = ProxyFactory::new(&first);

        proxy.create_element(doc.qname("one").unwrap());
        proxy.set_target(&second);
        proxy.create_element(doc.qname("two").unwrap());
        proxy.create_element(doc.qname("three").unwrap());

        assert_eq!(1, first.elements.get());
        assert_eq!(2, second.elements.get());
    }

    #[test]
    fn proxies_chain() {
        let package = Package::new();
        let doc = package.as_document();
        let counting = CountingFactory::new(doc);
        let inner = ProxyFactory::new(&counting);
        let outer = ProxyFactory::new(&inner);

        outer.create_element(doc.qname("deep").unwrap());

        assert_eq!(1, counting.elements.get());
    }
}
