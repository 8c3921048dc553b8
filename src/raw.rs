//! Node storage and linkage.
//!
//! `Storage` owns every node in per-kind arenas, plus the interning tables
//! that give namespaces and qualified names one shared instance apiece.
//! `Connections` owns the parent/child links and enforces the tree-shape
//! rules: a node has at most one parent, the document holds at most one
//! root element and one document type, and no element may become its own
//! ancestor. Nothing is deallocated until the whole `Storage` drops, which
//! is what makes handing out raw pointers workable.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use typed_arena::Arena;

use crate::error::{Error, Result};
use crate::lazy_hash_map::LazyHashMap;
use crate::string_pool::{InternedString, StringPool};

pub struct Namespace {
    prefix: InternedString,
    uri: InternedString,
}

impl Namespace {
    pub fn prefix(&self) -> &str { unsafe { self.prefix.as_str() } }
    pub fn uri(&self) -> &str { unsafe { self.uri.as_str() } }

    pub fn is_no_namespace(&self) -> bool {
        self.prefix().is_empty() && self.uri().is_empty()
    }
}

pub struct QName {
    local_name: InternedString,
    qualified_name: InternedString,
    namespace: *const Namespace,
}

impl QName {
    pub fn local_name(&self) -> &str { unsafe { self.local_name.as_str() } }
    pub fn qualified_name(&self) -> &str { unsafe { self.qualified_name.as_str() } }
    pub fn namespace(&self) -> &Namespace { unsafe { &*self.namespace } }
}

pub struct Root {
    children: Vec<ChildOfRoot>,
}

pub struct Element {
    name: *const QName,
    children: Vec<ChildOfElement>,
    parent: Option<ParentOfChild>,
    attributes: Vec<*mut Attribute>,
    attribute_index: LazyHashMap<*const QName, *mut Attribute>,
    namespaces: Vec<*const Namespace>,
    data: Option<Rc<dyn Any>>,
}

impl Element {
    pub fn name(&self) -> &QName { unsafe { &*self.name } }
}

pub struct Attribute {
    name: *const QName,
    value: InternedString,
    parent: Option<*mut Element>,
}

impl Attribute {
    pub fn name(&self) -> &QName { unsafe { &*self.name } }
    pub fn value(&self) -> &str { unsafe { self.value.as_str() } }
}

pub struct Text {
    text: InternedString,
    parent: Option<*mut Element>,
}

impl Text {
    pub fn text(&self) -> &str { unsafe { self.text.as_str() } }
}

pub struct Cdata {
    text: InternedString,
    parent: Option<*mut Element>,
}

impl Cdata {
    pub fn text(&self) -> &str { unsafe { self.text.as_str() } }
}

pub struct Comment {
    text: InternedString,
    parent: Option<ParentOfChild>,
}

impl Comment {
    pub fn text(&self) -> &str { unsafe { self.text.as_str() } }
}

pub struct Entity {
    name: InternedString,
    text: InternedString,
    parent: Option<*mut Element>,
}

impl Entity {
    pub fn name(&self) -> &str { unsafe { self.name.as_str() } }
    pub fn text(&self) -> &str { unsafe { self.text.as_str() } }
}

pub struct ProcessingInstruction {
    target: InternedString,
    value: Option<InternedString>,
    parent: Option<ParentOfChild>,
}

impl ProcessingInstruction {
    pub fn target(&self) -> &str { unsafe { self.target.as_str() } }
    pub fn value(&self) -> Option<&str> { self.value.as_ref().map(|v| unsafe { v.as_str() }) }
}

pub struct DocType {
    name: InternedString,
    public_id: Option<InternedString>,
    system_id: Option<InternedString>,
    parent: Option<*mut Root>,
}

impl DocType {
    pub fn name(&self) -> &str { unsafe { self.name.as_str() } }
    pub fn public_id(&self) -> Option<&str> { self.public_id.as_ref().map(|v| unsafe { v.as_str() }) }
    pub fn system_id(&self) -> Option<&str> { self.system_id.as_ref().map(|v| unsafe { v.as_str() }) }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChildOfRoot {
    Element(*mut Element),
    Comment(*mut Comment),
    ProcessingInstruction(*mut ProcessingInstruction),
    DocType(*mut DocType),
}

impl ChildOfRoot {
    fn is_element(&self) -> bool {
        matches!(*self, ChildOfRoot::Element(_))
    }

    fn is_doc_type(&self) -> bool {
        matches!(*self, ChildOfRoot::DocType(_))
    }

    fn current_parent(&self) -> Option<ParentOfChild> {
        match *self {
            ChildOfRoot::Element(n) => unsafe { &*n }.parent,
            ChildOfRoot::Comment(n) => unsafe { &*n }.parent,
            ChildOfRoot::ProcessingInstruction(n) => unsafe { &*n }.parent,
            ChildOfRoot::DocType(n) => unsafe { &*n }.parent.map(ParentOfChild::Root),
        }
    }

    fn set_parent(&self, parent: Option<*mut Root>) {
        match *self {
            ChildOfRoot::Element(n) => unsafe { &mut *n }.parent = parent.map(ParentOfChild::Root),
            ChildOfRoot::Comment(n) => unsafe { &mut *n }.parent = parent.map(ParentOfChild::Root),
            ChildOfRoot::ProcessingInstruction(n) => {
                unsafe { &mut *n }.parent = parent.map(ParentOfChild::Root)
            }
            ChildOfRoot::DocType(n) => unsafe { &mut *n }.parent = parent,
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            ChildOfRoot::Element(n) => describe_element(n),
            ChildOfRoot::Comment(_) => String::from("comment"),
            ChildOfRoot::ProcessingInstruction(n) => {
                format!("processing instruction <?{}?>", unsafe { &*n }.target())
            }
            ChildOfRoot::DocType(n) => {
                format!("document type <!DOCTYPE {}>", unsafe { &*n }.name())
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChildOfElement {
    Element(*mut Element),
    Text(*mut Text),
    Cdata(*mut Cdata),
    Comment(*mut Comment),
    ProcessingInstruction(*mut ProcessingInstruction),
    Entity(*mut Entity),
}

impl ChildOfElement {
    fn current_parent(&self) -> Option<ParentOfChild> {
        match *self {
            ChildOfElement::Element(n) => unsafe { &*n }.parent,
            ChildOfElement::Text(n) => unsafe { &*n }.parent.map(ParentOfChild::Element),
            ChildOfElement::Cdata(n) => unsafe { &*n }.parent.map(ParentOfChild::Element),
            ChildOfElement::Comment(n) => unsafe { &*n }.parent,
            ChildOfElement::ProcessingInstruction(n) => unsafe { &*n }.parent,
            ChildOfElement::Entity(n) => unsafe { &*n }.parent.map(ParentOfChild::Element),
        }
    }

    fn set_parent(&self, parent: Option<*mut Element>) {
        match *self {
            ChildOfElement::Element(n) => {
                unsafe { &mut *n }.parent = parent.map(ParentOfChild::Element)
            }
            ChildOfElement::Text(n) => unsafe { &mut *n }.parent = parent,
            ChildOfElement::Cdata(n) => unsafe { &mut *n }.parent = parent,
            ChildOfElement::Comment(n) => {
                unsafe { &mut *n }.parent = parent.map(ParentOfChild::Element)
            }
            ChildOfElement::ProcessingInstruction(n) => {
                unsafe { &mut *n }.parent = parent.map(ParentOfChild::Element)
            }
            ChildOfElement::Entity(n) => unsafe { &mut *n }.parent = parent,
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            ChildOfElement::Element(n) => describe_element(n),
            ChildOfElement::Text(_) => String::from("text node"),
            ChildOfElement::Cdata(_) => String::from("CDATA section"),
            ChildOfElement::Comment(_) => String::from("comment"),
            ChildOfElement::ProcessingInstruction(n) => {
                format!("processing instruction <?{}?>", unsafe { &*n }.target())
            }
            ChildOfElement::Entity(n) => format!("entity &{};", unsafe { &*n }.name()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParentOfChild {
    Root(*mut Root),
    Element(*mut Element),
}

pub fn describe_element(element: *mut Element) -> String {
    format!("element <{}>", unsafe { &*element }.name().qualified_name())
}

pub fn describe_attribute(attribute: *mut Attribute) -> String {
    format!("attribute \"{}\"", unsafe { &*attribute }.name().qualified_name())
}

pub struct Storage {
    strings: StringPool,
    namespaces: Arena<Namespace>,
    qnames: Arena<QName>,
    roots: Arena<Root>,
    elements: Arena<Element>,
    attributes: Arena<Attribute>,
    texts: Arena<Text>,
    cdatas: Arena<Cdata>,
    comments: Arena<Comment>,
    entities: Arena<Entity>,
    processing_instructions: Arena<ProcessingInstruction>,
    doc_types: Arena<DocType>,
    namespace_index: RefCell<HashMap<(InternedString, InternedString), *const Namespace>>,
    qname_index: RefCell<HashMap<(InternedString, *const Namespace), *const QName>>,
}

impl Storage {
    pub fn new() -> Storage {
        Storage {
            strings: StringPool::new(),
            namespaces: Arena::new(),
            qnames: Arena::new(),
            roots: Arena::new(),
            elements: Arena::new(),
            attributes: Arena::new(),
            texts: Arena::new(),
            cdatas: Arena::new(),
            comments: Arena::new(),
            entities: Arena::new(),
            processing_instructions: Arena::new(),
            doc_types: Arena::new(),
            namespace_index: RefCell::new(HashMap::new()),
            qname_index: RefCell::new(HashMap::new()),
        }
    }

    fn intern(&self, s: &str) -> InternedString {
        InternedString::from_str(self.strings.intern(s))
    }

    pub fn intern_namespace(&self, prefix: &str, uri: &str) -> *const Namespace {
        let prefix = self.intern(prefix);
        let uri = self.intern(uri);

        let mut index = self.namespace_index.borrow_mut();
        if let Some(&namespace) = index.get(&(prefix, uri)) {
            return namespace;
        }

        let namespace: *const Namespace = self.namespaces.alloc(Namespace { prefix, uri });
        index.insert((prefix, uri), namespace);
        namespace
    }

    pub fn no_namespace(&self) -> *const Namespace {
        self.intern_namespace("", "")
    }

    pub fn xml_namespace(&self) -> *const Namespace {
        self.intern_namespace("xml", crate::XML_NAMESPACE_URI)
    }

    pub fn intern_qname(&self, namespace: *const Namespace, local_name: &str) -> *const QName {
        let local = self.intern(local_name);

        let mut index = self.qname_index.borrow_mut();
        if let Some(&name) = index.get(&(local, namespace)) {
            return name;
        }

        let prefix = unsafe { &*namespace }.prefix();
        let qualified = if prefix.is_empty() {
            local
        } else {
            self.intern(&format!("{}:{}", prefix, local_name))
        };

        let name: *const QName = self.qnames.alloc(QName {
            local_name: local,
            qualified_name: qualified,
            namespace,
        });
        index.insert((local, namespace), name);
        name
    }

    pub fn create_root(&self) -> *mut Root {
        self.roots.alloc(Root {
            children: Vec::new(),
        })
    }

    pub fn create_element(&self, name: *const QName) -> *mut Element {
        self.elements.alloc(Element {
            name,
            children: Vec::new(),
            parent: None,
            attributes: Vec::new(),
            attribute_index: LazyHashMap::new(),
            namespaces: Vec::new(),
            data: None,
        })
    }

    pub fn create_attribute(&self, name: *const QName, value: &str) -> *mut Attribute {
        let value = self.intern(value);

        self.attributes.alloc(Attribute {
            name,
            value,
            parent: None,
        })
    }

    pub fn create_text(&self, text: &str) -> *mut Text {
        let text = self.intern(text);

        self.texts.alloc(Text { text, parent: None })
    }

    pub fn create_cdata(&self, text: &str) -> *mut Cdata {
        let text = self.intern(text);

        self.cdatas.alloc(Cdata { text, parent: None })
    }

    pub fn create_comment(&self, text: &str) -> *mut Comment {
        let text = self.intern(text);

        self.comments.alloc(Comment { text, parent: None })
    }

    pub fn create_entity(&self, name: &str, text: &str) -> *mut Entity {
        let name = self.intern(name);
        let text = self.intern(text);

        self.entities.alloc(Entity {
            name,
            text,
            parent: None,
        })
    }

    pub fn create_processing_instruction(
        &self,
        target: &str,
        value: Option<&str>,
    ) -> *mut ProcessingInstruction {
        let target = self.intern(target);
        let value = value.map(|v| self.intern(v));

        self.processing_instructions.alloc(ProcessingInstruction {
            target,
            value,
            parent: None,
        })
    }

    pub fn create_doc_type(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> *mut DocType {
        let name = self.intern(name);
        let public_id = public_id.map(|v| self.intern(v));
        let system_id = system_id.map(|v| self.intern(v));

        self.doc_types.alloc(DocType {
            name,
            public_id,
            system_id,
            parent: None,
        })
    }

    pub fn element_set_name(&self, element: *mut Element, name: *const QName) {
        let element_r = unsafe { &mut *element };
        element_r.name = name;
    }

    pub fn element_set_data(&self, element: *mut Element, data: Rc<dyn Any>) {
        let element_r = unsafe { &mut *element };
        element_r.data = Some(data);
    }

    pub fn element_data(&self, element: *mut Element) -> Option<Rc<dyn Any>> {
        let element_r = unsafe { &*element };
        element_r.data.clone()
    }

    pub fn element_take_data(&self, element: *mut Element) -> Option<Rc<dyn Any>> {
        let element_r = unsafe { &mut *element };
        element_r.data.take()
    }

    pub fn attribute_set_value(&self, attribute: *mut Attribute, value: &str) {
        let value = self.intern(value);
        let attribute_r = unsafe { &mut *attribute };
        attribute_r.value = value;
    }

    pub fn text_set_text(&self, text: *mut Text, new_text: &str) {
        let new_text = self.intern(new_text);
        let text_r = unsafe { &mut *text };
        text_r.text = new_text;
    }

    pub fn cdata_set_text(&self, cdata: *mut Cdata, new_text: &str) {
        let new_text = self.intern(new_text);
        let cdata_r = unsafe { &mut *cdata };
        cdata_r.text = new_text;
    }

    pub fn comment_set_text(&self, comment: *mut Comment, new_text: &str) {
        let new_text = self.intern(new_text);
        let comment_r = unsafe { &mut *comment };
        comment_r.text = new_text;
    }

    pub fn entity_set_text(&self, entity: *mut Entity, new_text: &str) {
        let new_text = self.intern(new_text);
        let entity_r = unsafe { &mut *entity };
        entity_r.text = new_text;
    }

    pub fn processing_instruction_set_target(
        &self,
        pi: *mut ProcessingInstruction,
        new_target: &str,
    ) {
        let new_target = self.intern(new_target);
        let pi_r = unsafe { &mut *pi };
        pi_r.target = new_target;
    }

    pub fn processing_instruction_set_value(
        &self,
        pi: *mut ProcessingInstruction,
        new_value: Option<&str>,
    ) {
        let new_value = new_value.map(|v| self.intern(v));
        let pi_r = unsafe { &mut *pi };
        pi_r.value = new_value;
    }

    pub fn doc_type_set_name(&self, doc_type: *mut DocType, new_name: &str) {
        let new_name = self.intern(new_name);
        let doc_type_r = unsafe { &mut *doc_type };
        doc_type_r.name = new_name;
    }

    pub fn doc_type_set_public_id(&self, doc_type: *mut DocType, new_id: Option<&str>) {
        let new_id = new_id.map(|v| self.intern(v));
        let doc_type_r = unsafe { &mut *doc_type };
        doc_type_r.public_id = new_id;
    }

    pub fn doc_type_set_system_id(&self, doc_type: *mut DocType, new_id: Option<&str>) {
        let new_id = new_id.map(|v| self.intern(v));
        let doc_type_r = unsafe { &mut *doc_type };
        doc_type_r.system_id = new_id;
    }
}

pub struct Connections {
    root: *mut Root,
}

impl Connections {
    pub fn new(root: *mut Root) -> Connections {
        Connections { root }
    }

    pub fn root(&self) -> *mut Root {
        self.root
    }

    pub fn element_parent(&self, child: *mut Element) -> Option<ParentOfChild> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn text_parent(&self, child: *mut Text) -> Option<*mut Element> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn cdata_parent(&self, child: *mut Cdata) -> Option<*mut Element> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn comment_parent(&self, child: *mut Comment) -> Option<ParentOfChild> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn entity_parent(&self, child: *mut Entity) -> Option<*mut Element> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn processing_instruction_parent(
        &self,
        child: *mut ProcessingInstruction,
    ) -> Option<ParentOfChild> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn doc_type_parent(&self, child: *mut DocType) -> Option<*mut Root> {
        let child_r = unsafe { &*child };
        child_r.parent
    }

    pub fn attribute_parent(&self, attribute: *mut Attribute) -> Option<*mut Element> {
        let attribute_r = unsafe { &*attribute };
        attribute_r.parent
    }

    pub fn append_root_child(&self, child: ChildOfRoot) -> Result<()> {
        let len = unsafe { &*self.root }.children.len();
        self.insert_root_child_at(len, child)
    }

    pub fn insert_root_child_at(&self, index: usize, child: ChildOfRoot) -> Result<()> {
        let len = unsafe { &*self.root }.children.len();
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.check_root_child(child)?;

        child.set_parent(Some(self.root));
        let root_r = unsafe { &mut *self.root };
        root_r.children.insert(index, child);
        Ok(())
    }

    fn check_root_child(&self, child: ChildOfRoot) -> Result<()> {
        if child.current_parent().is_some() {
            return Err(Error::NodeAlreadyOwned {
                node: child.describe(),
                target: String::from("the document"),
            });
        }

        let root_r = unsafe { &*self.root };
        if child.is_element() && root_r.children.iter().any(ChildOfRoot::is_element) {
            return Err(Error::DuplicateRootElement {
                node: child.describe(),
            });
        }
        if child.is_doc_type() && root_r.children.iter().any(ChildOfRoot::is_doc_type) {
            return Err(Error::DuplicateDocType {
                node: child.describe(),
            });
        }
        Ok(())
    }

    pub fn replace_root_child_at(&self, index: usize, child: ChildOfRoot) -> Result<ChildOfRoot> {
        let len = unsafe { &*self.root }.children.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        if child.current_parent().is_some() {
            return Err(Error::NodeAlreadyOwned {
                node: child.describe(),
                target: String::from("the document"),
            });
        }

        // The child being displaced does not count towards the
        // one-root-element and one-doctype limits.
        {
            let root_r = unsafe { &*self.root };
            let other_element = root_r
                .children
                .iter()
                .enumerate()
                .any(|(i, c)| i != index && c.is_element());
            if child.is_element() && other_element {
                return Err(Error::DuplicateRootElement {
                    node: child.describe(),
                });
            }
            let other_doc_type = root_r
                .children
                .iter()
                .enumerate()
                .any(|(i, c)| i != index && c.is_doc_type());
            if child.is_doc_type() && other_doc_type {
                return Err(Error::DuplicateDocType {
                    node: child.describe(),
                });
            }
        }

        child.set_parent(Some(self.root));
        let root_r = unsafe { &mut *self.root };
        let displaced = mem::replace(&mut root_r.children[index], child);
        displaced.set_parent(None);
        Ok(displaced)
    }

    pub fn remove_root_child(&self, child: ChildOfRoot) -> bool {
        let root_r = unsafe { &mut *self.root };
        match root_r.children.iter().position(|c| *c == child) {
            Some(index) => {
                root_r.children.remove(index);
                child.set_parent(None);
                true
            }
            None => false,
        }
    }

    pub fn remove_root_child_at(&self, index: usize) -> Result<ChildOfRoot> {
        let root_r = unsafe { &mut *self.root };
        if index >= root_r.children.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: root_r.children.len(),
            });
        }
        let child = root_r.children.remove(index);
        child.set_parent(None);
        Ok(child)
    }

    pub fn clear_root_children(&self) {
        let root_r = unsafe { &mut *self.root };
        for child in root_r.children.drain(..) {
            child.set_parent(None);
        }
    }

    pub unsafe fn root_children(&self) -> &[ChildOfRoot] {
        let root_r = &*self.root;
        &root_r.children
    }

    pub fn append_element_child(&self, parent: *mut Element, child: ChildOfElement) -> Result<()> {
        let len = unsafe { &*parent }.children.len();
        self.insert_element_child_at(parent, len, child)
    }

    pub fn insert_element_child_at(
        &self,
        parent: *mut Element,
        index: usize,
        child: ChildOfElement,
    ) -> Result<()> {
        let len = unsafe { &*parent }.children.len();
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.check_element_child(parent, child)?;

        child.set_parent(Some(parent));
        let parent_r = unsafe { &mut *parent };
        parent_r.children.insert(index, child);
        Ok(())
    }

    fn check_element_child(&self, parent: *mut Element, child: ChildOfElement) -> Result<()> {
        if child.current_parent().is_some() {
            return Err(Error::NodeAlreadyOwned {
                node: child.describe(),
                target: describe_element(parent),
            });
        }
        if let ChildOfElement::Element(node) = child {
            if self.would_create_cycle(parent, node) {
                return Err(Error::CyclicAdd {
                    node: child.describe(),
                    target: describe_element(parent),
                });
            }
        }
        Ok(())
    }

    // Adding `node` below `target` closes a loop exactly when `node` is
    // `target` itself or already sits on `target`'s ancestor chain.
    fn would_create_cycle(&self, target: *mut Element, node: *mut Element) -> bool {
        if target == node {
            return true;
        }
        let mut ancestor = self.element_parent(target);
        while let Some(ParentOfChild::Element(element)) = ancestor {
            if element == node {
                return true;
            }
            ancestor = self.element_parent(element);
        }
        false
    }

    pub fn replace_element_child_at(
        &self,
        parent: *mut Element,
        index: usize,
        child: ChildOfElement,
    ) -> Result<ChildOfElement> {
        let len = unsafe { &*parent }.children.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.check_element_child(parent, child)?;

        child.set_parent(Some(parent));
        let parent_r = unsafe { &mut *parent };
        let displaced = mem::replace(&mut parent_r.children[index], child);
        displaced.set_parent(None);
        Ok(displaced)
    }

    pub fn remove_element_child(&self, parent: *mut Element, child: ChildOfElement) -> bool {
        let parent_r = unsafe { &mut *parent };
        match parent_r.children.iter().position(|c| *c == child) {
            Some(index) => {
                parent_r.children.remove(index);
                child.set_parent(None);
                true
            }
            None => false,
        }
    }

    pub fn remove_element_child_at(
        &self,
        parent: *mut Element,
        index: usize,
    ) -> Result<ChildOfElement> {
        let parent_r = unsafe { &mut *parent };
        if index >= parent_r.children.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: parent_r.children.len(),
            });
        }
        let child = parent_r.children.remove(index);
        child.set_parent(None);
        Ok(child)
    }

    pub fn clear_element_children(&self, parent: *mut Element) {
        let parent_r = unsafe { &mut *parent };
        for child in parent_r.children.drain(..) {
            child.set_parent(None);
        }
    }

    pub unsafe fn element_children(&self, parent: *mut Element) -> &[ChildOfElement] {
        let parent_r = &*parent;
        &parent_r.children
    }

    // Fast paths for nodes created a moment ago: the caller guarantees the
    // child has never been attached anywhere, so no check can fail.
    pub fn attach_root_child(&self, child: ChildOfRoot) {
        child.set_parent(Some(self.root));
        let root_r = unsafe { &mut *self.root };
        root_r.children.push(child);
    }

    pub fn attach_element_child(&self, parent: *mut Element, child: ChildOfElement) {
        child.set_parent(Some(parent));
        let parent_r = unsafe { &mut *parent };
        parent_r.children.push(child);
    }

    pub fn attach_attribute(&self, parent: *mut Element, attribute: *mut Attribute) {
        let attribute_r = unsafe { &mut *attribute };
        attribute_r.parent = Some(parent);
        let parent_r = unsafe { &mut *parent };
        parent_r.attribute_index.clear();
        parent_r.attributes.push(attribute);
    }

    pub fn add_attribute(&self, parent: *mut Element, attribute: *mut Attribute) -> Result<()> {
        if unsafe { &*attribute }.parent.is_some() {
            return Err(Error::NodeAlreadyOwned {
                node: describe_attribute(attribute),
                target: describe_element(parent),
            });
        }
        self.attach_attribute(parent, attribute);
        Ok(())
    }

    pub fn remove_attribute(&self, parent: *mut Element, attribute: *mut Attribute) -> bool {
        let parent_r = unsafe { &mut *parent };
        match parent_r.attributes.iter().position(|&a| a == attribute) {
            Some(index) => {
                parent_r.attributes.remove(index);
                parent_r.attribute_index.clear();
                unsafe { &mut *attribute }.parent = None;
                true
            }
            None => false,
        }
    }

    pub fn detach_attribute(&self, attribute: *mut Attribute) {
        let parent = unsafe { &*attribute }.parent;
        if let Some(parent) = parent {
            self.remove_attribute(parent, attribute);
        }
    }

    pub unsafe fn attributes(&self, parent: *mut Element) -> &[*mut Attribute] {
        let parent_r = &*parent;
        &parent_r.attributes
    }

    pub fn attribute_by_local_name(
        &self,
        parent: *mut Element,
        local_name: &str,
    ) -> Option<*mut Attribute> {
        let parent_r = unsafe { &*parent };
        parent_r
            .attributes
            .iter()
            .copied()
            .find(|&a| unsafe { &*a }.name().local_name() == local_name)
    }

    pub fn attribute_by_qname(
        &self,
        parent: *mut Element,
        name: *const QName,
    ) -> Option<*mut Attribute> {
        let parent_r = unsafe { &mut *parent };
        if !parent_r.attribute_index.is_built() {
            // Insert back to front so that the first of two attributes
            // sharing a name is the one left in the index.
            for &attribute in parent_r.attributes.iter().rev() {
                let key = unsafe { &*attribute }.name;
                parent_r.attribute_index.insert(key, attribute);
            }
        }
        parent_r.attribute_index.get(&name).copied()
    }

    pub fn declare_namespace(&self, parent: *mut Element, namespace: *const Namespace) {
        let parent_r = unsafe { &mut *parent };
        if !parent_r.namespaces.contains(&namespace) {
            parent_r.namespaces.push(namespace);
        }
    }

    pub fn remove_namespace(&self, parent: *mut Element, namespace: *const Namespace) -> bool {
        let parent_r = unsafe { &mut *parent };
        match parent_r.namespaces.iter().position(|&n| n == namespace) {
            Some(index) => {
                parent_r.namespaces.remove(index);
                true
            }
            None => false,
        }
    }

    pub unsafe fn element_namespaces(&self, parent: *mut Element) -> &[*const Namespace] {
        let parent_r = &*parent;
        &parent_r.namespaces
    }
}
