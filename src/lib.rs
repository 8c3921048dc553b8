//! An in-memory, mutable model of XML documents.
//!
//! A [`Package`] owns every node of one document; [`Package::as_document`]
//! hands out a [`dom::Document`] of cheap `Copy` handles for building and
//! navigating the tree. [`reader`] parses a string into a package and
//! [`writer`] serializes one back out.
//!
//! ```
//! use grove::Package;
//!
//! let package = Package::new();
//! let doc = package.as_document();
//!
//! let hello = doc.create_element(doc.qname("hello")?);
//! hello.set_attribute_value(doc.qname("planet")?, "Earth");
//! hello.add_comment("What about other planets?");
//! hello.add_text("Greetings, Earthlings!");
//!
//! doc.root().append_child(hello)?;
//! # Ok::<(), grove::Error>(())
//! ```
//!
//! ### Design decisions
//!
//! Try to leverage the type system as much as possible.

use std::fmt;
use std::hash::{Hash, Hasher};

mod error;
mod lazy_hash_map;
mod string_pool;

pub mod dom;
pub mod factory;
#[doc(hidden)]
pub mod raw;
pub mod reader;
pub mod str;
pub mod writer;

pub use error::{Error, Result};

/// The namespace every document binds to the `xml` prefix.
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// A prefix/URI pair.
///
/// Values are interned per document, so creating the same pair twice is
/// cheap. An empty URI means the absence of a namespace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Namespace<'d> {
    prefix: &'d str,
    uri: &'d str,
}

impl<'d> Namespace<'d> {
    pub fn prefix(&self) -> &'d str {
        self.prefix
    }

    pub fn uri(&self) -> &'d str {
        self.uri
    }

    /// The absence of a namespace.
    pub const fn none() -> Namespace<'static> {
        Namespace { prefix: "", uri: "" }
    }

    /// The built-in binding of the `xml` prefix.
    pub const fn xml() -> Namespace<'static> {
        Namespace {
            prefix: "xml",
            uri: XML_NAMESPACE_URI,
        }
    }
}

/// A namespace-qualified name: a local name plus a [`Namespace`].
///
/// Equality spans the local name and the whole namespace value, so names
/// sharing a URI under different prefixes stay distinct.
#[derive(Debug, Copy, Clone)]
pub struct QName<'d> {
    local_name: &'d str,
    qualified_name: &'d str,
    namespace: Namespace<'d>,
}

impl<'d> QName<'d> {
    pub fn local_name(&self) -> &'d str {
        self.local_name
    }

    /// The name as written, like `b:book`.
    pub fn qualified_name(&self) -> &'d str {
        self.qualified_name
    }

    pub fn namespace(&self) -> Namespace<'d> {
        self.namespace
    }

    pub fn prefix(&self) -> &'d str {
        self.namespace.prefix
    }

    pub fn namespace_uri(&self) -> &'d str {
        self.namespace.uri
    }
}

impl<'d> PartialEq for QName<'d> {
    fn eq(&self, other: &QName<'d>) -> bool {
        self.local_name == other.local_name && self.namespace == other.namespace
    }
}

impl<'d> Eq for QName<'d> {}

impl<'d> Hash for QName<'d> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.local_name.hash(state);
        self.namespace.hash(state);
    }
}

impl<'d> fmt::Display for QName<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name)
    }
}

/// The owner of every node of one document.
///
/// Nodes are allocated into the package and live exactly as long as it
/// does; the handles of [`dom`] borrow from it.
pub struct Package {
    storage: raw::Storage,
    connections: raw::Connections,
}

impl Package {
    pub fn new() -> Package {
        let storage = raw::Storage::new();
        let root = storage.create_root();
        Package {
            storage,
            connections: raw::Connections::new(root),
        }
    }

    pub fn as_document(&self) -> dom::Document<'_> {
        dom::Document::new(&self.storage, &self.connections)
    }
}

impl Default for Package {
    fn default() -> Package {
        Package::new()
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Package) -> bool {
        self as *const Package == other as *const Package
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Package")
    }
}
