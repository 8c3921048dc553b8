//! End-to-end scenarios: parse a document, query and mutate it through
//! the public surface, write it back out, and parse the result again.

use grove::dom::ChildOfElement;
use grove::{reader, writer, Package};

fn format_xml(package: &Package) -> String {
    let mut output = Vec::new();
    writer::format_document(&package.as_document(), &mut output).expect("Not formatted");
    String::from_utf8(output).expect("Not a string")
}

#[test]
fn the_book_scenario() {
    let package = reader::parse(
        "<?xml version='1.0'?>\
         <book xmlns:b='urn:books' id='42'><b:author>Hello<b:pen>Ada</b:pen></b:author></book>",
    )
    .expect("Not parsed");
    let doc = package.as_document();
    let book = doc.root().root_element().expect("No root element");

    assert_eq!(Some("42"), book.attribute_value("id"));
    assert_eq!("HelloAda", book.string_value());

    let author = book.element("author").expect("No author");
    let ns = author.namespace_for_prefix("b").expect("Prefix not in scope");
    assert_eq!("urn:books", ns.uri());
    assert_eq!("urn:books", author.name().namespace_uri());
}

#[test]
fn parse_edit_and_write_back() {
    let package = reader::parse("<?xml version='1.0'?><shelf><book id='1'/></shelf>")
        .expect("Not parsed");
    let doc = package.as_document();
    let shelf = doc.root().root_element().expect("No root element");
    let book = shelf.element("book").expect("No book");

    book.set_attribute_value(doc.qname("id").expect("Bad name"), "2");
    let review = book.add_element(doc.qname("review").expect("Bad name"));
    review.add_text("A gripping read");
    shelf.add_comment("edited");

    let xml = format_xml(&package);
    assert_eq!(
        "<?xml version='1.0'?>\
         <shelf><book id='2'><review>A gripping read</review></book><!--edited--></shelf>",
        xml
    );

    let again = reader::parse(&xml).expect("Not reparsed");
    let doc = again.as_document();
    let book = doc
        .root()
        .root_element()
        .and_then(|shelf| shelf.element("book"))
        .expect("No book");
    assert_eq!(Some("2"), book.attribute_value("id"));
    assert_eq!("A gripping read", book.string_value());
}

#[test]
fn a_namespaced_document_round_trips() {
    let xml = "<?xml version='1.0'?>\
               <b:shelf xmlns:b='urn:books'><b:book id='1'>text</b:book><!--done--></b:shelf>";
    let package = reader::parse(xml).expect("Not parsed");

    assert_eq!(xml, format_xml(&package));
}

#[test]
fn a_cancelled_default_namespace_round_trips() {
    let xml = "<?xml version='1.0'?><shelf xmlns='urn:d'><plain xmlns=''/></shelf>";
    let package = reader::parse(xml).expect("Not parsed");
    let doc = package.as_document();

    let shelf = doc.root().root_element().expect("No root element");
    assert_eq!("urn:d", shelf.name().namespace_uri());
    let plain = shelf.element("plain").expect("No plain");
    assert_eq!("", plain.name().namespace_uri());

    assert_eq!(xml, format_xml(&package));
}

#[test]
fn unknown_entities_survive_a_round_trip() {
    let xml = "<?xml version='1.0'?><greeting>a&copy;b</greeting>";
    let package = reader::parse(xml).expect("Not parsed");
    let doc = package.as_document();

    let greeting = doc.root().root_element().expect("No root element");
    assert_eq!("ab", greeting.string_value());

    assert_eq!(xml, format_xml(&package));
}

#[test]
fn a_doc_type_round_trips() {
    let xml = "<?xml version='1.0'?><!DOCTYPE shelf SYSTEM 'shelf.dtd'><shelf/>";
    let package = reader::parse(xml).expect("Not parsed");
    let doc = package.as_document();

    let doc_type = doc.root().doc_type().expect("No document type");
    assert_eq!("shelf", doc_type.name());
    assert_eq!(Some("shelf.dtd"), doc_type.system_id());

    assert_eq!(xml, format_xml(&package));
}

#[test]
fn an_attribute_cannot_be_shared_between_elements() {
    let package = reader::parse("<?xml version='1.0'?><pair><a k='v'/><b/></pair>")
        .expect("Not parsed");
    let doc = package.as_document();
    let pair = doc.root().root_element().expect("No root element");
    let a = pair.element("a").expect("No a");
    let b = pair.element("b").expect("No b");
    let attribute = a.attribute("k").expect("No attribute");

    let e = b.add_attribute(attribute).expect_err("Added a shared attribute");
    assert!(e.is_illegal_add());
    assert_eq!(Some(a), attribute.parent());
    assert_eq!(Some("v"), a.attribute_value("k"));
    assert_eq!(0, b.attribute_count());
}

#[test]
fn a_subtree_moves_only_after_detach() {
    let package = reader::parse(
        "<?xml version='1.0'?><shelf><old><book/></old><new/></shelf>",
    )
    .expect("Not parsed");
    let doc = package.as_document();
    let shelf = doc.root().root_element().expect("No root element");
    let old = shelf.element("old").expect("No old");
    let new = shelf.element("new").expect("No new");
    let book = old.element("book").expect("No book");

    let e = new.append_child(book).expect_err("Added an owned node");
    assert!(e.is_illegal_add());

    book.detach();
    new.append_child(book).expect("Not moved");

    assert_eq!(
        "<?xml version='1.0'?><shelf><old/><new><book/></new></shelf>",
        format_xml(&package)
    );
}

#[test]
fn processing_instruction_values_parse_from_the_wire() {
    let package = reader::parse(
        "<?xml version='1.0'?><doc><?xml-stylesheet href='a.css' type='text/css'?></doc>",
    )
    .expect("Not parsed");
    let doc = package.as_document();
    let root_element = doc.root().root_element().expect("No root element");
    let pi = match root_element.children()[0] {
        ChildOfElement::ProcessingInstruction(pi) => pi,
        _ => panic!("Not a processing instruction"),
    };

    assert_eq!("xml-stylesheet", pi.target());
    assert_eq!(vec![("href", "a.css"), ("type", "text/css")], pi.values());
}

#[test]
fn a_document_built_by_hand_writes_out() {
    let package = Package::new();
    let doc = package.as_document();
    let ns = doc.namespace("b", "urn:books").expect("Bad namespace");
    let shelf = doc.create_element(doc.qname_with_namespace("shelf", ns).expect("Bad name"));
    doc.root().append_child(shelf).expect("Not appended");
    let book = shelf.add_element(doc.qname_with_namespace("book", ns).expect("Bad name"));
    book.set_attribute_value(doc.qname("id").expect("Bad name"), "42");
    book.add_text("Ada");

    assert_eq!(
        "<?xml version='1.0'?>\
         <b:shelf xmlns:b='urn:books'><b:book id='42'>Ada</b:book></b:shelf>",
        format_xml(&package)
    );
}
