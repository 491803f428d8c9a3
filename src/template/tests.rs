//! End-to-end tests: build a package, load it, render it, read it back.
use super::*;
use crate::common::{Error, Location};
use crate::ooxml::docx::scaffold::DocxBuilder;
use crate::ooxml::docx::xml::{XmlDocument, XmlElement};
use crate::ooxml::opc::{OpcPackage, PackURI};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

const DOCUMENT: &str = "word/document.xml";

fn load(builder: DocxBuilder) -> Template {
    Template::from_bytes(builder.build().unwrap()).unwrap()
}

fn template(body: &str) -> Template {
    load(DocxBuilder::new(body))
}

fn member(bytes: &[u8], name: &str) -> Vec<u8> {
    let pkg = OpcPackage::from_bytes(bytes.to_vec()).unwrap();
    pkg.blob_for(&PackURI::from_membername(name)).unwrap()
}

fn part_xml(output: &RenderOutput, name: &str) -> String {
    String::from_utf8(member(output.bytes(), name)).unwrap()
}

fn root(output: &RenderOutput, name: &str) -> XmlElement {
    XmlDocument::parse(&member(output.bytes(), name)).unwrap().root
}

/// Text of every paragraph in document order.
fn paragraphs(output: &RenderOutput) -> Vec<String> {
    fn visit(el: &XmlElement, out: &mut Vec<String>) {
        if el.is("p") {
            out.push(el.text());
            return;
        }
        for child in el.elements() {
            visit(child, out);
        }
    }
    let mut out = Vec::new();
    visit(&root(output, DOCUMENT), &mut out);
    out
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn items(skus: &[&str]) -> Value {
    Value::List(
        skus.iter()
            .enumerate()
            .map(|(i, sku)| Value::map([("sku", Value::from(*sku)), ("qty", Value::from(i + 1))]))
            .collect(),
    )
}

#[test]
fn test_untouched_members_survive() {
    let bytes = DocxBuilder::new("<w:p><w:r><w:t>No fields here</w:t></w:r></w:p>")
        .member("word/media/image1.png", vec![0x89, b'P', b'N', b'G'])
        .build()
        .unwrap();
    let template = Template::from_bytes(bytes.clone()).unwrap();
    assert_eq!(template.placeholder_count(), 0);

    let output = template.render(&Value::Null).unwrap();
    let original = OpcPackage::from_bytes(bytes.clone()).unwrap();
    let rendered = OpcPackage::from_bytes(output.bytes().to_vec()).unwrap();
    assert_eq!(original.member_names(), rendered.member_names());
    for name in original.member_names() {
        assert_eq!(member(&bytes, name), member(output.bytes(), name), "{name}");
    }
}

#[test]
fn test_scalar_substitution() {
    let template = template(r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">Hello {{name}}!</w:t></w:r></w:p>"#);
    let output = template.render(&Value::map([("name", Value::from("Ada"))])).unwrap();

    assert_eq!(paragraphs(&output), ["Hello Ada!"]);
    let xml = part_xml(&output, DOCUMENT);
    assert_eq!(count(&xml, "<w:i/>"), 3, "{xml}");
    assert!(xml.contains(r#"<w:t xml:space="preserve">Hello </w:t>"#));
}

#[test]
fn test_split_run_placeholder_takes_first_run_format() {
    let template = template(concat!(
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{{na</w:t></w:r>"#,
        r#"<w:proofErr w:type="spellStart"/>"#,
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t>me}}</w:t></w:r></w:p>"#
    ));
    let output = template.render(&Value::map([("name", Value::from("Ada"))])).unwrap();

    assert_eq!(paragraphs(&output), ["Ada"]);
    let xml = part_xml(&output, DOCUMENT);
    assert!(xml.contains("<w:r><w:rPr><w:b/></w:rPr><w:t>Ada</w:t></w:r>"), "{xml}");
    assert!(!xml.contains("<w:i/>"));
    assert!(xml.contains("proofErr"));
}

const ITEM_TABLE: &str = concat!(
    r#"<w:tbl><w:tblPr/><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid>"#,
    r#"<w:tr><w:tc><w:p><w:r><w:t>SKU</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Qty</w:t></w:r></w:p></w:tc></w:tr>"#,
    r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}{{sku}}</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:t>{{qty}}{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
    r#"</w:tbl>"#
);

#[test]
fn test_row_expansion() {
    let template = template(ITEM_TABLE);

    let output = template.render(&Value::map([("items", items(&["A", "B", "C"]))])).unwrap();
    let xml = part_xml(&output, DOCUMENT);
    assert_eq!(count(&xml, "<w:tr>"), 4);
    assert_eq!(paragraphs(&output), ["SKU", "Qty", "A", "1", "B", "2", "C", "3"]);

    let output = template.render(&Value::map([("items", items(&[]))])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 1);

    // Absent behaves like empty outside strict mode
    let output = template.render(&Value::map::<&str, _>([])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 1);
}

#[test]
fn test_marker_rows_are_not_repeated() {
    let template = template(concat!(
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{@number}}: {{sku}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let output = template.render(&Value::map([("items", items(&["A", "B", "C"]))])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 3);
    assert_eq!(paragraphs(&output), ["1: A", "2: B", "3: C"]);
}

#[test]
fn test_table_without_rows_is_dropped() {
    let template = template(concat!(
        r#"<w:p><w:r><w:t>Items</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}{{sku}}{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let output = template.render(&Value::map([("items", items(&[]))])).unwrap();
    let xml = part_xml(&output, DOCUMENT);
    assert!(!xml.contains("<w:tbl>"), "{xml}");
    assert_eq!(paragraphs(&output), ["Items"]);
}

fn orders() -> Value {
    let lines = |names: &[&str]| {
        Value::List(names.iter().map(|n| Value::map([("name", Value::from(*n))])).collect())
    };
    Value::map([(
        "orders",
        Value::List(vec![
            Value::map([("lines", lines(&["A", "B"]))]),
            Value::map([("lines", lines(&["C"]))]),
        ]),
    )])
}

#[test]
fn test_nested_blocks_sharing_delimiter_paragraphs() {
    let body = concat!(
        r#"<w:p><w:r><w:t>{{#orders}}{{#lines}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{name}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{/lines}}{{/orders}}</w:t></w:r></w:p>"#
    );
    let output = template(body).render(&orders()).unwrap();
    assert_eq!(paragraphs(&output), ["A", "B", "C"]);

    let bytes = DocxBuilder::new(body).build().unwrap();
    let strict = Template::from_bytes_with_options(bytes, TemplateOptions::new().with_strict(true)).unwrap();
    assert_eq!(paragraphs(&strict.render(&orders()).unwrap()), ["A", "B", "C"]);
}

#[test]
fn test_nested_blocks_sharing_delimiter_rows() {
    let template = template(concat!(
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#orders}}{{#lines}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{name}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{/lines}}{{/orders}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let output = template.render(&orders()).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 3);
    assert_eq!(paragraphs(&output), ["A", "B", "C"]);
}

#[test]
fn test_block_in_one_cell_repeats_its_row() {
    let template = template(concat!(
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>SKU</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}{{sku}}{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let output = template.render(&Value::map([("items", items(&["A", "B", "C"]))])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 4);
    assert_eq!(paragraphs(&output), ["SKU", "A", "B", "C"]);

    let output = template.render(&Value::map([("items", items(&[]))])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 1);
    assert_eq!(paragraphs(&output), ["SKU"]);
}

#[test]
fn test_block_sharing_its_cell_repeats_inline() {
    let template = template(concat!(
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t xml:space="preserve">SKUs: {{#items}}{{sku}},{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}{{sku}}{{/items}}</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>end</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let output = template.render(&Value::map([("items", items(&["A", "B", "C"]))])).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 2);
    assert_eq!(paragraphs(&output), ["SKUs: A,B,C,", "ABC", "end"]);
}

#[test]
fn test_inline_block_inside_row_block() {
    let template = template(concat!(
        r#"<w:tbl><w:tblPr/>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>{{#items}}{{sku}}:{{#tags}}{{.}}{{/tags}}{{/items}}</w:t></w:r></w:p></w:tc></w:tr>"#,
        r#"</w:tbl>"#
    ));
    let data = Value::map([(
        "items",
        Value::List(vec![
            Value::map([("sku", Value::from("A")), ("tags", Value::from(vec!["x", "y"]))]),
            Value::map([("sku", Value::from("B")), ("tags", Value::from(vec!["z"]))]),
        ]),
    )]);
    let output = template.render(&data).unwrap();
    assert_eq!(count(&part_xml(&output, DOCUMENT), "<w:tr>"), 2);
    assert_eq!(paragraphs(&output), ["A:xy", "B:z"]);
}

#[test]
fn test_strict_mode_names_the_path() {
    let body = r#"<w:p><w:r><w:t>Phone: {{invoice.customer.phone}}</w:t></w:r></w:p>"#;
    let data = Value::map([(
        "invoice",
        Value::map([("customer", Value::map([("name", Value::from("Ada"))]))]),
    )]);

    let lenient = template(body);
    assert_eq!(paragraphs(&lenient.render(&data).unwrap()), ["Phone: "]);

    let bytes = DocxBuilder::new(body).build().unwrap();
    let strict = Template::from_bytes_with_options(bytes, TemplateOptions::new().with_strict(true)).unwrap();
    match strict.render(&data) {
        Err(Error::UnresolvedPath { path, location, .. }) => {
            assert_eq!(path, "invoice.customer.phone");
            assert_eq!(location, Location::paragraph(DOCUMENT, 1));
        },
        other => panic!("expected an unresolved path, got {other:?}"),
    }
}

#[test]
fn test_printf_format() {
    let template = template(r#"<w:p><w:r><w:t>Total: {{total | %.2f}}</w:t></w:r></w:p>"#);
    for total in [Value::Decimal(Decimal::new(15000, 2)), Value::Float(150.0), Value::Int(150)] {
        let output = template.render(&Value::map([("total", total)])).unwrap();
        assert_eq!(paragraphs(&output), ["Total: 150.00"]);
    }
}

#[test]
fn test_invalid_format_fails_at_load() {
    let bytes = DocxBuilder::new(r#"<w:p/><w:p><w:r><w:t>{{total | %.2q}}</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    match Template::from_bytes(bytes) {
        Err(Error::Format { token, spec, location, .. }) => {
            assert_eq!(token, "{{total | %.2q}}");
            assert_eq!(spec, "%.2q");
            assert_eq!(location, Location::paragraph(DOCUMENT, 2));
        },
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn test_template_defects_fail_at_load() {
    let unmatched = DocxBuilder::new(r#"<w:p><w:r><w:t>{{#items}}{{sku}}</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    assert!(matches!(Template::from_bytes(unmatched), Err(Error::UnmatchedBlock { .. })));

    let overlapping = DocxBuilder::new(r#"<w:p><w:r><w:t>{{#a}}{{#b}}{{/a}}{{/b}}</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    assert!(matches!(Template::from_bytes(overlapping), Err(Error::MalformedTemplate { .. })));

    let unterminated = DocxBuilder::new(r#"<w:p><w:r><w:t>{{name</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    assert!(matches!(Template::from_bytes(unterminated), Err(Error::MalformedTemplate { .. })));
}

#[test]
fn test_package_errors() {
    assert!(matches!(Template::from_bytes(b"not a zip".to_vec()), Err(Error::Package(_))));

    let bytes = DocxBuilder::new("<w:p/>").without_document().build().unwrap();
    assert!(matches!(Template::from_bytes(bytes), Err(Error::Package(_))));

    let bytes = DocxBuilder::new("<w:p>").build().unwrap();
    match Template::from_bytes(bytes) {
        Err(Error::MalformedTemplate { location, .. }) => assert_eq!(location.part, DOCUMENT),
        other => panic!("expected malformed XML, got {other:?}"),
    }
}

#[test]
fn test_invalid_options() {
    let bytes = DocxBuilder::new("<w:p/>").build().unwrap();
    let options = TemplateOptions::new().with_delimiters("", "}}");
    assert!(matches!(
        Template::from_bytes_with_options(bytes, options),
        Err(Error::InvalidOptions(_))
    ));
}

#[test]
fn test_custom_delimiters() {
    let bytes = DocxBuilder::new(r#"<w:p><w:r><w:t>{{kept}} [[name]]</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    let template =
        Template::from_bytes_with_options(bytes, TemplateOptions::new().with_delimiters("[[", "]]")).unwrap();
    let output = template.render(&Value::map([("name", Value::from("Ada"))])).unwrap();
    assert_eq!(paragraphs(&output), ["{{kept}} Ada"]);
}

#[test]
fn test_deterministic_output() {
    let template = template(ITEM_TABLE);
    let data = Value::map([("items", items(&["A", "B"]))]);
    let first = template.render(&data).unwrap();
    let second = template.render(&data).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_headers_and_footers() {
    let template = load(
        DocxBuilder::new(r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#)
            .header(r#"<w:p><w:r><w:t>{{company}}</w:t></w:r></w:p>"#)
            .footer(r#"<w:p><w:r><w:t>Page footer</w:t></w:r></w:p>"#),
    );
    assert_eq!(template.templated_parts().collect::<Vec<_>>(), ["word/header1.xml"]);

    let template_bytes = DocxBuilder::new(r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#)
        .header(r#"<w:p><w:r><w:t>{{company}}</w:t></w:r></w:p>"#)
        .footer(r#"<w:p><w:r><w:t>Page footer</w:t></w:r></w:p>"#)
        .build()
        .unwrap();
    let output = template.render(&Value::map([("company", Value::from("ACME"))])).unwrap();
    assert_eq!(root(&output, "word/header1.xml").text(), "ACME");
    assert_eq!(member(output.bytes(), DOCUMENT), member(&template_bytes, DOCUMENT));
    assert_eq!(
        member(output.bytes(), "word/footer1.xml"),
        member(&template_bytes, "word/footer1.xml")
    );
}

#[test]
fn test_nested_blocks_and_scope_fallback() {
    let template = template(concat!(
        r#"<w:p><w:r><w:t>{{#groups}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{name}}:{{#members}} {{.}}{{unit}}{{/members}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{/groups}}</w:t></w:r></w:p>"#
    ));
    let data = Value::map([
        ("unit", Value::from("!")),
        (
            "groups",
            Value::List(vec![
                Value::map([("name", Value::from("A")), ("members", Value::from(vec!["x", "y"]))]),
                Value::map([("name", Value::from("B")), ("members", Value::List(vec![]))]),
            ]),
        ),
    ]);
    let output = template.render(&data).unwrap();
    assert_eq!(paragraphs(&output), ["A: x! y!", "B:"]);
}

#[test]
fn test_conditional_and_map_blocks() {
    let template = template(concat!(
        r#"<w:p><w:r><w:t>{{#paid}}PAID{{/paid}}{{#customer}}{{name}}{{/customer}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{paid | Yes/No}}</w:t></w:r></w:p>"#
    ));
    let data = Value::map([
        ("paid", Value::Bool(true)),
        ("customer", Value::map([("name", Value::from(" Ada"))])),
    ]);
    assert_eq!(paragraphs(&template.render(&data).unwrap()), ["PAID Ada", "Yes"]);

    let data = Value::map([("paid", Value::Bool(false))]);
    assert_eq!(paragraphs(&template.render(&data).unwrap()), ["", "No"]);
}

#[test]
fn test_type_mismatch() {
    let template = template(r#"<w:p><w:r><w:t>{{items}}</w:t></w:r></w:p>"#);
    let result = template.render(&Value::map([("items", items(&["A"]))]));
    match result {
        Err(Error::TypeMismatch { token, .. }) => assert_eq!(token, "{{items}}"),
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[test]
fn test_records_and_serialize() {
    struct Customer {
        name: String,
        since: chrono::NaiveDate,
    }
    let template = template(r#"<w:p><w:r><w:t>{{customer.name}} since {{customer.since | MMMM yyyy}}</w:t></w:r></w:p>"#);

    let accessors = Arc::new(
        Accessors::new()
            .field("name", |c: &Customer| c.name.as_str().into())
            .field("since", |c: &Customer| c.since.into()),
    );
    let customer = Customer {
        name: "Ada".to_string(),
        since: chrono::NaiveDate::from_ymd_opt(2021, 3, 14).unwrap(),
    };
    let data = Value::map([("customer", Value::from(Record::new(customer, accessors)))]);
    assert_eq!(paragraphs(&template.render(&data).unwrap()), ["Ada since March 2021"]);

    #[derive(Serialize)]
    struct Invoice {
        customer: SerCustomer,
    }
    #[derive(Serialize)]
    struct SerCustomer {
        name: &'static str,
        since: chrono::NaiveDate,
    }
    let invoice = Invoice {
        customer: SerCustomer {
            name: "Grace",
            since: chrono::NaiveDate::from_ymd_opt(1952, 5, 1).unwrap(),
        },
    };
    let output = template.render_serialize(&invoice).unwrap();
    assert_eq!(paragraphs(&output), ["Grace since May 1952"]);
}

#[test]
fn test_duplicated_drawings_get_unique_ids() {
    let template = template(concat!(
        r#"<w:p><w:r><w:t>{{#items}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="4" name="Logo"/></wp:inline></w:drawing></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{/items}}</w:t></w:r></w:p>"#
    ));
    let output = template.render(&Value::map([("items", items(&["A", "B", "C"]))])).unwrap();

    fn ids(el: &XmlElement, out: &mut Vec<String>) {
        if el.is("docPr")
            && let Some(id) = el.attr("id")
        {
            out.push(id.to_string());
        }
        for child in el.elements() {
            ids(child, out);
        }
    }
    let mut found = Vec::new();
    ids(&root(&output, DOCUMENT), &mut found);
    assert_eq!(found, ["4", "5", "6"]);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.docx");
    let target = dir.path().join("out.docx");
    std::fs::write(
        &source,
        DocxBuilder::new(r#"<w:p><w:r><w:t>{{name}}</w:t></w:r></w:p>"#).build().unwrap(),
    )
    .unwrap();

    let template = Template::from_file(&source).unwrap();
    let output = template.render(&Value::map([("name", Value::from("Ada"))])).unwrap();
    output.write_to_file(&target).unwrap();

    let reloaded = Template::from_reader(std::fs::File::open(&target).unwrap()).unwrap();
    assert_eq!(reloaded.placeholder_count(), 0);
    assert_eq!(std::fs::read(&target).unwrap(), output.into_bytes());

    assert!(matches!(Template::from_file(dir.path().join("missing.docx")), Err(Error::Io(_))));
}

#[test]
fn test_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Template>();

    let template = Arc::new(template(r#"<w:p><w:r><w:t>{{name}}</w:t></w:r></w:p>"#));
    std::thread::scope(|s| {
        let handles: Vec<_> = ["Ada", "Grace", "Barbara"]
            .into_iter()
            .map(|name| {
                let template = Arc::clone(&template);
                s.spawn(move || {
                    let output = template.render(&Value::map([("name", Value::from(name))])).unwrap();
                    (name, paragraphs(&output))
                })
            })
            .collect();
        for handle in handles {
            let (name, paragraphs) = handle.join().unwrap();
            assert_eq!(paragraphs, [name]);
        }
    });
}

#[test]
fn test_parallel_render_matches_sequential() {
    let builder = DocxBuilder::new(ITEM_TABLE)
        .header(r#"<w:p><w:r><w:t>{{company}}</w:t></w:r></w:p>"#)
        .footer(r#"<w:p><w:r><w:t>{{company | upper}}</w:t></w:r></w:p>"#);
    let bytes = builder.build().unwrap();
    let data = Value::map([("company", Value::from("acme")), ("items", items(&["A", "B"]))]);

    let sequential = Template::from_bytes(bytes.clone()).unwrap().render(&data).unwrap();
    let parallel = Template::from_bytes_with_options(bytes, TemplateOptions::new().with_parallel(true))
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(root(&parallel, "word/footer1.xml").text(), "ACME");
}
