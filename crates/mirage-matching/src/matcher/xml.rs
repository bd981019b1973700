//! XML structural matchers: `xml` equality and `xpath` selection.

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::parser;
use sxd_xpath::evaluate_xpath;

/// Structural XML equality: both sides must parse, and their root elements
/// must agree on names, attribute sets and (whitespace-normalized) text, with
/// child elements compared recursively in document order. Formatting
/// differences between pattern and body are irrelevant.
pub(super) fn xml_equals(actual: &str, pattern: &str) -> bool {
    let (Ok(actual), Ok(pattern)) = (parser::parse(actual), parser::parse(pattern)) else {
        return false;
    };

    let actual = actual.as_document();
    let pattern = pattern.as_document();
    match (root_element(&actual), root_element(&pattern)) {
        (Some(actual), Some(pattern)) => elements_equal(actual, pattern),
        _ => false,
    }
}

/// True when the XPath expression selects something in the body: a non-empty
/// node-set, a true boolean or a non-empty string. Numeric results always
/// count as a selection. Unparseable bodies and invalid expressions never
/// match.
pub(super) fn xpath_selects(actual: &str, expression: &str) -> bool {
    let Ok(package) = parser::parse(actual) else {
        return false;
    };
    let document = package.as_document();

    match evaluate_xpath(&document, expression) {
        Ok(sxd_xpath::Value::Nodeset(nodes)) => nodes.size() > 0,
        Ok(sxd_xpath::Value::Boolean(value)) => value,
        Ok(sxd_xpath::Value::String(value)) => !value.is_empty(),
        Ok(sxd_xpath::Value::Number(_)) => true,
        Err(_) => false,
    }
}

fn root_element<'d>(document: &Document<'d>) -> Option<Element<'d>> {
    document.root().children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(element) => Some(element),
        _ => None,
    })
}

fn elements_equal(a: Element<'_>, b: Element<'_>) -> bool {
    if a.name().local_part() != b.name().local_part()
        || a.name().namespace_uri() != b.name().namespace_uri()
    {
        return false;
    }
    if attribute_set(a) != attribute_set(b) {
        return false;
    }
    if normalized_text(a) != normalized_text(b) {
        return false;
    }

    let a_children = child_elements(a);
    let b_children = child_elements(b);
    a_children.len() == b_children.len()
        && a_children
            .into_iter()
            .zip(b_children)
            .all(|(a, b)| elements_equal(a, b))
}

fn attribute_set(element: Element<'_>) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = element
        .attributes()
        .iter()
        .map(|attribute| {
            (
                attribute.name().local_part().to_string(),
                attribute.value().to_string(),
            )
        })
        .collect();
    attributes.sort();
    attributes
}

fn child_elements(element: Element<'_>) -> Vec<Element<'_>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

fn normalized_text(element: Element<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let ChildOfElement::Text(node) = child {
            text.push_str(node.text());
            text.push(' ');
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_equals_ignores_formatting() {
        let pattern = "<order><id>1</id><total>9.99</total></order>";
        let actual = "<order>\n    <id>1</id>\n    <total>9.99</total>\n</order>";
        assert!(xml_equals(actual, pattern));
    }

    #[test]
    fn test_xml_equals_ignores_attribute_order() {
        assert!(xml_equals(
            r#"<item b="2" a="1"/>"#,
            r#"<item a="1" b="2"/>"#
        ));
        assert!(!xml_equals(r#"<item a="1"/>"#, r#"<item a="2"/>"#));
    }

    #[test]
    fn test_xml_equals_compares_text_and_structure() {
        assert!(!xml_equals("<a>one</a>", "<a>two</a>"));
        assert!(!xml_equals("<a><b/></a>", "<a><b/><c/></a>"));
        assert!(!xml_equals("<a/>", "<b/>"));
    }

    #[test]
    fn test_xml_equals_rejects_unparseable_input() {
        assert!(!xml_equals("not xml", "<a/>"));
        assert!(!xml_equals("<a/>", "not xml"));
    }

    #[test]
    fn test_xpath_selects_elements_and_attributes() {
        let xml = r#"<root><item id="123">Content</item></root>"#;
        assert!(xpath_selects(xml, "/root/item"));
        assert!(xpath_selects(xml, "/root/item/@id"));
        assert!(xpath_selects(xml, "//item"));
        assert!(!xpath_selects(xml, "/root/missing"));
    }

    #[test]
    fn test_xpath_boolean_and_string_results() {
        let xml = "<root><count>3</count></root>";
        assert!(xpath_selects(xml, "/root/count = 3"));
        assert!(!xpath_selects(xml, "/root/count = 4"));
        assert!(xpath_selects(xml, "string(/root/count)"));
    }

    #[test]
    fn test_xpath_invalid_input_never_matches() {
        assert!(!xpath_selects("not xml", "/root"));
        assert!(!xpath_selects("<root/>", "///"));
    }
}
