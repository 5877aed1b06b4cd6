// gstore: Rust client for signed REST object storage
// Copyright 2025 The gstore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! XML helpers shared by the document types.
//!
//! Reading is deliberately loose: elements are looked up by tag name
//! anywhere below a node, and a missing element reads as an empty string.
//! When a tag occurs more than once the last occurrence wins.

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::gs::error::Error;

/// Parses a response body into its root element.
pub fn parse_document(body: &[u8]) -> Result<Element, Error> {
    Ok(Element::parse(body)?)
}

/// All elements named `tag` strictly below `element`, in document order.
pub fn elements_by_tag_name<'a>(element: &'a Element, tag: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_descendants(element, tag, &mut found);
    found
}

/// Like [`elements_by_tag_name`], but searching a whole document, so the
/// root itself may match.
pub fn document_elements_by_tag_name<'a>(root: &'a Element, tag: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    if root.name == tag {
        found.push(root);
    }
    collect_descendants(root, tag, &mut found);
    found
}

fn collect_descendants<'a>(element: &'a Element, tag: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if let XMLNode::Element(e) = child {
            if e.name == tag {
                found.push(e);
            }
            collect_descendants(e, tag, found);
        }
    }
}

/// Text of the last child node of the last element in `elements`.
///
/// Returns an empty string when there are no elements, when the last one has
/// no children, or when its last child is not text.
pub fn value_from_elems(elements: &[&Element]) -> String {
    match elements.last().and_then(|e| e.children.last()) {
        Some(XMLNode::Text(s)) | Some(XMLNode::CData(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Text of the first child node of `element`, or empty.
pub fn first_text(element: &Element) -> String {
    match element.children.first() {
        Some(XMLNode::Text(s)) | Some(XMLNode::CData(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Value of attribute `name`, or empty when absent.
pub fn attribute(element: &Element, name: &str) -> String {
    element.attributes.get(name).cloned().unwrap_or_default()
}

/// Appends `child` below `parent`.
pub fn push_child(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}

/// Appends `<name>value</name>` below `parent` unless `value` is empty.
pub fn push_text_child(parent: &mut Element, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let mut child = Element::new(name);
    child.children.push(XMLNode::Text(value.to_string()));
    push_child(parent, child);
}

/// Serializes `root` as a document, on one line or indented by two spaces
/// per level. Empty elements are written self-closing.
pub fn write_document(root: &Element, pretty: bool) -> Result<String, Error> {
    let config = EmitterConfig::new()
        .perform_indent(pretty)
        .pad_self_closing(false);
    let mut data = Vec::new();
    root.write_with_config(&mut data, config)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}
