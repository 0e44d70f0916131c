//! Parsing of WS-Management responses

use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};
use xmltree::{Element, XMLNode};

use crate::codes::CodeTable;
use crate::error::{Result, WsmanError};
use crate::resource::ns;

const UNKNOWN_FAULT: &str = "Unknown error";

/// Outcome of an `invoke`: the `ReturnValue` code and its meaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagementResult {
    pub code: String,
    pub status: &'static str,
}

impl ManagementResult {
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }
}

impl fmt::Display for ManagementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status)
    }
}

/// A parsed response document
///
/// Construction fails on SOAP faults, so a `WsmanResponse` always holds a
/// regular answer. Lookups are namespace qualified: the prefixes chosen by
/// the device are irrelevant.
#[derive(Debug, Clone)]
pub struct WsmanResponse {
    root: Element,
}

impl WsmanResponse {
    /// Parses raw response text and surfaces SOAP faults
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(WsmanError::Transport("empty response".to_string()));
        }
        trace!(response = raw, "Parsing WS-Management response");

        let root = Element::parse(raw.as_bytes())?;
        if let Some(reason) = fault_reason(&root) {
            debug!(reason = %reason, "SOAP fault in response");
            return Err(WsmanError::RemoteFault(reason));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element named `name` in namespace `namespace`, document order
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Element> {
        find_descendant(&self.root, namespace, name)
    }

    pub fn find_all(&self, namespace: &str, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(&self.root, namespace, name, &mut found);
        found
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.find(namespace, name).is_some()
    }

    /// Trimmed text of the first match; `None` if absent or empty
    pub fn find_text(&self, namespace: &str, name: &str) -> Option<String> {
        self.find(namespace, name).and_then(element_text)
    }

    /// Trimmed text of every match, empty elements yield `""`
    pub fn find_all_text(&self, namespace: &str, name: &str) -> Vec<String> {
        self.find_all(namespace, name)
            .into_iter()
            .map(|elem| element_text(elem).unwrap_or_default())
            .collect()
    }

    pub fn require_text(&self, namespace: &str, name: &str) -> Result<String> {
        self.find_text(namespace, name)
            .ok_or_else(|| WsmanError::missing_field(name))
    }

    /// Resolves `ReturnValue` through `table`
    pub fn return_value(&self, namespace: &str, table: &CodeTable) -> Result<ManagementResult> {
        let code = self.require_text(namespace, "ReturnValue")?;
        let status = table.forward(&code)?;
        Ok(ManagementResult { code, status })
    }
}

fn element_text(elem: &Element) -> Option<String> {
    elem.get_text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn matches(elem: &Element, namespace: &str, name: &str) -> bool {
    elem.name == name && elem.namespace.as_deref() == Some(namespace)
}

fn child_elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(|node| match node {
        XMLNode::Element(elem) => Some(elem),
        _ => None,
    })
}

fn find_descendant<'a>(root: &'a Element, namespace: &str, name: &str) -> Option<&'a Element> {
    if matches(root, namespace, name) {
        return Some(root);
    }
    child_elements(root).find_map(|child| find_descendant(child, namespace, name))
}

fn collect_descendants<'a>(
    root: &'a Element,
    namespace: &str,
    name: &str,
    found: &mut Vec<&'a Element>,
) {
    if matches(root, namespace, name) {
        found.push(root);
    }
    for child in child_elements(root) {
        collect_descendants(child, namespace, name, found);
    }
}

/// Reason of a SOAP 1.2 fault, if the document carries one
fn fault_reason(root: &Element) -> Option<String> {
    let fault = find_descendant(root, ns::SOAP_ENVELOPE, "Fault")?;
    let reason = find_descendant(fault, ns::SOAP_ENVELOPE, "Reason")
        .and_then(|reason| find_descendant(reason, ns::SOAP_ENVELOPE, "Text"))
        .and_then(element_text)
        .unwrap_or_else(|| UNKNOWN_FAULT.to_string());
    Some(reason)
}
