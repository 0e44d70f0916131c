//! Construction of `invoke` input documents
//!
//! Every document is rooted in the namespace of the invoked class and
//! declares the same three prefixes:
//!
//! - `p`: the resource class (method input and its properties)
//! - `a`: WS-Addressing (`Address`, `ReferenceParameters`)
//! - `x`: WS-Management XSD (`ResourceURI`, `SelectorSet`, `Selector`)

use xmltree::{Element, XMLNode};

use crate::error::Result;
use crate::resource::{
    BOOT_CONFIGURATION_INSTANCE, CIM_BOOT_CONFIG_SETTING, CIM_BOOT_SERVICE,
    CIM_BOOT_SOURCE_SETTING, CIM_COMPUTER_SYSTEM, CIM_POWER_MANAGEMENT_SERVICE,
    FORCE_PXE_BOOT_SOURCE, MANAGED_SYSTEM, ResourceClass, Selector, ns,
};

const RESOURCE_PREFIX: &str = "p";
const ADDRESSING_PREFIX: &str = "a";
const WSMAN_PREFIX: &str = "x";

fn prefixed(prefix: &str, name: &str) -> Element {
    Element::new(&format!("{}:{}", prefix, name))
}

fn text_element(prefix: &str, name: &str, text: &str) -> Element {
    let mut elem = prefixed(prefix, name);
    elem.children.push(XMLNode::Text(text.to_string()));
    elem
}

/// Root `<p:{method}_INPUT>` element carrying the namespace declarations
fn input_root(resource: &ResourceClass, method: &str) -> Element {
    let mut root = prefixed(RESOURCE_PREFIX, &format!("{}_INPUT", method));
    root.attributes
        .insert(format!("xmlns:{}", RESOURCE_PREFIX), resource.uri());
    root.attributes
        .insert(format!("xmlns:{}", ADDRESSING_PREFIX), ns::ADDRESSING.to_string());
    root.attributes
        .insert(format!("xmlns:{}", WSMAN_PREFIX), ns::WSMAN_XSD.to_string());
    root
}

/// Endpoint reference pointing at one instance of `target`
///
/// ```xml
/// <p:{parent}>
///   <a:Address>{address}</a:Address>
///   <a:ReferenceParameters>
///     <x:ResourceURI>{target uri}</x:ResourceURI>
///     <x:SelectorSet>
///       <x:Selector Name="{name}">{value}</x:Selector>
///     </x:SelectorSet>
///   </a:ReferenceParameters>
/// </p:{parent}>
/// ```
pub fn endpoint_reference(
    parent: &str,
    address: &str,
    target: &ResourceClass,
    selectors: &[Selector],
) -> Element {
    let mut selector_set = prefixed(WSMAN_PREFIX, "SelectorSet");
    for selector in selectors {
        let mut elem = text_element(WSMAN_PREFIX, "Selector", selector.value);
        elem.attributes
            .insert("Name".to_string(), selector.name.to_string());
        selector_set.children.push(XMLNode::Element(elem));
    }

    let mut reference_parameters = prefixed(ADDRESSING_PREFIX, "ReferenceParameters");
    reference_parameters
        .children
        .push(XMLNode::Element(text_element(
            WSMAN_PREFIX,
            "ResourceURI",
            &target.uri(),
        )));
    reference_parameters
        .children
        .push(XMLNode::Element(selector_set));

    let mut reference = prefixed(RESOURCE_PREFIX, parent);
    reference
        .children
        .push(XMLNode::Element(text_element(ADDRESSING_PREFIX, "Address", address)));
    reference
        .children
        .push(XMLNode::Element(reference_parameters));
    reference
}

/// `RequestPowerStateChange_INPUT` targeting the managed computer system
///
/// `power_state` must already be a resolved wire code.
pub fn power_state_change(address: &str, power_state: &str) -> Element {
    let mut root = input_root(&CIM_POWER_MANAGEMENT_SERVICE, "RequestPowerStateChange");
    root.children
        .push(XMLNode::Element(text_element(RESOURCE_PREFIX, "PowerState", power_state)));
    root.children.push(XMLNode::Element(endpoint_reference(
        "ManagedElement",
        address,
        &CIM_COMPUTER_SYSTEM,
        &[MANAGED_SYSTEM],
    )));
    root
}

/// `ChangeBootOrder_INPUT` with the "Force PXE Boot" source as sole entry
pub fn boot_order_change(address: &str) -> Element {
    let mut root = input_root(&CIM_BOOT_CONFIG_SETTING, "ChangeBootOrder");
    root.children.push(XMLNode::Element(endpoint_reference(
        "Source",
        address,
        &CIM_BOOT_SOURCE_SETTING,
        &[FORCE_PXE_BOOT_SOURCE],
    )));
    root
}

/// `SetBootConfigRole_INPUT` for the AMT boot configuration
///
/// `role` must already be a resolved wire code.
pub fn boot_config_role_change(address: &str, role: &str) -> Element {
    let mut root = input_root(&CIM_BOOT_SERVICE, "SetBootConfigRole");
    root.children.push(XMLNode::Element(endpoint_reference(
        "BootConfigSetting",
        address,
        &CIM_BOOT_CONFIG_SETTING,
        &[BOOT_CONFIGURATION_INSTANCE],
    )));
    root.children
        .push(XMLNode::Element(text_element(RESOURCE_PREFIX, "Role", role)));
    root
}

/// Serializes a request document for the gateway's textual input
pub fn to_xml(document: &Element) -> Result<String> {
    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(true)
        .indent_string("  ");
    document.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
