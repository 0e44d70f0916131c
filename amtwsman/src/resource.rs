//! Schema namespaces, resource classes and instance selectors

use std::fmt;

/// XML namespaces of the WS-Management protocol itself
pub mod ns {
    pub const AMT_SCHEMA: &str = "http://intel.com/wbem/wscim/1/amt-schema/1";
    pub const CIM_SCHEMA: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2";
    pub const IPS_SCHEMA: &str = "http://intel.com/wbem/wscim/1/ips-schema/1";

    pub const WSMAN_XSD: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
    pub const ADDRESSING: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
    pub const SOAP_ENVELOPE: &str = "http://www.w3.org/2003/05/soap-envelope";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Amt,
    Cim,
    Ips,
}

impl Schema {
    pub const fn root(&self) -> &'static str {
        match self {
            Schema::Amt => ns::AMT_SCHEMA,
            Schema::Cim => ns::CIM_SCHEMA,
            Schema::Ips => ns::IPS_SCHEMA,
        }
    }
}

/// A CIM / AMT / IPS class, identified by schema root and class name
///
/// The class URI is both the WS-Management resource URI and the XML
/// namespace of the properties the device returns for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceClass {
    schema: Schema,
    class: &'static str,
}

impl ResourceClass {
    pub const fn new(schema: Schema, class: &'static str) -> Self {
        Self { schema, class }
    }

    pub fn uri(&self) -> String {
        format!("{}/{}", self.schema.root(), self.class)
    }

    /// Resource URI addressing one instance, `<uri>?<key>=<value>`
    pub fn instance_uri(&self, selector: &Selector) -> String {
        format!("{}?{}", self.uri(), selector.to_query())
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

pub const AMT_BOOT_CAPABILITIES: ResourceClass =
    ResourceClass::new(Schema::Amt, "AMT_BootCapabilities");
pub const AMT_BOOT_SETTING_DATA: ResourceClass =
    ResourceClass::new(Schema::Amt, "AMT_BootSettingData");

pub const CIM_BOOT_CONFIG_SETTING: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_BootConfigSetting");
pub const CIM_BOOT_SOURCE_SETTING: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_BootSourceSetting");
pub const CIM_BOOT_SERVICE: ResourceClass = ResourceClass::new(Schema::Cim, "CIM_BootService");
pub const CIM_POWER_MANAGEMENT_SERVICE: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_PowerManagementService");
pub const CIM_POWER_MANAGEMENT_CAPABILITIES: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_PowerManagementCapabilities");
pub const CIM_ASSOCIATED_POWER_MANAGEMENT_SERVICE: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_AssociatedPowerManagementService");
pub const CIM_COMPUTER_SYSTEM: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_ComputerSystem");
pub const CIM_KVM_REDIRECTION_SAP: ResourceClass =
    ResourceClass::new(Schema::Cim, "CIM_KVMRedirectionSAP");

pub const IPS_KVM_REDIRECTION_SETTING_DATA: ResourceClass =
    ResourceClass::new(Schema::Ips, "IPS_KVMRedirectionSettingData");

/// A `Name=value` pair identifying one instance of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector {
    pub name: &'static str,
    pub value: &'static str,
}

impl Selector {
    pub const fn new(name: &'static str, value: &'static str) -> Self {
        Self { name, value }
    }

    /// Query form used in resource URIs; only spaces are escaped, the
    /// firmware expects `(r)` and `:` verbatim.
    pub fn to_query(&self) -> String {
        format!("{}={}", self.name, self.value.replace(' ', "%20"))
    }
}

pub const BOOT_SETTING_DATA_INSTANCE: Selector =
    Selector::new("InstanceID", "Intel(r) AMT:BootSettingData 0");
pub const BOOT_CONFIGURATION_INSTANCE: Selector =
    Selector::new("InstanceID", "Intel(r) AMT: Boot Configuration 0");
pub const FORCE_PXE_BOOT_SOURCE: Selector =
    Selector::new("InstanceID", "Intel(r) AMT: Force PXE Boot");
pub const BOOT_SERVICE_INSTANCE: Selector = Selector::new("Name", "Intel(r) AMT Boot Service");
pub const POWER_MANAGEMENT_SERVICE_INSTANCE: Selector =
    Selector::new("Name", "Intel(r) AMT Power Management Service");
pub const MANAGED_SYSTEM: Selector = Selector::new("Name", "ManagedSystem");
