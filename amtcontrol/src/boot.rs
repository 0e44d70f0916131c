use std::collections::BTreeMap;

use amtwsman::codes::{BOOT_CAPABILITIES, BOOT_CHANGE_RESULTS, BOOT_CONFIG_ROLES};
use amtwsman::request::{boot_config_role_change, boot_order_change, to_xml};
use amtwsman::resource::{
    AMT_BOOT_CAPABILITIES, AMT_BOOT_SETTING_DATA, BOOT_CONFIGURATION_INSTANCE,
    BOOT_SERVICE_INSTANCE, BOOT_SETTING_DATA_INSTANCE, CIM_BOOT_CONFIG_SETTING, CIM_BOOT_SERVICE,
};
use amtwsman::{ManagementResult, Result, WsmanCommand, WsmanError, WsmanGateway, WsmanResponse};
use serde::Serialize;
use tracing::{debug, info, warn};

/// AMT_BootSettingData values written when clearing the boot parameters
pub const BOOT_SETTING_DEFAULTS: &[(&str, &str)] = &[
    ("BIOSPause", "false"),
    ("BIOSSetup", "false"),
    ("BootMediaIndex", "0"),
    ("ConfigurationDataReset", "false"),
    ("EnforceSecureBoot", "false"),
    ("FirmwareVerbosity", "0"),
    ("ForcedProgressEvents", "false"),
    ("IDERBootDevice", "0"),
    ("LockKeyboard", "false"),
    ("LockPowerButton", "false"),
    ("LockResetButton", "false"),
    ("LockSleepButton", "false"),
    ("ReflashBIOS", "false"),
    ("SecureErase", "false"),
    ("UseIDER", "false"),
    ("UseSOL", "false"),
    ("UseSafeMode", "false"),
    ("UserPasswordBypass", "false"),
];

/// Boot parameters as reported by AMT_BootSettingData
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootParams {
    #[serde(rename = "InstanceID")]
    pub instance_id: String,
    #[serde(rename = "ElementName")]
    pub element_name: String,
    /// Known parameters present in the response, as raw strings
    #[serde(flatten)]
    pub settings: BTreeMap<String, String>,
}

impl BootParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.settings.get(name).map(String::as_str)
    }
}

/// Default template overlaid with `overrides`
///
/// Template keys keep their order, extra keys follow in map order.
pub fn merge_boot_settings(overrides: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = BOOT_SETTING_DEFAULTS
        .iter()
        .map(|(key, default)| {
            let value = overrides
                .get(*key)
                .cloned()
                .unwrap_or_else(|| default.to_string());
            (key.to_string(), value)
        })
        .collect();

    for (key, value) in overrides {
        if !BOOT_SETTING_DEFAULTS.iter().any(|(k, _)| *k == key.as_str()) {
            merged.push((key.clone(), value.clone()));
        }
    }
    merged
}

#[derive(Debug, Clone)]
pub struct BootController<G> {
    gateway: G,
}

impl<G: WsmanGateway> BootController<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Names of the AMT_BootCapabilities properties the device reports
    ///
    /// A property is listed as soon as it is present, its `true`/`false`
    /// value is not looked at.
    pub fn get_boot_capabilities(&self) -> Result<Vec<&'static str>> {
        let namespace = AMT_BOOT_CAPABILITIES.uri();
        let command = WsmanCommand::get(namespace.as_str());
        let response = WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;

        let mut capabilities = Vec::new();
        for capability in BOOT_CAPABILITIES {
            if response.contains(&namespace, capability) {
                response.require_text(&namespace, capability)?;
                capabilities.push(*capability);
            }
        }
        debug!(count = capabilities.len(), "Boot capabilities retrieved");
        Ok(capabilities)
    }

    pub fn get_boot_params(&self) -> Result<BootParams> {
        let command =
            WsmanCommand::get(AMT_BOOT_SETTING_DATA.instance_uri(&BOOT_SETTING_DATA_INSTANCE));
        parse_boot_params(&self.gateway.retrieve(&command)?)
    }

    /// Writes the default template overlaid with `overrides`
    pub fn set_boot_params(&self, overrides: &BTreeMap<String, String>) -> Result<BootParams> {
        if let Some(key) = overrides.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(WsmanError::invalid_argument(format!(
                "invalid boot parameter name '{}'",
                key
            )));
        }

        let command = merge_boot_settings(overrides).into_iter().fold(
            WsmanCommand::put(AMT_BOOT_SETTING_DATA.instance_uri(&BOOT_SETTING_DATA_INSTANCE)),
            |command, (key, value)| command.key_value(&key, value),
        );

        let params = parse_boot_params(&self.gateway.retrieve(&command)?)?;
        info!(overrides = overrides.len(), "Boot parameters written");
        Ok(params)
    }

    pub fn clear_boot_params(&self) -> Result<BootParams> {
        self.set_boot_params(&BTreeMap::new())
    }

    /// Invokes ChangeBootOrder without a source
    // `-d 6` is the wsman debug level flag, not a method argument.
    pub fn clear_boot_order(&self) -> Result<ManagementResult> {
        let command = WsmanCommand::invoke(
            "ChangeBootOrder",
            CIM_BOOT_CONFIG_SETTING.instance_uri(&BOOT_CONFIGURATION_INSTANCE),
        )
        .option("-d", "6");

        let response = WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;
        let result = response.return_value(&CIM_BOOT_CONFIG_SETTING.uri(), &BOOT_CHANGE_RESULTS)?;
        log_result("ChangeBootOrder", &result);
        Ok(result)
    }

    /// Makes "Force PXE Boot" the only boot source
    pub fn set_boot_order_pxe(&self) -> Result<ManagementResult> {
        let body = to_xml(&boot_order_change(&self.gateway.service_address()))?;
        let command = WsmanCommand::invoke(
            "ChangeBootOrder",
            CIM_BOOT_CONFIG_SETTING.instance_uri(&BOOT_CONFIGURATION_INSTANCE),
        );

        let response = WsmanResponse::parse(&self.gateway.send_input(&body, &command)?)?;
        let result = response.return_value(&CIM_BOOT_CONFIG_SETTING.uri(), &BOOT_CHANGE_RESULTS)?;
        log_result("ChangeBootOrder", &result);
        Ok(result)
    }

    /// Sets the role of the AMT boot configuration, by code or name
    pub fn set_boot_config(&self, role: &str) -> Result<ManagementResult> {
        let code = BOOT_CONFIG_ROLES.resolve(role)?;
        let body = to_xml(&boot_config_role_change(
            &self.gateway.service_address(),
            code,
        ))?;
        let command = WsmanCommand::invoke(
            "SetBootConfigRole",
            CIM_BOOT_SERVICE.instance_uri(&BOOT_SERVICE_INSTANCE),
        );

        let response = WsmanResponse::parse(&self.gateway.send_input(&body, &command)?)?;
        let result = response.return_value(&CIM_BOOT_SERVICE.uri(), &BOOT_CHANGE_RESULTS)?;
        log_result("SetBootConfigRole", &result);
        Ok(result)
    }
}

fn log_result(method: &str, result: &ManagementResult) {
    if result.is_success() {
        info!(method, result = %result, "Boot change applied");
    } else {
        warn!(method, code = %result.code, result = %result, "Boot change refused");
    }
}

fn parse_boot_params(raw: &str) -> Result<BootParams> {
    let namespace = AMT_BOOT_SETTING_DATA.uri();
    let response = WsmanResponse::parse(raw)?;

    let mut settings = BTreeMap::new();
    for (name, _) in BOOT_SETTING_DEFAULTS {
        if response.contains(&namespace, name) {
            settings.insert(name.to_string(), response.require_text(&namespace, name)?);
        }
    }

    Ok(BootParams {
        instance_id: response.require_text(&namespace, "InstanceID")?,
        element_name: response.require_text(&namespace, "ElementName")?,
        settings,
    })
}
