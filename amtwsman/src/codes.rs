//! Wire code tables
//!
//! Static bidirectional mappings between the numeric tokens exchanged with
//! the firmware and their names in the AMT / CIM class reference. Each table
//! is a bijection: a code maps to exactly one name and no name is shared by
//! two codes of the same table.

use crate::error::{Result, WsmanError};

/// A bijective code ↔ name table
#[derive(Debug)]
pub struct CodeTable {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl CodeTable {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, entries }
    }

    /// Table name, used in error messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    /// Wire code → semantic name
    pub fn forward(&self, code: &str) -> Result<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, value)| *value)
            .ok_or_else(|| WsmanError::unrecognized_code(self.name, code))
    }

    /// Semantic name → wire code
    pub fn reverse(&self, value: &str) -> Result<&'static str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(code, _)| *code)
            .ok_or_else(|| {
                WsmanError::invalid_argument(format!("unknown {} '{}'", self.name, value))
            })
    }

    /// Accepts either a wire code or a semantic name and returns the wire code
    ///
    /// An exact code match wins over a name match.
    pub fn resolve(&self, input: &str) -> Result<&'static str> {
        if let Some((code, _)) = self.entries.iter().find(|(c, _)| *c == input) {
            return Ok(*code);
        }
        self.reverse(input).map_err(|_| {
            WsmanError::invalid_argument(format!("invalid {} '{}' specified", self.name, input))
        })
    }
}

/// CIM_PowerManagementService.RequestPowerStateChange PowerState values
pub static POWER_STATES: CodeTable = CodeTable::new(
    "power state",
    &[
        ("2", "On"),
        ("3", "Sleep - Light"),
        ("4", "Sleep - Deep"),
        ("5", "Power Cycle (Off Soft)"),
        ("6", "Power Off - Hard"),
        ("7", "Hibernate"),
        ("8", "Power Off - Soft"),
        ("9", "Power Cycle (Off Hard)"),
        ("10", "Master Bus Reset"),
        ("11", "Diagnostic Interrupt (NMI)"),
        ("12", "Power Off - Soft Graceful"),
        ("13", "Power Off - Hard Graceful"),
        ("14", "Master Bus Reset Graceful"),
        ("15", "Power Cycle (off - Soft Graceful)"),
        ("16", "Power Cycle (Off - Hard Graceful)"),
        // Only reported in RequestedPowerStatesSupported
        ("17", "Diagnostic Interrupt (INIT)"),
    ],
);

/// CIM_PowerManagementCapabilities.PowerChangeCapabilities
pub static POWER_CHANGE_CAPABILITIES: CodeTable = CodeTable::new(
    "power change capability",
    &[
        ("0", "Unknown"),
        ("1", "Other"),
        ("2", "Power Saving Modes Entered Automatically"),
        ("3", "Power State Settable"),
        ("4", "Power Cycling Supported"),
        ("5", "Timed Power On Supported"),
        ("6", "Off Hard Power Cycling Supported"),
        ("7", "HW Reset Supported"),
        ("8", "Graceful Shutdown Supported"),
    ],
);

/// CIM_PowerManagementService.RequestPowerStateChange return values
///
/// 4101..32767 (method reserved) and 32768..65535 (vendor specific) are not
/// mapped and fail as unrecognized.
pub static POWER_CHANGE_RESULTS: CodeTable = CodeTable::new(
    "power change result",
    &[
        ("0", "Completed with No Error"),
        ("1", "Not Supported"),
        ("2", "Unknown or Unspecified Error"),
        ("3", "Cannot complete within Timeout Period"),
        ("4", "Failed"),
        ("5", "Invalid Parameter"),
        ("6", "In Use"),
        ("4096", "DTMF Reserved"),
        ("4097", "Method Parameters Checked - Job Started"),
        ("4098", "Invalid State Transition"),
        ("4099", "Use of Timeout Parameter Not Supported"),
        ("4100", "Busy"),
    ],
);

/// CIM_BootConfigSetting.ChangeBootOrder and CIM_BootService.SetBootConfigRole
/// return values
pub static BOOT_CHANGE_RESULTS: CodeTable = CodeTable::new(
    "boot change result",
    &[
        ("0", "Completed with No Error"),
        ("1", "Not Supported"),
        ("2", "Unknown/Unspecified Error"),
        ("3", "Busy"),
        ("4", "Invalid Reference"),
        ("5", "Invalid Parameter"),
        ("6", "Access Denied"),
    ],
);

/// CIM_BootService.SetBootConfigRole Role values
pub static BOOT_CONFIG_ROLES: CodeTable = CodeTable::new(
    "boot config role",
    &[("1", "IsNextSingleUse"), ("32768", "IsNotNext")],
);

/// CIM_KVMRedirectionSAP.EnabledState
pub static KVM_STATES: CodeTable = CodeTable::new(
    "KVM state",
    &[("2", "Enabled"), ("3", "Disabled"), ("6", "Enabled but Offline")],
);

/// CIM_KVMRedirectionSAP.RequestStateChange return values
pub static KVM_STATE_CHANGE_RESULTS: CodeTable = CodeTable::new(
    "KVM state change result",
    &[
        ("0", "Completed with No Error"),
        ("1", "Not Supported"),
        ("2", "Unknown or Unspecified Error"),
        ("3", "Cannot complete within Timeout Period"),
        ("4", "Failed"),
        ("5", "Invalid Parameter"),
        ("6", "In Use"),
        ("4096", "Method Parameters Checked - Job Started"),
        ("4097", "Invalid State Transition"),
        ("4098", "Use of Timeout Parameter Not Supported"),
        ("4099", "Busy"),
    ],
);

/// AMT_BootCapabilities boolean properties, in class reference order
pub const BOOT_CAPABILITIES: &[&str] = &[
    "IDER",
    "SOL",
    "BIOSReflash",
    "BIOSSetup",
    "BIOSPause",
    "ForcePXEBoot",
    "ForceHardDriveBoot",
    "ForceHardDriveSafeModeBoot",
    "ForceDiagnosticBoot",
    "ForceCDorDVDBoot",
    "VerbosityScreenBlank",
    "PowerButtonLock",
    "ResetButtonLock",
    "KeyboardLock",
    "SleepButtonLock",
    "UserPasswordBypass",
    "ForcedProgressEvents",
    "VerbosityVerbose",
    "VerbosityQuiet",
    "ConfigurationDataReset",
    "BIOSSecureBoot",
    "SecureErase",
    "ForceWinREBoot",
    "ForceUEFILocalPBABoot",
    "ForceUEFIHTTPSBoot",
    "AMTSecureBootControl",
    "UEFIWiFiCoExistenceAndProfileShare",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_tables() -> [&'static CodeTable; 7] {
        [
            &POWER_STATES,
            &POWER_CHANGE_CAPABILITIES,
            &POWER_CHANGE_RESULTS,
            &BOOT_CHANGE_RESULTS,
            &BOOT_CONFIG_ROLES,
            &KVM_STATES,
            &KVM_STATE_CHANGE_RESULTS,
        ]
    }

    #[test]
    fn test_tables_are_bijective() {
        for table in all_tables() {
            let codes: HashSet<_> = table.entries().iter().map(|(c, _)| c).collect();
            let values: HashSet<_> = table.entries().iter().map(|(_, v)| v).collect();
            assert_eq!(codes.len(), table.entries().len(), "{}", table.name());
            assert_eq!(values.len(), table.entries().len(), "{}", table.name());

            for (code, value) in table.entries() {
                assert_eq!(table.reverse(table.forward(code).unwrap()).unwrap(), *code);
                assert_eq!(table.forward(table.reverse(value).unwrap()).unwrap(), *value);
            }
        }
    }

    #[test]
    fn test_no_name_is_also_a_code_of_another_entry() {
        // resolve() tries codes first, a name equal to a code would be shadowed
        for table in all_tables() {
            for (_, value) in table.entries() {
                assert!(table.forward(value).is_err(), "{}: {}", table.name(), value);
            }
        }
    }

    #[test]
    fn test_forward_unknown_code() {
        match POWER_CHANGE_RESULTS.forward("99") {
            Err(WsmanError::UnrecognizedCode { table, code }) => {
                assert_eq!(table, "power change result");
                assert_eq!(code, "99");
            }
            other => panic!("unexpected {:?}", other),
        }
        // Reserved ranges are not mapped
        assert!(POWER_CHANGE_RESULTS.forward("4101").is_err());
        assert!(BOOT_CHANGE_RESULTS.forward("32768").is_err());
    }

    #[test]
    fn test_reverse_unknown_value() {
        let err = POWER_STATES.reverse("Off").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_resolve_accepts_both_forms() {
        assert_eq!(POWER_STATES.resolve("On").unwrap(), "2");
        assert_eq!(POWER_STATES.resolve("2").unwrap(), "2");
        assert_eq!(POWER_STATES.resolve("Master Bus Reset").unwrap(), "10");
        assert_eq!(BOOT_CONFIG_ROLES.resolve("IsNextSingleUse").unwrap(), "1");
        assert_eq!(BOOT_CONFIG_ROLES.resolve("32768").unwrap(), "32768");
    }

    #[test]
    fn test_resolve_rejects_unknown_input() {
        assert!(POWER_STATES.resolve("1").unwrap_err().is_invalid_argument());
        assert!(POWER_STATES.resolve("on").unwrap_err().is_invalid_argument());
        assert!(BOOT_CONFIG_ROLES.resolve("IsDefault").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_boot_capabilities_list() {
        assert_eq!(BOOT_CAPABILITIES.len(), 27);
        let unique: HashSet<_> = BOOT_CAPABILITIES.iter().collect();
        assert_eq!(unique.len(), 27);
        assert_eq!(BOOT_CAPABILITIES[5], "ForcePXEBoot");
    }
}
