//! KVM redirection through the device's built-in VNC server

use amtwsman::codes::{KVM_STATE_CHANGE_RESULTS, KVM_STATES};
use amtwsman::resource::{CIM_KVM_REDIRECTION_SAP, IPS_KVM_REDIRECTION_SETTING_DATA};
use amtwsman::{ManagementResult, Result, WsmanCommand, WsmanError, WsmanGateway, WsmanResponse};
use serde::Serialize;
use tracing::{debug, info};

pub const VNC_PASSWORD_LENGTH: usize = 8;

/// Punctuation accepted in an RFB password (`"`, `,` and `:` are not)
pub const VNC_PASSWORD_SPECIALS: &str = "!#$%&'()*+-./;<=>?@[\\]^_`{|}~";

const STATE_ENABLED: &str = "2";
const STATE_DISABLED: &str = "3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvmState {
    #[serde(rename = "EnabledState")]
    pub enabled_state: &'static str,
    /// KVM allowed from the ME BIOS extension
    #[serde(rename = "EnabledByMEBx")]
    pub enabled_by_mebx: bool,
    #[serde(rename = "Is5900PortEnabled")]
    pub is_5900_port_enabled: bool,
    /// User consent required before a session starts
    #[serde(rename = "OptInPolicy")]
    pub opt_in_policy: bool,
    #[serde(rename = "SessionTimeout")]
    pub session_timeout: u32,
}

impl KvmState {
    pub fn is_disabled(&self) -> bool {
        self.enabled_state == "Disabled"
    }
}

/// One mutation performed while enabling or disabling KVM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum KvmStep {
    SetPassword,
    EnablePort5900,
    DisablePort5900,
    DisableOptIn,
    RequestStateChange {
        requested: &'static str,
        result: ManagementResult,
    },
}

/// Checks a VNC password against the RFB constraints
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() != VNC_PASSWORD_LENGTH {
        return Err(WsmanError::InvalidPassword(format!(
            "VNC password must be {} characters exactly",
            VNC_PASSWORD_LENGTH
        )));
    }

    let (mut lower, mut upper, mut digit, mut special) = (false, false, false, false);
    for ch in password.chars() {
        if ch.is_ascii_lowercase() {
            lower = true;
        } else if ch.is_ascii_uppercase() {
            upper = true;
        } else if ch.is_ascii_digit() {
            digit = true;
        } else if VNC_PASSWORD_SPECIALS.contains(ch) {
            special = true;
        } else {
            return Err(WsmanError::InvalidPassword(format!(
                "invalid character in VNC password, acceptable: {}",
                VNC_PASSWORD_SPECIALS
            )));
        }
    }

    if lower && upper && digit && special {
        Ok(())
    } else {
        Err(WsmanError::WeakPassword)
    }
}

#[derive(Debug, Clone)]
pub struct KvmController<G> {
    gateway: G,
}

impl<G: WsmanGateway> KvmController<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn get_state(&self) -> Result<KvmState> {
        let sap = CIM_KVM_REDIRECTION_SAP.uri();
        let response = self.get(&sap)?;
        let enabled_state = KVM_STATES.forward(&response.require_text(&sap, "EnabledState")?)?;

        let settings = IPS_KVM_REDIRECTION_SETTING_DATA.uri();
        let response = self.get(&settings)?;

        let state = KvmState {
            enabled_state,
            enabled_by_mebx: parse_bool(&response.require_text(&settings, "EnabledByMEBx")?)?,
            is_5900_port_enabled: parse_bool(
                &response.require_text(&settings, "Is5900PortEnabled")?,
            )?,
            opt_in_policy: parse_bool(&response.require_text(&settings, "OptInPolicy")?)?,
            session_timeout: parse_u32(&response.require_text(&settings, "SessionTimeout")?)?,
        };
        debug!(?state, "KVM state retrieved");
        Ok(state)
    }

    /// Sets the VNC password and enables KVM on port 5900 without user consent
    ///
    /// Steps already in the wanted state are skipped, except the password
    /// which cannot be read back. Nothing is undone when a step fails.
    pub fn enable_vnc_kvm(&self, password: &str) -> Result<Vec<KvmStep>> {
        validate_password(password)?;

        let state = self.get_state()?;
        if !state.enabled_by_mebx {
            return Err(WsmanError::NotPermitted(
                "KVM is disabled in the Intel ME BIOS extension".to_string(),
            ));
        }

        let mut steps = Vec::new();

        self.put_setting("RFBPassword", password)?;
        steps.push(KvmStep::SetPassword);

        if !state.is_5900_port_enabled {
            self.put_setting("Is5900PortEnabled", "true")?;
            steps.push(KvmStep::EnablePort5900);
        }

        if state.opt_in_policy {
            self.put_setting("OptInPolicy", "false")?;
            steps.push(KvmStep::DisableOptIn);
        }

        if state.is_disabled() {
            steps.push(self.request_state_change(STATE_ENABLED)?);
        }

        info!(steps = steps.len(), "VNC KVM enabled");
        Ok(steps)
    }

    pub fn disable_vnc_kvm(&self) -> Result<Vec<KvmStep>> {
        let state = self.get_state()?;
        let mut steps = Vec::new();

        if state.is_5900_port_enabled {
            self.put_setting("Is5900PortEnabled", "false")?;
            steps.push(KvmStep::DisablePort5900);
        }

        if !state.is_disabled() {
            steps.push(self.request_state_change(STATE_DISABLED)?);
        }

        info!(steps = steps.len(), "VNC KVM disabled");
        Ok(steps)
    }

    fn get(&self, resource_uri: &str) -> Result<WsmanResponse> {
        WsmanResponse::parse(&self.gateway.retrieve(&WsmanCommand::get(resource_uri))?)
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let command =
            WsmanCommand::put(IPS_KVM_REDIRECTION_SETTING_DATA.uri()).key_value(key, value);
        WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;
        // The password value stays out of the logs
        info!(setting = key, "KVM setting written");
        Ok(())
    }

    fn request_state_change(&self, code: &str) -> Result<KvmStep> {
        let requested = KVM_STATES.forward(code)?;
        let command = WsmanCommand::invoke("RequestStateChange", CIM_KVM_REDIRECTION_SAP.uri())
            .key_value("RequestedState", code);

        let response = WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;
        let result =
            response.return_value(&CIM_KVM_REDIRECTION_SAP.uri(), &KVM_STATE_CHANGE_RESULTS)?;
        info!(requested, result = %result, "KVM state change requested");
        Ok(KvmStep::RequestStateChange { requested, result })
    }
}

fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(WsmanError::unrecognized_code("boolean", other)),
    }
}

fn parse_u32(text: &str) -> Result<u32> {
    text.parse()
        .map_err(|_| WsmanError::unrecognized_code("integer", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, envelope, fault};

    const SAP: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_KVMRedirectionSAP";
    const SETTINGS: &str =
        "http://intel.com/wbem/wscim/1/ips-schema/1/IPS_KVMRedirectionSettingData";

    fn sap(enabled_state: &str) -> String {
        envelope(&format!(
            r#"<g:CIM_KVMRedirectionSAP xmlns:g="{SAP}"><g:EnabledState>{enabled_state}</g:EnabledState><g:Name>KVM Redirection Service Access Point</g:Name></g:CIM_KVMRedirectionSAP>"#
        ))
    }

    fn settings(mebx: &str, port: &str, opt_in: &str) -> String {
        envelope(&format!(
            r#"<g:IPS_KVMRedirectionSettingData xmlns:g="{SETTINGS}">
                 <g:EnabledByMEBx>{mebx}</g:EnabledByMEBx>
                 <g:Is5900PortEnabled>{port}</g:Is5900PortEnabled>
                 <g:OptInPolicy>{opt_in}</g:OptInPolicy>
                 <g:SessionTimeout>0</g:SessionTimeout>
               </g:IPS_KVMRedirectionSettingData>"#
        ))
    }

    fn put_ok() -> String {
        settings("true", "true", "false")
    }

    fn state_change(code: &str) -> String {
        envelope(&format!(
            r#"<g:RequestStateChange_OUTPUT xmlns:g="{SAP}"><g:ReturnValue>{code}</g:ReturnValue></g:RequestStateChange_OUTPUT>"#
        ))
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Abcdef1!").is_ok());
        assert!(validate_password("Zz9~aaaa").is_ok());
        assert!(validate_password("Ab3!xy@9").is_ok());

        assert!(matches!(
            validate_password("Abc1!"),
            Err(WsmanError::InvalidPassword(_))
        ));
        assert!(matches!(
            validate_password("Abcdefg1!"),
            Err(WsmanError::InvalidPassword(_))
        ));
        // ':' , ',' and '"' are refused by RFB
        assert!(matches!(
            validate_password("Abcdef1:"),
            Err(WsmanError::InvalidPassword(_))
        ));
        assert!(matches!(
            validate_password("Abcdef1,"),
            Err(WsmanError::InvalidPassword(_))
        ));
        assert!(matches!(
            validate_password("Abcdefg1"),
            Err(WsmanError::WeakPassword)
        ));
        assert!(matches!(
            validate_password("abcdef1!"),
            Err(WsmanError::WeakPassword)
        ));
        assert!(matches!(
            validate_password("ABCDEF1!"),
            Err(WsmanError::WeakPassword)
        ));
        assert!(matches!(
            validate_password("Abcdefg!"),
            Err(WsmanError::WeakPassword)
        ));
    }

    #[test]
    fn test_get_state() {
        let gateway = ScriptedGateway::new(vec![sap("6"), settings("true", "false", "true")]);
        let state = KvmController::new(&gateway).get_state().unwrap();

        assert_eq!(
            state,
            KvmState {
                enabled_state: "Enabled but Offline",
                enabled_by_mebx: true,
                is_5900_port_enabled: false,
                opt_in_policy: true,
                session_timeout: 0,
            }
        );
        let calls = gateway.calls();
        assert_eq!(calls[0].args, vec!["get", SAP]);
        assert_eq!(calls[1].args, vec!["get", SETTINGS]);
    }

    #[test]
    fn test_get_state_rejects_non_boolean() {
        let gateway = ScriptedGateway::new(vec![sap("2"), settings("yes", "true", "false")]);
        assert!(matches!(
            KvmController::new(&gateway).get_state(),
            Err(WsmanError::UnrecognizedCode { table: "boolean", .. })
        ));
    }

    #[test]
    fn test_get_state_missing_enabled_state() {
        let gateway = ScriptedGateway::new(vec![envelope(&format!(
            r#"<g:CIM_KVMRedirectionSAP xmlns:g="{SAP}"/>"#
        ))]);
        match KvmController::new(&gateway).get_state() {
            Err(WsmanError::MissingField(name)) => assert_eq!(name, "EnabledState"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_enable_from_scratch() {
        let gateway = ScriptedGateway::new(vec![
            sap("3"),
            settings("true", "false", "true"),
            put_ok(),
            put_ok(),
            put_ok(),
            state_change("0"),
        ]);
        let steps = KvmController::new(&gateway)
            .enable_vnc_kvm("Abcdef1!")
            .unwrap();

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], KvmStep::SetPassword);
        assert_eq!(steps[1], KvmStep::EnablePort5900);
        assert_eq!(steps[2], KvmStep::DisableOptIn);
        match &steps[3] {
            KvmStep::RequestStateChange { requested, result } => {
                assert_eq!(*requested, "Enabled");
                assert!(result.is_success());
            }
            other => panic!("unexpected {:?}", other),
        }

        let calls = gateway.calls();
        assert_eq!(calls[2].args, vec!["put", SETTINGS, "-k", "RFBPassword=Abcdef1!"]);
        assert_eq!(calls[3].args, vec!["put", SETTINGS, "-k", "Is5900PortEnabled=true"]);
        assert_eq!(calls[4].args, vec!["put", SETTINGS, "-k", "OptInPolicy=false"]);
        assert_eq!(
            calls[5].args,
            vec!["invoke", "-a", "RequestStateChange", SAP, "-k", "RequestedState=2"]
        );
    }

    #[test]
    fn test_enable_when_already_configured_only_sets_password() {
        let gateway = ScriptedGateway::new(vec![
            sap("2"),
            settings("true", "true", "false"),
            put_ok(),
        ]);
        let steps = KvmController::new(&gateway)
            .enable_vnc_kvm("Abcdef1!")
            .unwrap();

        assert_eq!(steps, vec![KvmStep::SetPassword]);
        assert_eq!(gateway.calls().len(), 3);
    }

    #[test]
    fn test_enable_refused_by_mebx_before_any_mutation() {
        let gateway = ScriptedGateway::new(vec![sap("3"), settings("false", "false", "true")]);
        let err = KvmController::new(&gateway)
            .enable_vnc_kvm("Abcdef1!")
            .unwrap_err();

        assert!(matches!(err, WsmanError::NotPermitted(_)));
        assert!(gateway.calls().iter().all(|call| call.args[0] == "get"));
    }

    #[test]
    fn test_enable_rejects_weak_password_without_io() {
        let gateway = ScriptedGateway::new(vec![]);
        let err = KvmController::new(&gateway)
            .enable_vnc_kvm("abcdefgh")
            .unwrap_err();
        assert!(matches!(err, WsmanError::WeakPassword));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_enable_stops_on_fault() {
        let gateway = ScriptedGateway::new(vec![
            sap("3"),
            settings("true", "false", "false"),
            fault("The user is not authorized."),
        ]);
        let err = KvmController::new(&gateway)
            .enable_vnc_kvm("Abcdef1!")
            .unwrap_err();

        assert!(err.is_remote_fault());
        assert_eq!(gateway.calls().len(), 3);
    }

    #[test]
    fn test_disable() {
        let gateway = ScriptedGateway::new(vec![
            sap("2"),
            settings("true", "true", "false"),
            put_ok(),
            state_change("0"),
        ]);
        let steps = KvmController::new(&gateway).disable_vnc_kvm().unwrap();

        assert_eq!(steps[0], KvmStep::DisablePort5900);
        assert!(matches!(
            steps[1],
            KvmStep::RequestStateChange {
                requested: "Disabled",
                ..
            }
        ));
        let calls = gateway.calls();
        assert_eq!(calls[2].args, vec!["put", SETTINGS, "-k", "Is5900PortEnabled=false"]);
        assert_eq!(
            calls[3].args,
            vec!["invoke", "-a", "RequestStateChange", SAP, "-k", "RequestedState=3"]
        );
    }

    #[test]
    fn test_disable_when_already_disabled() {
        let gateway = ScriptedGateway::new(vec![sap("3"), settings("true", "false", "false")]);
        let steps = KvmController::new(&gateway).disable_vnc_kvm().unwrap();
        assert!(steps.is_empty());
        assert_eq!(gateway.calls().len(), 2);
    }
}
