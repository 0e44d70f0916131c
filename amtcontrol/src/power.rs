use amtwsman::codes::{POWER_CHANGE_CAPABILITIES, POWER_CHANGE_RESULTS, POWER_STATES};
use amtwsman::request::{power_state_change, to_xml};
use amtwsman::resource::{
    CIM_ASSOCIATED_POWER_MANAGEMENT_SERVICE, CIM_POWER_MANAGEMENT_CAPABILITIES,
    CIM_POWER_MANAGEMENT_SERVICE, POWER_MANAGEMENT_SERVICE_INSTANCE,
};
use amtwsman::{
    CodeTable, ManagementResult, Result, WsmanCommand, WsmanError, WsmanGateway, WsmanResponse,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Power capabilities advertised by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PowerCapabilities {
    pub power_change_capabilities: Vec<&'static str>,
    pub power_states_supported: Vec<&'static str>,
    pub requested_power_states_supported: Vec<&'static str>,
}

/// Current power state and the transitions the device accepts right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PowerStatus {
    pub power_state: &'static str,
    pub available_power_states: Vec<&'static str>,
}

impl PowerStatus {
    pub fn is_available(&self, state: &str) -> bool {
        self.available_power_states.iter().any(|s| *s == state)
    }
}

#[derive(Debug, Clone)]
pub struct PowerController<G> {
    gateway: G,
}

impl<G: WsmanGateway> PowerController<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// CIM_PowerManagementCapabilities, restricted to `PowerChangeCapabilities`
    pub fn get_capabilities(&self) -> Result<PowerCapabilities> {
        let namespace = CIM_POWER_MANAGEMENT_CAPABILITIES.uri();
        let command = WsmanCommand::get(namespace.as_str()).property("PowerChangeCapabilities");
        let response = WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;

        Ok(PowerCapabilities {
            power_change_capabilities: translate_all(
                &response,
                &namespace,
                "PowerChangeCapabilities",
                &POWER_CHANGE_CAPABILITIES,
            )?,
            power_states_supported: translate_all(
                &response,
                &namespace,
                "PowerStatesSupported",
                &POWER_STATES,
            )?,
            requested_power_states_supported: translate_all(
                &response,
                &namespace,
                "RequestedPowerStatesSupported",
                &POWER_STATES,
            )?,
        })
    }

    pub fn get_state(&self) -> Result<PowerStatus> {
        let namespace = CIM_ASSOCIATED_POWER_MANAGEMENT_SERVICE.uri();
        let command = WsmanCommand::get(namespace.as_str());
        let response = WsmanResponse::parse(&self.gateway.retrieve(&command)?)?;

        let code = response.require_text(&namespace, "PowerState")?;
        let status = PowerStatus {
            power_state: POWER_STATES.forward(&code)?,
            available_power_states: translate_all(
                &response,
                &namespace,
                "AvailableRequestedPowerStates",
                &POWER_STATES,
            )?,
        };
        debug!(power_state = status.power_state, "Power state retrieved");
        Ok(status)
    }

    /// Requests a power transition, `target` is a wire code or a state name
    ///
    /// The device decides whether the transition is acceptable, see
    /// [`PowerController::set_state_checked`] for a guarded variant.
    pub fn set_state(&self, target: &str) -> Result<ManagementResult> {
        let code = POWER_STATES.resolve(target)?;
        let body = to_xml(&power_state_change(&self.gateway.service_address(), code))?;
        let command = WsmanCommand::invoke(
            "RequestPowerStateChange",
            CIM_POWER_MANAGEMENT_SERVICE.instance_uri(&POWER_MANAGEMENT_SERVICE_INSTANCE),
        );

        let response = WsmanResponse::parse(&self.gateway.send_input(&body, &command)?)?;
        let result =
            response.return_value(&CIM_POWER_MANAGEMENT_SERVICE.uri(), &POWER_CHANGE_RESULTS)?;

        if result.is_success() {
            info!(power_state = code, result = %result, "Power state change requested");
        } else {
            warn!(power_state = code, code = %result.code, result = %result, "Power state change refused");
        }
        Ok(result)
    }

    /// Like `set_state`, but fails before any mutation when the target is
    /// not among the currently available transitions
    pub fn set_state_checked(&self, target: &str) -> Result<ManagementResult> {
        let requested = POWER_STATES.forward(POWER_STATES.resolve(target)?)?;
        let status = self.get_state()?;

        if !status.is_available(requested) {
            return Err(WsmanError::StateUnavailable {
                requested: requested.to_string(),
                available: status
                    .available_power_states
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            });
        }

        self.set_state(requested)
    }
}

/// Every `name` element of `namespace`, each translated through `table`
fn translate_all(
    response: &WsmanResponse,
    namespace: &str,
    name: &str,
    table: &CodeTable,
) -> Result<Vec<&'static str>> {
    response
        .find_all_text(namespace, name)
        .iter()
        .map(|code| table.forward(code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, envelope, method_output};

    const APMS: &str =
        "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_AssociatedPowerManagementService";
    const PMC: &str =
        "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_PowerManagementCapabilities";
    const PMS: &str =
        "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_PowerManagementService";

    fn power_state(current: &str, available: &[&str]) -> String {
        let mut body = format!(
            r#"<h:CIM_AssociatedPowerManagementService xmlns:h="{APMS}"><h:PowerState>{current}</h:PowerState>"#
        );
        for state in available {
            body.push_str(&format!(
                "<h:AvailableRequestedPowerStates>{state}</h:AvailableRequestedPowerStates>"
            ));
        }
        body.push_str("</h:CIM_AssociatedPowerManagementService>");
        envelope(&body)
    }

    #[test]
    fn test_get_capabilities() {
        let gateway = ScriptedGateway::new(vec![envelope(&format!(
            r#"<h:CIM_PowerManagementCapabilities xmlns:h="{PMC}">
                 <h:PowerChangeCapabilities>3</h:PowerChangeCapabilities>
                 <h:PowerChangeCapabilities>4</h:PowerChangeCapabilities>
                 <h:PowerChangeCapabilities>7</h:PowerChangeCapabilities>
                 <h:PowerStatesSupported>2</h:PowerStatesSupported>
                 <h:PowerStatesSupported>8</h:PowerStatesSupported>
                 <h:RequestedPowerStatesSupported>17</h:RequestedPowerStatesSupported>
               </h:CIM_PowerManagementCapabilities>"#
        ))]);
        let capabilities = PowerController::new(&gateway).get_capabilities().unwrap();

        assert_eq!(
            capabilities.power_change_capabilities,
            vec!["Power State Settable", "Power Cycling Supported", "HW Reset Supported"]
        );
        assert_eq!(capabilities.power_states_supported, vec!["On", "Power Off - Soft"]);
        assert_eq!(
            capabilities.requested_power_states_supported,
            vec!["Diagnostic Interrupt (INIT)"]
        );
        assert_eq!(
            gateway.calls()[0].args,
            vec!["get", PMC, "-k", "PowerChangeCapabilities"]
        );
    }

    #[test]
    fn test_unknown_capability_code_fails() {
        let gateway = ScriptedGateway::new(vec![envelope(&format!(
            r#"<h:X xmlns:h="{PMC}"><h:PowerChangeCapabilities>42</h:PowerChangeCapabilities></h:X>"#
        ))]);
        let err = PowerController::new(&gateway).get_capabilities().unwrap_err();
        assert!(matches!(err, WsmanError::UnrecognizedCode { .. }));
    }

    #[test]
    fn test_get_state() {
        let gateway = ScriptedGateway::new(vec![power_state("8", &["2", "10"])]);
        let status = PowerController::new(&gateway).get_state().unwrap();

        assert_eq!(status.power_state, "Power Off - Soft");
        assert_eq!(status.available_power_states, vec!["On", "Master Bus Reset"]);
        assert!(status.is_available("On"));
        assert_eq!(gateway.calls()[0].args, vec!["get", APMS]);
    }

    #[test]
    fn test_get_state_requires_power_state() {
        let gateway = ScriptedGateway::new(vec![envelope(&format!(
            r#"<h:X xmlns:h="{APMS}"><h:AvailableRequestedPowerStates>2</h:AvailableRequestedPowerStates></h:X>"#
        ))]);
        match PowerController::new(&gateway).get_state() {
            Err(WsmanError::MissingField(name)) => assert_eq!(name, "PowerState"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_state_by_name_embeds_wire_code() {
        let gateway = ScriptedGateway::new(vec![method_output(
            PMS,
            "RequestPowerStateChange",
            "0",
        )]);
        let result = PowerController::new(&gateway).set_state("On").unwrap();

        assert_eq!(result.status, "Completed with No Error");
        assert!(result.is_success());

        let calls = gateway.calls();
        assert_eq!(
            calls[0].args,
            vec![
                "invoke",
                "-a",
                "RequestPowerStateChange",
                "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_PowerManagementService?Name=Intel(r)%20AMT%20Power%20Management%20Service"
            ]
        );
        let input = calls[0].input.as_deref().unwrap();
        assert!(input.contains("<p:PowerState>2</p:PowerState>"));
        assert!(input.contains("<a:Address>http://amt.test:16992/wsman</a:Address>"));
    }

    #[test]
    fn test_set_state_by_code() {
        let gateway = ScriptedGateway::new(vec![method_output(
            PMS,
            "RequestPowerStateChange",
            "4098",
        )]);
        let result = PowerController::new(&gateway).set_state("10").unwrap();

        assert_eq!(result.status, "Invalid State Transition");
        assert!(gateway.calls()[0]
            .input
            .as_deref()
            .unwrap()
            .contains("<p:PowerState>10</p:PowerState>"));
    }

    #[test]
    fn test_set_state_rejects_unknown_target_without_io() {
        let gateway = ScriptedGateway::new(vec![]);
        let err = PowerController::new(&gateway).set_state("Off").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_set_state_checked_unavailable() {
        let gateway = ScriptedGateway::new(vec![power_state("2", &["8", "10"])]);
        match PowerController::new(&gateway).set_state_checked("On") {
            Err(WsmanError::StateUnavailable {
                requested,
                available,
            }) => {
                assert_eq!(requested, "On");
                assert_eq!(available, vec!["Power Off - Soft", "Master Bus Reset"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        // Only the state query went out
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn test_set_state_checked_available() {
        let gateway = ScriptedGateway::new(vec![
            power_state("2", &["8", "10"]),
            method_output(PMS, "RequestPowerStateChange", "0"),
        ]);
        let result = PowerController::new(&gateway)
            .set_state_checked("8")
            .unwrap();
        assert!(result.is_success());
        assert!(gateway.calls()[1]
            .input
            .as_deref()
            .unwrap()
            .contains("<p:PowerState>8</p:PowerState>"));
    }
}
