//! Scripted in-memory gateway for the controller tests

use std::cell::RefCell;
use std::collections::VecDeque;

use amtwsman::{Result, WsmanCommand, WsmanError, WsmanGateway};

#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub input: Option<String>,
}

/// Replays canned responses in order and records every request
pub struct ScriptedGateway {
    responses: RefCell<VecDeque<String>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn answer(&self, command: &WsmanCommand, input: Option<&str>) -> Result<String> {
        self.calls.borrow_mut().push(Call {
            args: command.to_args(),
            input: input.map(str::to_string),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| WsmanError::Transport("no scripted response left".to_string()))
    }
}

impl WsmanGateway for ScriptedGateway {
    fn retrieve(&self, command: &WsmanCommand) -> Result<String> {
        self.answer(command, None)
    }

    fn send_input(&self, input: &str, command: &WsmanCommand) -> Result<String> {
        self.answer(command, Some(input))
    }

    fn service_address(&self) -> String {
        "http://amt.test:16992/wsman".to_string()
    }
}

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope" xmlns:b="http://schemas.xmlsoap.org/ws/2004/08/addressing">
  <a:Header><b:To>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</b:To></a:Header>
  <a:Body>{}</a:Body>
</a:Envelope>"#,
        body
    )
}

/// `<{method}_OUTPUT>` carrying a `ReturnValue`
pub fn method_output(namespace: &str, method: &str, return_value: &str) -> String {
    envelope(&format!(
        r#"<g:{method}_OUTPUT xmlns:g="{namespace}"><g:ReturnValue>{return_value}</g:ReturnValue></g:{method}_OUTPUT>"#
    ))
}

pub fn fault(reason: &str) -> String {
    envelope(&format!(
        r#"<a:Fault><a:Code><a:Value>a:Sender</a:Value></a:Code><a:Reason><a:Text xml:lang="en-US">{reason}</a:Text></a:Reason></a:Fault>"#
    ))
}
