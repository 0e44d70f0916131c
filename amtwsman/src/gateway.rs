//! Transport seam between the controllers and a WS-Management executor

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

const SECRET_KEY_SUFFIX: &str = "Password";

/// WS-Management operations used by the controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Invoke,
    Enumerate,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Invoke => "invoke",
            Verb::Enumerate => "enumerate",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request: verb, resource URI and its arguments
///
/// Rendered as `verb [-a method] [options] uri [-k property]...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsmanCommand {
    verb: Verb,
    resource_uri: String,
    method: Option<String>,
    options: Vec<(String, String)>,
    properties: Vec<String>,
}

impl WsmanCommand {
    fn new(verb: Verb, resource_uri: impl Into<String>) -> Self {
        Self {
            verb,
            resource_uri: resource_uri.into(),
            method: None,
            options: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn get(resource_uri: impl Into<String>) -> Self {
        Self::new(Verb::Get, resource_uri)
    }

    pub fn put(resource_uri: impl Into<String>) -> Self {
        Self::new(Verb::Put, resource_uri)
    }

    pub fn enumerate(resource_uri: impl Into<String>) -> Self {
        Self::new(Verb::Enumerate, resource_uri)
    }

    pub fn invoke(method: impl Into<String>, resource_uri: impl Into<String>) -> Self {
        let mut command = Self::new(Verb::Invoke, resource_uri);
        command.method = Some(method.into());
        command
    }

    /// Extra option pair placed before the resource URI, e.g. `-d 6`
    pub fn option(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((flag.into(), value.into()));
        self
    }

    /// Bare `-k` property, e.g. a property name to restrict a `get` to
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.properties.push(property.into());
        self
    }

    /// `-k key=value` property
    pub fn key_value(self, key: &str, value: impl fmt::Display) -> Self {
        self.property(format!("{}={}", key, value))
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.verb.as_str().to_string()];
        if let Some(method) = &self.method {
            args.push("-a".to_string());
            args.push(method.clone());
        }
        for (flag, value) in &self.options {
            args.push(flag.clone());
            args.push(value.clone());
        }
        args.push(self.resource_uri.clone());
        for property in &self.properties {
            args.push("-k".to_string());
            args.push(property.clone());
        }
        args
    }
}

/// Same layout as [`WsmanCommand::to_args`], with the value of every
/// `*Password` property masked
impl fmt::Display for WsmanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb.as_str())?;
        if let Some(method) = &self.method {
            write!(f, " -a {}", method)?;
        }
        for (flag, value) in &self.options {
            write!(f, " {} {}", flag, value)?;
        }
        write!(f, " {}", self.resource_uri)?;
        for property in &self.properties {
            match property.split_once('=') {
                Some((key, _)) if key.ends_with(SECRET_KEY_SUFFIX) => write!(f, " -k {}=***", key)?,
                _ => write!(f, " -k {}", property)?,
            }
        }
        Ok(())
    }
}

/// Executes WS-Management requests against one device
///
/// Implementations return the raw response text; fault detection and
/// extraction are left to [`crate::WsmanResponse`].
pub trait WsmanGateway {
    fn retrieve(&self, command: &WsmanCommand) -> Result<String>;

    /// Same as `retrieve`, with `input` sent as the request body
    fn send_input(&self, input: &str, command: &WsmanCommand) -> Result<String>;

    /// Address of the WS-Management service, used in endpoint references
    fn service_address(&self) -> String;
}

impl<G: WsmanGateway + ?Sized> WsmanGateway for Arc<G> {
    fn retrieve(&self, command: &WsmanCommand) -> Result<String> {
        (**self).retrieve(command)
    }

    fn send_input(&self, input: &str, command: &WsmanCommand) -> Result<String> {
        (**self).send_input(input, command)
    }

    fn service_address(&self) -> String {
        (**self).service_address()
    }
}

impl<G: WsmanGateway + ?Sized> WsmanGateway for &G {
    fn retrieve(&self, command: &WsmanCommand) -> Result<String> {
        (**self).retrieve(command)
    }

    fn send_input(&self, input: &str, command: &WsmanCommand) -> Result<String> {
        (**self).send_input(input, command)
    }

    fn service_address(&self) -> String {
        (**self).service_address()
    }
}
