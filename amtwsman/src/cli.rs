//! Gateway driving the openwsman `wsman` command-line client

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, trace, warn};

use crate::error::{Result, WsmanError};
use crate::gateway::{WsmanCommand, WsmanGateway};

pub const DEFAULT_PROGRAM: &str = "wsman";

/// Runs `wsman -h host -P port -u user -p password <command>` per request
#[derive(Clone)]
pub struct WsmanCli {
    program: String,
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl fmt::Debug for WsmanCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsmanCli")
            .field("program", &self.program)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl WsmanCli {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Uses another executable than `wsman` found in `PATH`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn connection_args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.host.clone(),
            "-P".to_string(),
            self.port.to_string(),
            "-u".to_string(),
            self.user.clone(),
            "-p".to_string(),
            self.password.clone(),
        ]
    }

    fn run(&self, command: &WsmanCommand, input: Option<&str>) -> Result<String> {
        let mut args = self.connection_args();
        if input.is_some() {
            args.push("-J".to_string());
            args.push("-".to_string());
        }
        args.extend(command.to_args());

        debug!(
            program = %self.program,
            host = %self.host,
            port = self.port,
            command = %command,
            with_input = input.is_some(),
            "Running wsman request"
        );

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                WsmanError::Transport(format!("cannot run '{}': {}", self.program, e))
            })?;

        if let Some(body) = input {
            trace!(input = body, "Request body");
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(body.as_bytes()).map_err(|e| {
                    WsmanError::Transport(format!("cannot write request body: {}", e))
                })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| {
            WsmanError::Transport(format!("'{}' did not complete: {}", self.program, e))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "wsman exited with a failure status"
            );
        }

        if stdout.trim().is_empty() {
            let detail = match stderr.trim() {
                "" => format!("no output from '{}' ({})", self.program, output.status),
                err => format!("no output from '{}': {}", self.program, err),
            };
            return Err(WsmanError::Transport(detail));
        }

        debug!(bytes = stdout.len(), "wsman response received");
        Ok(stdout)
    }
}

impl WsmanGateway for WsmanCli {
    fn retrieve(&self, command: &WsmanCommand) -> Result<String> {
        self.run(command, None)
    }

    fn send_input(&self, input: &str, command: &WsmanCommand) -> Result<String> {
        self.run(command, Some(input))
    }

    fn service_address(&self) -> String {
        format!("http://{}:{}/wsman", self.host, self.port)
    }
}
