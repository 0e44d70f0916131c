//! AMT connection settings stored in amtconfig
//!
//! ```yaml
//! amt:
//!   host: 192.168.1.20
//!   port: 623
//!   username: admin
//!   password: encrypted:...
//!   vnc_password: ""
//! wsman:
//!   program: wsman
//! ```

use amtconfig::Config;
use anyhow::{anyhow, Result};
use serde_yaml::Value;

pub const DEFAULT_AMT_PORT: u16 = 623;
pub const DEFAULT_AMT_USERNAME: &str = "admin";

/// Extension trait adding the AMT accessors to `amtconfig::Config`
///
/// # Example
///
/// ```rust,ignore
/// use amtconfig::Config;
/// use amtcontrol::AmtConfigExt;
///
/// let config = Config::load_config("")?;
/// let host = config.get_amt_host()?;
/// ```
pub trait AmtConfigExt {
    /// Device host name or address
    ///
    /// # Errors
    ///
    /// Fails when no host is configured
    fn get_amt_host(&self) -> Result<String>;

    fn set_amt_host(&self, host: &str) -> Result<()>;

    fn get_amt_port(&self) -> Result<u16>;

    fn set_amt_port(&self, port: u16) -> Result<()>;

    fn get_amt_username(&self) -> Result<String>;

    /// Device password, decrypted when stored with the `encrypted:` prefix
    fn get_amt_password(&self) -> Result<String>;

    /// Stores the password as given, callers encrypt it beforehand if needed
    fn set_amt_password(&self, password: &str) -> Result<()>;

    /// VNC password, `None` when not configured
    fn get_amt_vnc_password(&self) -> Result<Option<String>>;

    fn set_amt_vnc_password(&self, password: &str) -> Result<()>;

    /// `wsman` executable used by the command-line gateway
    fn get_wsman_program(&self) -> Result<String>;
}

impl AmtConfigExt for Config {
    fn get_amt_host(&self) -> Result<String> {
        self.get_string(&["amt", "host"])
            .ok_or_else(|| anyhow!("AMT host not configured"))
    }

    fn set_amt_host(&self, host: &str) -> Result<()> {
        self.set_value(&["amt", "host"], Value::String(host.to_string()))
    }

    fn get_amt_port(&self) -> Result<u16> {
        match self.get_value(&["amt", "port"]) {
            Ok(Value::Number(n)) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| anyhow!("Invalid AMT port: {}", n)),
            Ok(Value::String(s)) => s
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid AMT port: {}", s)),
            _ => Ok(DEFAULT_AMT_PORT),
        }
    }

    fn set_amt_port(&self, port: u16) -> Result<()> {
        self.set_value(&["amt", "port"], Value::Number(port.into()))
    }

    fn get_amt_username(&self) -> Result<String> {
        Ok(self
            .get_string(&["amt", "username"])
            .unwrap_or_else(|| DEFAULT_AMT_USERNAME.to_string()))
    }

    fn get_amt_password(&self) -> Result<String> {
        let stored = self
            .get_string(&["amt", "password"])
            .ok_or_else(|| anyhow!("AMT password not configured"))?;
        amtconfig::encryption::get_password(&stored)
            .map_err(|e| anyhow!("Failed to decrypt AMT password: {}", e))
    }

    fn set_amt_password(&self, password: &str) -> Result<()> {
        self.set_value(&["amt", "password"], Value::String(password.to_string()))
    }

    fn get_amt_vnc_password(&self) -> Result<Option<String>> {
        match self.get_string(&["amt", "vnc_password"]) {
            Some(stored) => amtconfig::encryption::get_password(&stored)
                .map(Some)
                .map_err(|e| anyhow!("Failed to decrypt VNC password: {}", e)),
            None => Ok(None),
        }
    }

    fn set_amt_vnc_password(&self, password: &str) -> Result<()> {
        self.set_value(
            &["amt", "vnc_password"],
            Value::String(password.to_string()),
        )
    }

    fn get_wsman_program(&self) -> Result<String> {
        Ok(self
            .get_string(&["wsman", "program"])
            .unwrap_or_else(|| amtwsman::cli::DEFAULT_PROGRAM.to_string()))
    }
}
