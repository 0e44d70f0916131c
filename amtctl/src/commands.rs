//! Subcommand execution

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use amtconfig::Config;
use amtconfig::encryption::encrypt_password;
use amtcontrol::{AmtConfigExt, AmtDevice};
use amtwsman::{WsmanCli, WsmanCommand, WsmanGateway};
use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::{BootCommand, Commands, ConnectionArgs, KvmCommand, PowerCommand, StoredPassword};

/// Delay before reading the power state back after a PXE boot
const PXE_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Command-line values first, then the configuration
pub fn build_gateway(args: &ConnectionArgs, config: &Config) -> Result<WsmanCli> {
    let host = match &args.host {
        Some(host) => host.clone(),
        None => config
            .get_amt_host()
            .context("Need an AMT host: --host, AMT_HOST or amt.host in the configuration")?,
    };
    let port = match args.port {
        Some(port) => port,
        None => config.get_amt_port()?,
    };
    let user = match &args.user {
        Some(user) => user.clone(),
        None => config.get_amt_username()?,
    };
    let password = match &args.password {
        Some(password) => password.clone(),
        None => config.get_amt_password().context(
            "Need an AMT password: --password, AMT_PASSWORD or amt.password in the configuration",
        )?,
    };
    let program = match &args.wsman {
        Some(program) => program.clone(),
        None => config.get_wsman_program()?,
    };

    debug!(host = %host, port, user = %user, program = %program, "WS-Management connection");
    Ok(WsmanCli::new(host, port, user, password).with_program(program))
}

/// Runs `command`; `None` means nothing to print as JSON
pub fn execute(
    command: Commands,
    connection: &ConnectionArgs,
    config: &Config,
) -> Result<Option<Value>> {
    match command {
        Commands::EncryptPassword { password, store } => encrypt(&password, store, config).map(Some),
        Commands::Enumerate { resource_uri } => {
            // Raw dump, no parsing
            let gateway = build_gateway(connection, config)?;
            let raw = gateway.retrieve(&WsmanCommand::enumerate(resource_uri))?;
            println!("{}", raw);
            Ok(None)
        }
        command => {
            let device = AmtDevice::new(build_gateway(connection, config)?);
            device_command(command, &device, config).map(Some)
        }
    }
}

fn device_command(command: Commands, device: &AmtDevice<WsmanCli>, config: &Config) -> Result<Value> {
    let output = match command {
        Commands::Info => json!({
            "PowerCapabilities": device.power.get_capabilities()?,
            "PowerState": device.power.get_state()?,
            "BootCapabilities": device.boot.get_boot_capabilities()?,
            "BootParams": device.boot.get_boot_params()?,
            "KvmState": device.kvm.get_state()?,
        }),
        Commands::On => json!(device.power.set_state_checked("On")?),
        Commands::Off => json!(device.power.set_state_checked("Power Off - Soft")?),
        Commands::Reset => json!(device.power.set_state_checked("Master Bus Reset")?),
        Commands::Power(power) => match power {
            PowerCommand::Get => json!(device.power.get_state()?),
            PowerCommand::Capabilities => json!(device.power.get_capabilities()?),
            PowerCommand::Set { state, checked } => {
                if checked {
                    json!(device.power.set_state_checked(&state)?)
                } else {
                    json!(device.power.set_state(&state)?)
                }
            }
        },
        Commands::Boot(boot) => match boot {
            BootCommand::Capabilities => json!(device.boot.get_boot_capabilities()?),
            BootCommand::Params => json!(device.boot.get_boot_params()?),
            BootCommand::Set { params } => {
                json!(device.boot.set_boot_params(&parse_overrides(&params)?)?)
            }
            BootCommand::Clear => json!(device.boot.clear_boot_params()?),
        },
        Commands::PxeBoot => {
            let report = device.force_pxe_boot()?;
            thread::sleep(PXE_SETTLE_DELAY);
            json!({
                "Steps": report,
                "PowerState": device.power.get_state()?,
            })
        }
        Commands::Kvm(kvm) => match kvm {
            KvmCommand::Status => json!(device.kvm.get_state()?),
            KvmCommand::Enable { vnc_password } => {
                let password = match vnc_password {
                    Some(password) => password,
                    None => config.get_amt_vnc_password()?.ok_or_else(|| {
                        anyhow!(
                            "Need a VNC password: --vnc-password, AMT_VNC_PASSWORD or amt.vnc_password in the configuration"
                        )
                    })?,
                };
                json!(device.kvm.enable_vnc_kvm(&password)?)
            }
            KvmCommand::Disable => json!(device.kvm.disable_vnc_kvm()?),
        },
        Commands::Enumerate { .. } | Commands::EncryptPassword { .. } => {
            return Err(anyhow!("not a device command"));
        }
    };
    Ok(output)
}

fn encrypt(password: &str, store: Option<StoredPassword>, config: &Config) -> Result<Value> {
    let encrypted = encrypt_password(password)?;
    if let Some(stored) = store {
        match stored {
            StoredPassword::Amt => config.set_amt_password(&encrypted)?,
            StoredPassword::Vnc => config.set_amt_vnc_password(&encrypted)?,
        }
        info!(password = ?stored, config_file = %config.file_path(), "Encrypted password stored");
    }
    Ok(json!({ "encrypted": encrypted }))
}

/// `KEY=VALUE` pairs to a map, the last occurrence of a key wins
pub fn parse_overrides(params: &[String]) -> Result<BTreeMap<String, String>> {
    params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| anyhow!("Invalid boot parameter '{}', expected KEY=VALUE", param))
        })
        .collect()
}
