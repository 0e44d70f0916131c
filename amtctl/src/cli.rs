//! Command-line definition

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Every resource class of the device
pub const ALL_CLASSES: &str = "http://schemas.dmtf.org/wbem/wscim/1/*";

/// amtctl - power, boot and KVM control of Intel AMT devices
#[derive(Parser, Debug, Clone)]
#[command(name = "amtctl")]
#[command(version)]
#[command(about = "Intel AMT management over WS-Management", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Configuration directory (defaults to $AMTCTL_CONFIG, ./.amtctl or ~/.amtctl)
    #[arg(short = 'c', long, global = true)]
    pub config_dir: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Device connection, each value falls back to the configuration file
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// AMT host name or address
    #[arg(long, global = true, env = "AMT_HOST")]
    pub host: Option<String>,

    /// AMT WS-Management port [config default: 623]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// AMT user [config default: admin]
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// AMT password
    #[arg(long, global = true, env = "AMT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// wsman executable
    #[arg(long, global = true)]
    pub wsman: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Power, boot and KVM overview
    Info,

    /// Power on, if the device currently allows it
    On,

    /// Soft power off, if the device currently allows it
    Off,

    /// Master bus reset, if the device currently allows it
    Reset,

    /// Power state
    #[command(subcommand)]
    Power(PowerCommand),

    /// Boot configuration
    #[command(subcommand)]
    Boot(BootCommand),

    /// Boot once from the network and power on
    #[command(name = "pxe-boot")]
    PxeBoot,

    /// KVM redirection over VNC
    #[command(subcommand)]
    Kvm(KvmCommand),

    /// Raw enumeration of a resource class
    Enumerate {
        #[arg(default_value = ALL_CLASSES)]
        resource_uri: String,
    },

    /// Encrypt a password for the configuration file
    #[command(name = "encrypt-password")]
    EncryptPassword {
        password: String,

        /// Also store the encrypted value in the configuration
        #[arg(long, value_enum)]
        store: Option<StoredPassword>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PowerCommand {
    /// Current state and available transitions
    Get,

    /// Supported power states and capabilities
    Capabilities,

    /// Request a power state, by name or code
    Set {
        state: String,

        /// Refuse states the device does not currently offer
        #[arg(long)]
        checked: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BootCommand {
    Capabilities,

    Params,

    /// Write boot parameters (defaults overlaid with KEY=VALUE pairs)
    Set {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Reset boot parameters to their defaults
    Clear,
}

#[derive(Subcommand, Debug, Clone)]
pub enum KvmCommand {
    Status,

    /// Enable VNC on port 5900 without user consent
    Enable {
        /// VNC password (8 characters)
        #[arg(long, env = "AMT_VNC_PASSWORD", hide_env_values = true)]
        vnc_password: Option<String>,
    },

    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoredPassword {
    Amt,
    Vnc,
}
