//! # amtcontrol - Intel AMT power, boot and KVM control
//!
//! Controllers built on [`amtwsman`], each generic over the
//! [`WsmanGateway`](amtwsman::WsmanGateway) that carries the requests:
//!
//! - [`PowerController`] : power capabilities, state and transitions
//! - [`BootController`] : boot capabilities, parameters, order and role
//! - [`KvmController`] : VNC based KVM redirection
//! - [`force_pxe_boot`] : the ordered one-shot network boot sequence
//!
//! ## Example
//!
//! ```ignore
//! use amtcontrol::AmtDevice;
//! use amtwsman::WsmanCli;
//!
//! let device = AmtDevice::new(WsmanCli::new("192.168.1.20", 623, "admin", "P@ssw0rd"));
//! let status = device.power.get_state()?;
//! if status.is_available("On") {
//!     device.power.set_state("On")?;
//! }
//! ```

pub mod boot;
pub mod config_ext;
pub mod device;
pub mod kvm;
pub mod power;
pub mod pxe;

#[cfg(test)]
mod testing;

pub use boot::{BOOT_SETTING_DEFAULTS, BootController, BootParams, merge_boot_settings};
pub use config_ext::AmtConfigExt;
pub use device::AmtDevice;
pub use kvm::{KvmController, KvmState, KvmStep, validate_password};
pub use power::{PowerCapabilities, PowerController, PowerStatus};
pub use pxe::{PxeBootReport, force_pxe_boot};
