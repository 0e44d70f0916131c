//! One-shot network boot

use amtwsman::{ManagementResult, Result, WsmanGateway};
use serde::Serialize;
use tracing::{info, warn};

use crate::boot::{BootController, BootParams};
use crate::power::PowerController;

/// Role making the PXE boot order apply to the next boot only
pub const NEXT_BOOT_ROLE: &str = "IsNextSingleUse";

/// Results of every step of [`force_pxe_boot`], in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PxeBootReport {
    pub boot_params: BootParams,
    pub clear_boot_order: ManagementResult,
    pub set_boot_order: ManagementResult,
    pub set_boot_config: ManagementResult,
    pub power_on: ManagementResult,
}

/// Boots the machine once from the network
///
/// The firmware only honours the override when the steps run in this
/// order: clear boot parameters, clear boot order, set PXE boot order,
/// mark it for the next boot, power on. The first failing step aborts the
/// sequence and earlier steps stay applied. A non-zero `ReturnValue` is
/// reported, not treated as a failure.
pub fn force_pxe_boot<G: WsmanGateway>(
    boot: &BootController<G>,
    power: &PowerController<G>,
) -> Result<PxeBootReport> {
    info!("Clearing boot configuration");
    let boot_params = boot.clear_boot_params()?;
    let clear_boot_order = check("clear boot order", boot.clear_boot_order()?);

    info!("Setting PXE boot for next boot");
    let set_boot_order = check("set PXE boot order", boot.set_boot_order_pxe()?);
    let set_boot_config = check("set boot config role", boot.set_boot_config(NEXT_BOOT_ROLE)?);

    info!("Powering on");
    let power_on = check("power on", power.set_state("On")?);

    Ok(PxeBootReport {
        boot_params,
        clear_boot_order,
        set_boot_order,
        set_boot_config,
        power_on,
    })
}

fn check(step: &str, result: ManagementResult) -> ManagementResult {
    if !result.is_success() {
        warn!(step, code = %result.code, result = %result, "Step did not complete cleanly");
    }
    result
}
