use std::sync::Arc;

use amtwsman::WsmanGateway;

use crate::boot::BootController;
use crate::kvm::KvmController;
use crate::power::PowerController;
use crate::pxe::{PxeBootReport, force_pxe_boot};

/// The three controllers of one device, sharing a single gateway
#[derive(Debug)]
pub struct AmtDevice<G> {
    pub power: PowerController<Arc<G>>,
    pub boot: BootController<Arc<G>>,
    pub kvm: KvmController<Arc<G>>,
}

impl<G: WsmanGateway> AmtDevice<G> {
    pub fn new(gateway: G) -> Self {
        Self::from_shared(Arc::new(gateway))
    }

    pub fn from_shared(gateway: Arc<G>) -> Self {
        Self {
            power: PowerController::new(gateway.clone()),
            boot: BootController::new(gateway.clone()),
            kvm: KvmController::new(gateway),
        }
    }

    pub fn force_pxe_boot(&self) -> amtwsman::Result<PxeBootReport> {
        force_pxe_boot(&self.boot, &self.power)
    }
}
