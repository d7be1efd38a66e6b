//! Display sleep inhibition through the operating system's own API.

use super::{Acquisition, LockHandle, Ticket, WakeLockProvider};
use crate::constants::APP_NAME;
use crate::error::WakefulError;
use keepawake::KeepAwake;
use log::debug;

const REASON: &str = "Keeping the screen on while you work";
const REVERSE_DOMAIN: &str = "com.wakeful.Wakeful";

#[derive(Debug, Default)]
pub struct SystemProvider;

impl SystemProvider {
    pub fn new() -> Self {
        Self
    }
}

impl WakeLockProvider for SystemProvider {
    fn name(&self) -> &'static str {
        "system"
    }

    fn supported(&self) -> bool {
        cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows"))
    }

    fn acquire(&mut self, ticket: Ticket) -> Acquisition {
        let result = keepawake::Builder::default()
            .display(true)
            .reason(REASON)
            .app_name(APP_NAME)
            .app_reverse_domain(REVERSE_DOMAIN)
            .create();

        match result {
            Ok(awake) => {
                debug!("system wake lock #{ticket} granted");
                Acquisition::Granted(Box::new(SystemHandle { awake: Some(awake) }))
            }
            Err(e) => Acquisition::Denied(WakefulError::AcquisitionFailed {
                reason: e.to_string(),
            }),
        }
    }
}

/// The OS releases the inhibition when the guard is dropped.
struct SystemHandle {
    awake: Option<KeepAwake>,
}

impl LockHandle for SystemHandle {
    fn release(&mut self) -> Result<(), WakefulError> {
        drop(self.awake.take());
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.awake.is_none()
    }
}
