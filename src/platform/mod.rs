mod types;

pub use types::{Acquisition, LockHandle, Ticket, WakeLockProvider};

pub mod system;

#[cfg(target_os = "linux")]
pub mod linux;

use crate::constants::BACKEND_ENV;
use crate::error::WakefulError;
use log::warn;

pub use system::SystemProvider;

#[cfg(target_os = "linux")]
pub use linux::X11Provider;

/// Stand-in for platforms with no way to keep the display awake.
pub struct UnsupportedProvider;

impl WakeLockProvider for UnsupportedProvider {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn supported(&self) -> bool {
        false
    }

    fn acquire(&mut self, _ticket: Ticket) -> Acquisition {
        Acquisition::Denied(WakefulError::Unsupported)
    }
}

/// Provider selected through `WAKEFUL_BACKEND`, the system one by default.
pub fn native_provider() -> Box<dyn WakeLockProvider> {
    let backend = std::env::var(BACKEND_ENV).unwrap_or_default();
    provider_for(backend.trim())
}

pub fn provider_for(backend: &str) -> Box<dyn WakeLockProvider> {
    match backend {
        "" | "system" => Box::new(SystemProvider::new()),
        #[cfg(target_os = "linux")]
        "x11" => Box::new(X11Provider::new()),
        "none" => Box::new(UnsupportedProvider),
        other => {
            warn!("unknown {BACKEND_ENV} '{other}', using the system provider");
            Box::new(SystemProvider::new())
        }
    }
}
