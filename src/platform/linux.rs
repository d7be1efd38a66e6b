//! X11 screen saver suspension through the MIT-SCREEN-SAVER extension.
//!
//! Suspension is tied to the client connection: if the host dies, the X
//! server resumes the screen saver on its own.

use super::{Acquisition, LockHandle, Ticket, WakeLockProvider};
use crate::error::WakefulError;
use log::{debug, warn};
use std::rc::Rc;
use x11rb::connection::Connection;
use x11rb::protocol::screensaver;
use x11rb::rust_connection::RustConnection;

pub struct X11Provider {
    conn: Option<Rc<RustConnection>>,
}

impl Default for X11Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl X11Provider {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, _screen_num)) => {
                let has_extension = screensaver::query_version(&conn, 1, 1)
                    .ok()
                    .and_then(|cookie| cookie.reply().ok())
                    .is_some();
                if !has_extension {
                    warn!("X server lacks the screen saver extension, X11 backend disabled");
                    return Self { conn: None };
                }
                Self {
                    conn: Some(Rc::new(conn)),
                }
            }
            Err(e) => {
                // Wayland or headless sessions end up here.
                warn!("Failed to connect to X server: {e}. X11 backend disabled.");
                Self { conn: None }
            }
        }
    }
}

fn set_suspended(conn: &RustConnection, suspended: bool) -> Result<(), String> {
    screensaver::suspend(conn, u32::from(suspended))
        .map_err(|e| e.to_string())?
        .check()
        .map_err(|e| e.to_string())?;
    conn.flush().map_err(|e| e.to_string())
}

impl WakeLockProvider for X11Provider {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn supported(&self) -> bool {
        self.conn.is_some()
    }

    fn acquire(&mut self, ticket: Ticket) -> Acquisition {
        let Some(conn) = self.conn.as_ref() else {
            return Acquisition::Denied(WakefulError::Unsupported);
        };

        match set_suspended(conn, true) {
            Ok(()) => {
                debug!("screen saver suspended for #{ticket}");
                Acquisition::Granted(Box::new(X11Handle {
                    conn: Rc::clone(conn),
                    released: false,
                }))
            }
            Err(reason) => Acquisition::Denied(WakefulError::AcquisitionFailed { reason }),
        }
    }
}

struct X11Handle {
    conn: Rc<RustConnection>,
    released: bool,
}

impl LockHandle for X11Handle {
    fn release(&mut self) -> Result<(), WakefulError> {
        if self.released {
            return Ok(());
        }
        set_suspended(&self.conn, false).map_err(|reason| WakefulError::ReleaseFailed { reason })?;
        self.released = true;
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for X11Handle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{e}");
        }
    }
}
