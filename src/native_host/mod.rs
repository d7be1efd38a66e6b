//! Native messaging host: drives a [`WakeLockController`] from the editor.
//!
//! Frames are a little-endian `u32` length followed by that many bytes of
//! JSON, in both directions. stdin is read on a helper thread; everything
//! else runs on the calling thread, which sleeps until the next frame or the
//! controller's next deadline, whichever comes first.

use crate::constants::MAX_MESSAGE_SIZE;
use crate::controller::{ControllerParts, WakeLockController};
use crate::error::WakefulError;
use crate::platform::WakeLockProvider;
use crate::settings::SettingsPersistence;
use crate::signals::{Ambient, Signal};
use crate::strategy::StrategyKind;
use crate::ui::{IndicatorState, NoticeSink, StatusIndicator, WakeLockObserver};
use crate::validation::validate_strategy_name;
use crate::wake_lock::{ResourceConfig, WakeLockEvent};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "visibility")]
    Visibility { visible: bool },
    #[serde(rename = "window_focus")]
    WindowFocus,
    #[serde(rename = "window_blur")]
    WindowBlur,
    #[serde(rename = "orientation_change")]
    OrientationChange,
    #[serde(rename = "active_view")]
    ActiveView { editor: bool },
    #[serde(rename = "editor_change")]
    EditorChange,
    #[serde(rename = "settings_dialog")]
    SettingsDialog { open: bool },
    #[serde(rename = "toggle")]
    Toggle,
    #[serde(rename = "set_enabled")]
    SetEnabled { enabled: bool },
    #[serde(rename = "set_strategy")]
    SetStrategy { strategy: String },
    #[serde(rename = "set_delay")]
    SetDelay { seconds: f64 },
    #[serde(rename = "set_show_in_status_bar")]
    SetShowInStatusBar { show: bool },
    #[serde(rename = "set_show_notifications")]
    SetShowNotifications { show: bool },
    #[serde(rename = "set_dev_mode")]
    SetDevMode { enabled: bool },
    #[serde(rename = "reload_settings")]
    ReloadSettings,
    #[serde(rename = "request_state")]
    RequestState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "state")]
    State {
        enabled: bool,
        strategy: StrategyKind,
        #[serde(rename = "strategyLabel")]
        strategy_label: String,
        #[serde(rename = "lockActive")]
        lock_active: bool,
        indicator: IndicatorState,
        #[serde(rename = "delaySeconds")]
        delay_secs: f64,
    },
    #[serde(rename = "indicator")]
    Indicator {
        state: IndicatorState,
        visible: bool,
        icon: String,
        label: String,
    },
    #[serde(rename = "notice")]
    Notice { message: String },
    #[serde(rename = "lock")]
    Lock { active: bool },
    #[serde(rename = "error")]
    Error { message: String },
}

impl OutgoingMessage {
    /// Indicator update carrying what the status bar should render.
    pub fn indicator(state: IndicatorState, visible: bool) -> Self {
        OutgoingMessage::Indicator {
            state,
            visible,
            icon: state.icon().to_string(),
            label: state.label(),
        }
    }
}

/// Messages queued for the editor, shared by the UI sinks and the host.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Rc<RefCell<Vec<OutgoingMessage>>>,
}

impl Clone for Outbox {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl Outbox {
    pub fn push(&self, message: OutgoingMessage) {
        self.queue.borrow_mut().push(message);
    }

    pub fn drain(&self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

struct HostIndicator {
    outbox: Outbox,
    state: IndicatorState,
    visible: bool,
}

impl HostIndicator {
    fn announce(&self) {
        self.outbox.push(OutgoingMessage::indicator(self.state, self.visible));
    }
}

impl StatusIndicator for HostIndicator {
    fn set_state(&mut self, state: IndicatorState) {
        self.state = state;
        self.announce();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.announce();
    }
}

struct HostNotices {
    outbox: Outbox,
}

impl NoticeSink for HostNotices {
    fn notice(&mut self, message: &str) {
        self.outbox.push(OutgoingMessage::Notice {
            message: message.to_string(),
        });
    }
}

struct HostLockObserver {
    outbox: Outbox,
}

impl WakeLockObserver for HostLockObserver {
    fn on_event(&mut self, event: &WakeLockEvent) {
        let message = match event {
            WakeLockEvent::Request => OutgoingMessage::Lock { active: true },
            WakeLockEvent::Release => OutgoingMessage::Lock { active: false },
            WakeLockEvent::Error { reason } => OutgoingMessage::Error {
                message: reason.clone(),
            },
        };
        self.outbox.push(message);
    }
}

pub struct NativeHost {
    controller: WakeLockController,
    outbox: Outbox,
}

impl NativeHost {
    /// Start the controller with UI sinks that queue into `outbox`.
    ///
    /// On failure the outbox still holds whatever was posted (for an
    /// unsupported platform: the notice and the disabled indicator).
    pub fn start(
        provider: Box<dyn WakeLockProvider>,
        persistence: Box<dyn SettingsPersistence>,
        outbox: &Outbox,
        now: Instant,
    ) -> Result<Self, WakefulError> {
        let parts = ControllerParts {
            provider,
            persistence,
            indicator: Box::new(HostIndicator {
                outbox: outbox.clone(),
                state: IndicatorState::Off,
                visible: true,
            }),
            notices: Box::new(HostNotices {
                outbox: outbox.clone(),
            }),
        };
        let mut controller =
            WakeLockController::start(parts, ResourceConfig::default(), Ambient::default(), now)?;
        controller.observe(Box::new(HostLockObserver {
            outbox: outbox.clone(),
        }));

        Ok(Self {
            controller,
            outbox: outbox.clone(),
        })
    }

    pub fn controller(&self) -> &WakeLockController {
        &self.controller
    }

    /// Decode one frame payload and act on it. Bad input is answered with an
    /// `error` message rather than ending the session.
    pub fn handle_frame(&mut self, payload: &[u8], now: Instant) {
        let message = match serde_json::from_slice::<IncomingMessage>(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("unreadable message: {e}");
                self.outbox.push(OutgoingMessage::Error {
                    message: format!("unreadable message: {e}"),
                });
                return;
            }
        };
        debug!("received {message:?}");

        if let Err(e) = self.handle_message(message, now) {
            warn!("{e}");
            self.outbox.push(OutgoingMessage::Error { message: e.into() });
        }
    }

    pub fn poll(&mut self, now: Instant) {
        self.controller.poll(now);
    }

    pub fn drain_outgoing(&self) -> Vec<OutgoingMessage> {
        self.outbox.drain()
    }

    pub fn shutdown(&mut self, now: Instant) {
        self.controller.shutdown(now);
    }

    fn handle_message(&mut self, message: IncomingMessage, now: Instant) -> Result<(), WakefulError> {
        let controller = &mut self.controller;
        match message {
            IncomingMessage::Visibility { visible } => {
                controller.handle_signal(Signal::VisibilityChanged(visible.into()), now);
            }
            IncomingMessage::WindowFocus => controller.handle_signal(Signal::WindowFocused, now),
            IncomingMessage::WindowBlur => controller.handle_signal(Signal::WindowBlurred, now),
            IncomingMessage::OrientationChange => {
                controller.handle_signal(Signal::OrientationChanged, now);
            }
            IncomingMessage::ActiveView { editor } => {
                controller.handle_signal(Signal::ActiveViewChanged { editor }, now);
            }
            IncomingMessage::EditorChange => controller.handle_signal(Signal::EditorChanged, now),
            IncomingMessage::SettingsDialog { open } => {
                controller.handle_signal(Signal::SettingsDialog { open }, now);
            }
            IncomingMessage::Toggle => controller.toggle(now)?,
            IncomingMessage::SetEnabled { enabled } => controller.set_enabled(enabled, now)?,
            IncomingMessage::SetStrategy { strategy } => {
                let kind = validate_strategy_name(&strategy)?;
                controller.set_strategy(kind, now)?;
            }
            IncomingMessage::SetDelay { seconds } => controller.set_delay_secs(seconds, now)?,
            IncomingMessage::SetShowInStatusBar { show } => {
                controller.set_show_in_status_bar(show, now)?;
            }
            IncomingMessage::SetShowNotifications { show } => {
                controller.set_show_notifications(show, now)?;
            }
            IncomingMessage::SetDevMode { enabled } => controller.set_dev_mode(enabled, now)?,
            IncomingMessage::ReloadSettings => controller.reload_settings(now)?,
            IncomingMessage::RequestState => {
                let message = self.state_message();
                self.outbox.push(message);
            }
        }
        Ok(())
    }

    fn state_message(&self) -> OutgoingMessage {
        let state = self.controller.state();
        OutgoingMessage::State {
            enabled: state.enabled,
            strategy: state.strategy,
            strategy_label: state.strategy.label().to_string(),
            lock_active: state.lock_active,
            indicator: state.indicator,
            delay_secs: self.controller.settings().delay_secs,
        }
    }

    fn flush<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for message in self.drain_outgoing() {
            write_message(writer, &message)?;
        }
        Ok(())
    }

    /// Serve until `reader` hits end of stream, then release everything.
    pub fn run<R, W>(mut self, reader: R, writer: &mut W) -> io::Result<()>
    where
        R: Read + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = reader;
            loop {
                let frame = read_frame(&mut reader);
                let stop = frame.is_err();
                if tx.send(frame).is_err() || stop {
                    break;
                }
            }
        });

        loop {
            self.controller.poll(Instant::now());
            self.flush(writer)?;

            let received = match self.controller.next_deadline() {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Ok(payload)) => self.handle_frame(&payload, Instant::now()),
                Ok(Err(e)) => {
                    self.shutdown(Instant::now());
                    self.flush(writer)?;
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        info!("editor closed the connection");
                        return Ok(());
                    }
                    return Err(e);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.shutdown(Instant::now());
                    return self.flush(writer);
                }
            }
        }
    }
}

/// Read one length-prefixed frame payload.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {} bytes", json.len()),
        ));
    }
    let len = u32::try_from(json.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}
