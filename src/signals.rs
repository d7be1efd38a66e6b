//! Ambient signals reported by the host application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    VisibilityChanged(Visibility),
    WindowFocused,
    WindowBlurred,
    OrientationChanged,
    /// The active view changed; `editor` tells whether it is an editing view.
    ActiveViewChanged { editor: bool },
    /// Content of the active editor changed (typing).
    EditorChanged,
    /// A settings dialog appeared or disappeared.
    SettingsDialog { open: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Visibility,
    WindowFocus,
    WindowBlur,
    Orientation,
    ActiveView,
    EditorChange,
    DialogPresence,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::VisibilityChanged(_) => SignalKind::Visibility,
            Signal::WindowFocused => SignalKind::WindowFocus,
            Signal::WindowBlurred => SignalKind::WindowBlur,
            Signal::OrientationChanged => SignalKind::Orientation,
            Signal::ActiveViewChanged { .. } => SignalKind::ActiveView,
            Signal::EditorChanged => SignalKind::EditorChange,
            Signal::SettingsDialog { .. } => SignalKind::DialogPresence,
        }
    }
}

/// Latest known state of the host, updated from every signal whether or not
/// a strategy listens to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ambient {
    pub visible: bool,
    pub editor_active: bool,
    pub settings_dialog_open: bool,
}

impl Default for Ambient {
    fn default() -> Self {
        Self {
            visible: true,
            editor_active: false,
            settings_dialog_open: false,
        }
    }
}

impl Ambient {
    pub fn apply(&mut self, signal: &Signal) {
        match *signal {
            Signal::VisibilityChanged(visibility) => {
                self.visible = visibility == Visibility::Visible;
            }
            Signal::ActiveViewChanged { editor } => self.editor_active = editor,
            Signal::SettingsDialog { open } => self.settings_dialog_open = open,
            Signal::WindowFocused
            | Signal::WindowBlurred
            | Signal::OrientationChanged
            | Signal::EditorChanged => {}
        }
    }
}

/// Registered listeners per signal kind. Signals of a kind nobody listens to
/// are not delivered.
#[derive(Debug, Default)]
pub struct SignalBus {
    listeners: BTreeMap<SignalKind, usize>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: SignalKind) {
        *self.listeners.entry(kind).or_insert(0) += 1;
    }

    pub fn unsubscribe(&mut self, kind: SignalKind) {
        if let Some(count) = self.listeners.get_mut(&kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.listeners.remove(&kind);
            }
        }
    }

    pub fn is_subscribed(&self, kind: SignalKind) -> bool {
        self.listeners.contains_key(&kind)
    }

    pub fn listener_count(&self, kind: SignalKind) -> usize {
        self.listeners.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Kinds with at least one listener, in a stable order.
    pub fn subscribed_kinds(&self) -> Vec<SignalKind> {
        self.listeners.keys().copied().collect()
    }
}
