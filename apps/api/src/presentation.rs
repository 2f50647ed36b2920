//! Presentation-level context objects: colour theme and a mirror of the
//! current admin session. Both are created explicitly and passed around; there
//! are no ambient globals.

use std::fmt;
use std::str::FromStr;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::auth::{AdminUser, AuthEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{other}'")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeContext {
    theme: Theme,
}

impl ThemeContext {
    /// A saved preference wins; otherwise follow the system setting.
    /// An unreadable saved value is treated as absent.
    pub fn resolve(saved: Option<&str>, prefers_dark: bool) -> Self {
        let theme = saved
            .and_then(|s| s.parse().ok())
            .unwrap_or(if prefers_dark { Theme::Dark } else { Theme::Light });
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flips the theme and returns the value to persist.
    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}

/// Tracks who is signed in by applying auth-state events in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionMirror {
    current_user: Option<AdminUser>,
}

impl SessionMirror {
    pub fn new(initial: Option<AdminUser>) -> Self {
        Self {
            current_user: initial,
        }
    }

    pub fn current_user(&self) -> Option<&AdminUser> {
        self.current_user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn apply(&mut self, event: &AuthEvent) {
        self.current_user = match event {
            AuthEvent::SignedIn(user) => Some(user.clone()),
            AuthEvent::SignedOut => None,
        };
    }

    /// Follows an event subscription until the sender goes away, calling
    /// `on_change` after every applied event.
    pub async fn follow(
        mut self,
        mut events: broadcast::Receiver<AuthEvent>,
        mut on_change: impl FnMut(&SessionMirror) + Send,
    ) -> Self {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.apply(&event);
                    on_change(&self);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Session mirror skipped {skipped} auth events");
                }
                Err(RecvError::Closed) => return self,
            }
        }
    }
}
