//! Render instructions returned to the transport
//!
//! Screen text is HTML (the subset chat transports accept: `<b>`, `<i>`,
//! `<code>`). Layout beyond rows of buttons is the transport's business.

use super::action::Action;

/// One button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label
    pub label: String,
    /// What pressing it does
    pub action: Action,
}

impl Button {
    /// Create a button
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of buttons under a screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Empty keyboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row (empty rows are skipped)
    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Append a single-button row
    pub fn button(self, label: impl Into<String>, action: Action) -> Self {
        self.row(vec![Button::new(label, action)])
    }

    /// Every button, row by row
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A full screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// HTML text
    pub text: String,
    /// Buttons, if any
    pub keyboard: Option<Keyboard>,
}

impl Screen {
    /// Screen without buttons
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Screen with buttons
    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    /// Find the first button whose action matches `predicate`
    pub fn find_action(&self, predicate: impl Fn(&Action) -> bool) -> Option<&Action> {
        self.keyboard
            .as_ref()?
            .buttons()
            .map(|button| &button.action)
            .find(|action| predicate(action))
    }
}

/// Short acknowledgement (toast, or a plain message for text input)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Plain text
    pub text: String,
    /// Needs dismissal (errors)
    pub alert: bool,
}

/// What the transport should show in reply to one event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    /// Acknowledgement, shown before the screen
    pub notice: Option<Notice>,
    /// Screen to display; `None` leaves the current one in place
    pub screen: Option<Screen>,
}

impl Response {
    /// Show `screen`
    pub fn screen(screen: Screen) -> Self {
        Self {
            notice: None,
            screen: Some(screen),
        }
    }

    /// Acknowledge only
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            notice: Some(Notice {
                text: text.into(),
                alert: false,
            }),
            screen: None,
        }
    }

    /// Report an error only
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            notice: Some(Notice {
                text: text.into(),
                alert: true,
            }),
            screen: None,
        }
    }

    /// Nothing to show
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a screen
    pub fn and_screen(mut self, screen: Screen) -> Self {
        self.screen = Some(screen);
        self
    }
}
