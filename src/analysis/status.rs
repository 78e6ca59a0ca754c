#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    Success,
    Error,
    Loading,
    #[default]
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusNotice {
    pub text: String,
    pub severity: Severity,
}

/// Single-slot notice surface. Every `set` replaces the previous notice.
#[derive(Debug, Default)]
pub struct StatusChannel {
    current: StatusNotice,
}

impl StatusChannel {
    pub fn set(&mut self, text: impl Into<String>, severity: Severity) {
        let text = text.into();
        log::trace!("Status [{:?}] {}", severity, text);
        self.current = StatusNotice { text, severity };
    }

    pub fn current(&self) -> &StatusNotice {
        &self.current
    }
}
