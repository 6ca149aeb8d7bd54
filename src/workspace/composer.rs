//! Reply composer text

/// The operator's reply being written for the active conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    text: String,
}

impl Composer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the text with an inserted assistant draft
    pub fn apply_draft(&mut self, draft: String) {
        self.text = draft;
    }

    /// Take the text for sending, leaving the composer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}
