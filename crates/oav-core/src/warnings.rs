use indexmap::IndexSet;

/// Insertion-ordered, de-duplicated collection of non-fatal warnings.
///
/// Schema resolution never fails hard; problems degrade the output and are
/// recorded here. Each distinct message is logged once.
#[derive(Debug, Clone, Default)]
pub struct WarningSink {
    messages: IndexSet<String>,
}

impl WarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Duplicate messages are ignored.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.messages.insert(message.clone()) {
            log::warn!("{message}");
        }
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.contains(message)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Drain the accumulated messages into a plain list.
    pub fn into_messages(self) -> Vec<String> {
        self.messages.into_iter().collect()
    }

    pub fn to_messages(&self) -> Vec<String> {
        self.messages.iter().cloned().collect()
    }
}
