/// A user action on a running session, independent of the input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// Select the choice at this zero-based index.
    Choose(usize),
    Next,
    Quit,
}

impl SessionInput {
    /// Map a key or typed word to an action.
    ///
    /// `1`..`9` and `a`..`h` select a choice, an empty line or `n` moves on,
    /// `q` quits. Anything else maps to `None`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        match key.as_str() {
            "" | "n" | "next" => return Some(Self::Next),
            "q" | "quit" | "exit" => return Some(Self::Quit),
            _ => {}
        }

        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        match c {
            '1'..='9' => c.to_digit(10).map(|d| Self::Choose(d as usize - 1)),
            'a'..='h' => Some(Self::Choose(c as usize - 'a' as usize)),
            _ => None,
        }
    }
}
