//! Implicit node naming

use rustc_hash::FxHashMap;

/// Generates `<hint><count>` names for nodes built without an explicit name
///
/// Counters are per hint and start at 0, so two unnamed convolutions become
/// `convolution0` and `convolution1`.
#[derive(Debug, Default)]
pub struct NameManager {
    counters: FxHashMap<String, usize>,
}

impl NameManager {
    /// Create a manager with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `name` when given, otherwise the next name for `hint`
    pub fn get(&mut self, name: Option<&str>, hint: &str) -> String {
        if let Some(name) = name {
            return name.to_string();
        }

        let hint = hint.to_lowercase();
        let counter = self.counters.entry(hint.clone()).or_insert(0);
        let generated = format!("{}{}", hint, counter);
        *counter += 1;
        generated
    }
}
