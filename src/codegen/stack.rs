use std::fmt;

/// Compile-time model of the VM data stack. Each slot carries the name of the
/// variable it binds, or the text of the expression that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    slots: Vec<String>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.slots.push(name.into());
    }

    pub fn pop_n(&mut self, n: usize) {
        let keep = self.slots.len().saturating_sub(n);
        self.slots.truncate(keep);
    }

    /// Distance from the top of the topmost slot named `name` (top is 0).
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().rev().position(|s| s == name)
    }

    /// Moves the slot at `depth` to the top (ROLL).
    pub fn roll(&mut self, depth: usize) {
        if depth < self.slots.len() {
            let idx = self.slots.len() - 1 - depth;
            let slot = self.slots.remove(idx);
            self.slots.push(slot);
        }
    }

    /// Copies the slot at `depth` to the top (PICK) under a fresh name.
    pub fn pick(&mut self, depth: usize, copy_name: impl Into<String>) {
        if depth < self.slots.len() {
            self.slots.push(copy_name.into());
        }
    }

    pub fn rename_top(&mut self, name: impl Into<String>) {
        if let Some(top) = self.slots.last_mut() {
            *top = name.into();
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.slots.join(" "))
    }
}
