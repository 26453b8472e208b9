//! Type aliases and small shared types.

/// A POSIX account name.
pub type Username = String;

/// One raw line from a key source.
pub type KeyLine = String;

/// Whether an operation mutated the host or found it already converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

impl Outcome {
    pub fn is_changed(self) -> bool {
        matches!(self, Outcome::Changed)
    }
}

/// What a removal tears down beyond the primary target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Also remove the account's `authorized_keys`.
    pub remove_user: bool,
    /// Also delete the account. Implies `remove_user`.
    pub delete_account: bool,
    /// Keep the home directory when deleting the account.
    pub keep_home: bool,
}
