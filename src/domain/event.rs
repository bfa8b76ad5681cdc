//! Changes observed in a vault.

/// Vault-relative paths of notes that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Modified(String),
    Deleted(String),
    Renamed { from: String, to: String },
    Opened(String),
}

impl VaultEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            VaultEvent::Modified(_) => "modified",
            VaultEvent::Deleted(_) => "deleted",
            VaultEvent::Renamed { .. } => "renamed",
            VaultEvent::Opened(_) => "opened",
        }
    }

    /// Path of the note as it exists after the event.
    pub fn path(&self) -> &str {
        match self {
            VaultEvent::Modified(path) | VaultEvent::Deleted(path) | VaultEvent::Opened(path) => {
                path
            }
            VaultEvent::Renamed { to, .. } => to,
        }
    }
}
