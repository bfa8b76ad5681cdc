//! Vault file handles.

/// A note inside the vault: its vault-relative path and its file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultFile {
    pub path: String,
    pub name: String,
}

impl VaultFile {
    /// Build a handle from a vault-relative path, normalising separators to `/`.
    pub fn from_path(path: impl AsRef<str>) -> Self {
        let path = path.as_ref().replace('\\', "/");
        let path = path.trim_start_matches('/').to_string();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name }
    }

    /// Document title: the file name without a trailing `.md` in any case.
    pub fn title(&self) -> &str {
        strip_markdown_extension(&self.name)
    }

    pub fn is_markdown(&self) -> bool {
        self.title().len() != self.name.len()
    }
}

fn strip_markdown_extension(name: &str) -> &str {
    let split = name.len().saturating_sub(3);
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(extension)) if extension.eq_ignore_ascii_case(".md") => stem,
        _ => name,
    }
}
