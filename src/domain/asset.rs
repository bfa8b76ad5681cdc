//! Image references found in a rendered note and the rules used to inline them.

use std::path::Path;

use percent_encoding::percent_decode_str;

const VAULT_URI_SCHEME: &str = "app://local/";
const DEFAULT_EXTENSION: &str = "png";
const EXTERNAL_SCHEMES: [&str; 2] = ["http", "https"];

/// Where an image source points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// A file inside the vault, as a vault-relative path.
    LocalVaultPath(String),
    /// Already inlined bytes.
    DataUri,
    /// Anything else: remote images, `file:` URLs and other schemes.
    RemoteUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub raw_source: String,
    pub kind: AssetKind,
}

impl AssetReference {
    pub fn classify(raw_source: &str, vault_prefix: &str) -> Self {
        let kind = if raw_source.starts_with("data:") {
            AssetKind::DataUri
        } else if let Some(path) = vault_relative_path(raw_source, vault_prefix) {
            AssetKind::LocalVaultPath(path)
        } else {
            AssetKind::RemoteUrl
        };
        Self {
            raw_source: raw_source.to_string(),
            kind,
        }
    }

    /// Lower-cased scheme, i.e. everything before the first `:`.
    pub fn scheme(&self) -> String {
        self.raw_source
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn is_external(&self) -> bool {
        EXTERNAL_SCHEMES.contains(&self.scheme().as_str())
    }

    pub fn is_inline_svg(&self) -> bool {
        self.raw_source.starts_with("data:image/svg+xml")
    }
}

/// What the resolver does with one image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlan {
    Keep,
    Rasterize,
    ReadVault { path: String },
}

impl ImagePlan {
    pub fn for_reference(
        reference: &AssetReference,
        convert_svg_to_bitmap: bool,
        embed_external_links: bool,
    ) -> Self {
        if reference.is_inline_svg() && convert_svg_to_bitmap {
            return ImagePlan::Rasterize;
        }
        if !embed_external_links && reference.is_external() {
            return ImagePlan::Keep;
        }
        match &reference.kind {
            AssetKind::DataUri => ImagePlan::Keep,
            AssetKind::LocalVaultPath(path) => ImagePlan::ReadVault { path: path.clone() },
            AssetKind::RemoteUrl => ImagePlan::Rasterize,
        }
    }
}

/// URI prefix the renderer uses for files inside the vault rooted at `base_path`.
pub fn vault_uri_prefix(base_path: &Path) -> String {
    let base = base_path.to_string_lossy().replace('\\', "/");
    format!("{VAULT_URI_SCHEME}{}", base.trim_start_matches('/'))
}

/// Vault-relative path of a source living under `vault_prefix`, with query and
/// fragment removed and percent-escapes decoded.
pub fn vault_relative_path(source: &str, vault_prefix: &str) -> Option<String> {
    let decoded = percent_decode_str(source).decode_utf8_lossy();
    let remainder = decoded.strip_prefix(vault_prefix)?;
    let mut chars = remainder.chars();
    chars.next()?;
    let remainder = chars.as_str();
    let end = remainder.find(['?', '#']).unwrap_or(remainder.len());
    let path = percent_decode_str(&remainder[..end])
        .decode_utf8_lossy()
        .into_owned();
    (!path.is_empty()).then_some(path)
}

/// Lower-cased extension of the final path segment, `png` when there is none.
pub fn file_extension(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rfind('.') {
        Some(index) if index + 1 < file_name.len() => file_name[index + 1..].to_ascii_lowercase(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// MIME type for an image path, inferred from its extension.
pub fn mime_type_for(path: &str) -> String {
    let extension = file_extension(path);
    match extension.as_str() {
        "svg" => "image/svg+xml".to_string(),
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "app://local/home/me/vault";

    #[test]
    fn mime_mapping_covers_exceptions_and_default() {
        assert_eq!(mime_type_for("img/photo.jpg"), "image/jpeg");
        assert_eq!(mime_type_for("img/photo.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("diagram.svg"), "image/svg+xml");
        assert_eq!(mime_type_for("local.png"), "image/png");
        assert_eq!(mime_type_for("anim.gif"), "image/gif");
        assert_eq!(mime_type_for("shot.webp"), "image/webp");
        assert_eq!(mime_type_for("assets.v2/noext"), "image/png");
        assert_eq!(mime_type_for("trailing."), "image/png");
    }

    #[test]
    fn vault_prefix_uses_forward_slashes() {
        assert_eq!(
            vault_uri_prefix(Path::new("C:\\Users\\me\\vault")),
            "app://local/C:/Users/me/vault"
        );
        assert_eq!(vault_uri_prefix(Path::new("/home/me/vault")), PREFIX);
    }

    #[test]
    fn vault_path_drops_query_and_decodes() {
        let source = "app://local/home/me/vault/attachments/my%20image.png?1700000000";
        assert_eq!(
            vault_relative_path(source, PREFIX).as_deref(),
            Some("attachments/my image.png")
        );
        assert_eq!(
            vault_relative_path("app://local/home/me/vault/a.png#frag", PREFIX).as_deref(),
            Some("a.png")
        );
        assert_eq!(vault_relative_path("https://example.com/a.png", PREFIX), None);
        assert_eq!(vault_relative_path(PREFIX, PREFIX), None);
    }

    #[test]
    fn classify_recognises_each_kind() {
        assert_eq!(
            AssetReference::classify("data:image/png;base64,AAAA", PREFIX).kind,
            AssetKind::DataUri
        );
        assert_eq!(
            AssetReference::classify("app://local/home/me/vault/x.png", PREFIX).kind,
            AssetKind::LocalVaultPath("x.png".to_string())
        );
        assert_eq!(
            AssetReference::classify("https://example.com/x.png", PREFIX).kind,
            AssetKind::RemoteUrl
        );
    }

    #[test]
    fn plan_keeps_external_images_unless_embedding() {
        let remote = AssetReference::classify("HTTPS://example.com/x.png", PREFIX);
        assert_eq!(ImagePlan::for_reference(&remote, true, false), ImagePlan::Keep);
        assert_eq!(
            ImagePlan::for_reference(&remote, true, true),
            ImagePlan::Rasterize
        );
    }

    #[test]
    fn plan_rasterizes_inline_svg_only_when_converting() {
        let svg = AssetReference::classify("data:image/svg+xml;base64,PHN2Zy8+", PREFIX);
        assert_eq!(ImagePlan::for_reference(&svg, true, false), ImagePlan::Rasterize);
        assert_eq!(ImagePlan::for_reference(&svg, false, false), ImagePlan::Keep);

        let png = AssetReference::classify("data:image/png;base64,AAAA", PREFIX);
        assert_eq!(ImagePlan::for_reference(&png, true, true), ImagePlan::Keep);
    }

    #[test]
    fn plan_reads_vault_files_regardless_of_embedding() {
        let local = AssetReference::classify("app://local/home/me/vault/a/b.jpg", PREFIX);
        let expected = ImagePlan::ReadVault {
            path: "a/b.jpg".to_string(),
        };
        assert_eq!(ImagePlan::for_reference(&local, true, false), expected);
        assert_eq!(ImagePlan::for_reference(&local, true, true), expected);
    }

    #[test]
    fn plan_rasterizes_other_local_sources() {
        let file = AssetReference::classify("file:///tmp/shot.png", PREFIX);
        assert_eq!(
            ImagePlan::for_reference(&file, true, false),
            ImagePlan::Rasterize
        );
    }
}
