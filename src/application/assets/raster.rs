use std::{io::Cursor, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use reqwest::{Client, header::CONTENT_TYPE};
use resvg::{tiny_skia, usvg};
use tracing::{info, trace};

use super::AssetError;

const PNG_DATA_PREFIX: &str = "data:image/png;base64,";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Largest surface side and pixel count a single image may be drawn at.
const MAX_SIDE: u32 = 16_384;
const MAX_AREA: u64 = 1 << 28;

/// Fonts used for text inside vector graphics, loaded once per process.
static FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut fonts = usvg::fontdb::Database::new();
    fonts.load_system_fonts();
    Arc::new(fonts)
});

/// Result of drawing an image onto a bitmap surface. Conversion never fails at
/// the type level: anything that cannot be converted keeps its original URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterOutcome {
    /// `data:image/png;base64,…` of the drawn surface.
    Converted(String),
    Fallback(String),
}

impl RasterOutcome {
    pub fn into_src(self) -> String {
        match self {
            RasterOutcome::Converted(src) | RasterOutcome::Fallback(src) => src,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, RasterOutcome::Converted(_))
    }
}

struct Payload {
    mime: Option<String>,
    bytes: Bytes,
}

/// Loads an image from a URL and re-encodes it as a PNG data URI.
#[derive(Debug, Clone)]
pub struct RasterConverter {
    client: Client,
    fetch_timeout: Duration,
}

impl RasterConverter {
    /// Build a converter with an anonymous HTTP client: no cookie store and no
    /// credentials are ever attached to image requests.
    pub fn new() -> Result<Self, AssetError> {
        let client = Client::builder()
            .user_agent(concat!("vault-copy/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub async fn rasterize(&self, url: &str) -> RasterOutcome {
        match self.try_rasterize(url).await {
            Ok(data_uri) => {
                trace!(
                    target = "application::assets::raster",
                    op = "rasterize",
                    result = "converted",
                    source = %preview(url),
                    "image drawn to bitmap"
                );
                RasterOutcome::Converted(data_uri)
            }
            Err(error) => {
                info!(
                    target = "application::assets::raster",
                    op = "rasterize",
                    result = "fallback",
                    source = %preview(url),
                    error = %error,
                    "keeping original image source"
                );
                RasterOutcome::Fallback(url.to_string())
            }
        }
    }

    async fn try_rasterize(&self, url: &str) -> Result<String, AssetError> {
        let payload = self.load(url).await?;
        let png = tokio::task::spawn_blocking(move || draw_to_png(&payload))
            .await
            .map_err(AssetError::decode)??;
        Ok(format!("{PNG_DATA_PREFIX}{}", STANDARD.encode(png)))
    }

    async fn load(&self, url: &str) -> Result<Payload, AssetError> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();
        match scheme.as_str() {
            "data" => parse_data_uri(url),
            "http" | "https" => self.fetch(url).await,
            "file" => {
                let path = url::Url::parse(url)
                    .ok()
                    .and_then(|parsed| parsed.to_file_path().ok())
                    .ok_or_else(|| AssetError::load(url, "not a local file path"))?;
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|err| AssetError::load(url, err))?;
                Ok(Payload {
                    mime: None,
                    bytes: Bytes::from(bytes),
                })
            }
            _ => Err(AssetError::UnsupportedScheme { scheme }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Payload, AssetError> {
        tokio::time::timeout(self.fetch_timeout, self.download(url))
            .await
            .map_err(|_| {
                AssetError::load(
                    url,
                    format!("no response within {}ms", self.fetch_timeout.as_millis()),
                )
            })?
    }

    async fn download(&self, url: &str) -> Result<Payload, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| AssetError::load(url, err))?;
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AssetError::load(url, err))?;
        Ok(Payload { mime, bytes })
    }
}

fn parse_data_uri(url: &str) -> Result<Payload, AssetError> {
    let rest = &url["data:".len()..];
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::load(preview(url), "data URI has no payload"))?;
    let mut parts = header.split(';');
    let mime = parts
        .next()
        .filter(|mime| !mime.is_empty())
        .map(str::to_ascii_lowercase);
    let is_base64 = parts.any(|part| part.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let compact: String = percent_decode_str(data)
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|err| AssetError::load(preview(url), err))?
    } else {
        percent_decode_str(data).collect()
    };
    Ok(Payload {
        mime,
        bytes: Bytes::from(bytes),
    })
}

fn draw_to_png(payload: &Payload) -> Result<Vec<u8>, AssetError> {
    if is_svg(payload) {
        draw_svg(&payload.bytes)
    } else {
        draw_raster(&payload.bytes)
    }
}

fn is_svg(payload: &Payload) -> bool {
    if payload
        .mime
        .as_deref()
        .is_some_and(|mime| mime.contains("svg"))
    {
        return true;
    }
    let head = &payload.bytes[..payload.bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

fn draw_svg(data: &[u8]) -> Result<Vec<u8>, AssetError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(data, &options).map_err(AssetError::decode)?;
    let size = tree.size().to_int_size();
    check_surface(size.width(), size.height())?;
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        AssetError::encode(format!(
            "cannot allocate a {}x{} surface",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(AssetError::encode)
}

fn draw_raster(data: &[u8]) -> Result<Vec<u8>, AssetError> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(AssetError::decode)?;
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);
    limits.max_alloc = Some(MAX_AREA * 4);
    reader.limits(limits);
    let decoded = reader.decode().map_err(AssetError::decode)?;
    check_surface(decoded.width(), decoded.height())?;
    let surface = decoded.to_rgba8();
    if surface.width() == 0 || surface.height() == 0 {
        return Err(AssetError::encode("image has no pixels"));
    }
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(surface)
        .write_to(&mut png, ImageFormat::Png)
        .map_err(AssetError::encode)?;
    Ok(png.into_inner())
}

fn check_surface(width: u32, height: u32) -> Result<(), AssetError> {
    if width > MAX_SIDE || height > MAX_SIDE || u64::from(width) * u64::from(height) > MAX_AREA {
        return Err(AssetError::encode(format!(
            "a {width}x{height} surface exceeds the {MAX_SIDE}px drawing limit"
        )));
    }
    Ok(())
}

/// Data URIs can be huge; logs only carry their head.
fn preview(url: &str) -> String {
    const LIMIT: usize = 64;
    match url.char_indices().nth(LIMIT) {
        Some((index, _)) => format!("{}…", &url[..index]),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba};

    use super::*;

    fn converter() -> RasterConverter {
        RasterConverter::with_client(Client::new())
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = ImageBuffer::from_pixel(width, height, Rgba([200u8, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    fn decode_png_uri(uri: &str) -> DynamicImage {
        let payload = uri.strip_prefix(PNG_DATA_PREFIX).expect("png data uri");
        let bytes = STANDARD.decode(payload).expect("base64");
        image::load_from_memory_with_format(&bytes, ImageFormat::Png).expect("png")
    }

    #[tokio::test]
    async fn svg_data_uri_is_drawn_at_natural_size() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="blue"/></svg>"#;
        let uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg));
        let outcome = converter().rasterize(&uri).await;
        let RasterOutcome::Converted(src) = outcome else {
            panic!("expected conversion, got {outcome:?}");
        };
        let image = decode_png_uri(&src);
        assert_eq!((image.width(), image.height()), (40, 20));
    }

    #[tokio::test]
    async fn percent_encoded_svg_is_sniffed() {
        let uri = "data:,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20width%3D%225%22%20height%3D%225%22%2F%3E";
        assert!(converter().rasterize(uri).await.is_converted());
    }

    #[tokio::test]
    async fn raster_images_are_reencoded_as_png() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(3, 7)));
        let src = converter().rasterize(&uri).await.into_src();
        let image = decode_png_uri(&src);
        assert_eq!((image.width(), image.height()), (3, 7));
    }

    #[tokio::test]
    async fn file_urls_are_read_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pic.png");
        std::fs::write(&path, png_bytes(2, 2)).expect("write");
        let url = url::Url::from_file_path(&path).expect("file url");
        assert!(converter().rasterize(url.as_str()).await.is_converted());
    }

    #[tokio::test]
    async fn failures_fall_back_to_the_original_url() {
        let converter = converter();
        for url in [
            "data:image/png;base64,not-an-image",
            "data:image/svg+xml;base64,PHA+bm90IHN2ZzwvcD4=",
            "ftp://example.com/a.png",
            "file:///definitely/missing/image.png",
            "no scheme at all",
        ] {
            assert_eq!(
                converter.rasterize(url).await,
                RasterOutcome::Fallback(url.to_string()),
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn zero_sized_svg_falls_back() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="10"/>"#;
        let uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg));
        assert!(!converter().rasterize(&uri).await.is_converted());
    }

    #[tokio::test]
    async fn oversized_svg_falls_back_without_allocating() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="200000" height="200000"/>"#;
        let uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg));
        assert_eq!(
            converter().rasterize(&uri).await,
            RasterOutcome::Fallback(uri.clone())
        );
    }

    #[tokio::test]
    async fn oversized_raster_header_falls_back() {
        // Bitmap header declaring 100000x100000 pixels with no pixel data.
        let mut bmp = Vec::new();
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&54u32.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&54u32.to_le_bytes());
        bmp.extend_from_slice(&40u32.to_le_bytes());
        bmp.extend_from_slice(&100_000i32.to_le_bytes());
        bmp.extend_from_slice(&100_000i32.to_le_bytes());
        bmp.extend_from_slice(&1u16.to_le_bytes());
        bmp.extend_from_slice(&24u16.to_le_bytes());
        bmp.extend_from_slice(&[0u8; 24]);
        let uri = format!("data:image/bmp;base64,{}", STANDARD.encode(bmp));
        assert!(!converter().rasterize(&uri).await.is_converted());
    }

    #[test]
    fn surface_limits_cover_side_and_area() {
        assert!(check_surface(MAX_SIDE, 1).is_ok());
        assert!(check_surface(MAX_SIDE + 1, 1).is_err());
        assert!(check_surface(1, MAX_SIDE + 1).is_err());
        assert!(check_surface(200_000, 200_000).is_err());
        assert!(check_surface(MAX_SIDE, MAX_SIDE).is_ok());
    }

    #[tokio::test]
    async fn silent_servers_time_out_to_the_original_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let address = listener.local_addr().expect("address");
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let url = format!("http://{address}/photo.png");
        let converter = converter().with_fetch_timeout(Duration::from_millis(200));
        let outcome = tokio::time::timeout(Duration::from_secs(5), converter.rasterize(&url))
            .await
            .expect("rasterize resolves");
        assert_eq!(outcome, RasterOutcome::Fallback(url));
        server.abort();
    }

    #[test]
    fn previews_are_truncated() {
        let long = "x".repeat(200);
        assert_eq!(preview(&long).chars().count(), 65);
        assert_eq!(preview("short"), "short");
    }
}
