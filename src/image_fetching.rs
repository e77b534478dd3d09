use anyhow::{ensure, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::display::{display_image, DisplaySurface};

pub const DEFAULT_WIDTH: u32 = 256;
pub const DEFAULT_HEIGHT: u32 = 256;
pub const JPEG_QUALITY: u8 = 90;

/// Downloads the image at `url`, resizes and crops it to exactly `width` x `height`
/// and saves it as a jpeg in the temp dir.
/// Returns the path of the saved file, which is left for the caller to clean up.
/// If a display surface is given, the resized image is shown on it too.
pub fn fetch(
    url: &str,
    width: u32,
    height: u32,
    display: Option<&mut dyn DisplaySurface>,
) -> Result<PathBuf> {
    ensure!(
        width > 0 && height > 0,
        "Target size must be positive, got {}x{}",
        width,
        height
    );
    let img_bytes = download_bytes(url)?;
    let img = fit_image(&img_bytes, width, height)
        .with_context(|| format!("Error decoding image downloaded from {}", url))?;
    let filename = save_jpeg_to_temp(&img)?;
    println!("{}", download_notice(&filename));

    if let Some(surface) = display {
        display_image(&img, surface)?;
    }
    Ok(filename)
}

/// [`fetch`] with the default 256x256 size and no display
pub fn fetch_default(url: &str) -> Result<PathBuf> {
    fetch(url, DEFAULT_WIDTH, DEFAULT_HEIGHT, None)
}

/// Line printed to stdout once a fetched image is saved
pub fn download_notice(path: &Path) -> String {
    format!("Image Downloaded to {}", path.display())
}

/// Whole response body of a GET to `url`, following redirects.
/// Blocks until it is downloaded.
pub fn download_bytes(url: &str) -> Result<Vec<u8>> {
    async_std::task::block_on(download_bytes_async(url))
}

async fn download_bytes_async(url: &str) -> Result<Vec<u8>> {
    let parsed_url =
        surf::Url::parse(url).with_context(|| format!("Invalid image url {}", url))?;
    let client = surf::client().with(surf::middleware::Redirect::default());
    let mut res = client
        .get(parsed_url.as_str())
        .await
        .map_err(|e| e.into_inner())
        .with_context(|| format!("Error downloading {}", url))?;
    ensure!(
        res.status().is_success(),
        "Error downloading {}: server answered {}",
        url,
        res.status() as u16
    );
    let response_bytes = res
        .body_bytes()
        .await
        .map_err(|e| e.into_inner())
        .with_context(|| format!("Error getting response bytes from {}", url))?;
    debug!(url, bytes = response_bytes.len(), "image downloaded");
    Ok(response_bytes)
}

/// Decodes an image and fills `width` x `height` with it, scaling with Lanczos
/// and cropping whatever sticks out around the center
pub fn fit_image(img_bytes: &[u8], width: u32, height: u32) -> Result<RgbImage> {
    let img = image::load_from_memory(img_bytes).context("Unknown or corrupt image data")?;
    let fitted = img.resize_to_fill(width, height, FilterType::Lanczos3);
    Ok(fitted.to_rgb8())
}

/// Saves the image as a jpeg under a new, unique name in the temp dir
pub fn save_jpeg_to_temp(img: &RgbImage) -> Result<PathBuf> {
    let filename = std::env::temp_dir().join(format!("{}.jpg", Uuid::new_v4()));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&filename)
        .with_context(|| format!("Error creating {}", filename.display()))?;
    let mut writer = BufWriter::new(file);
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))
        .with_context(|| format!("Error encoding jpeg to {}", filename.display()))?;
    writer
        .flush()
        .with_context(|| format!("Error writing {}", filename.display()))?;
    info!(path = %filename.display(), "image saved");
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FigureBuffer;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, Rgba, RgbaImage};
    use std::io::{Cursor, Read};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;

    fn encoded(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(vec![]);
        img.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    /// Answers a single http request with the given status and body, returns the url to hit
    fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![];
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            )
            .unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{}/image", addr)
    }

    fn answer(stream: &mut TcpStream, status: &str, extra_headers: &str, body: &[u8]) {
        write!(
            stream,
            "HTTP/1.1 {}\r\n{}Content-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
            status,
            extra_headers,
            body.len()
        )
        .unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();
    }

    /// Serves `/image` as a 302 to `/moved`, and `body` at `/moved`, for as many
    /// requests and connections as the client makes. Returns the url of `/image`.
    fn serve_redirect(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = Arc::new(body);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => return,
                };
                let body = Arc::clone(&body);
                std::thread::spawn(move || {
                    let mut pending: Vec<u8> = vec![];
                    let mut buf = [0u8; 1024];
                    loop {
                        while let Some(end) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
                            let request: Vec<u8> = pending.drain(..end + 4).collect();
                            if request.starts_with(b"GET /moved ") {
                                answer(&mut stream, "200 OK", "", &body);
                            } else {
                                let location = format!("Location: http://{}/moved\r\n", addr);
                                answer(&mut stream, "302 Found", &location, b"");
                            }
                        }
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => return,
                            Ok(read) => pending.extend_from_slice(&buf[..read]),
                        }
                    }
                });
            }
        });
        format!("http://{}/image", addr)
    }

    #[test]
    fn test_fit_image_exact_size() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 100, Rgb([0, 128, 255])));
        let img = fit_image(&encoded(wide, ImageFormat::Png), 256, 256).unwrap();
        assert_eq!(img.dimensions(), (256, 256));

        let tall = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 500, Rgb([0, 128, 255])));
        let img = fit_image(&encoded(tall, ImageFormat::Png), 64, 32).unwrap();
        assert_eq!(img.dimensions(), (64, 32));
    }

    #[test]
    fn test_fit_image_crops_center() {
        // left third red, middle third green, right third blue
        let stripes = RgbImage::from_fn(300, 100, |x, _| match x {
            0..=99 => Rgb([255, 0, 0]),
            100..=199 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let img = fit_image(
            &encoded(DynamicImage::ImageRgb8(stripes), ImageFormat::Png),
            100,
            100,
        )
        .unwrap();
        let center = img.get_pixel(50, 50);
        assert!(center[1] > 200 && center[0] < 50 && center[2] < 50);
    }

    #[test]
    fn test_fit_image_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([10, 20, 30, 255])));
        let img = fit_image(&encoded(rgba, ImageFormat::Png), 10, 10).unwrap();
        assert_eq!(*img.get_pixel(5, 5), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_fit_image_rejects_garbage() {
        assert!(fit_image(b"this is not an image", 10, 10).is_err());
    }

    #[test]
    fn test_save_jpeg_to_temp() {
        let img = RgbImage::from_pixel(32, 16, Rgb([200, 100, 50]));
        let first = save_jpeg_to_temp(&img).unwrap();
        let second = save_jpeg_to_temp(&img).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "jpg");

        let bytes = std::fs::read(&first).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let saved = image::load_from_memory(&bytes).unwrap();
        assert_eq!(saved.dimensions(), (32, 16));
        std::fs::remove_file(first).unwrap();
        std::fs::remove_file(second).unwrap();
    }

    #[test]
    fn test_fetch_from_local_server() {
        let served = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([30, 60, 90])));
        let url = serve_once("200 OK", encoded(served, ImageFormat::Png));
        let mut surface = FigureBuffer::new();
        let path = fetch(&url, DEFAULT_WIDTH, DEFAULT_HEIGHT, Some(&mut surface)).unwrap();

        let saved = image::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(saved.dimensions(), (256, 256));
        assert_eq!(saved.color(), image::ColorType::Rgb8);
        assert!(surface.last_figure().is_some());
    }

    #[test]
    fn test_fetch_follows_redirect() {
        let served = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([200, 10, 10])));
        let url = serve_redirect(encoded(served, ImageFormat::Png));
        let path = fetch(&url, 16, 16, None).unwrap();

        let saved = image::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(saved.dimensions(), (16, 16));
    }

    #[test]
    fn test_download_notice() {
        let path = std::env::temp_dir().join("cat.jpg");
        assert_eq!(
            download_notice(&path),
            format!("Image Downloaded to {}", path.display())
        );
        assert!(download_notice(Path::new("/tmp/a.jpg")).ends_with("to /tmp/a.jpg"));
    }

    #[test]
    fn test_fetch_http_error() {
        let url = serve_once("404 Not Found", b"nope".to_vec());
        let err = fetch(&url, 16, 16, None).unwrap_err();
        assert!(format!("{:#}", err).contains("404"));
    }

    #[test]
    fn test_fetch_not_an_image() {
        let url = serve_once("200 OK", b"<html>hello</html>".to_vec());
        assert!(fetch(&url, 16, 16, None).is_err());
    }

    #[test]
    fn test_fetch_rejects_bad_input() {
        assert!(fetch("not a url", 16, 16, None).is_err());
        assert!(fetch("http://127.0.0.1:1/image", 0, 16, None).is_err());
    }
}
