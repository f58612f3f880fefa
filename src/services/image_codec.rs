use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat};
use thiserror::Error;

/// Container formats an upload can arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Other,
}

impl ImageKind {
    /// Format the rest of the pipeline works on
    pub const CANONICAL: ImageKind = ImageKind::Png;

    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageKind::Other)
    }

    pub fn mime_type(&self) -> mime::Mime {
        match self {
            ImageKind::Jpeg => mime::IMAGE_JPEG,
            ImageKind::Png => mime::IMAGE_PNG,
            ImageKind::Gif => mime::IMAGE_GIF,
            ImageKind::Other => mime::APPLICATION_OCTET_STREAM,
        }
    }

    fn image_format(&self) -> Option<ImageFormat> {
        match self {
            ImageKind::Jpeg => Some(ImageFormat::Jpeg),
            ImageKind::Png => Some(ImageFormat::Png),
            ImageKind::Gif => Some(ImageFormat::Gif),
            ImageKind::Other => None,
        }
    }
}

impl From<ImageFormat> for ImageKind {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => ImageKind::Jpeg,
            ImageFormat::Png => ImageKind::Png,
            ImageFormat::Gif => ImageKind::Gif,
            _ => ImageKind::Other,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImageCodecError {
    #[error("Cannot encode to {0:?}")]
    UnsupportedTarget(ImageKind),
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Images wider than this are scaled down, narrower ones are left alone
    pub resize_width: u32,
    pub grayscale: bool,
    /// Contrast stretch on luminance; implies greyscale output
    pub normalize: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            resize_width: 1600,
            grayscale: true,
            normalize: true,
        }
    }
}

/// Decoding, transcoding and OCR preparation of uploaded images.
///
/// Implementations are CPU bound and synchronous; async callers should run
/// them on the blocking pool.
pub trait ImageCodec: Send + Sync {
    fn detect_format(&self, bytes: &[u8]) -> ImageKind;

    fn transcode(&self, bytes: &[u8], target: ImageKind) -> Result<Vec<u8>, ImageCodecError>;

    /// Returns the prepared image encoded in the canonical format.
    fn preprocess(
        &self,
        bytes: &[u8],
        options: &PreprocessOptions,
    ) -> Result<Vec<u8>, ImageCodecError>;
}

/// `ImageCodec` backed by the `image` crate
#[derive(Debug, Clone, Default)]
pub struct RasterImageCodec;

impl RasterImageCodec {
    pub fn new() -> Self {
        Self
    }

    fn encode(image: &DynamicImage, target: ImageKind) -> Result<Vec<u8>, ImageCodecError> {
        let format = target
            .image_format()
            .ok_or(ImageCodecError::UnsupportedTarget(target))?;

        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format)?;
        Ok(buffer.into_inner())
    }
}

impl ImageCodec for RasterImageCodec {
    fn detect_format(&self, bytes: &[u8]) -> ImageKind {
        image::guess_format(bytes)
            .map(ImageKind::from)
            .unwrap_or(ImageKind::Other)
    }

    fn transcode(&self, bytes: &[u8], target: ImageKind) -> Result<Vec<u8>, ImageCodecError> {
        let image = image::load_from_memory(bytes)?;
        Self::encode(&image, target)
    }

    fn preprocess(
        &self,
        bytes: &[u8],
        options: &PreprocessOptions,
    ) -> Result<Vec<u8>, ImageCodecError> {
        let mut image = image::load_from_memory(bytes)?;

        let (width, height) = image.dimensions();
        if options.resize_width > 0 && width > options.resize_width {
            let scaled_height = (f64::from(height) * f64::from(options.resize_width)
                / f64::from(width))
            .round()
            .max(1.0) as u32;
            image = image.resize_exact(options.resize_width, scaled_height, FilterType::Triangle);
        }

        if options.normalize {
            image = DynamicImage::ImageLuma8(stretch_contrast(image.to_luma8()));
        } else if options.grayscale {
            image = DynamicImage::ImageLuma8(image.to_luma8());
        }

        Self::encode(&image, ImageKind::CANONICAL)
    }
}

/// Linear stretch of the 1st..99th luminance percentile onto the full range.
fn stretch_contrast(mut image: GrayImage) -> GrayImage {
    let pixel_count = image.pixels().len();
    if pixel_count == 0 {
        return image;
    }

    let mut histogram = [0usize; 256];
    for pixel in image.pixels() {
        histogram[usize::from(pixel.0[0])] += 1;
    }

    let clip = pixel_count / 100;
    let low = percentile_bound(histogram.iter().enumerate(), clip);
    let high = percentile_bound(histogram.iter().enumerate().rev(), clip);

    if high <= low {
        return image;
    }

    let range = f32::from(high - low);
    for pixel in image.pixels_mut() {
        let value = pixel.0[0].clamp(low, high);
        pixel.0[0] = ((f32::from(value - low) * 255.0) / range).round() as u8;
    }

    image
}

fn percentile_bound<'a>(bins: impl Iterator<Item = (usize, &'a usize)>, clip: usize) -> u8 {
    let mut seen = 0;
    let mut last = 0;
    for (level, count) in bins {
        if *count == 0 {
            continue;
        }
        last = level;
        seen += count;
        if seen > clip {
            break;
        }
    }
    last as u8
}
