//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 格式 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 按签名识别格式（不看扩展名）
//! 2. JPEG 先做标记段探测：拿到尺寸与颜色模型，`Mime` 模式到此为止
//! 3. 读取 header 尺寸，按像素/内存上限快速拒绝
//! 4. 带解码器限制的完整解码（解码器 panic 也收敛为解码错误）
//! 5. 转换 RGBA，并校验字节长度一致性

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use super::probe::{self, ColorModel};
use super::source::{DecodedImage, RawImageData};
use super::{DataMode, ImageError, ImageKind, ImageLoader, LoaderConfig};

impl ImageLoader {
    /// 将原始字节识别并解码为加载结果。
    pub(crate) fn decode_raw(
        raw: RawImageData,
        mode: DataMode,
        config: &LoaderConfig,
    ) -> Result<DecodedImage, ImageError> {
        let kind = ImageKind::detect(&raw.bytes)?;
        log::debug!(
            "🔍 签名识别 - 来源: {} 格式: {:?} 大小: {} bytes",
            raw.source_hint,
            kind,
            raw.bytes.len()
        );

        let mut source_color = None;
        if kind == ImageKind::Jpeg {
            let header = probe::probe_jpeg(&raw.bytes)?;
            Self::validate_dimension_limits(config, header.width, header.height)?;
            Self::validate_pixel_limits(config, header.width, header.height)?;
            Self::validate_decoded_memory_limits(config, header.width, header.height)?;
            source_color = Some(header.color_model());
            log::debug!(
                "🔍 JPEG 帧头 - {}x{} 分量: {} 颜色: {:?} 渐进式: {}",
                header.width,
                header.height,
                header.components,
                header.color_model(),
                header.progressive
            );

            if !mode.decodes_pixels() {
                log::info!(
                    "✅ JPEG 头部读取完成（仅保留编码数据）- 来源: {} 尺寸: {}x{}",
                    raw.source_hint,
                    header.width,
                    header.height
                );
                return Ok(DecodedImage {
                    width: header.width,
                    height: header.height,
                    kind,
                    source_color: header.color_model(),
                    pixels: None,
                    mime_data: Some(raw.bytes),
                });
            }
        }

        let (width, height, decoded_color, pixels) =
            Self::decode_pixels(&raw.bytes, kind, config)?;
        let source_color = source_color.unwrap_or(decoded_color);

        if source_color.is_four_channel() {
            log::debug!(
                "🎨 {:?} 源数据已转换为 RGB - 尺寸: {}x{}",
                source_color,
                width,
                height
            );
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {:?} 尺寸: {}x{}",
            raw.source_hint,
            kind,
            width,
            height
        );

        let mime_data = Self::retained_mime_data(kind, mode, raw.bytes);

        Ok(DecodedImage {
            width,
            height,
            kind,
            source_color,
            pixels: Some(pixels),
            mime_data,
        })
    }

    fn retained_mime_data(kind: ImageKind, mode: DataMode, bytes: Bytes) -> Option<Bytes> {
        (kind == ImageKind::Jpeg && mode.retains_mime()).then_some(bytes)
    }

    /// 完整解码为 RGBA8，返回宽高、颜色模型与像素。
    fn decode_pixels(
        bytes: &[u8],
        kind: ImageKind,
        config: &LoaderConfig,
    ) -> Result<(u32, u32, ColorModel, Vec<u8>), ImageError> {
        let (header_width, header_height) = Self::inspect_dimensions(bytes, kind, config)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let mut reader = ImageReader::with_format(Cursor::new(bytes), kind.as_image_format());
        reader.limits(config.to_decoder_limits());

        let decoded: DynamicImage = panic::catch_unwind(AssertUnwindSafe(|| reader.decode()))
            .map_err(|_| ImageError::Decode(format!("{:?} 解码器内部异常", kind)))??;

        let (width, height) = decoded.dimensions();
        Self::validate_pixel_limits(config, width, height)?;
        Self::validate_decoded_memory_limits(config, width, height)?;

        let color = ColorModel::from_decoded(decoded.color());
        let pixels = decoded.to_rgba8().into_raw();

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if pixels.len() != expected_len {
            return Err(ImageError::Decode("解码后像素数据长度异常".to_string()));
        }

        Ok((width, height, color, pixels))
    }

    /// 仅通过图片头信息读取宽高。
    ///
    /// 解码器限制在此处已生效，超出单边上限的输入在读取 header 后即被拒绝。
    fn inspect_dimensions(
        bytes: &[u8],
        kind: ImageKind,
        config: &LoaderConfig,
    ) -> Result<(u32, u32), ImageError> {
        let mut reader = ImageReader::with_format(Cursor::new(bytes), kind.as_image_format());
        reader.limits(config.to_decoder_limits());

        let (width, height) = reader.into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(ImageError::Decode(format!(
                "图片尺寸无效：{}x{}",
                width, height
            )));
        }

        Ok((width, height))
    }

    fn validate_dimension_limits(
        config: &LoaderConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        if width > config.max_image_dimension || height > config.max_image_dimension {
            return Err(ImageError::ResourceLimit(format!(
                "图片边长过大：{}x{}（限制：{}）",
                width, height, config.max_image_dimension
            )));
        }

        Ok(())
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &LoaderConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &LoaderConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(ImageError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb, Rgba};

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "test",
        }
    }

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, format)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn create_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 255) as u8, (y * 3 % 255) as u8, 128])
        });
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    fn create_gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| {
            Rgba([if x % 2 == 0 { 255 } else { 0 }, 0, 0, 255])
        });
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Gif)
    }

    #[test]
    fn jpeg_image_mode_decodes_without_mime_data() {
        let config = LoaderConfig::default();
        let decoded = ImageLoader::decode_raw(raw(create_jpeg_bytes(33, 21)), DataMode::Image, &config)
            .expect("jpeg should decode");

        assert_eq!((decoded.width, decoded.height), (33, 21));
        assert_eq!(decoded.source_color, ColorModel::YCbCr);
        assert_eq!(decoded.pixels.as_ref().map(Vec::len), Some(33 * 21 * 4));
        assert!(decoded.mime_data.is_none());
    }

    #[test]
    fn jpeg_mime_mode_skips_pixel_decode() {
        let config = LoaderConfig::default();
        let bytes = create_jpeg_bytes(48, 16);

        let decoded = ImageLoader::decode_raw(raw(bytes.clone()), DataMode::Mime, &config)
            .expect("header should be readable");

        assert_eq!((decoded.width, decoded.height), (48, 16));
        assert!(decoded.pixels.is_none());
        assert_eq!(decoded.mime_data.as_deref(), Some(bytes.as_slice()));
    }

    #[test]
    fn jpeg_image_and_mime_mode_keeps_both() {
        let config = LoaderConfig::default();
        let decoded =
            ImageLoader::decode_raw(raw(create_jpeg_bytes(8, 8)), DataMode::ImageAndMime, &config)
                .expect("jpeg should decode");

        assert!(decoded.pixels.is_some());
        assert!(decoded.mime_data.is_some());
    }

    #[test]
    fn png_never_retains_mime_data() {
        let config = LoaderConfig::default();
        let png = encode(
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(5, 6, Rgba([1, 2, 3, 4]))),
            ImageFormat::Png,
        );

        let decoded = ImageLoader::decode_raw(raw(png), DataMode::Mime, &config)
            .expect("png should decode");

        assert_eq!((decoded.width, decoded.height), (5, 6));
        assert!(decoded.pixels.is_some());
        assert!(decoded.mime_data.is_none());
        assert_eq!(decoded.source_color, ColorModel::Rgb);
    }

    #[test]
    fn gif_decodes_first_frame() {
        let config = LoaderConfig::default();
        let decoded = ImageLoader::decode_raw(raw(create_gif_bytes(12, 7)), DataMode::Image, &config)
            .expect("gif should decode");

        assert_eq!(decoded.kind, ImageKind::Gif);
        assert_eq!((decoded.width, decoded.height), (12, 7));
        assert_eq!(decoded.pixels.as_ref().map(Vec::len), Some(12 * 7 * 4));
    }

    #[test]
    fn jpeg_header_dimensions_are_checked_before_decode() {
        let mut config = LoaderConfig::default();
        config.max_decoded_pixels = 100;

        let result = ImageLoader::decode_raw(raw(create_jpeg_bytes(20, 20)), DataMode::Mime, &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn memory_estimate_limit_is_enforced() {
        let mut config = LoaderConfig::default();
        config.max_decoded_bytes = 1024;

        let png = encode(
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(32, 32, Rgba([0, 0, 0, 255]))),
            ImageFormat::Png,
        );
        let result = ImageLoader::decode_raw(raw(png), DataMode::Image, &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(ref msg)) if msg.contains("内存")));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let config = LoaderConfig::default();
        let noisy = ImageBuffer::from_fn(64, 64, |x, y| {
            Rgba([(x * 31 % 251) as u8, (y * 17 % 241) as u8, ((x ^ y) % 255) as u8, 255])
        });
        let mut png = encode(DynamicImage::ImageRgba8(noisy), ImageFormat::Png);
        png.truncate(png.len() / 2);

        let result = ImageLoader::decode_raw(raw(png), DataMode::Image, &config);

        assert!(matches!(result, Err(ImageError::Decode(_))));
    }
}
