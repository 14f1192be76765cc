//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / 内存字节 / Data URL）的原始字节加载，
//! 并在“尽可能早”的阶段执行体积校验。目标是尽快失败，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：metadata（区分“不存在”与其他文件错误）+ 体积限制 + 读取。
//! - 内存字节：体积限制，零拷贝复用 `Bytes`。
//! - Data URL：格式解析 + 解码前体积上界估算 + 解码后体积限制。
//!
//! 这里不判断图片格式，格式只由 `sniff` 根据内容决定。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::io;
use std::path::Path;

use super::source::RawImageData;
use super::{ImageError, ImageLoader, ImageSource, LoaderConfig};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

impl ImageLoader {
    /// 按来源类型分派读取。
    pub(super) fn load_raw(
        source: &ImageSource,
        config: &LoaderConfig,
    ) -> Result<RawImageData, ImageError> {
        let bytes = match source {
            ImageSource::FilePath(path) => Self::load_from_file(path, config)?,
            ImageSource::Buffer(bytes) => Self::load_from_buffer(bytes, config)?,
            ImageSource::DataUrl(data) => Self::load_from_data_url(data, config)?,
        };

        Ok(RawImageData {
            bytes,
            source_hint: source.source_hint(),
        })
    }

    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        path: &Path,
        config: &LoaderConfig,
    ) -> Result<Bytes, ImageError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                ImageError::SourceNotFound(format!("文件不存在：{}", path.display()))
            }
            _ => ImageError::FileSystem(format!("无法读取文件信息：{}（{}）", path.display(), e)),
        })?;

        if metadata.is_dir() {
            return Err(ImageError::FileSystem(format!(
                "路径是目录而不是文件：{}",
                path.display()
            )));
        }

        if metadata.len() > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(Bytes::from(bytes))
    }

    /// 使用调用方提供的内存字节。
    pub(super) fn load_from_buffer(
        bytes: &Bytes,
        config: &LoaderConfig,
    ) -> Result<Bytes, ImageError> {
        log::info!("🧠 开始处理内存图片 - {} bytes", bytes.len());

        if bytes.len() as u64 > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "内存图片过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(bytes.clone())
    }

    /// 从 Data URL（或纯 Base64）加载图片原始字节。
    pub(super) fn load_from_data_url(
        data: &str,
        config: &LoaderConfig,
    ) -> Result<Bytes, ImageError> {
        log::info!("📝 开始处理 Data URL 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(Bytes::from(bytes))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Data URL 并解码 Base64 负载。
    ///
    /// 声明的媒体类型不参与格式判断，只取 `;base64,` 之后的负载。
    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ImageError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with(DATA_URL_PREFIX) {
            let base64_start = normalized.find(BASE64_MARKER).ok_or_else(|| {
                ImageError::UnrecognizedFormat("Data URL 缺少 base64 标记".to_string())
            })?;
            &normalized[base64_start + BASE64_MARKER.len()..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
    }
}
