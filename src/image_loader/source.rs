//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示调用方赋给 `src` 的来源语义
//! - `RawImageData` 表示已读取但未识别的字节
//! - `DecodedImage` 表示一次成功加载的最终产物

use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};

use super::probe::ColorModel;
use super::sniff::ImageKind;

const DISPLAY_DATA_URL_PREFIX_CHARS: usize = 48;

/// 图片输入来源。
///
/// 字符串以 `data:` 开头时视为 Data URL，否则视为本地路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 本地文件路径。
    FilePath(PathBuf),
    /// 内存中的已编码字节。
    Buffer(Bytes),
    /// `data:<mime>;base64,<payload>`，也接受纯 Base64。
    DataUrl(String),
}

impl ImageSource {
    /// 来源提示（用于日志与诊断）。
    pub(crate) fn source_hint(&self) -> &'static str {
        match self {
            Self::FilePath(_) => "file",
            Self::Buffer(_) => "buffer",
            Self::DataUrl(_) => "data-url",
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilePath(path) => write!(f, "{}", path.display()),
            Self::Buffer(bytes) => write!(f, "<buffer {} bytes>", bytes.len()),
            Self::DataUrl(data) => {
                if data.chars().count() <= DISPLAY_DATA_URL_PREFIX_CHARS {
                    return f.write_str(data);
                }
                let prefix: String = data.chars().take(DISPLAY_DATA_URL_PREFIX_CHARS).collect();
                write!(f, "{}…", prefix)
            }
        }
    }
}

impl From<&str> for ImageSource {
    fn from(src: &str) -> Self {
        if src.trim_start().starts_with("data:") {
            Self::DataUrl(src.to_string())
        } else {
            Self::FilePath(PathBuf::from(src))
        }
    }
}

impl From<String> for ImageSource {
    fn from(src: String) -> Self {
        if src.trim_start().starts_with("data:") {
            Self::DataUrl(src)
        } else {
            Self::FilePath(PathBuf::from(src))
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(bytes))
    }
}

impl From<Bytes> for ImageSource {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

/// 读取阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Bytes,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 一次成功加载的结果。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// 图像宽度（像素）。
    pub width: u32,
    /// 图像高度（像素）。
    pub height: u32,
    /// 按签名识别出的编码格式。
    pub kind: ImageKind,
    /// 源数据的颜色模型（CMYK 等在输出前已转换为 RGB）。
    pub source_color: ColorModel,
    /// RGBA 字节数组（`width * height * 4`）；仅保留编码数据时为 `None`。
    pub pixels: Option<Vec<u8>>,
    /// 保留的原始编码字节（仅 JPEG 且数据模式要求时存在）。
    pub mime_data: Option<Bytes>,
}
