//! # 签名识别模块
//!
//! ## 设计思路
//!
//! 格式只由文件头的签名字节（magic bytes）决定，从不参考扩展名或声明的 MIME。
//! 扩展名与内容不符的文件照常按内容加载；内容不是受支持格式时给出可读的失败原因。
//!
//! ## 实现思路
//!
//! - 受支持格式：PNG（8 字节签名）、JPEG（SOI `FF D8`）、GIF（`GIF8`）。
//! - 无法识别时借助 `infer` 描述实际内容类型，便于排查“把 PDF 当图片”这类问题。

use image::ImageFormat;

use super::ImageError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const GIF_SIGNATURE: [u8; 4] = *b"GIF8";
const DIAGNOSTIC_PREFIX_BYTES: usize = 8;

/// 按签名识别出的编码格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    /// 仅根据前几个字节判断格式，无法识别时返回 `None`。
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&JPEG_SOI) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&GIF_SIGNATURE) {
            return Some(Self::Gif);
        }
        None
    }

    /// 识别格式；失败时给出包含实际内容类型的错误。
    pub(crate) fn detect(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::UnrecognizedFormat("图片内容为空".to_string()));
        }

        if let Some(kind) = Self::sniff(bytes) {
            return Ok(kind);
        }

        match infer::get(bytes) {
            Some(kind) => Err(ImageError::UnrecognizedFormat(format!(
                "文件签名不是受支持的图片类型：{}（支持：PNG / JPEG / GIF）",
                kind.mime_type()
            ))),
            None => {
                let prefix: Vec<String> = bytes
                    .iter()
                    .take(DIAGNOSTIC_PREFIX_BYTES)
                    .map(|b| format!("{:02X}", b))
                    .collect();
                Err(ImageError::UnrecognizedFormat(format!(
                    "无法识别图片类型（文件头：{}）",
                    prefix.join(" ")
                )))
            }
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }

    pub(crate) fn as_image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
        }
    }
}
