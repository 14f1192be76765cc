//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 加载链路中的所有失败来源（读取来源、签名识别、解码、资源限制）收敛到单一枚举，
//! 避免字符串拼接式错误处理。错误只通过 `onerror` 交给调用方，`set_src` 本身从不失败。
//!
//! 解码器（`image` crate）返回的错误在这里统一映射，保证上层只面对一套分类。

use std::io;

/// 图片加载统一错误类型。
///
/// 作为 `onerror` 回调的唯一参数，`Display` 输出即人类可读的失败原因。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("来源不存在：{0}")]
    SourceNotFound(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("格式错误：{0}")]
    UnrecognizedFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("不支持的子格式：{0}")]
    Unsupported(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

impl ImageError {
    /// 稳定错误码，供日志检索与宿主侧分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "source_not_found",
            Self::FileSystem(_) => "file_system",
            Self::UnrecognizedFormat(_) => "unrecognized_format",
            Self::Decode(_) => "decode",
            Self::Unsupported(_) => "unsupported",
            Self::ResourceLimit(_) => "resource_limit",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<image::ImageError> for ImageError {
    /// 解码器错误映射：超限归为资源限制，流提前结束归为截断，其余归为解码失败。
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::Limits(e) => {
                ImageError::ResourceLimit(format!("解码器拒绝超限输入：{}", e))
            }
            image::ImageError::Unsupported(e) => ImageError::Unsupported(e.to_string()),
            image::ImageError::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                ImageError::Decode(format!("数据流被截断：{}", e))
            }
            other => ImageError::Decode(other.to_string()),
        }
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
