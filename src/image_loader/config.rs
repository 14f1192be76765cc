//! # 配置模块
//!
//! ## 设计思路
//!
//! 所有“可调的资源上限”集中到 `LoaderConfig`，保证加载行为可观测、可调整、可测试。
//! 资源档位（strict / balanced / relaxed）作为高层语义，映射到底层阈值组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `LimitProfile` 负责档位字符串解析与反向输出。
//! - `apply_limit_profile` 将档位转换为具体阈值。
//! - `infer_limit_profile` 从当前配置反推档位。
//! - `to_decoder_limits` 把阈值转换为解码器自身的分配上限（`image::Limits`）。

use serde::{Deserialize, Serialize};

use super::ImageError;

/// 图片加载配置。
///
/// 字段覆盖读取、头部预检与完整解码三个阶段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 按 RGBA 估算的解码内存上限（字节）。
    pub max_decoded_bytes: u64,
    /// 宽/高单边上限，同时作为解码器的严格尺寸限制。
    pub max_image_dimension: u32,
    /// 解码器内部单次分配总量上限（字节）。
    pub max_decoder_alloc: u64,
    /// `ImageLoader::new_image` 创建的元素使用的数据模式。
    pub default_data_mode: DataMode,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_image_dimension: 32_768,
            max_decoder_alloc: 256 * 1024 * 1024,
            default_data_mode: DataMode::default(),
        }
    }
}

/// 可在运行时调整的高级限制。
///
/// 独立于档位存在：先应用档位，再用这里的值覆盖。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedLimits {
    pub max_file_size: u64,
    pub max_decoded_bytes: u64,
    pub max_image_dimension: u32,
}

/// 资源档位（面向使用者的语义）。
///
/// - `Strict`：不可信输入，尽早拒绝
/// - `Balanced`：默认
/// - `Relaxed`：可信的大图场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitProfile {
    Strict,
    Balanced,
    Relaxed,
}

impl LimitProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_image::image_loader::LimitProfile;
    ///
    /// let p = LimitProfile::from_str("strict")?;
    /// assert_eq!(p.as_str(), "strict");
    /// # Ok::<(), canvas_image::image_loader::ImageError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(ImageError::InvalidConfig(format!(
                "未知资源档位：{}（可选：strict / balanced / relaxed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供持久化与日志使用。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Relaxed => "relaxed",
        }
    }
}

impl LoaderConfig {
    /// 基于当前参数反推资源档位。
    pub(crate) fn infer_limit_profile(&self) -> LimitProfile {
        if self.max_decoded_pixels <= 16_000_000 || self.max_image_dimension <= 8192 {
            return LimitProfile::Strict;
        }

        if self.max_decoded_pixels >= 120_000_000 {
            return LimitProfile::Relaxed;
        }

        LimitProfile::Balanced
    }

    /// 应用指定资源档位到实际参数。
    pub(crate) fn apply_limit_profile(&mut self, profile: LimitProfile) {
        match profile {
            LimitProfile::Strict => {
                self.max_file_size = 10 * 1024 * 1024;
                self.max_decoded_pixels = 16_000_000;
                self.max_decoded_bytes = 64 * 1024 * 1024;
                self.max_image_dimension = 8192;
                self.max_decoder_alloc = 96 * 1024 * 1024;
            }
            LimitProfile::Balanced => {
                *self = Self {
                    default_data_mode: self.default_data_mode,
                    ..Self::default()
                };
            }
            LimitProfile::Relaxed => {
                self.max_file_size = 200 * 1024 * 1024;
                self.max_decoded_pixels = 120_000_000;
                self.max_decoded_bytes = 512 * 1024 * 1024;
                self.max_image_dimension = 65_535;
                self.max_decoder_alloc = 768 * 1024 * 1024;
            }
        }
    }

    pub(crate) fn advanced_limits(&self) -> AdvancedLimits {
        AdvancedLimits {
            max_file_size: self.max_file_size,
            max_decoded_bytes: self.max_decoded_bytes,
            max_image_dimension: self.max_image_dimension,
        }
    }

    /// 解码器侧的限制：单边尺寸为严格限制，分配总量为尽力限制。
    pub(crate) fn to_decoder_limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_image_dimension);
        limits.max_image_height = Some(self.max_image_dimension);
        limits.max_alloc = Some(self.max_decoder_alloc);
        limits
    }
}

/// 数据模式：决定 JPEG 是否解码像素、是否保留原始编码字节。
///
/// 数值与宿主侧常量保持一致（`MODE_IMAGE = 1`、`MODE_MIME = 2`、两者兼有 = 3）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Image = 1,
    Mime = 2,
    ImageAndMime = 3,
}

impl DataMode {
    /// 未知数值返回 `None`，调用方保持原模式不变。
    pub fn from_u32(mode: u32) -> Option<Self> {
        match mode {
            1 => Some(Self::Image),
            2 => Some(Self::Mime),
            3 => Some(Self::ImageAndMime),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub(crate) fn decodes_pixels(self) -> bool {
        !matches!(self, Self::Mime)
    }

    pub(crate) fn retains_mime(self) -> bool {
        !matches!(self, Self::Image)
    }
}
