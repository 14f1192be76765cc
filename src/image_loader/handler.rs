//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageLoader` 只负责流程编排与配置管理，不持有任何单次加载的状态。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 签名识别 + 解码为 RGBA
//!
//! 加载结果交给 `Image`（见 `element.rs`）应用到元素状态并触发回调。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<LoaderConfig>>` 支持运行时动态切档，克隆加载器即共享配置。
//! - 单次加载内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::source::DecodedImage;
use super::{
    AdvancedLimits, DataMode, Image, ImageError, ImageSource, LimitProfile, LoaderConfig,
};

/// 图片加载器。
///
/// 本身无单次加载状态，一次失败不会影响后续加载。
#[derive(Clone)]
pub struct ImageLoader {
    pub(super) config: Arc<RwLock<LoaderConfig>>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl ImageLoader {
    /// 根据初始配置创建加载器。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_image::image_loader::{ImageLoader, LoaderConfig};
    ///
    /// let loader = ImageLoader::new(LoaderConfig::default());
    /// assert_eq!(loader.get_limit_profile()?.as_str(), "balanced");
    /// # Ok::<(), canvas_image::image_loader::ImageError>(())
    /// ```
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次加载链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<LoaderConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置资源档位。
    pub fn set_limit_profile(&self, profile: LimitProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_limit_profile(profile);

        log::info!(
            "⚙️ 已切换图片资源档位：{:?}（max_file={}, max_pixels={}, max_dim={}, decoder_alloc={}）",
            profile,
            config.max_file_size,
            config.max_decoded_pixels,
            config.max_image_dimension,
            config.max_decoder_alloc
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_limit_profile(&self) -> Result<LimitProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_limit_profile())
    }

    /// 设置高级限制，越界参数整体拒绝、不做部分写入。
    pub fn set_advanced_limits(&self, limits: AdvancedLimits) -> Result<(), ImageError> {
        if !(1024..=1024 * 1024 * 1024).contains(&limits.max_file_size) {
            return Err(ImageError::InvalidConfig(
                "max_file_size 必须在 1KB~1GB 之间".to_string(),
            ));
        }
        if limits.max_decoded_bytes < 1024 * 1024 {
            return Err(ImageError::InvalidConfig(
                "max_decoded_bytes 不能小于 1MB".to_string(),
            ));
        }
        if !(16..=65_535).contains(&limits.max_image_dimension) {
            return Err(ImageError::InvalidConfig(
                "max_image_dimension 必须在 16~65535 之间".to_string(),
            ));
        }

        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;

        config.max_file_size = limits.max_file_size;
        config.max_decoded_bytes = limits.max_decoded_bytes;
        config.max_image_dimension = limits.max_image_dimension;

        Ok(())
    }

    /// 获取高级限制快照。
    pub fn get_advanced_limits(&self) -> Result<AdvancedLimits, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))?;

        Ok(config.advanced_limits())
    }

    /// 设置新建元素的默认数据模式，已存在的元素不受影响。
    pub fn set_default_data_mode(&self, mode: DataMode) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.default_data_mode = mode;

        log::info!("⚙️ 默认数据模式已设置为 {:?}（{}）", mode, mode.as_u32());
        Ok(())
    }

    pub fn get_default_data_mode(&self) -> Result<DataMode, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.default_data_mode)
    }

    /// 创建使用默认数据模式的空元素。
    pub fn new_image(&self) -> Result<Image, ImageError> {
        let mut image = Image::new();
        image.set_data_mode(self.get_default_data_mode()?);
        Ok(image)
    }

    /// 加载主入口：读取来源并解码。
    ///
    /// 同步执行；错误不会 panic，也不会留下半成品结果。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_image::image_loader::{DataMode, ImageLoader, ImageSource};
    ///
    /// let loader = ImageLoader::default();
    /// let err = loader
    ///     .load(&ImageSource::from("/definitely/missing.png"), DataMode::Image)
    ///     .unwrap_err();
    /// assert_eq!(err.code(), "source_not_found");
    /// ```
    pub fn load(&self, source: &ImageSource, mode: DataMode) -> Result<DecodedImage, ImageError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = Self::load_raw(source, &config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = Self::decode_raw(raw, mode, &config)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 图片加载完成 - {}x{} {:?} load={}ms decode={}ms total={}ms",
            decoded.width,
            decoded.height,
            decoded.kind,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(decoded)
    }

    /// 在阻塞线程池上执行加载，不占用异步运行时的工作线程。
    pub async fn load_async(
        &self,
        source: ImageSource,
        mode: DataMode,
    ) -> Result<DecodedImage, ImageError> {
        let loader = self.clone();

        tokio::task::spawn_blocking(move || loader.load(&source, mode))
            .await
            .map_err(|e| ImageError::Decode(format!("加载任务异常退出：{}", e)))?
    }
}
