//! 加载限制的持久化设置。
//!
//! 文件不存在视为“未保存过”，返回 `None`；缺失字段按默认值补齐。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::image_loader::{AdvancedLimits, DataMode, ImageLoader, LimitProfile, LoaderConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// `strict` / `balanced` / `relaxed`
    pub limit_profile: String,
    /// 高级限制；存在时在档位之后覆盖。
    pub advanced: Option<AdvancedLimits>,
    /// `ImageLoader::new_image` 使用的数据模式（1 / 2 / 3）。
    pub data_mode: u32,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            limit_profile: LimitProfile::Balanced.as_str().to_string(),
            advanced: None,
            data_mode: DataMode::default().as_u32(),
        }
    }
}

impl LoaderSettings {
    /// 从加载器当前配置生成设置快照。
    pub fn from_loader(loader: &ImageLoader) -> Result<Self, AppError> {
        let advanced = loader.get_advanced_limits()?;
        let defaults = LoaderConfig::default().advanced_limits();

        Ok(Self {
            limit_profile: loader.get_limit_profile()?.as_str().to_string(),
            advanced: (advanced != defaults).then_some(advanced),
            data_mode: loader.get_default_data_mode()?.as_u32(),
        })
    }

    /// 应用到加载器：先档位，再高级限制，最后是新建元素的数据模式。
    pub fn apply_to(&self, loader: &ImageLoader) -> Result<(), AppError> {
        let profile = LimitProfile::from_str(&self.limit_profile)?;
        loader.set_limit_profile(profile)?;

        if let Some(advanced) = self.advanced {
            loader.set_advanced_limits(advanced)?;
        }
        loader.set_default_data_mode(self.data_mode())?;

        log::info!(
            "⚙️ 已应用加载设置 - profile={} advanced={} data_mode={}",
            profile.as_str(),
            self.advanced.is_some(),
            self.data_mode
        );

        Ok(())
    }

    /// 未知数值回退为默认模式。
    pub fn data_mode(&self) -> DataMode {
        DataMode::from_u32(self.data_mode).unwrap_or_default()
    }
}

pub fn load_settings(path: &Path) -> Result<Option<LoaderSettings>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<LoaderSettings>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    Ok(Some(parsed))
}

pub fn save_settings(path: &Path, settings: &LoaderSettings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}
