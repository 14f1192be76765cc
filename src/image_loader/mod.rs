//! # 图片加载模块（image_loader）
//!
//! ## 设计思路
//!
//! 该模块将“来源读取 → 签名识别 → 头部探测 → 解码 → 元素状态与回调”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `element`：图片元素（`src` / `complete` / 宽高 / `onload` / `onerror`）
//! - `service`：跨任务共享的元素与异步赋值
//! - `handler`：编排加载流程 + 配置管理
//! - `loader`：文件 / 内存 / Data URL 读取与体积校验
//! - `sniff`：按签名识别格式
//! - `probe`：JPEG 标记段探测（尺寸、颜色模型）
//! - `pipeline`：解码、像素限制、RGBA 输出
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! Image::set_src / SharedImage::set_src_async
//!    ↓
//! element.rs（复位状态 + 签发票据）
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（读取来源 + 体积校验）
//!    └─ pipeline.rs
//!         ├─ sniff.rs（签名识别）
//!         ├─ probe.rs（JPEG 头部）
//!         └─ image crate（带限制的解码）
//!    ↓
//! element.rs（校验票据 → 写入终态 → onload / onerror）
//! ```
//!
//! ## 分层职责建议
//!
//! - 回调与状态语义变更优先改 `element.rs`
//! - 资源上限与档位变更优先改 `config.rs`
//! - 新增来源类型改 `source.rs` 与 `loader.rs`
//! - 新增格式改 `sniff.rs` 与 `pipeline.rs`

mod config;
mod element;
mod error;
mod handler;
mod loader;
mod pipeline;
mod probe;
mod service;
mod sniff;
mod source;

pub use config::{AdvancedLimits, DataMode, LimitProfile, LoaderConfig};
pub use element::{ErrorHandler, Image, LoadHandler, LoadState, LoadTicket};
pub use error::ImageError;
pub use handler::ImageLoader;
pub use probe::ColorModel;
pub use service::SharedImage;
pub use sniff::ImageKind;
pub use source::{DecodedImage, ImageSource};
