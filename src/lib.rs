//! # canvas-image — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                宿主（同步调用 / tokio 任务）               │
//! │                                                          │
//! │   Image::set_src ─── SharedImage::set_src_async          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ onload() / onerror(&ImageError)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓                                                  │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ image_loader   签名识别·解码·元素状态·回调            │
//! │  │   ├─ loader     文件 / 内存 / Data URL                 │
//! │  │   ├─ sniff      PNG / JPEG / GIF 签名                  │
//! │  │   ├─ probe      JPEG 头部与颜色模型                    │
//! │  │   └─ pipeline   带资源限制的解码                       │
//! │  │                                                       │
//! │  └─ settings       加载限制的 JSON 持久化                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，对外接口的返回类型 |
//! | [`image_loader`] | `Image` 元素、`ImageLoader` 加载器及其配置 |
//! | [`settings`] | `LoaderSettings` 的读取、保存与应用 |

pub mod error;
pub mod image_loader;
pub mod settings;
