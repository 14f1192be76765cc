//! # 图片元素模块
//!
//! ## 设计思路
//!
//! `Image` 对应宿主侧的图片对象：赋值 `src` 即开始一次加载，结束时恰好触发
//! `onload` 或 `onerror` 之一。元素状态只在两个时刻变化：
//! 1. 赋值时同步复位（`complete=false`、宽高归零）
//! 2. 加载结束时一次性写入终态
//!
//! ## 实现思路
//!
//! - 每次赋值递增代数（generation），并签发 `LoadTicket`。
//! - `finish_load` 只接受当前代数的票据；被新赋值取代的结果直接丢弃，不触发任何回调。
//! - 同步的 `set_src` 与异步的 `SharedImage::set_src_async` 共用同一套 begin/finish 逻辑。

use bytes::Bytes;
use std::fmt;

use super::probe::ColorModel;
use super::source::DecodedImage;
use super::{DataMode, ImageError, ImageKind, ImageLoader, ImageSource};

/// 加载成功回调。
pub type LoadHandler = Box<dyn FnMut() + Send>;
/// 加载失败回调，参数为失败原因。
pub type ErrorHandler = Box<dyn FnMut(&ImageError) + Send>;

/// 加载状态机：`Unloaded → Loading → {Loaded | Failed}`，每次赋值重新进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// 一次加载的凭据。
///
/// 只能由 `Image::begin_load` 签发，交回 `Image::finish_load` 时校验是否已被取代。
#[derive(Debug)]
#[must_use = "未交回 finish_load 的票据不会触发任何回调"]
pub struct LoadTicket {
    generation: u64,
    data_mode: DataMode,
}

impl LoadTicket {
    /// 签发时的数据模式，加载过程中修改元素的模式不影响本次加载。
    pub fn data_mode(&self) -> DataMode {
        self.data_mode
    }
}

/// 可加载的图片元素。
#[derive(Default)]
pub struct Image {
    src: Option<ImageSource>,
    state: LoadState,
    width: u32,
    height: u32,
    data_mode: DataMode,
    decoded: Option<DecodedImage>,
    onload: Option<LoadHandler>,
    onerror: Option<ErrorHandler>,
    generation: u64,
}

impl Image {
    /// 创建空元素：未设置 `src`，宽高为 0，`complete()` 为 false。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置成功回调（替换已有回调）。
    pub fn set_onload<F>(&mut self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.onload = Some(Box::new(handler));
    }

    /// 设置失败回调（替换已有回调）。
    pub fn set_onerror<F>(&mut self, handler: F)
    where
        F: FnMut(&ImageError) + Send + 'static,
    {
        self.onerror = Some(Box::new(handler));
    }

    pub fn clear_onload(&mut self) {
        self.onload = None;
    }

    pub fn clear_onerror(&mut self) {
        self.onerror = None;
    }

    pub fn data_mode(&self) -> DataMode {
        self.data_mode
    }

    /// 设置数据模式，从下一次赋值开始生效。
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.data_mode = mode;
    }

    /// 赋值 `src` 并同步完成加载。
    ///
    /// 本方法从不失败：所有错误都通过 `onerror` 交给调用方，返回时终态已写入。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_image::image_loader::{Image, ImageLoader};
    /// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
    ///
    /// let loader = ImageLoader::default();
    /// let errors = Arc::new(AtomicUsize::new(0));
    /// let counter = errors.clone();
    ///
    /// let mut img = Image::new();
    /// img.set_onerror(move |_| {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    /// });
    /// img.set_src(&loader, "/definitely/missing.png");
    ///
    /// assert!(!img.complete());
    /// assert_eq!(errors.load(Ordering::SeqCst), 1);
    /// ```
    pub fn set_src(&mut self, loader: &ImageLoader, src: impl Into<ImageSource>) {
        let source = src.into();
        let ticket = self.begin_load(source.clone());
        let result = loader.load(&source, ticket.data_mode());
        self.finish_load(ticket, result);
    }

    /// 开始一次加载：记录 `src`、复位状态并签发票据。
    ///
    /// 之前签发的票据全部失效。
    pub fn begin_load(&mut self, src: impl Into<ImageSource>) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.src = Some(src.into());
        self.reset_output();
        self.state = LoadState::Loading;

        LoadTicket {
            generation: self.generation,
            data_mode: self.data_mode,
        }
    }

    /// 结束一次加载：写入终态并触发恰好一个回调。
    ///
    /// 票据已被取代（或已交回过）时丢弃结果并返回 `false`，不改变任何状态。
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<DecodedImage, ImageError>,
    ) -> bool {
        if ticket.generation != self.generation || self.state != LoadState::Loading {
            log::warn!(
                "⏭️ 丢弃已被取代的加载结果（票据代数 {}，当前代数 {}）",
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(decoded) => {
                self.width = decoded.width;
                self.height = decoded.height;
                self.decoded = Some(decoded);
                self.state = LoadState::Loaded;

                if let Some(handler) = self.onload.as_mut() {
                    handler();
                }
            }
            Err(err) => {
                self.reset_output();
                self.state = LoadState::Failed;

                log::warn!(
                    "❌ 图片加载失败 [{}] - 来源: {} 原因: {}",
                    err.code(),
                    self.src
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    err
                );

                if let Some(handler) = self.onerror.as_mut() {
                    handler(&err);
                }
            }
        }

        true
    }

    fn reset_output(&mut self) {
        self.width = 0;
        self.height = 0;
        self.decoded = None;
    }

    /// 最近一次赋值的来源（加载失败也保留）。
    pub fn src(&self) -> Option<&ImageSource> {
        self.src.as_ref()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// 仅当最近一次赋值已成功完成时为 true。
    pub fn complete(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 像素（行优先）。仅保留编码数据的 JPEG 返回 `None`。
    pub fn pixels(&self) -> Option<&[u8]> {
        self.decoded.as_ref()?.pixels.as_deref()
    }

    /// 保留的 JPEG 原始编码字节。
    pub fn mime_data(&self) -> Option<&Bytes> {
        self.decoded.as_ref()?.mime_data.as_ref()
    }

    pub fn source_format(&self) -> Option<ImageKind> {
        self.decoded.as_ref().map(|d| d.kind)
    }

    pub fn source_color(&self) -> Option<ColorModel> {
        self.decoded.as_ref().map(|d| d.source_color)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("src", &self.src.as_ref().map(ToString::to_string))
            .field("state", &self.state)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_mode", &self.data_mode)
            .field("has_onload", &self.onload.is_some())
            .field("has_onerror", &self.onerror.is_some())
            .finish()
    }
}
