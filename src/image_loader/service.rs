//! # 服务层（共享元素）
//!
//! ## 设计思路
//!
//! 异步场景下图片元素需要跨任务共享，解码又不能长期占用锁。
//! `SharedImage` 把一次异步赋值拆成三段：
//! 1. 持锁：复位状态并签发票据
//! 2. 释放锁：在阻塞线程池上读取与解码
//! 3. 持锁：交回票据，写入终态并触发回调
//!
//! ## 实现思路
//!
//! 重叠的赋值以最后一次为准；被取代的结果在第 3 步被丢弃，不触发回调。
//! 回调在持锁期间执行，回调内部不能再访问同一个 `SharedImage`，否则会死锁。

use std::sync::{Arc, Mutex};

use super::{Image, ImageError, ImageLoader, ImageSource};

/// 可跨任务共享的图片元素。
#[derive(Clone, Default)]
pub struct SharedImage {
    inner: Arc<Mutex<Image>>,
}

impl SharedImage {
    pub fn new(image: Image) -> Self {
        Self {
            inner: Arc::new(Mutex::new(image)),
        }
    }

    /// 持锁访问元素（读取状态、设置回调等）。
    pub fn with_image<R>(&self, f: impl FnOnce(&mut Image) -> R) -> Result<R, ImageError> {
        let mut image = self
            .inner
            .lock()
            .map_err(|_| ImageError::ResourceLimit("图片元素锁已中毒".to_string()))?;
        Ok(f(&mut image))
    }

    /// 异步赋值 `src`。
    ///
    /// 返回本次结果是否被应用；被更新的赋值取代时返回 `false`。
    pub async fn set_src_async(&self, loader: &ImageLoader, src: impl Into<ImageSource>) -> bool {
        let source = src.into();

        let ticket = match self.with_image(|img| img.begin_load(source.clone())) {
            Ok(ticket) => ticket,
            Err(err) => {
                log::warn!("⚠️ 无法开始加载：{}", err);
                return false;
            }
        };

        let result = loader.load_async(source, ticket.data_mode()).await;

        match self.with_image(|img| img.finish_load(ticket, result)) {
            Ok(applied) => applied,
            Err(err) => {
                log::warn!("⚠️ 无法写入加载结果：{}", err);
                false
            }
        }
    }
}
