//! # 头部探测模块
//!
//! ## 设计思路
//!
//! 在完整解码前只遍历 JPEG 的标记段，拿到帧尺寸、分量数与 Adobe APP14 颜色变换标记。
//! 用途有三个：
//! 1. 尺寸预检：完整解码前按像素上限快速拒绝
//! 2. 颜色模型识别：CMYK / YCCK 需要在输出前转换为 RGB，这里负责识别并记录
//! 3. `DataMode::Mime`：只需要尺寸、不解码像素
//!
//! ## 实现思路
//!
//! 标记段都带长度前缀，全部通过切片访问，越界即视为截断，不会 panic。
//! 扫描到 SOS 即停止，熵编码数据交给解码器处理。

use super::ImageError;

const M_SOI: u8 = 0xD8;
const M_EOI: u8 = 0xD9;
const M_SOS: u8 = 0xDA;
const M_APP14: u8 = 0xEE;
const M_DHT: u8 = 0xC4;
const M_JPG: u8 = 0xC8;
const M_DAC: u8 = 0xCC;
const ADOBE_SEGMENT_MIN_LEN: usize = 12;

/// 源数据的颜色模型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Grayscale,
    Rgb,
    YCbCr,
    Cmyk,
    Ycck,
    Unknown,
}

impl ColorModel {
    /// 是否需要四色到 RGB 的转换。
    pub fn is_four_channel(self) -> bool {
        matches!(self, Self::Cmyk | Self::Ycck)
    }

    pub(crate) fn from_decoded(color: image::ColorType) -> Self {
        use image::ColorType;

        match color {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => Self::Grayscale,
            _ => Self::Rgb,
        }
    }
}

/// JPEG 帧头信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub progressive: bool,
    /// Adobe APP14 段中的颜色变换标记（0 = 无变换，1 = YCbCr，2 = YCCK）。
    pub adobe_transform: Option<u8>,
}

impl JpegHeader {
    pub fn color_model(&self) -> ColorModel {
        match (self.components, self.adobe_transform) {
            (1, _) => ColorModel::Grayscale,
            (3, Some(0)) => ColorModel::Rgb,
            (3, _) => ColorModel::YCbCr,
            (4, Some(2)) => ColorModel::Ycck,
            (4, _) => ColorModel::Cmyk,
            _ => ColorModel::Unknown,
        }
    }
}

fn be_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let pair = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([pair[0], pair[1]]))
}

fn is_sof(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && !matches!(marker, M_DHT | M_JPG | M_DAC)
}

fn truncated(what: &str) -> ImageError {
    ImageError::Decode(format!("JPEG 头部被截断：{}", what))
}

/// 遍历标记段直到 SOS，返回帧头信息。
pub(crate) fn probe_jpeg(data: &[u8]) -> Result<JpegHeader, ImageError> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != M_SOI {
        return Err(ImageError::UnrecognizedFormat("缺少 JPEG SOI 标记".to_string()));
    }

    let len = data.len();
    let mut pos = 2usize;
    let mut frame: Option<JpegHeader> = None;
    let mut adobe_transform: Option<u8> = None;

    loop {
        while pos < len && data[pos] != 0xFF {
            pos += 1;
        }
        while pos < len && data[pos] == 0xFF {
            pos += 1;
        }
        if pos >= len {
            return Err(truncated("未找到扫描段（SOS）"));
        }

        let marker = data[pos];
        pos += 1;

        match marker {
            0x00 | 0x01 | 0xD0..=0xD7 => continue,
            M_EOI => {
                return Err(ImageError::Decode("JPEG 在扫描段之前结束".to_string()));
            }
            _ => {}
        }

        let seg_len = be_u16(data, pos).ok_or_else(|| truncated("标记段长度缺失"))? as usize;
        if seg_len < 2 || pos + seg_len > len {
            return Err(truncated(&format!("标记 0xFF{:02X} 段长度越界", marker)));
        }
        let payload = &data[pos + 2..pos + seg_len];
        pos += seg_len;

        if marker == M_SOS {
            let mut header = frame.ok_or_else(|| {
                ImageError::Decode("JPEG 缺少帧头（SOF）".to_string())
            })?;
            header.adobe_transform = adobe_transform;
            return Ok(header);
        }

        if is_sof(marker) {
            if payload.len() < 6 {
                return Err(truncated("SOF 段过短"));
            }
            let height = be_u16(payload, 1).unwrap_or(0) as u32;
            let width = be_u16(payload, 3).unwrap_or(0) as u32;
            let components = payload[5];

            if width == 0 || height == 0 {
                return Err(ImageError::Decode(format!(
                    "JPEG 帧尺寸无效：{}x{}",
                    width, height
                )));
            }
            if components == 0 {
                return Err(ImageError::Decode("JPEG 分量数为 0".to_string()));
            }

            frame = Some(JpegHeader {
                width,
                height,
                components,
                progressive: marker == 0xC2,
                adobe_transform: None,
            });
        } else if marker == M_APP14
            && payload.len() >= ADOBE_SEGMENT_MIN_LEN
            && payload.starts_with(b"Adobe")
        {
            adobe_transform = Some(payload[11]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMYK_JPEG: &[u8] = include_bytes!("../../tests/fixtures/cmyk.jpg");
    const CORRUPT_JPEG: &[u8] = include_bytes!("../../tests/fixtures/corrupt.jpg");

    fn minimal_gray_header(width: u16, height: u16) -> Vec<u8> {
        gray_header_with_sof(0xC0, width, height)
    }

    fn gray_header_with_sof(sof: u8, width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, M_SOI];
        bytes.extend_from_slice(&[0xFF, sof, 0x00, 0x0B, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[0x01, 0x01, 0x11, 0x00]);
        bytes.extend_from_slice(&[0xFF, M_SOS, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        bytes
    }

    #[test]
    fn cmyk_fixture_reports_adobe_cmyk() {
        let header = probe_jpeg(CMYK_JPEG).expect("probe should succeed");

        assert_eq!((header.width, header.height), (190, 45));
        assert_eq!(header.components, 4);
        assert_eq!(header.adobe_transform, Some(0));
        assert_eq!(header.color_model(), ColorModel::Cmyk);
        assert!(header.color_model().is_four_channel());
    }

    #[test]
    fn single_component_frame_is_grayscale() {
        let header = probe_jpeg(&minimal_gray_header(64, 32)).expect("probe should succeed");

        assert_eq!((header.width, header.height), (64, 32));
        assert_eq!(header.color_model(), ColorModel::Grayscale);
        assert!(!header.progressive);
    }

    #[test]
    fn sof2_frame_is_progressive() {
        let header =
            probe_jpeg(&gray_header_with_sof(0xC2, 16, 16)).expect("probe should succeed");

        assert!(header.progressive);
        assert_eq!((header.width, header.height), (16, 16));
    }

    #[test]
    fn zero_height_frame_is_rejected() {
        assert!(matches!(
            probe_jpeg(&minimal_gray_header(64, 0)),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn truncated_headers_are_reported_not_panicked() {
        assert!(matches!(probe_jpeg(CORRUPT_JPEG), Err(ImageError::Decode(_))));

        for cut in 0..CMYK_JPEG.len().min(200) {
            let _ = probe_jpeg(&CMYK_JPEG[..cut]);
        }
    }

    #[test]
    fn four_components_with_ycck_transform() {
        let header = JpegHeader {
            width: 1,
            height: 1,
            components: 4,
            progressive: false,
            adobe_transform: Some(2),
        };

        assert_eq!(header.color_model(), ColorModel::Ycck);
    }
}
