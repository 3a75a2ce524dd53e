// 该文件是 Tuili （推理） 项目的一部分。
// src/frame.rs - HWC 帧定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::RgbImage;

use crate::{error::TaskError, model::PixelRect};

const RGB_CHANNELS: usize = 3;

pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
}

/// 通道在后（行、列、通道交错）的字节图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
  data: Box<[u8]>,
  width: usize,
  height: usize,
  channels: usize,
}

impl ImageFrame {
  pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> Result<Self, TaskError> {
    if data.len() != width * height * channels {
      return Err(TaskError::InvalidImage(format!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        width * height * channels,
        data.len()
      )));
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      width,
      height,
      channels,
    })
  }

  pub fn with_shape(height: usize, width: usize, channels: usize) -> Self {
    Self {
      data: vec![0u8; width * height * channels].into_boxed_slice(),
      width,
      height,
      channels,
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// 按行主序遍历某一通道的取值
  pub fn channel(&self, channel: usize) -> impl Iterator<Item = u8> + '_ {
    self
      .data
      .iter()
      .skip(channel)
      .step_by(self.channels.max(1))
      .copied()
  }

  /// 裁剪出矩形区域，矩形会先被限制在图像范围内
  pub fn crop(&self, rect: &PixelRect) -> Option<ImageFrame> {
    let rect = rect.clamp_to(self.width as i32, self.height as i32);
    if rect.width <= 0 || rect.height <= 0 {
      return None;
    }

    let (x0, y0) = (rect.x as usize, rect.y as usize);
    let (w, h) = (rect.width as usize, rect.height as usize);
    let row_len = w * self.channels;
    let mut data = Vec::with_capacity(h * row_len);
    for y in y0..y0 + h {
      let start = (y * self.width + x0) * self.channels;
      data.extend_from_slice(&self.as_nhwc()[start..start + row_len]);
    }

    Some(Self {
      data: data.into_boxed_slice(),
      width: w,
      height: h,
      channels: self.channels,
    })
  }
}

impl AsMut<[u8]> for ImageFrame {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl AsNhwcFrame for ImageFrame {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }
}

impl From<RgbImage> for ImageFrame {
  fn from(image: RgbImage) -> Self {
    let (width, height) = image.dimensions();
    Self {
      data: image.into_raw().into_boxed_slice(),
      width: width as usize,
      height: height as usize,
      channels: RGB_CHANNELS,
    }
  }
}
