// 该文件是 Tuili （推理） 项目的一部分。
// src/preprocess.rs - 前处理：图像到模型输入张量
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

use image::{ImageBuffer, Luma, imageops};
use ndarray::ArrayView4;
use tracing::debug;

use crate::{error::TaskError, frame::ImageFrame, tensor::ModelShape};

pub trait Preprocess {
  /// 生成模型输入张量
  ///
  /// 返回的张量借用前处理器自身持有的缓冲区，
  /// 在下一次调用或前处理器销毁之前一直有效。
  fn preprocess<'a>(
    &'a mut self,
    frame: &ImageFrame,
    shape: &ModelShape,
  ) -> Result<ArrayView4<'a, f32>, TaskError>;
}

/// 缩放后转为 f32 的 CHW 平面布局
#[derive(Debug, Default)]
pub struct FloatChw {
  buffer: Vec<f32>,
}

impl FloatChw {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Preprocess for FloatChw {
  fn preprocess<'a>(
    &'a mut self,
    frame: &ImageFrame,
    shape: &ModelShape,
  ) -> Result<ArrayView4<'a, f32>, TaskError> {
    if frame.is_empty() || frame.width() == 0 || frame.height() == 0 {
      return Err(TaskError::InvalidImage("输入图像为空".to_string()));
    }

    if frame.channels() != shape.channels {
      return Err(TaskError::shape_mismatch(
        format!("{} 通道", shape.channels),
        format!("{} 通道", frame.channels()),
      ));
    }

    let (width, height) = (shape.width, shape.height);
    let plane = width * height;
    self.buffer.clear();
    self.buffer.resize(shape.channels * plane, 0.0);

    debug!(
      "前处理: {}x{}x{} -> {}",
      frame.width(),
      frame.height(),
      frame.channels(),
      shape
    );

    // 逐通道缩放，直接写入对应平面即完成 HWC -> CHW
    for c in 0..shape.channels {
      let channel = split_channel(frame, c)?;
      let resized = if (frame.width(), frame.height()) == (width, height) {
        channel
      } else {
        imageops::resize(
          &channel,
          width as u32,
          height as u32,
          imageops::FilterType::Triangle,
        )
      };

      let dst = &mut self.buffer[c * plane..(c + 1) * plane];
      for (d, s) in dst.iter_mut().zip(resized.as_raw()) {
        *d = *s as f32;
      }
    }

    ArrayView4::from_shape((1, shape.channels, height, width), &self.buffer)
      .map_err(|e| TaskError::shape_mismatch(shape, e))
  }
}

fn split_channel(
  frame: &ImageFrame,
  channel: usize,
) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, TaskError> {
  let data: Vec<u8> = frame.channel(channel).collect();
  ImageBuffer::from_raw(frame.width() as u32, frame.height() as u32, data)
    .ok_or_else(|| TaskError::InvalidImage(format!("无法取出第 {} 通道", channel)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_image_is_invalid() {
    let frame = ImageFrame::with_shape(0, 0, 3);
    let mut pre = FloatChw::new();
    let err = pre
      .preprocess(&frame, &ModelShape::new(1, 3, 2, 2))
      .unwrap_err();
    assert!(matches!(err, TaskError::InvalidImage(_)));
  }

  #[test]
  fn channel_count_must_match() {
    let frame = ImageFrame::with_shape(2, 2, 1);
    let mut pre = FloatChw::new();
    let err = pre
      .preprocess(&frame, &ModelShape::new(1, 3, 2, 2))
      .unwrap_err();
    assert!(matches!(err, TaskError::ShapeMismatch { .. }));
  }

  #[test]
  fn same_size_is_planar_copy() {
    // 2x2 RGB，像素值 = 10 * 像素序号 + 通道
    let data: Vec<u8> = (0..4u8)
      .flat_map(|p| (0..3u8).map(move |c| 10 * p + c))
      .collect();
    let frame = ImageFrame::new(data, 2, 2, 3).unwrap();
    let mut pre = FloatChw::new();
    let tensor = pre.preprocess(&frame, &ModelShape::new(1, 3, 2, 2)).unwrap();
    assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
    let flat: Vec<f32> = tensor.iter().copied().collect();
    assert_eq!(
      flat,
      vec![
        0.0, 10.0, 20.0, 30.0, 1.0, 11.0, 21.0, 31.0, 2.0, 12.0, 22.0, 32.0
      ]
    );
  }

  #[test]
  fn constant_image_stays_constant_after_resize() {
    let frame = ImageFrame::new(vec![100; 3], 1, 1, 3).unwrap();
    let mut pre = FloatChw::new();
    let tensor = pre.preprocess(&frame, &ModelShape::new(1, 3, 4, 6)).unwrap();
    assert_eq!(tensor.shape(), &[1, 3, 4, 6]);
    assert!(tensor.iter().all(|&v| v == 100.0));
  }
}
