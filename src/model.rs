// 该文件是 Tuili （推理） 项目的一部分。
// src/model.rs - 模型与结果对象
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

use serde::Serialize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 归一化矩形，原点加宽高
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Rect {
  /// 由两个角点构造
  pub fn from_corners(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
    Self {
      x: xmin,
      y: ymin,
      width: xmax - xmin,
      height: ymax - ymin,
    }
  }

  /// 换算到像素坐标，按截断取整
  pub fn to_pixels(&self, width: usize, height: usize) -> PixelRect {
    let x = (self.x * width as f32) as i32;
    let y = (self.y * height as f32) as i32;
    PixelRect {
      x,
      y,
      width: (self.width * width as f32) as i32,
      height: (self.height * height as f32) as i32,
    }
  }
}

/// 像素矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl PixelRect {
  pub fn from_corners(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
    Self {
      x: xmin,
      y: ymin,
      width: xmax.saturating_sub(xmin),
      height: ymax.saturating_sub(ymin),
    }
  }

  pub fn clamp_to(&self, width: i32, height: i32) -> PixelRect {
    let x_min = self.x.clamp(0, width);
    let y_min = self.y.clamp(0, height);
    let x_max = self.x.saturating_add(self.width).clamp(0, width);
    let y_max = self.y.saturating_add(self.height).clamp(0, height);
    PixelRect::from_corners(x_min, y_min, x_max.max(x_min), y_max.max(y_min))
  }
}

/// 检测结果，坐标为图像比例
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
  pub rect: Rect,
  pub label: u32,
  pub confidence: f32,
}

/// 检测结果，坐标为显示图像上的像素
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelDetection {
  pub rect: PixelRect,
  pub label: u32,
  pub confidence: f32,
}

/// 关键点，坐标为图像比例
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
  pub confidence: f32,
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
  pub label: u32,
  pub confidence: f32,
}

mod skeleton;
pub use self::skeleton::{COCO_KEYPOINT_COUNT, COCO_SKELETON, KeypointIndex, Skeleton};
