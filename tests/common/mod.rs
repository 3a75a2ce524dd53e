// 该文件是 Tuili （推理） 项目的一部分。
// tests/common/mod.rs - 测试公用构造函数
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

#![allow(dead_code)]

use tuili::{backend::MemoryBackend, frame::ImageFrame};

pub const EPSILON: f32 = 1e-5;

pub fn assert_close(actual: f32, expected: f32) {
  assert!(
    (actual - expected).abs() < EPSILON,
    "期望 {}, 实际 {}",
    expected,
    actual
  );
}

/// 取值随下标递增的 RGB 图像
pub fn rgb_frame(width: usize, height: usize) -> ImageFrame {
  let data = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
  ImageFrame::new(data, width, height, 3).unwrap()
}

/// [N,5] 检测框加 [N] 标签
pub fn box5_backend(input_shape: &[usize], rows: &[[f32; 5]], labels: &[i64]) -> MemoryBackend {
  MemoryBackend::new(input_shape)
    .with_f32_output(
      Some("boxes"),
      &[rows.len(), 5],
      rows.iter().flatten().copied().collect(),
    )
    .unwrap()
    .with_i64_output(Some("labels"), &[labels.len()], labels.to_vec())
    .unwrap()
}

/// [1,1,N,7] 检测框
pub fn box7_backend(input_shape: &[usize], rows: &[[f32; 7]]) -> MemoryBackend {
  MemoryBackend::new(input_shape)
    .with_f32_output(
      Some("detection_out"),
      &[1, 1, rows.len(), 7],
      rows.iter().flatten().copied().collect(),
    )
    .unwrap()
}

/// [1,K,H,W] 热力图
pub fn heatmap_backend(
  input_shape: &[usize],
  joints: usize,
  height: usize,
  width: usize,
  data: Vec<f32>,
) -> MemoryBackend {
  MemoryBackend::new(input_shape)
    .with_f32_output(Some("heatmaps"), &[1, joints, height, width], data)
    .unwrap()
}
