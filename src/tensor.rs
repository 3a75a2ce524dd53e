// 该文件是 Tuili （推理） 项目的一部分。
// src/tensor.rs - 张量与模型形状
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

use std::{borrow::Cow, fmt};

use ndarray::{ArrayD, ArrayViewD};

use crate::error::TaskError;

/// 模型输入形状 (N, C, H, W)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
  pub batch: usize,
  pub channels: usize,
  pub height: usize,
  pub width: usize,
}

impl ModelShape {
  pub fn new(batch: usize, channels: usize, height: usize, width: usize) -> Self {
    Self {
      batch,
      channels,
      height,
      width,
    }
  }

  /// 从后端报告的维度构造，必须恰好是四维且空间尺寸非零
  pub fn from_dims(dims: &[usize]) -> Result<Self, TaskError> {
    let [batch, channels, height, width] = dims else {
      return Err(TaskError::incompatible(format!(
        "模型输入应为 NCHW 四维, 实际维度 {:?}",
        dims
      )));
    };

    if *channels == 0 || *height == 0 || *width == 0 {
      return Err(TaskError::incompatible(format!(
        "模型输入尺寸为零: {:?}",
        dims
      )));
    }

    Ok(Self::new(*batch, *channels, *height, *width))
  }
}

impl fmt::Display for ModelShape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}, {}, {}, {}]",
      self.batch, self.channels, self.height, self.width
    )
  }
}

/// 输出张量的索引方式：按序号或按名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorKey {
  Index(usize),
  Name(String),
}

impl From<usize> for TensorKey {
  fn from(index: usize) -> Self {
    TensorKey::Index(index)
  }
}

impl From<&str> for TensorKey {
  fn from(name: &str) -> Self {
    TensorKey::Name(name.to_string())
  }
}

impl fmt::Display for TensorKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TensorKey::Index(index) => write!(f, "#{}", index),
      TensorKey::Name(name) => write!(f, "'{}'", name),
    }
  }
}

/// 后端持有的输出张量
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
  F32(ArrayD<f32>),
  I64(ArrayD<i64>),
}

impl TensorData {
  pub fn view(&self) -> OutputTensor<'_> {
    match self {
      TensorData::F32(array) => OutputTensor::F32(array.view()),
      TensorData::I64(array) => OutputTensor::I64(array.view()),
    }
  }
}

/// 只读的输出张量视图，解码器只通过它读取数据
#[derive(Debug, Clone)]
pub enum OutputTensor<'a> {
  F32(ArrayViewD<'a, f32>),
  I64(ArrayViewD<'a, i64>),
}

impl<'a> OutputTensor<'a> {
  pub fn shape(&self) -> &[usize] {
    match self {
      OutputTensor::F32(view) => view.shape(),
      OutputTensor::I64(view) => view.shape(),
    }
  }

  pub fn ndim(&self) -> usize {
    self.shape().len()
  }

  pub fn dtype(&self) -> &'static str {
    match self {
      OutputTensor::F32(_) => "f32",
      OutputTensor::I64(_) => "i64",
    }
  }

  /// 以行主序读取 f32 数据
  pub fn f32_row_major(&self, key: &TensorKey) -> Result<Cow<'a, [f32]>, TaskError> {
    match self {
      OutputTensor::F32(view) => Ok(row_major(view)),
      other => Err(TaskError::incompatible(format!(
        "输出 {} 应为 f32, 实际为 {}",
        key,
        other.dtype()
      ))),
    }
  }

  /// 以行主序读取 i64 数据
  pub fn i64_row_major(&self, key: &TensorKey) -> Result<Cow<'a, [i64]>, TaskError> {
    match self {
      OutputTensor::I64(view) => Ok(row_major(view)),
      other => Err(TaskError::incompatible(format!(
        "输出 {} 应为 i64, 实际为 {}",
        key,
        other.dtype()
      ))),
    }
  }

  /// 要求张量恰好具有 `rank` 维
  pub fn expect_rank(&self, key: &TensorKey, rank: usize) -> Result<&[usize], TaskError> {
    let shape = self.shape();
    if shape.len() != rank {
      return Err(TaskError::incompatible(format!(
        "输出 {} 应为 {} 维, 实际形状 {:?}",
        key, rank, shape
      )));
    }
    Ok(shape)
  }
}

// 标准布局时直接借用，否则按逻辑顺序复制一份
fn row_major<'a, T: Clone>(view: &ArrayViewD<'a, T>) -> Cow<'a, [T]> {
  match view.to_slice() {
    Some(slice) => Cow::Borrowed(slice),
    None => Cow::Owned(view.iter().cloned().collect()),
  }
}
