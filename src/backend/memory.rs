// 该文件是 Tuili （推理） 项目的一部分。
// src/backend/memory.rs - 内存回放后端
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

use ndarray::{Array4, ArrayD, ArrayView4, IxDyn};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  backend::{InferenceBackend, ModelOutputs},
  tensor::{OutputTensor, TensorData, TensorKey},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum MemoryBackendError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("回放文件解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("张量形状错误: {0}")]
  ShapeError(#[from] ndarray::ShapeError),
  #[error("输入形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputMismatch {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[derive(Deserialize)]
struct ReplayFile {
  input_shape: Vec<usize>,
  outputs: Vec<ReplayTensor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReplayDtype {
  F32,
  I64,
}

#[derive(Deserialize)]
struct ReplayTensor {
  #[serde(default)]
  name: Option<String>,
  shape: Vec<usize>,
  dtype: ReplayDtype,
  data: Vec<f64>,
}

/// 固定输出的后端，用于回放录制下来的模型输出
///
/// 每次推理都会校验输入形状，并保存最近一次的输入张量。
#[derive(Debug, Clone)]
pub struct MemoryBackend {
  input_shape: Vec<usize>,
  outputs: Vec<(Option<String>, TensorData)>,
  last_input: Option<Array4<f32>>,
  infer_count: usize,
}

impl MemoryBackend {
  pub fn new(input_shape: &[usize]) -> Self {
    Self {
      input_shape: input_shape.to_vec(),
      outputs: Vec::new(),
      last_input: None,
      infer_count: 0,
    }
  }

  pub fn with_f32_output(
    mut self,
    name: Option<&str>,
    shape: &[usize],
    data: Vec<f32>,
  ) -> Result<Self, MemoryBackendError> {
    let array = ArrayD::from_shape_vec(IxDyn(shape), data)?;
    self
      .outputs
      .push((name.map(str::to_string), TensorData::F32(array)));
    Ok(self)
  }

  pub fn with_i64_output(
    mut self,
    name: Option<&str>,
    shape: &[usize],
    data: Vec<i64>,
  ) -> Result<Self, MemoryBackendError> {
    let array = ArrayD::from_shape_vec(IxDyn(shape), data)?;
    self
      .outputs
      .push((name.map(str::to_string), TensorData::I64(array)));
    Ok(self)
  }

  pub fn from_json_str(json: &str) -> Result<Self, MemoryBackendError> {
    let replay: ReplayFile = serde_json::from_str(json)?;
    let mut backend = Self::new(&replay.input_shape);
    for tensor in replay.outputs {
      let name = tensor.name.as_deref();
      backend = match tensor.dtype {
        ReplayDtype::F32 => backend.with_f32_output(
          name,
          &tensor.shape,
          tensor.data.iter().map(|&v| v as f32).collect(),
        )?,
        ReplayDtype::I64 => backend.with_i64_output(
          name,
          &tensor.shape,
          tensor.data.iter().map(|&v| v as i64).collect(),
        )?,
      };
    }
    debug!("回放文件包含 {} 个输出", backend.outputs.len());
    Ok(backend)
  }

  pub fn last_input(&self) -> Option<&Array4<f32>> {
    self.last_input.as_ref()
  }

  pub fn infer_count(&self) -> usize {
    self.infer_count
  }
}

impl FromUrlWithScheme for MemoryBackend {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for MemoryBackend {
  type Error = MemoryBackendError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(MemoryBackendError::SchemeMismatch(format!(
        "期望后端 '{}', 实际后端 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = url_file_path(url);
    info!("加载回放文件: {}", path);
    let json = std::fs::read_to_string(&path)?;
    Self::from_json_str(&json)
  }
}

impl ModelOutputs for MemoryBackend {
  fn output(&self, key: &TensorKey) -> Option<OutputTensor<'_>> {
    let found = match key {
      TensorKey::Index(index) => self.outputs.get(*index),
      TensorKey::Name(name) => self
        .outputs
        .iter()
        .find(|(n, _)| n.as_deref() == Some(name.as_str())),
    };
    found.map(|(_, data)| data.view())
  }
}

impl InferenceBackend for MemoryBackend {
  type Error = MemoryBackendError;

  fn input_shape(&self) -> Result<Vec<usize>, Self::Error> {
    Ok(self.input_shape.clone())
  }

  fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
    if input.shape() != self.input_shape.as_slice() {
      return Err(MemoryBackendError::InputMismatch {
        expected: self.input_shape.clone(),
        actual: input.shape().to_vec(),
      });
    }

    self.last_input = Some(input.to_owned());
    self.infer_count += 1;
    debug!("回放推理第 {} 次", self.infer_count);
    Ok(())
  }
}
