// 该文件是 Tuili （推理） 项目的一部分。
// src/task.rs - 推理任务与任务执行器
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

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{
  backend::InferenceBackend,
  error::TaskError,
  frame::ImageFrame,
  model::Model,
  output::Render,
  postprocess::Postprocess,
  preprocess::Preprocess,
  tensor::ModelShape,
};

mod top_down_pose;
pub use self::top_down_pose::{PersonPose, TopDownPose, TOP_DOWN_MIN_CONFIDENCE};

/// 预处理、推理、后处理串联成的一次推理
///
/// 预处理与后处理在构造时选定，三个阶段严格顺序执行。
pub struct InferenceTask<B, P, D> {
  backend: B,
  preprocess: P,
  postprocess: D,
}

impl<B, P, D> InferenceTask<B, P, D>
where
  B: InferenceBackend,
  P: Preprocess,
  D: Postprocess,
{
  pub fn new(backend: B, preprocess: P, postprocess: D) -> Self {
    Self {
      backend,
      preprocess,
      postprocess,
    }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn run(&mut self, frame: &ImageFrame) -> Result<D::Output, TaskError> {
    let dims = self.backend.input_shape().map_err(TaskError::backend)?;
    let shape = ModelShape::from_dims(&dims)?;
    debug!("模型输入形状: {}", shape);

    let tensor = self.preprocess.preprocess(frame, &shape)?;
    debug!("预处理完成");

    self.backend.infer(tensor).map_err(TaskError::backend)?;
    debug!("推理完成");

    self
      .postprocess
      .postprocess(&self.backend, &shape, (frame.width(), frame.height()))
  }
}

impl<B, P, D> Model for InferenceTask<B, P, D>
where
  B: InferenceBackend,
  P: Preprocess,
  D: Postprocess,
{
  type Input = ImageFrame;
  type Output = D::Output;
  type Error = TaskError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.run(input)
  }
}

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.infer(&frame)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 依次处理全部帧，可限定帧数，也可由外部标志提前结束
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  stop: Option<Arc<AtomicBool>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
    self.stop = Some(stop);
    self
  }
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");

    let mut frame_index = 0;
    let mut now = Instant::now();
    for frame in input {
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if self.stop.as_ref().is_some_and(|s| s.load(Ordering::SeqCst)) {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      frame_index += 1;
      info!("处理第 {} 帧图像", frame_index);
      let result = model.infer(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      now = Instant::now();
      info!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
    }

    info!("任务完成，共处理 {} 帧", frame_index);
    Ok(())
  }
}
