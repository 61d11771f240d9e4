/**
* filename : range
* author : HAMA
* date: 2025. 4. 12.
* description: Height ranges and the one-shot block stream built over them
**/

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};

use crate::block::Block;
use crate::types::AppError;

/// Half-open `[start, stop)` walked by `step`, like a Python range.
/// A negative step walks downwards and needs `start > stop` to yield anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRange {
  start: u64,
  stop: u64,
  step: i64,
}

impl HeightRange {
  pub fn new(start: u64, stop: u64, step: i64) -> Result<Self, AppError> {
    if step == 0 {
      return Err(AppError::InvalidRange("step must not be zero".to_string()));
    }
    Ok(Self { start, stop, step })
  }

  pub fn start(&self) -> u64 {
    self.start
  }

  pub fn stop(&self) -> u64 {
    self.stop
  }

  pub fn step(&self) -> i64 {
    self.step
  }

  pub fn is_ascending(&self) -> bool {
    self.step > 0
  }

  pub fn len(&self) -> usize {
    let stride = self.step.unsigned_abs();
    let span = if self.step > 0 {
      self.stop.saturating_sub(self.start)
    } else {
      self.start.saturating_sub(self.stop)
    };
    span.div_ceil(stride) as usize
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn heights(&self) -> impl Iterator<Item = u64> + Send + 'static {
    let start = i128::from(self.start);
    let step = i128::from(self.step);
    (0..self.len()).map(move |i| (start + i as i128 * step) as u64)
  }
}

/// Blocks of a [`HeightRange`], assembled lazily one at a time.
///
/// Finite and single-pass: it cannot be restarted once consumed. The first
/// failed height is yielded as an `Err` and ends the stream.
pub struct BlockStream<'a> {
  inner: BoxStream<'a, Result<Block, AppError>>,
  remaining: usize,
}

impl<'a> BlockStream<'a> {
  pub(crate) fn new(inner: BoxStream<'a, Result<Block, AppError>>, remaining: usize) -> Self {
    Self { inner, remaining }
  }

  /// Heights not yet yielded (upper bound; an error ends the stream early).
  pub fn remaining(&self) -> usize {
    self.remaining
  }
}

impl Stream for BlockStream<'_> {
  type Item = Result<Block, AppError>;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let polled = self.inner.poll_next_unpin(cx);
    match &polled {
      Poll::Ready(Some(_)) => self.remaining = self.remaining.saturating_sub(1),
      Poll::Ready(None) => self.remaining = 0,
      Poll::Pending => {}
    }
    polled
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.remaining))
  }
}
