// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::token::{ScanProbability, TokenWithCategories};

pub mod earley;
pub mod tree;

/// Options for a single parse.
#[derive(Derivative)]
#[derivative(Default(bound = ""))]
pub struct ParseOptions<T> {
  scan_probability: Option<Box<dyn ScanProbability<T>>>,
}

impl<T> ParseOptions<T> {
  pub fn new() -> Self {
    ParseOptions::default()
  }

  /// Reweights every scan with `scan_probability`. Its results must be in
  /// the score space of the semiring the parser uses.
  pub fn with_scan_probability(
    mut self,
    scan_probability: impl ScanProbability<T> + 'static,
  ) -> Self {
    self.scan_probability = Some(Box::new(scan_probability));
    self
  }

  pub fn scan_probability(&self) -> Option<&dyn ScanProbability<T>> {
    self.scan_probability.as_deref()
  }
}

impl<T> std::fmt::Debug for ParseOptions<T> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    fmt
      .debug_struct("ParseOptions")
      .field("scan_probability", &self.scan_probability.is_some())
      .finish()
  }
}

pub trait Parser<T> {
  fn parse_tree(
    &self,
    tokens: &[TokenWithCategories<T>],
    options: &ParseOptions<T>,
  ) -> anyhow::Result<tree::ParseTree>;
}
