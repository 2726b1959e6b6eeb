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

use std::collections::BTreeSet;

use crate::grammar::{Category, Terminal};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Token<T> {
  value: T,
}

impl<T> Token<T> {
  pub fn new(value: T) -> Self {
    Token { value }
  }

  pub fn value(&self) -> &T {
    &self.value
  }
}

/// A token together with every terminal it may instantiate at its position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TokenWithCategories<T> {
  token: Token<T>,
  categories: BTreeSet<Terminal>,
}

impl<T> TokenWithCategories<T> {
  pub fn new(
    token: Token<T>,
    categories: impl IntoIterator<Item = Terminal>,
  ) -> Self {
    TokenWithCategories {
      token,
      categories: categories.into_iter().collect(),
    }
  }

  pub fn token(&self) -> &Token<T> {
    &self.token
  }

  pub fn categories(&self) -> &BTreeSet<Terminal> {
    &self.categories
  }

  /// Returns true if a state expecting `category` can scan this token.
  ///
  /// The `Error` category matches every token.
  pub fn matches(&self, category: &Category) -> bool {
    match category {
      Category::Error => true,
      Category::Term(t) => self.categories.contains(t),
      Category::Start | Category::NonTerm(_) => false,
    }
  }
}

impl TokenWithCategories<String> {
  /// Creates a token whose only category is the terminal spelled like the
  /// token itself.
  pub fn literal(word: &str) -> Self {
    TokenWithCategories::new(
      Token::new(word.to_string()),
      std::iter::once(Terminal::new(word)),
    )
  }
}

/// Reweights a scan of `token` at `position`.
///
/// The returned value is combined with the pre-scan scores using the
/// semiring's `times`, so it must already be in the semiring's score space.
pub trait ScanProbability<T> {
  fn probability(&self, position: usize, token: &TokenWithCategories<T>)
    -> f64;
}

impl<T, F> ScanProbability<T> for F
where
  F: Fn(usize, &TokenWithCategories<T>) -> f64,
{
  fn probability(
    &self,
    position: usize,
    token: &TokenWithCategories<T>,
  ) -> f64 {
    self(position, token)
  }
}
