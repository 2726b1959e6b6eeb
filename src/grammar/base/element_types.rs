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

use crate::utils::{Name, ToDoc};

/// A terminal category. Tokens are tagged with the terminals they may
/// instantiate.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Terminal(Name);

impl Terminal {
  pub fn new(s: &str) -> Self {
    Terminal(Name::new(s))
  }

  pub fn name(&self) -> &Name {
    &self.0
  }
}

impl std::fmt::Display for Terminal {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    std::fmt::Display::fmt(&self.0, fmt)
  }
}

impl ToDoc for Terminal {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self.0.to_doc(da)
  }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NonTerminal(Name);

impl NonTerminal {
  pub fn new(s: &str) -> Self {
    NonTerminal(Name::new(s))
  }

  pub fn name(&self) -> &Name {
    &self.0
  }
}

impl std::fmt::Display for NonTerminal {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    std::fmt::Display::fmt(&self.0, fmt)
  }
}

impl ToDoc for NonTerminal {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self.0.to_doc(da)
  }
}

/// A grammar symbol.
///
/// `Start` heads the implicit top rule of every grammar and never shows up
/// in a derivation tree. `Error` is a terminal that matches any token; rules
/// that use it are error rules.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Category {
  Start,
  Error,
  Term(Terminal),
  NonTerm(NonTerminal),
}

impl Category {
  pub fn as_nonterm(&self) -> Option<&NonTerminal> {
    match self {
      Category::NonTerm(nt) => Some(nt),
      _ => None,
    }
  }
}

impl From<Terminal> for Category {
  fn from(t: Terminal) -> Self {
    Category::Term(t)
  }
}

impl From<NonTerminal> for Category {
  fn from(nt: NonTerminal) -> Self {
    Category::NonTerm(nt)
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Category::Start => fmt.write_str("<start>"),
      Category::Error => fmt.write_str("<error>"),
      Category::Term(t) => std::fmt::Display::fmt(t, fmt),
      Category::NonTerm(nt) => std::fmt::Display::fmt(nt, fmt),
    }
  }
}

impl ToDoc for Category {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self {
      Category::Start => da.text("<start>"),
      Category::Error => da.text("<error>"),
      Category::Term(t) => t.to_doc(da),
      Category::NonTerm(nt) => {
        da.text("<").append(nt.to_doc(da)).append(da.text(">"))
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::utils::render_pretty;

  #[test]
  fn categories_render_as_docs() {
    let np = Category::from(NonTerminal::new("NP"));
    let the = Category::from(Terminal::new("the"));
    assert_eq!(render_pretty(&np, 80), "<NP>");
    assert_eq!(render_pretty(&the, 80), "the");
    assert_eq!(render_pretty(&Category::Error, 80), "<error>");
    assert_eq!(render_pretty(&Terminal::new("boy"), 80), "boy");
    assert_eq!(np.as_nonterm(), Some(&NonTerminal::new("NP")));
    assert_eq!(the.as_nonterm(), None);
  }
}
