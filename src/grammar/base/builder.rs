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

use super::{Category, Grammar, GrammarError, NonTerminal, Rule, Terminal};

/// A helper trait to allow builder methods to either take a type `T`, or a
/// reference to `T` if it is clonable.
pub trait BuilderInto<T> {
  /// Consumes self and produces a value of type `T`.
  fn builder_into(self) -> T;
}

impl<T> BuilderInto<T> for T {
  fn builder_into(self) -> T {
    self
  }
}

impl<'a, T> BuilderInto<T> for &'a T
where
  T: Clone,
{
  fn builder_into(self) -> T {
    self.clone()
  }
}

impl BuilderInto<Terminal> for &'_ str {
  fn builder_into(self) -> Terminal {
    Terminal::new(self)
  }
}

impl BuilderInto<NonTerminal> for &'_ str {
  fn builder_into(self) -> NonTerminal {
    NonTerminal::new(self)
  }
}

pub struct ProductionBuilder {
  elems: Vec<Category>,
}

impl ProductionBuilder {
  fn new() -> Self {
    ProductionBuilder { elems: Vec::new() }
  }

  pub fn add_term(&mut self, term: impl BuilderInto<Terminal>) -> &mut Self {
    self.elems.push(Category::Term(term.builder_into()));
    self
  }

  pub fn add_nonterm(
    &mut self,
    nonterm: impl BuilderInto<NonTerminal>,
  ) -> &mut Self {
    self.elems.push(Category::NonTerm(nonterm.builder_into()));
    self
  }

  /// Adds the `Error` category, which matches any single token and makes
  /// the production an error rule.
  pub fn add_error(&mut self) -> &mut Self {
    self.elems.push(Category::Error);
    self
  }
}

// ----------------

pub struct RuleBuilder {
  head: NonTerminal,
  rules: Vec<Rule>,
}

impl RuleBuilder {
  fn new(head: NonTerminal) -> Self {
    RuleBuilder {
      head,
      rules: Vec::new(),
    }
  }

  /// Adds a production with probability 1.
  pub fn add_prod(
    &mut self,
    build_fn: impl FnOnce(&mut ProductionBuilder),
  ) -> &mut Self {
    self.add_prod_with_probability(1.0, build_fn)
  }

  pub fn add_prod_with_probability(
    &mut self,
    probability: f64,
    build_fn: impl FnOnce(&mut ProductionBuilder),
  ) -> &mut Self {
    let mut builder = ProductionBuilder::new();
    build_fn(&mut builder);
    self
      .rules
      .push(Rule::new(self.head.clone(), builder.elems, probability));
    self
  }
}

// ----------------

pub struct GrammarBuilder {
  start: NonTerminal,
  rules: Vec<Rule>,
}

impl GrammarBuilder {
  fn new(start: NonTerminal) -> Self {
    GrammarBuilder {
      start,
      rules: Vec::new(),
    }
  }

  fn build(self) -> Result<Grammar, GrammarError> {
    let GrammarBuilder { start, rules } = self;
    Grammar::new(start, rules)
  }

  pub fn add_rule<F>(
    &mut self,
    head: impl BuilderInto<NonTerminal>,
    build_fn: F,
  ) -> &mut Self
  where
    F: FnOnce(&mut RuleBuilder),
  {
    let mut rule_builder = RuleBuilder::new(head.builder_into());
    build_fn(&mut rule_builder);
    self.rules.extend(rule_builder.rules);
    self
  }
}

/// Builds a grammar using a builder function.
///
/// Example:
///
/// ```rust
/// # use weighted_earley::grammar::{build, NonTerminal};
/// let s = NonTerminal::new("S");
/// let g = build(&s, |gb| {
///   gb.add_rule(&s, |rb| {
///     rb.add_prod_with_probability(0.6, |pb| {
///       pb.add_nonterm(&s).add_term("and").add_nonterm(&s);
///     })
///     .add_prod_with_probability(0.4, |pb| {
///       pb.add_term("x");
///     });
///   });
/// })
/// .unwrap();
/// assert_eq!(g.rules().count(), 2);
/// ```
///
/// Arguments that take a `Terminal` or `NonTerminal` accept the value, a
/// reference to it, or a `&str` naming it.
pub fn build(
  start: impl BuilderInto<NonTerminal>,
  build_fn: impl FnOnce(&mut GrammarBuilder),
) -> Result<Grammar, GrammarError> {
  let mut builder = GrammarBuilder::new(start.builder_into());
  build_fn(&mut builder);
  builder.build()
}
