// Copyright 2018 Google LLC
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

pub mod builder;
mod element_types;

use {
  crate::utils::{render_pretty, ToDoc},
  std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
  },
};

pub use element_types::{Category, NonTerminal, Terminal};

/// A weighted production `left -> right...`.
///
/// A rule's identity is its left side and right-hand side. The probability
/// is a weight carried along with the rule and does not take part in
/// equality or hashing.
#[derive(Derivative)]
#[derivative(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Rule {
  left: Category,
  right: Vec<Category>,
  #[derivative(PartialEq = "ignore", Hash = "ignore")]
  probability: f64,
}

impl Rule {
  pub fn new(
    left: impl Into<Category>,
    right: impl IntoIterator<Item = Category>,
    probability: f64,
  ) -> Self {
    Rule {
      left: left.into(),
      right: right.into_iter().collect(),
      probability,
    }
  }

  pub fn left(&self) -> &Category {
    &self.left
  }

  pub fn right(&self) -> &[Category] {
    &self.right
  }

  pub fn probability(&self) -> f64 {
    self.probability
  }

  /// Returns the category at `index` of the right-hand side.
  pub fn category_at(&self, index: usize) -> Option<&Category> {
    self.right.get(index)
  }

  pub fn len(&self) -> usize {
    self.right.len()
  }

  pub fn is_empty(&self) -> bool {
    self.right.is_empty()
  }

  /// A unit production has exactly one category on its right-hand side.
  pub fn is_unit_production(&self) -> bool {
    self.right.len() == 1
  }

  /// An error rule consumes input through the `Error` category.
  pub fn is_error_rule(&self) -> bool {
    self.right.iter().any(|c| *c == Category::Error)
  }
}

impl std::fmt::Display for Rule {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "{} ->", self.left)?;
    for cat in &self.right {
      write!(fmt, " {}", cat)?;
    }
    Ok(())
  }
}

impl ToDoc for Rule {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let body = if self.right.is_empty() {
      da.text("ε")
    } else {
      da.intersperse(self.right.iter().map(|e| e.to_doc(da)), da.softline())
    };

    self
      .left
      .to_doc(da)
      .append(da.text(" =>"))
      .append(da.softline())
      .append(body)
      .append(da.text(format!(" ({})", self.probability)))
      .group()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
  #[error("rule for {left} has an empty right-hand side")]
  EmptyProduction { left: Category },
  #[error("rule `{rule}` has invalid probability {probability}")]
  InvalidProbability { rule: String, probability: f64 },
  #[error("rule `{rule}` is defined more than once")]
  DuplicateRule { rule: String },
  #[error("nonterminal {nonterminal} is used but has no rules")]
  UndefinedNonTerminal { nonterminal: NonTerminal },
  #[error("unit productions through {nonterminal} cycle with weight >= 1")]
  UnitCycle { nonterminal: NonTerminal },
}

// Pivots at or below this are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// A weighted context-free grammar.
///
/// Every grammar carries an implicit top rule `<start> -> start_symbol` with
/// probability 1, which roots every parse. Rules are shared, so states in a
/// chart refer to them rather than copying them.
#[derive(Clone, Debug)]
pub struct Grammar {
  start_symbol: NonTerminal,
  start_rule: Arc<Rule>,
  rules: Vec<Arc<Rule>>,
  rules_by_left: BTreeMap<Category, Vec<Arc<Rule>>>,
}

impl Grammar {
  fn new(
    start_symbol: NonTerminal,
    rules: impl IntoIterator<Item = Rule>,
  ) -> Result<Self, GrammarError> {
    let start_rule = Arc::new(Rule::new(
      Category::Start,
      std::iter::once(Category::NonTerm(start_symbol.clone())),
      1.0,
    ));
    let rules: Vec<Arc<Rule>> = rules.into_iter().map(Arc::new).collect();

    let mut rules_by_left: BTreeMap<Category, Vec<Arc<Rule>>> = BTreeMap::new();
    rules_by_left
      .entry(Category::Start)
      .or_default()
      .push(start_rule.clone());
    for rule in &rules {
      rules_by_left
        .entry(rule.left().clone())
        .or_default()
        .push(rule.clone());
    }

    let g = Grammar {
      start_symbol,
      start_rule,
      rules,
      rules_by_left,
    };

    g.check_grammar().map(|_| g)
  }

  /// Returns the start nonterminal for this grammar.
  pub fn start_nt(&self) -> &NonTerminal {
    &self.start_symbol
  }

  /// Returns the implicit `<start> -> start_symbol` rule.
  pub fn start_rule(&self) -> &Arc<Rule> {
    &self.start_rule
  }

  /// Returns the rules given to the grammar, in definition order. The
  /// implicit start rule is not included.
  pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
    self.rules.iter()
  }

  /// Returns the rules whose left side is `left`. Empty if there are none.
  pub fn rules_for(&self, left: &Category) -> &[Arc<Rule>] {
    self
      .rules_by_left
      .get(left)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn to_pretty(&self) -> String {
    render_pretty(self, 80)
  }

  fn check_grammar(&self) -> Result<(), GrammarError> {
    let mut seen = HashSet::new();
    for rule in &self.rules {
      if rule.is_empty() {
        return Err(GrammarError::EmptyProduction {
          left: rule.left().clone(),
        });
      }
      let probability = rule.probability();
      if probability.is_nan() || probability < 0.0 || probability > 1.0 {
        return Err(GrammarError::InvalidProbability {
          rule: rule.to_string(),
          probability,
        });
      }
      if !seen.insert(rule.clone()) {
        return Err(GrammarError::DuplicateRule {
          rule: rule.to_string(),
        });
      }
    }

    let mut referenced = BTreeSet::new();
    referenced.insert(&self.start_symbol);
    referenced.extend(
      self
        .rules
        .iter()
        .flat_map(|r| r.right())
        .filter_map(Category::as_nonterm),
    );
    for nt in referenced {
      if !self
        .rules_by_left
        .contains_key(&Category::NonTerm(nt.clone()))
      {
        return Err(GrammarError::UndefinedNonTerminal {
          nonterminal: nt.clone(),
        });
      }
    }

    match self.divergent_unit_cycle() {
      Some(nonterminal) => Err(GrammarError::UnitCycle { nonterminal }),
      None => Ok(()),
    }
  }

  /// Finds a nonterminal whose unit production closure does not converge.
  ///
  /// With `U` the matrix of unit production probabilities between
  /// nonterminals, `I + U + U^2 + ...` converges iff Gaussian elimination of
  /// `I - U` without pivoting meets only positive pivots. The nonterminal at
  /// the first failing pivot is returned.
  fn divergent_unit_cycle(&self) -> Option<NonTerminal> {
    let nonterminals: Vec<&NonTerminal> = self
      .rules_by_left
      .keys()
      .filter_map(Category::as_nonterm)
      .collect();
    let index: HashMap<&NonTerminal, usize> = nonterminals
      .iter()
      .enumerate()
      .map(|(i, nt)| (*nt, i))
      .collect();
    let n = nonterminals.len();

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
      row[i] = 1.0;
    }
    for rule in &self.rules {
      let right = match rule.right() {
        [Category::NonTerm(right)] => right,
        _ => continue,
      };
      let left = rule.left().as_nonterm().and_then(|nt| index.get(nt));
      if let (Some(&i), Some(&j)) = (left, index.get(right)) {
        matrix[i][j] -= rule.probability();
      }
    }

    for k in 0..n {
      let pivot = matrix[k][k];
      if pivot <= PIVOT_TOLERANCE {
        return Some(nonterminals[k].clone());
      }
      for i in (k + 1)..n {
        let factor = matrix[i][k] / pivot;
        if factor == 0.0 {
          continue;
        }
        for j in k..n {
          let step = factor * matrix[k][j];
          matrix[i][j] -= step;
        }
      }
    }
    None
  }
}

impl ToDoc for Grammar {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let start_entry = da
      .text("Start =")
      .group()
      .append(da.softline())
      .append(self.start_nt().to_doc(da));
    let rules_entry = da.text("Rules ").append(
      da.softline()
        .append(
          da.concat(self.rules.iter().map(|rule| {
            rule.to_doc(da).append(da.text(";")).append(da.softline())
          }))
          .nest(2),
        )
        .braces(),
    );

    da.concat(
      vec![start_entry, rules_entry]
        .into_iter()
        .map(|doc| doc.append(da.text(",")).append(da.softline())),
    )
  }
}
