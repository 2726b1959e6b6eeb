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

//! The reflexive transitive left-corner relation of a grammar, scored in a
//! semiring.
//!
//! `Y` is a left corner of `Z` with weight `w` when every derivation
//! `Z => Y ...` that only rewrites the leftmost nonterminal sums to `w`.
//! Predicting from the closure adds each predicted state once per position,
//! however the grammar recurses on the left.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
  grammar::{Category, Grammar},
  semiring::Semiring,
};

#[derive(Clone, Debug)]
pub struct LeftCorners {
  reachable: BTreeMap<Category, Vec<(Category, f64)>>,
}

impl LeftCorners {
  pub fn new<S: Semiring>(grammar: &Grammar, semiring: &S) -> Self {
    let nonterminals: Vec<&Category> = grammar
      .rules()
      .map(|rule| rule.left())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let index: HashMap<&Category, usize> = nonterminals
      .iter()
      .enumerate()
      .map(|(i, category)| (*category, i))
      .collect();
    let n = nonterminals.len();

    let mut closure = vec![vec![semiring.zero(); n]; n];
    for rule in grammar.rules() {
      let corner = rule.category_at(0).and_then(|c| index.get(c));
      if let (Some(&i), Some(&j)) = (index.get(rule.left()), corner) {
        let probability = semiring.from_probability(rule.probability());
        closure[i][j] = semiring.plus(closure[i][j], probability);
      }
    }

    // After step k, closure[i][j] sums the paths from i to j whose inner
    // nodes are all at most k.
    for k in 0..n {
      let star = semiring.star(closure[k][k]);
      let previous = closure.clone();
      for i in 0..n {
        let into = semiring.times(previous[i][k], star);
        if into == semiring.zero() {
          continue;
        }
        for j in 0..n {
          let through = semiring.times(into, previous[k][j]);
          closure[i][j] = semiring.plus(previous[i][j], through);
        }
      }
    }

    let mut reachable = BTreeMap::new();
    for (i, &from) in nonterminals.iter().enumerate() {
      let corners = nonterminals
        .iter()
        .enumerate()
        .filter_map(|(j, &to)| {
          let weight = if i == j {
            semiring.plus(semiring.one(), closure[i][j])
          } else {
            closure[i][j]
          };
          if weight == semiring.zero() {
            None
          } else {
            Some((to.clone(), weight))
          }
        })
        .collect();
      reachable.insert(from.clone(), corners);
    }

    LeftCorners { reachable }
  }

  /// Returns every nonterminal that can start a derivation of `category`,
  /// `category` itself included, with the weight of getting there.
  pub fn reachable_from(&self, category: &Category) -> &[(Category, f64)] {
    self
      .reachable
      .get(category)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    grammar::{examples, NonTerminal},
    semiring::{BooleanSemiring, LogSemiring, ProbabilitySemiring},
  };

  fn nt(name: &str) -> Category {
    Category::NonTerm(NonTerminal::new(name))
  }

  fn weight(corners: &LeftCorners, from: &str, to: &str) -> Option<f64> {
    corners
      .reachable_from(&nt(from))
      .iter()
      .find(|(category, _)| *category == nt(to))
      .map(|(_, w)| *w)
  }

  #[test]
  fn self_loops_sum_geometrically() {
    let g = examples::make_ambiguous();
    let corners = LeftCorners::new(&g, &ProbabilitySemiring);
    let w = weight(&corners, "S", "S").unwrap();
    assert!((w - 1.0 / 0.6).abs() < 1e-12);
  }

  #[test]
  fn chains_are_followed_through_unit_rules() {
    let g = examples::make_unit_chain();
    let corners = LeftCorners::new(&g, &ProbabilitySemiring);
    assert_eq!(weight(&corners, "A", "A"), Some(1.0));
    assert_eq!(weight(&corners, "A", "B"), Some(1.0));
    assert_eq!(weight(&corners, "B", "A"), None);
    assert!(corners.reachable_from(&nt("C")).is_empty());

    let g = examples::make_unit_cycle();
    let corners = LeftCorners::new(&g, &ProbabilitySemiring);
    let back = weight(&corners, "A", "A").unwrap();
    assert!((back - 2.0).abs() < 1e-12);
  }

  #[test]
  fn certain_left_recursion_diverges() {
    let g = examples::make_left_recursive();
    let corners = LeftCorners::new(&g, &ProbabilitySemiring);
    assert_eq!(weight(&corners, "E", "E"), Some(f64::INFINITY));

    let corners = LeftCorners::new(&g, &LogSemiring);
    assert_eq!(weight(&corners, "E", "E"), Some(f64::NEG_INFINITY));

    let corners = LeftCorners::new(&g, &BooleanSemiring);
    assert_eq!(weight(&corners, "E", "E"), Some(1.0));
  }
}
