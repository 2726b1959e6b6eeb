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

//! A weighted Earley parser for any grammar.
//!
//! The parser sweeps the input left to right. At each position it takes the
//! closure of Predict and Complete over an agenda of score deltas, then scans
//! the next token into the following position.
//!
//! Scores are propagated as deltas: when a state is reached again, only the
//! new contribution is passed on, and only if it changed the stored scores.
//!
//! Prediction goes through the precomputed left-corner closure of the
//! grammar, so a predicted state never predicts again and left recursion
//! needs no iteration. Cycles of unit productions are settled by the deltas:
//! the grammar rejects unit cycles of weight 1 or more, so the contributions
//! shrink until `plus` leaves the stored score unchanged.

mod left_corner;

use std::collections::VecDeque;

use anyhow::Context;

use crate::{
  chart::{Chart, Link, State, StateId},
  grammar::{Category, Grammar},
  parsers::{
    tree::{new_parse_tree, ParseTree, TreeError},
    ParseOptions, Parser,
  },
  scan,
  semiring::Semiring,
  token::TokenWithCategories,
};

use left_corner::LeftCorners;

struct Delta {
  id: StateId,
  forward: f64,
  inner: f64,
}

struct Sweep<'a, S> {
  grammar: &'a Grammar,
  left_corners: &'a LeftCorners,
  chart: Chart<S>,
  agenda: VecDeque<Delta>,
}

impl<'a, S: Semiring> Sweep<'a, S> {
  fn add(
    &mut self,
    state: State,
    forward: f64,
    inner: f64,
    link: Option<Link>,
  ) {
    let (id, changed) = self.chart.add_state(state, forward, inner, link);
    if changed.is_changed() {
      self.agenda.push_back(Delta { id, forward, inner });
    }
  }

  fn predict(&mut self, position: usize, category: &Category, forward: f64) {
    let grammar = self.grammar;
    let left_corners = self.left_corners;
    for (left, weight) in left_corners.reachable_from(category) {
      let reach = self.chart.semiring().times(forward, *weight);
      for rule in grammar.rules_for(left) {
        let state = State::create(position, position, 0, rule.clone());
        let probability =
          self.chart.semiring().from_probability(rule.probability());
        // The inner score of a predicted state is its rule's probability, no
        // matter how often it is predicted.
        let inner = if self.chart.get(&state).is_some() {
          self.chart.semiring().zero()
        } else {
          probability
        };
        let forward = self.chart.semiring().times(reach, probability);
        log::trace!("Predicted {}.", state);
        self.add(state, forward, inner, None);
      }
    }
  }

  fn complete(&mut self, completed: StateId, inner: f64) {
    let state = self.chart.state(completed).clone();
    let position = state.position();
    let waiting = self
      .chart
      .active_on(state.rule_start(), state.rule().left())
      .to_vec();
    for id in waiting {
      let record = self.chart.record(id);
      let next = match record.state().advance(position) {
        Some(next) => next,
        None => continue,
      };
      let semiring = self.chart.semiring();
      let forward = semiring.times(record.forward_score(), inner);
      let next_inner = semiring.times(record.inner_score(), inner);
      log::trace!("Completed {} with {}.", next, state);
      self.add(next, forward, next_inner, Some(Link::completed(id, completed)));
    }
  }

  fn close(&mut self, position: usize) {
    while let Some(Delta { id, forward, inner }) = self.agenda.pop_front() {
      let state = self.chart.state(id);
      // Predicted states were reached through the left-corner closure
      // already.
      let predicted =
        state.dot() == 0 && *state.rule().left() != Category::Start;
      let active = state.active_category().cloned();
      match active {
        Some(category @ Category::NonTerm(_)) if !predicted => {
          self.predict(position, &category, forward)
        }
        // Terminals wait for the scan at the end of the closure.
        Some(_) => {}
        None => self.complete(id, inner),
      }
    }
  }

  fn scan<T>(
    &mut self,
    position: usize,
    token: &TokenWithCategories<T>,
    options: &ParseOptions<T>,
  ) {
    let scan_prob =
      scan::scan_probability(options.scan_probability(), token, position);
    let scannable: Vec<StateId> = self
      .chart
      .states_at(position)
      .iter()
      .copied()
      .filter(|&id| {
        let state = self.chart.state(id);
        state.active_category().map_or(false, |c| token.matches(c))
      })
      .collect();
    for id in scannable {
      let record = self.chart.record(id);
      let scanned = scan::scan(
        record.state(),
        record.forward_score(),
        record.inner_score(),
        scan_prob,
        self.chart.semiring(),
        position + 1,
      );
      if let Some(scanned) = scanned {
        self.add(
          scanned.state,
          scanned.forward,
          scanned.inner,
          Some(Link::scanned(id)),
        );
      }
    }
  }
}

/// The outcome of a parse: the finished chart and the state, if any, that
/// derives the whole input from the start symbol.
#[derive(Clone, Debug)]
pub struct ParseResult<S> {
  chart: Chart<S>,
  root: Option<StateId>,
  input_len: usize,
}

impl<S: Semiring> ParseResult<S> {
  pub fn chart(&self) -> &Chart<S> {
    &self.chart
  }

  pub fn root(&self) -> Option<StateId> {
    self.root
  }

  pub fn input_len(&self) -> usize {
    self.input_len
  }

  pub fn is_success(&self) -> bool {
    self.root.is_some()
  }

  /// Returns the total score of all derivations of the input, or the
  /// semiring's zero if there are none.
  pub fn score(&self) -> f64 {
    match self.root {
      Some(root) => self.chart.inner_score(root),
      None => self.chart.semiring().zero(),
    }
  }

  /// Returns `score` converted back to a probability.
  pub fn probability(&self) -> f64 {
    self.chart.semiring().to_probability(self.score())
  }

  /// Returns how many error rules completed over the whole input.
  pub fn error_rule_completions(&self) -> usize {
    (0..=self.input_len)
      .map(|p| self.chart.completed().completed_error_rules_count(p))
      .sum()
  }

  pub fn parse_tree(&self) -> Result<ParseTree, TreeError> {
    let root = self.root.ok_or(TreeError::NoParse)?;
    new_parse_tree(&self.chart, root)
  }
}

pub struct EarleyParser<'g, S> {
  grammar: &'g Grammar,
  semiring: S,
  left_corners: LeftCorners,
}

impl<'g, S> EarleyParser<'g, S>
where
  S: Semiring + Clone,
{
  pub fn new(grammar: &'g Grammar, semiring: S) -> Self {
    let left_corners = LeftCorners::new(grammar, &semiring);
    EarleyParser {
      grammar,
      semiring,
      left_corners,
    }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn parse<T>(
    &self,
    tokens: &[TokenWithCategories<T>],
    options: &ParseOptions<T>,
  ) -> ParseResult<S> {
    let mut sweep = Sweep {
      grammar: self.grammar,
      left_corners: &self.left_corners,
      chart: Chart::new(self.semiring.clone()),
      agenda: VecDeque::new(),
    };

    let start_rule = self.grammar.start_rule().clone();
    let one = self.semiring.one();
    sweep.add(State::create(0, 0, 0, start_rule.clone()), one, one, None);

    for position in 0..=tokens.len() {
      sweep.close(position);
      log::debug!(
        "Position {}: {} states, {} completed, {} error rule completions.",
        position,
        sweep.chart.states_at(position).len(),
        sweep.chart.completed().completed_states(position).len(),
        sweep.chart.completed().completed_error_rules_count(position),
      );
      if let Some(token) = tokens.get(position) {
        sweep.scan(position, token, options);
      }
    }

    let root = sweep
      .chart
      .get(&State::create(tokens.len(), 0, 1, start_rule));
    if root.is_none() {
      log::debug!("No parse spans the {} input tokens.", tokens.len());
    }

    ParseResult {
      chart: sweep.chart,
      root,
      input_len: tokens.len(),
    }
  }
}

impl<'g, S, T> Parser<T> for EarleyParser<'g, S>
where
  S: Semiring + Clone,
{
  fn parse_tree(
    &self,
    tokens: &[TokenWithCategories<T>],
    options: &ParseOptions<T>,
  ) -> anyhow::Result<ParseTree> {
    let result = self.parse(tokens, options);
    result
      .parse_tree()
      .with_context(|| format!("While parsing {} tokens", tokens.len()))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    grammar::examples,
    semiring::{
      BooleanSemiring, LogSemiring, ProbabilitySemiring, ViterbiSemiring,
    },
  };

  fn words(input: &str) -> Vec<TokenWithCategories<String>> {
    input
      .split_whitespace()
      .map(TokenWithCategories::literal)
      .collect()
  }

  #[test]
  fn parses_a_sentence() {
    let g = examples::make_sentence();
    let parser = EarleyParser::new(&g, ProbabilitySemiring);
    let result = parser.parse(&words("the boy left"), &ParseOptions::new());
    assert!(result.is_success());
    assert_eq!(result.score(), 1.0);
    assert_eq!(result.error_rule_completions(), 0);
    assert_eq!(
      result.parse_tree().unwrap().to_string(),
      "[S[NP[the][boy]][VP[left]]]"
    );
  }

  #[test]
  fn rejects_bad_input() {
    let g = examples::make_sentence();
    let parser = EarleyParser::new(&g, ProbabilitySemiring);
    let result = parser.parse(&words("the left"), &ParseOptions::new());
    assert!(!result.is_success());
    assert_eq!(result.score(), 0.0);
    assert!(matches!(result.parse_tree(), Err(TreeError::NoParse)));

    let err = parser
      .parse_tree(&words("boy"), &ParseOptions::new())
      .unwrap_err();
    assert!(err.to_string().contains("While parsing 1 tokens"));
  }

  #[test]
  fn empty_input_has_no_parse() {
    let g = examples::make_sentence();
    let parser = EarleyParser::new(&g, BooleanSemiring);
    let result = parser.parse(&words(""), &ParseOptions::new());
    assert!(!result.is_success());
    assert_eq!(result.score(), 0.0);
  }

  #[test]
  fn predicted_states_keep_their_rule_probability() {
    let g = examples::make_ambiguous();
    let parser = EarleyParser::new(&g, ProbabilitySemiring);
    let result = parser.parse(&words("a"), &ParseOptions::new());
    let chart = result.chart();
    for &id in chart.states_at(0) {
      if chart.state(id).rule().left() != &Category::Start {
        assert_eq!(
          chart.inner_score(id),
          chart.state(id).rule().probability()
        );
      }
    }
    assert!((result.score() - 0.6).abs() < 1e-12);
  }

  #[test]
  fn left_recursion_predicts_each_rule_once() {
    let g = examples::make_left_recursive();
    let tokens = words("n + n + n");
    let options = ParseOptions::new();

    let result =
      EarleyParser::new(&g, ProbabilitySemiring).parse(&tokens, &options);
    assert_eq!(result.score(), 1.0);
    assert_eq!(result.chart().states_at(0).len(), 3);
    assert_eq!(
      result.parse_tree().unwrap().to_string(),
      "[E[E[E[n]][+][n]][+][n]]"
    );

    let log = EarleyParser::new(&g, LogSemiring).parse(&tokens, &options);
    assert_eq!(log.score(), 0.0);
    assert_eq!(log.probability(), 1.0);

    let viterbi =
      EarleyParser::new(&g, ViterbiSemiring).parse(&tokens, &options);
    assert_eq!(viterbi.score(), 1.0);

    let partial =
      EarleyParser::new(&g, LogSemiring).parse(&words("n +"), &options);
    assert!(!partial.is_success());
  }

  #[test]
  fn left_recursion_keeps_probabilities_below_one() {
    let e = crate::grammar::NonTerminal::new("E");
    let g = crate::grammar::build(&e, |gb| {
      gb.add_rule(&e, |rb| {
        rb.add_prod_with_probability(0.25, |pb| {
          pb.add_nonterm(&e).add_term("+").add_term("n");
        })
        .add_prod_with_probability(0.75, |pb| {
          pb.add_term("n");
        });
      });
    })
    .unwrap();
    let parser = EarleyParser::new(&g, LogSemiring);
    let result = parser.parse(&words("n + n"), &ParseOptions::new());
    assert!((result.probability() - 0.25 * 0.75).abs() < 1e-12);

    // The forward score of a prediction sums every depth of left recursion.
    let chart = result.chart();
    for &id in chart.states_at(0) {
      let state = chart.state(id);
      if state.rule().left() != &Category::Start {
        let expected = state.rule().probability() / 0.75;
        let forward = chart.semiring().to_probability(chart.forward_score(id));
        assert!((forward - expected).abs() < 1e-12);
      }
    }
  }
}
