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

//! The scan transition: advancing a state over one input token.
//!
//! A scan probability of NaN means "no reweighting". It is never combined
//! with a score.

use crate::{
  chart::State,
  semiring::Semiring,
  token::{ScanProbability, TokenWithCategories},
};

/// Returns the weight of scanning `token` at `position`, or NaN if there is
/// no scan probability function.
pub fn scan_probability<T>(
  scan_probability: Option<&dyn ScanProbability<T>>,
  token: &TokenWithCategories<T>,
  position: usize,
) -> f64 {
  match scan_probability {
    Some(f) => f.probability(position, token),
    None => f64::NAN,
  }
}

fn reweight<S: Semiring>(scan_prob: f64, semiring: &S, previous: f64) -> f64 {
  if scan_prob.is_nan() {
    previous
  } else {
    semiring.times(previous, scan_prob)
  }
}

pub fn forward_score<S: Semiring>(
  scan_prob: f64,
  semiring: &S,
  previous_forward: f64,
) -> f64 {
  reweight(scan_prob, semiring, previous_forward)
}

pub fn inner_score<S: Semiring>(
  scan_prob: f64,
  semiring: &S,
  previous_inner: f64,
) -> f64 {
  reweight(scan_prob, semiring, previous_inner)
}

/// The result of a scan: the advanced state and its scores.
#[derive(Clone, Debug, PartialEq)]
pub struct Scanned {
  pub state: State,
  pub forward: f64,
  pub inner: f64,
}

/// Advances `state` over one token so that it ends at `next_position`.
///
/// Returns `None` if `state` is already completed. The caller is
/// responsible for inserting the result into the chart.
pub fn scan<S: Semiring>(
  state: &State,
  forward: f64,
  inner: f64,
  scan_prob: f64,
  semiring: &S,
  next_position: usize,
) -> Option<Scanned> {
  let next = state.advance(next_position)?;
  log::trace!("Scanned {} into {}.", state, next);
  Some(Scanned {
    state: next,
    forward: forward_score(scan_prob, semiring, forward),
    inner: inner_score(scan_prob, semiring, inner),
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{Category, NonTerminal, Rule, Terminal};
  use crate::semiring::{
    BooleanSemiring, LogSemiring, ProbabilitySemiring, ViterbiSemiring,
  };
  use std::sync::Arc;

  fn neutral_for<S: Semiring>(semiring: S, values: &[f64]) {
    for &v in values {
      assert_eq!(forward_score(f64::NAN, &semiring, v), v);
      assert_eq!(inner_score(f64::NAN, &semiring, v), v);
    }
  }

  #[test]
  fn nan_never_reweights() {
    neutral_for(ProbabilitySemiring, &[0.0, 0.3, 1.0]);
    neutral_for(LogSemiring, &[0.0, 2.5, f64::INFINITY]);
    neutral_for(ViterbiSemiring, &[0.0, 0.75]);
    neutral_for(BooleanSemiring, &[0.0, 1.0]);
  }

  #[test]
  fn scan_probability_composes_with_times() {
    let p = ProbabilitySemiring;
    assert_eq!(forward_score(0.5, &p, 0.25), p.times(0.25, 0.5));
    assert_eq!(inner_score(0.5, &p, 0.8), 0.4);

    let log = LogSemiring;
    assert_eq!(forward_score(1.5, &log, 2.0), 3.5);
    assert_eq!(forward_score(log.zero(), &log, 2.0), log.zero());
  }

  #[test]
  fn missing_function_yields_nan() {
    let tok = TokenWithCategories::literal("x");
    assert!(scan_probability::<String>(None, &tok, 0).is_nan());

    let half: &dyn ScanProbability<String> =
      &|_: usize, _: &TokenWithCategories<String>| 0.5;
    assert_eq!(scan_probability(Some(half), &tok, 4), 0.5);
  }

  #[test]
  fn scan_advances_the_dot() {
    let rule = Arc::new(Rule::new(
      NonTerminal::new("NP"),
      vec![
        Category::Term(Terminal::new("the")),
        Category::Term(Terminal::new("boy")),
      ],
      1.0,
    ));
    let before = State::create(0, 0, 0, rule.clone());
    let scanned =
      scan(&before, 0.5, 1.0, f64::NAN, &ProbabilitySemiring, 1).unwrap();
    assert_eq!(scanned.state, State::create(1, 0, 1, rule.clone()));
    assert_eq!(scanned.forward, 0.5);
    assert_eq!(scanned.inner, 1.0);

    let weighted =
      scan(&scanned.state, 0.5, 1.0, 0.2, &ProbabilitySemiring, 2).unwrap();
    assert!(weighted.state.is_completed());
    assert_eq!(weighted.forward, 0.1);
    assert_eq!(weighted.inner, 0.2);

    assert_eq!(
      scan(&weighted.state, 1.0, 1.0, f64::NAN, &ProbabilitySemiring, 3),
      None
    );
  }
}
