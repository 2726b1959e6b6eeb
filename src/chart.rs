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

//! The Earley chart.
//!
//! A chart is an append-only arena of state records. Each logical state is
//! stored once; reaching it again combines its scores with the semiring's
//! `plus` and records the new link, if any.

mod completed;
mod state;

use std::collections::HashMap;

use crate::{grammar::Category, semiring::Semiring, utils::WasChanged};

pub use completed::CompletedStates;
pub use state::{Link, State, StateId, StateRecord};

fn same_score(a: f64, b: f64) -> bool {
  a == b || (a.is_nan() && b.is_nan())
}

#[derive(Clone, Debug)]
pub struct Chart<S> {
  semiring: S,
  records: Vec<StateRecord>,
  ids: HashMap<State, StateId>,
  positions: Vec<Vec<StateId>>,
  active: Vec<HashMap<Category, Vec<StateId>>>,
  completed: CompletedStates,
}

impl<S: Semiring> Chart<S> {
  pub fn new(semiring: S) -> Self {
    Chart {
      semiring,
      records: Vec::new(),
      ids: HashMap::new(),
      positions: Vec::new(),
      active: Vec::new(),
      completed: CompletedStates::new(),
    }
  }

  pub fn semiring(&self) -> &S {
    &self.semiring
  }

  /// Adds a derivation of `state` with the given scores.
  ///
  /// If the state is new, it is stored with these scores. Otherwise the
  /// scores are combined with the stored ones using `plus`. The result
  /// reports a change only if the state is new or a stored score changed.
  pub fn add_state(
    &mut self,
    state: State,
    forward: f64,
    inner: f64,
    link: Option<Link>,
  ) -> (StateId, WasChanged) {
    if let Some(&id) = self.ids.get(&state) {
      let semiring = &self.semiring;
      let record = &mut self.records[id.0];
      let new_forward = semiring.plus(record.forward, forward);
      let new_inner = semiring.plus(record.inner, inner);
      let changed = !same_score(record.forward, new_forward)
        || !same_score(record.inner, new_inner);
      record.forward = new_forward;
      record.inner = new_inner;
      if let Some(link) = link {
        if !record.links.contains(&link) {
          record.links.push(link);
        }
      }
      log::trace!(
        "Combined {} to forward {} inner {}.",
        record.state,
        new_forward,
        new_inner
      );
      return (id, WasChanged::from_changed(changed));
    }

    let id = StateId(self.records.len());
    let position = state.position();
    if self.positions.len() <= position {
      self.positions.resize_with(position + 1, Vec::new);
      self.active.resize_with(position + 1, HashMap::new);
    }
    self.positions[position].push(id);
    if let Some(category) = state.active_category() {
      self.active[position]
        .entry(category.clone())
        .or_default()
        .push(id);
    }
    self.completed.add_if_completed(&state);
    self.ids.insert(state.clone(), id);
    log::trace!("Added {} with forward {} inner {}.", state, forward, inner);
    self.records.push(StateRecord {
      state,
      forward,
      inner,
      links: link.into_iter().collect(),
    });

    (id, WasChanged::Changed)
  }
}

impl<S> Chart<S> {
  pub fn get(&self, state: &State) -> Option<StateId> {
    self.ids.get(state).copied()
  }

  pub fn record(&self, id: StateId) -> &StateRecord {
    &self.records[id.0]
  }

  pub fn state(&self, id: StateId) -> &State {
    &self.record(id).state
  }

  pub fn forward_score(&self, id: StateId) -> f64 {
    self.record(id).forward
  }

  pub fn inner_score(&self, id: StateId) -> f64 {
    self.record(id).inner
  }

  pub fn links(&self, id: StateId) -> &[Link] {
    &self.record(id).links
  }

  /// Returns the number of states in the chart.
  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Returns one past the last position that holds a state.
  pub fn num_positions(&self) -> usize {
    self.positions.len()
  }

  /// Returns the states ending at `position`, in insertion order.
  pub fn states_at(&self, position: usize) -> &[StateId] {
    self
      .positions
      .get(position)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Returns the states ending at `position` whose active category is
  /// `category`, in insertion order.
  pub fn active_on(&self, position: usize, category: &Category) -> &[StateId] {
    self
      .active
      .get(position)
      .and_then(|by_category| by_category.get(category))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn completed(&self) -> &CompletedStates {
    &self.completed
  }

  /// Returns the ids of completed states ending at `position` whose rule
  /// has `left` as its left side.
  pub fn completed_ids<'a>(
    &'a self,
    position: usize,
    left: &Category,
  ) -> impl Iterator<Item = StateId> + 'a {
    self
      .completed
      .completed_states_for(position, left)
      .iter()
      .filter_map(move |state| self.get(state))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{NonTerminal, Rule, Terminal};
  use crate::semiring::{ProbabilitySemiring, ViterbiSemiring};
  use std::sync::Arc;

  fn error_rule() -> Arc<Rule> {
    Arc::new(Rule::new(NonTerminal::new("R"), vec![Category::Error], 0.1))
  }

  fn np_rule() -> Arc<Rule> {
    Arc::new(Rule::new(
      NonTerminal::new("NP"),
      vec![
        Category::Term(Terminal::new("the")),
        Category::Term(Terminal::new("boy")),
      ],
      1.0,
    ))
  }

  #[test]
  fn rederivation_combines_scores() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let state = State::create(1, 0, 1, np_rule());
    let (id, changed) = chart.add_state(state.clone(), 0.25, 0.5, None);
    assert!(changed.is_changed());
    let (again, changed) = chart.add_state(state.clone(), 0.25, 0.25, None);
    assert_eq!(id, again);
    assert!(changed.is_changed());
    assert_eq!(chart.len(), 1);
    assert_eq!(chart.forward_score(id), 0.5);
    assert_eq!(chart.inner_score(id), 0.75);

    let (_, changed) = chart.add_state(state, 0.0, 0.0, None);
    assert!(!changed.is_changed());
  }

  #[test]
  fn idempotent_semiring_settles() {
    let mut chart = Chart::new(ViterbiSemiring);
    let state = State::create(1, 0, 1, np_rule());
    let (id, _) = chart.add_state(state.clone(), 0.5, 0.5, None);
    let (_, changed) = chart.add_state(state, 0.25, 0.25, None);
    assert!(!changed.is_changed());
    assert_eq!(chart.inner_score(id), 0.5);
  }

  #[test]
  fn links_are_recorded_once() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let (pre, _) =
      chart.add_state(State::create(0, 0, 0, np_rule()), 1.0, 1.0, None);
    let next = State::create(1, 0, 1, np_rule());
    let (id, _) =
      chart.add_state(next.clone(), 1.0, 1.0, Some(Link::scanned(pre)));
    chart.add_state(next, 1.0, 1.0, Some(Link::scanned(pre)));
    assert_eq!(chart.links(id), &[Link::scanned(pre)]);
  }

  #[test]
  fn indexes_by_position_and_active_category() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let the = Category::Term(Terminal::new("the"));
    let boy = Category::Term(Terminal::new("boy"));
    let (a, _) =
      chart.add_state(State::create(0, 0, 0, np_rule()), 1.0, 1.0, None);
    let (b, _) =
      chart.add_state(State::create(1, 0, 1, np_rule()), 1.0, 1.0, None);
    let (c, _) =
      chart.add_state(State::create(2, 0, 2, np_rule()), 1.0, 1.0, None);

    assert_eq!(chart.states_at(0), &[a]);
    assert_eq!(chart.active_on(0, &the), &[a]);
    assert_eq!(chart.active_on(1, &boy), &[b]);
    assert!(chart.active_on(1, &the).is_empty());
    assert!(chart.active_on(7, &the).is_empty());
    assert_eq!(chart.num_positions(), 3);

    let np = Category::NonTerm(NonTerminal::new("NP"));
    assert_eq!(chart.completed_ids(2, &np).collect::<Vec<_>>(), vec![c]);
    assert!(chart.completed().completed_states(1).is_empty());
  }

  #[test]
  fn error_count_survives_rederivation() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let state = State::create(2, 1, 1, error_rule());
    chart.add_state(state.clone(), 0.1, 0.1, None);
    assert_eq!(chart.completed().completed_error_rules_count(2), 1);
    chart.add_state(state, 0.3, 0.3, None);
    assert_eq!(chart.completed().completed_error_rules_count(2), 1);
  }
}
