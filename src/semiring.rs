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

//! Scoring algebras for chart items.
//!
//! All score combination in a chart goes through a `Semiring`, so the same
//! chart logic can compute probabilities, log probabilities, best-derivation
//! scores or plain reachability.

/// An algebraic property a semiring declares about itself.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Property {
  Commutative,
  LeftSemiring,
  RightSemiring,
  Idempotent,
}

impl Property {
  fn bit(self) -> u8 {
    match self {
      Property::Commutative => 1,
      Property::LeftSemiring => 1 << 1,
      Property::RightSemiring => 1 << 2,
      Property::Idempotent => 1 << 3,
    }
  }
}

static ALL_PROPERTIES: [Property; 4] = [
  Property::Commutative,
  Property::LeftSemiring,
  Property::RightSemiring,
  Property::Idempotent,
];

/// A small set of `Property` values.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Properties(u8);

impl Properties {
  pub fn empty() -> Self {
    Properties(0)
  }

  pub fn of(props: &[Property]) -> Self {
    Properties(props.iter().fold(0, |bits, p| bits | p.bit()))
  }

  pub fn with(self, prop: Property) -> Self {
    Properties(self.0 | prop.bit())
  }

  pub fn contains(self, prop: Property) -> bool {
    self.0 & prop.bit() != 0
  }

  pub fn iter(self) -> impl Iterator<Item = Property> {
    ALL_PROPERTIES
      .iter()
      .copied()
      .filter(move |p| self.contains(*p))
  }
}

impl std::fmt::Debug for Properties {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

/// A scoring algebra over `f64` values.
///
/// Implementations must satisfy, for every `x` where `member(x)` holds:
///
/// - `plus(zero(), x) == x`
/// - `times(one(), x) == x`
/// - `times(zero(), x) == zero()`
/// - `star(x) == plus(one(), times(x, star(x)))`
///
/// The declared `properties` are metadata for callers deciding whether the
/// order of combination matters. They are not checked.
pub trait Semiring {
  /// Combines the scores of two different derivations of the same item.
  fn plus(&self, a: f64, b: f64) -> f64;

  /// Composes scores along a single derivation.
  fn times(&self, a: f64, b: f64) -> f64;

  /// The additive identity, which annihilates under `times`.
  fn zero(&self) -> f64;

  /// The multiplicative identity.
  fn one(&self) -> f64;

  /// The closure `one + a + a * a + ...`. Where the series diverges this is
  /// the algebra's infinity.
  fn star(&self, a: f64) -> f64;

  /// Returns true if `candidate` is a valid score in this algebra.
  fn member(&self, candidate: f64) -> bool;

  fn properties(&self) -> Properties;

  /// Maps a probability in `[0, 1]` into this algebra's score space.
  fn from_probability(&self, probability: f64) -> f64;

  /// Maps a score back to a probability. This is the inverse of
  /// `from_probability` wherever that is defined.
  fn to_probability(&self, score: f64) -> f64;
}

impl<S: Semiring + ?Sized> Semiring for &S {
  fn plus(&self, a: f64, b: f64) -> f64 {
    (**self).plus(a, b)
  }

  fn times(&self, a: f64, b: f64) -> f64 {
    (**self).times(a, b)
  }

  fn zero(&self) -> f64 {
    (**self).zero()
  }

  fn one(&self) -> f64 {
    (**self).one()
  }

  fn star(&self, a: f64) -> f64 {
    (**self).star(a)
  }

  fn member(&self, candidate: f64) -> bool {
    (**self).member(candidate)
  }

  fn properties(&self) -> Properties {
    (**self).properties()
  }

  fn from_probability(&self, probability: f64) -> f64 {
    (**self).from_probability(probability)
  }

  fn to_probability(&self, score: f64) -> f64 {
    (**self).to_probability(score)
  }
}

fn is_probability(candidate: f64) -> bool {
  !candidate.is_nan() && candidate >= 0.0
}

// Zero annihilates even an infinite operand.
fn annihilating_product(a: f64, b: f64) -> f64 {
  if a == 0.0 || b == 0.0 {
    0.0
  } else {
    a * b
  }
}

/// Plain probabilities: `+`, `*`, `0` and `1`.
///
/// Combining a value that is not a member yields negative infinity, which is
/// itself not a member, so invalid scores stay detectable downstream.
/// Positive infinity is a member: it is the closure of a weight of 1 or more.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProbabilitySemiring;

impl Semiring for ProbabilitySemiring {
  fn plus(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NEG_INFINITY;
    }
    a + b
  }

  fn times(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NEG_INFINITY;
    }
    annihilating_product(a, b)
  }

  fn zero(&self) -> f64 {
    0.0
  }

  fn one(&self) -> f64 {
    1.0
  }

  fn star(&self, a: f64) -> f64 {
    if !self.member(a) {
      f64::NEG_INFINITY
    } else if a < 1.0 {
      1.0 / (1.0 - a)
    } else {
      f64::INFINITY
    }
  }

  fn member(&self, candidate: f64) -> bool {
    is_probability(candidate)
  }

  fn properties(&self) -> Properties {
    Properties::of(&[
      Property::LeftSemiring,
      Property::RightSemiring,
      Property::Commutative,
    ])
  }

  fn from_probability(&self, probability: f64) -> f64 {
    probability
  }

  fn to_probability(&self, score: f64) -> f64 {
    score
  }
}

/// Negative log probabilities.
///
/// `plus` is `-ln(e^-a + e^-b)`, `times` is addition, `zero` is positive
/// infinity and `one` is `0`. Scores read as costs: lower is more likely.
/// Negative infinity is the cost of a divergent closure.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSemiring;

impl Semiring for LogSemiring {
  fn plus(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NAN;
    }
    if a == f64::INFINITY {
      return b;
    }
    if b == f64::INFINITY {
      return a;
    }
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    if low == f64::NEG_INFINITY {
      return low;
    }
    low - (-(high - low)).exp().ln_1p()
  }

  fn times(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NAN;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
      return f64::INFINITY;
    }
    a + b
  }

  fn zero(&self) -> f64 {
    f64::INFINITY
  }

  fn one(&self) -> f64 {
    0.0
  }

  fn star(&self, a: f64) -> f64 {
    if !self.member(a) {
      f64::NAN
    } else if a > 0.0 {
      (-(-a).exp_m1()).ln()
    } else {
      f64::NEG_INFINITY
    }
  }

  fn member(&self, candidate: f64) -> bool {
    !candidate.is_nan()
  }

  fn properties(&self) -> Properties {
    Properties::of(&[
      Property::LeftSemiring,
      Property::RightSemiring,
      Property::Commutative,
    ])
  }

  fn from_probability(&self, probability: f64) -> f64 {
    -probability.ln()
  }

  fn to_probability(&self, score: f64) -> f64 {
    (-score).exp()
  }
}

/// Best-derivation scoring: `max` and `*` over probabilities.
#[derive(Copy, Clone, Debug, Default)]
pub struct ViterbiSemiring;

impl Semiring for ViterbiSemiring {
  fn plus(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NEG_INFINITY;
    }
    a.max(b)
  }

  fn times(&self, a: f64, b: f64) -> f64 {
    if !self.member(a) || !self.member(b) {
      return f64::NEG_INFINITY;
    }
    annihilating_product(a, b)
  }

  fn zero(&self) -> f64 {
    0.0
  }

  fn one(&self) -> f64 {
    1.0
  }

  fn star(&self, a: f64) -> f64 {
    if !self.member(a) {
      f64::NEG_INFINITY
    } else if a <= 1.0 {
      1.0
    } else {
      f64::INFINITY
    }
  }

  fn member(&self, candidate: f64) -> bool {
    is_probability(candidate)
  }

  fn properties(&self) -> Properties {
    Properties::of(&[
      Property::LeftSemiring,
      Property::RightSemiring,
      Property::Commutative,
      Property::Idempotent,
    ])
  }

  fn from_probability(&self, probability: f64) -> f64 {
    probability
  }

  fn to_probability(&self, score: f64) -> f64 {
    score
  }
}

/// Reachability: scores are `0` (unreachable) or `1` (reachable), `plus` is
/// OR and `times` is AND.
#[derive(Copy, Clone, Debug, Default)]
pub struct BooleanSemiring;

impl Semiring for BooleanSemiring {
  fn plus(&self, a: f64, b: f64) -> f64 {
    if self.member(a) && self.member(b) && (a == 1.0 || b == 1.0) {
      1.0
    } else {
      0.0
    }
  }

  fn times(&self, a: f64, b: f64) -> f64 {
    if self.member(a) && self.member(b) && a == 1.0 && b == 1.0 {
      1.0
    } else {
      0.0
    }
  }

  fn zero(&self) -> f64 {
    0.0
  }

  fn one(&self) -> f64 {
    1.0
  }

  fn star(&self, a: f64) -> f64 {
    if self.member(a) {
      1.0
    } else {
      0.0
    }
  }

  fn member(&self, candidate: f64) -> bool {
    candidate == 0.0 || candidate == 1.0
  }

  fn properties(&self) -> Properties {
    Properties::of(&[
      Property::LeftSemiring,
      Property::RightSemiring,
      Property::Commutative,
      Property::Idempotent,
    ])
  }

  fn from_probability(&self, probability: f64) -> f64 {
    if probability > 0.0 {
      1.0
    } else {
      0.0
    }
  }

  fn to_probability(&self, score: f64) -> f64 {
    score
  }
}
