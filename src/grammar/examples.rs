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

//! Small grammars used by tests and documentation.

use crate::grammar::{build, Grammar, NonTerminal};

/// `S -> NP VP`, `NP -> the boy`, `VP -> left`.
pub fn make_sentence() -> Grammar {
  let s = NonTerminal::new("S");
  let np = NonTerminal::new("NP");
  let vp = NonTerminal::new("VP");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&np).add_nonterm(&vp);
      });
    })
    .add_rule(&np, |rb| {
      rb.add_prod(|pb| {
        pb.add_term("the").add_term("boy");
      });
    })
    .add_rule(&vp, |rb| {
      rb.add_prod(|pb| {
        pb.add_term("left");
      });
    });
  })
  .expect("sentence grammar is valid")
}

/// `A -> B`, `B -> x`. Every rule is a unit production.
pub fn make_unit_chain() -> Grammar {
  let a = NonTerminal::new("A");
  let b = NonTerminal::new("B");

  build(&a, |gb| {
    gb.add_rule(&a, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&b);
      });
    })
    .add_rule(&b, |rb| {
      rb.add_prod(|pb| {
        pb.add_term("x");
      });
    });
  })
  .expect("unit chain grammar is valid")
}

/// `A -> B (0.5) | x (0.5)`, `B -> A (1.0)`: a cycle of unit productions.
pub fn make_unit_cycle() -> Grammar {
  let a = NonTerminal::new("A");
  let b = NonTerminal::new("B");

  build(&a, |gb| {
    gb.add_rule(&a, |rb| {
      rb.add_prod_with_probability(0.5, |pb| {
        pb.add_nonterm(&b);
      })
      .add_prod_with_probability(0.5, |pb| {
        pb.add_term("x");
      });
    })
    .add_rule(&b, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&a);
      });
    });
  })
  .expect("unit cycle grammar is valid")
}

/// `E -> E + n | n`, both with probability 1.
pub fn make_left_recursive() -> Grammar {
  let e = NonTerminal::new("E");

  build(&e, |gb| {
    gb.add_rule(&e, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&e).add_term("+").add_term("n");
      })
      .add_prod(|pb| {
        pb.add_term("n");
      });
    });
  })
  .expect("left recursive grammar is valid")
}

/// `E -> n E (0.5) | n (0.5)`.
pub fn make_right_recursive() -> Grammar {
  let e = NonTerminal::new("E");

  build(&e, |gb| {
    gb.add_rule(&e, |rb| {
      rb.add_prod_with_probability(0.5, |pb| {
        pb.add_term("n").add_nonterm(&e);
      })
      .add_prod_with_probability(0.5, |pb| {
        pb.add_term("n");
      });
    });
  })
  .expect("right recursive grammar is valid")
}

/// `S -> S S (0.4) | a (0.6)`. Three or more tokens are ambiguous.
pub fn make_ambiguous() -> Grammar {
  let s = NonTerminal::new("S");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod_with_probability(0.4, |pb| {
        pb.add_nonterm(&s).add_nonterm(&s);
      })
      .add_prod_with_probability(0.6, |pb| {
        pb.add_term("a");
      });
    });
  })
  .expect("ambiguous grammar is valid")
}

/// `S -> W R`, `W -> w`, `R -> r (0.9) | <error> (0.1)`.
pub fn make_error_recovery() -> Grammar {
  let s = NonTerminal::new("S");
  let w = NonTerminal::new("W");
  let r = NonTerminal::new("R");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&w).add_nonterm(&r);
      });
    })
    .add_rule(&w, |rb| {
      rb.add_prod(|pb| {
        pb.add_term("w");
      });
    })
    .add_rule(&r, |rb| {
      rb.add_prod_with_probability(0.9, |pb| {
        pb.add_term("r");
      })
      .add_prod_with_probability(0.1, |pb| {
        pb.add_error();
      });
    });
  })
  .expect("error recovery grammar is valid")
}

/// A part-of-speech grammar over ambiguous tokens:
/// `S -> NP VP`, `NP -> N (0.7) | N N (0.3)`, `VP -> V (0.6) | V NP (0.4)`.
pub fn make_tagged() -> Grammar {
  let s = NonTerminal::new("S");
  let np = NonTerminal::new("NP");
  let vp = NonTerminal::new("VP");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&np).add_nonterm(&vp);
      });
    })
    .add_rule(&np, |rb| {
      rb.add_prod_with_probability(0.7, |pb| {
        pb.add_term("N");
      })
      .add_prod_with_probability(0.3, |pb| {
        pb.add_term("N").add_term("N");
      });
    })
    .add_rule(&vp, |rb| {
      rb.add_prod_with_probability(0.6, |pb| {
        pb.add_term("V");
      })
      .add_prod_with_probability(0.4, |pb| {
        pb.add_term("V").add_nonterm(&np);
      });
    });
  })
  .expect("tagged grammar is valid")
}
