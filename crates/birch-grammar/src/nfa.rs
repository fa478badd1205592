//! Thompson automata over child labels, one per production.

use crate::meta::{Label, Pattern};

#[derive(Debug, Default)]
struct State {
    epsilon: Vec<usize>,
    edges: Vec<(Label, usize)>,
}

#[derive(Debug)]
pub(crate) struct Nfa {
    states: Vec<State>,
    accept: usize,
}

impl Nfa {
    pub(crate) fn new(pattern: &Pattern) -> Self {
        let mut nfa = Self { states: vec![State::default()], accept: 0 };
        nfa.accept = nfa.compile(pattern, 0);
        nfa
    }

    fn state(&mut self) -> usize {
        self.states.push(State::default());
        self.states.len() - 1
    }

    /// Adds transitions for `pattern` leaving `start`, returning the end state.
    fn compile(&mut self, pattern: &Pattern, start: usize) -> usize {
        match pattern {
            Pattern::Label(label) => {
                let end = self.state();
                self.states[start].edges.push((*label, end));
                end
            }
            Pattern::Seq(items) => items.iter().fold(start, |from, item| self.compile(item, from)),
            Pattern::Alt(alts) => {
                let end = self.state();
                for alt in alts {
                    let alt_end = self.compile(alt, start);
                    self.states[alt_end].epsilon.push(end);
                }
                end
            }
            Pattern::Opt(inner) => {
                let end = self.compile(inner, start);
                self.states[start].epsilon.push(end);
                end
            }
            Pattern::Star(inner) => {
                let hub = self.state();
                self.states[start].epsilon.push(hub);
                let end = self.compile(inner, hub);
                self.states[end].epsilon.push(hub);
                hub
            }
            Pattern::Plus(inner) => {
                let hub = self.state();
                self.states[start].epsilon.push(hub);
                let end = self.compile(inner, hub);
                self.states[end].epsilon.push(hub);
                end
            }
        }
    }

    fn close(&self, set: &mut [bool], worklist: &mut Vec<usize>) {
        while let Some(state) = worklist.pop() {
            for &next in &self.states[state].epsilon {
                if !set[next] {
                    set[next] = true;
                    worklist.push(next);
                }
            }
        }
    }

    /// Runs the automaton over `labels`, where `accepts(label, i)` says whether
    /// the `i`-th child can be read through `label`.
    pub(crate) fn matches(&self, len: usize, accepts: impl Fn(Label, usize) -> bool) -> bool {
        let mut current = vec![false; self.states.len()];
        let mut next = vec![false; self.states.len()];
        let mut worklist = vec![0];
        current[0] = true;
        self.close(&mut current, &mut worklist);

        for index in 0..len {
            next.fill(false);
            for (state, _) in current.iter().enumerate().filter(|(_, live)| **live) {
                for &(label, target) in &self.states[state].edges {
                    if !next[target] && accepts(label, index) {
                        next[target] = true;
                        worklist.push(target);
                    }
                }
            }
            self.close(&mut next, &mut worklist);

            if !next.contains(&true) {
                return false;
            }
            std::mem::swap(&mut current, &mut next);
        }

        current[self.accept]
    }
}
