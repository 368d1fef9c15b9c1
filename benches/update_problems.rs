//! Benchmark for `bridge::update_problems`'s fixed-point retry loop
//! (`spec.md` §4.4, §8 "Termination"): a queue of `n` independent
//! deferred equations, each immediately solvable, to measure how the
//! per-pass retry scales with queue size.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use im::HashSet;

use sctt_proof_engine::context::SimpleContext;
use sctt_proof_engine::name::Name;
use sctt_proof_engine::proofstate::ProofState;
use sctt_proof_engine::term::{Binder, Env, Term};
use sctt_proof_engine::unifier::{Problem, ProblemMode, StructuralUnifier};
use sctt_proof_engine::Context;

/// A proof state whose `problems` queue holds `n` equations `hole_i =
/// Z` against `n` declared holes — every one resolves on the first
/// sweep, isolating the cost of `update_problems`'s per-entry retry
/// from any cross-entry dependency chasing.
fn build_state(n: usize) -> ProofState {
    let ctxt: Rc<dyn Context> = Rc::new(SimpleContext::new());
    let nat = Name::user("Nat");
    let zero = Term::var(Name::user("Z"), Term::var(nat.clone(), Rc::new(Term::Erased)));

    let mut pterm = Term::var(Name::user("done"), Rc::new(Term::Erased));
    let mut holes = im::Vector::new();
    let mut problems = Vec::new();
    let env: Env = im::Vector::new();

    for i in 0..n {
        let h = Name::machine(i as u64, "bench");
        holes.push_back(h.clone());
        pterm = Term::bind(h.clone(), Binder::Hole(Term::var(nat.clone(), Rc::new(Term::Erased))), pterm);

        problems.push(Problem {
            env: env.clone(),
            lhs: Term::var(h, Term::var(nat.clone(), Rc::new(Term::Erased))),
            rhs: zero.clone(),
            mode: ProblemMode::Unify,
            error: sctt_proof_engine::EngineError::StillHolesToFill,
        });
    }

    let mut state = ProofState::new_proof(Name::user("bench"), ctxt, Term::universe(sctt_proof_engine::term::Level::ZERO));
    state.pterm = pterm;
    state.holes = holes;
    state.problems = problems;
    state.injective = HashSet::new();
    state
}

fn bench_update_problems(c: &mut Criterion) {
    let unifier = StructuralUnifier::new();
    let mut group = c.benchmark_group("update_problems");
    for n in [8usize, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_state(n),
                |mut state| {
                    sctt_proof_engine::bridge::update_problems(black_box(&mut state), &unifier).unwrap();
                    state
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update_problems);
criterion_main!(benches);
