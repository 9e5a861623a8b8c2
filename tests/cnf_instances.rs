use consat::{dimacs, Heuristic, Result, Solver};

const SINGLE_UNIT: &str = include_str!("../cnf_examples/1_1_single_unit.dimacs");
const CONTRADICTORY_UNITS: &str = include_str!("../cnf_examples/1_2_contradictory_units.dimacs");
const UNITS_CASCADE: &str = include_str!("../cnf_examples/3_3_units_cascade.dimacs");
const IMPLICATION_CHAIN: &str = include_str!("../cnf_examples/3_3_implication_chain.dimacs");
const TWO_VARS_EXHAUSTED: &str = include_str!("../cnf_examples/3_4_two_vars_exhausted.dimacs");
const PIGEONHOLE_3_2: &str = include_str!("../cnf_examples/6_9_pigeonhole_3_2.dimacs");
const TRIANGLE_COLORING: &str = include_str!("../cnf_examples/9_21_triangle_coloring.dimacs");
const EMPTY: &str = include_str!("../cnf_examples/0_0_empty.dimacs");

const ALL_HEURISTICS: [Heuristic; 12] = [
    Heuristic::First,
    Heuristic::YesNo,
    Heuristic::Random,
    Heuristic::Dlis,
    Heuristic::Rdlis,
    Heuristic::Dlcs,
    Heuristic::Rdlcs,
    Heuristic::Jw,
    Heuristic::Rjw,
    Heuristic::Moms,
    Heuristic::Rmoms,
    Heuristic::Lucky,
];

/// Every clause of `input` must contain a literal the model sets true.
fn assert_model_satisfies(input: &str, model: &[i32]) {
    let formula = dimacs::parse(input).unwrap();
    assert_eq!(model.len(), formula.num_vars);

    for clause in &formula.clauses {
        assert!(
            clause.iter().any(|&lit| model.contains(&lit)),
            "clause {clause:?} is not satisfied by model {model:?}"
        );
    }
}

#[test]
fn single_unit_is_sat() {
    let mut solver = Solver::from_dimacs(SINGLE_UNIT).unwrap();
    let model = solver.solve().unwrap_sat();
    assert_eq!(model.as_vec(), vec![1]);
}

#[test]
fn contradictory_units_are_unsat() {
    let mut solver = Solver::from_dimacs(CONTRADICTORY_UNITS).unwrap();
    assert!(solver.solve().is_unsat());
}

#[test]
fn units_cascade_is_fully_forced() {
    let mut solver = Solver::from_dimacs(UNITS_CASCADE).unwrap();
    let model = solver.solve().unwrap_sat();
    assert_eq!(model.as_vec(), vec![1, 2, -3]);
    assert_eq!(solver.stats().decisions, 0);
}

#[test]
fn implication_chain_is_sat() {
    let mut solver = Solver::from_dimacs(IMPLICATION_CHAIN).unwrap();
    let model = solver.solve().unwrap_sat();
    assert_model_satisfies(IMPLICATION_CHAIN, &model.as_vec());
}

#[test]
fn exhausted_square_is_unsat() {
    let mut solver = Solver::from_dimacs(TWO_VARS_EXHAUSTED).unwrap();
    assert!(solver.solve().is_unsat());
}

#[test]
fn pigeonhole_is_unsat() {
    let mut solver = Solver::from_dimacs(PIGEONHOLE_3_2).unwrap();
    assert!(solver.solve().is_unsat());
}

#[test]
fn triangle_coloring_decodes_to_valid_coloring() {
    let mut solver = Solver::from_dimacs(TRIANGLE_COLORING).unwrap();
    let model = solver.solve().unwrap_sat();

    let color_of = |vertex: i32| -> i32 {
        let colors: Vec<i32> = (1..=3)
            .filter(|color| model.lit((vertex - 1) * 3 + color))
            .collect();
        assert_eq!(colors.len(), 1, "vertex {vertex} needs exactly one color");
        colors[0]
    };

    let (a, b, c) = (color_of(1), color_of(2), color_of(3));
    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
}

#[test]
fn empty_formula_is_sat() {
    let mut solver = Solver::from_dimacs(EMPTY).unwrap();
    let model = solver.solve().unwrap_sat();
    assert!(model.as_vec().is_empty());
}

#[test]
fn all_heuristics_agree_on_the_verdict() {
    let instances = [
        (SINGLE_UNIT, true),
        (CONTRADICTORY_UNITS, false),
        (UNITS_CASCADE, true),
        (IMPLICATION_CHAIN, true),
        (TWO_VARS_EXHAUSTED, false),
        (PIGEONHOLE_3_2, false),
        (TRIANGLE_COLORING, true),
        (EMPTY, true),
    ];

    for (input, expect_sat) in instances {
        for heuristic in ALL_HEURISTICS {
            for seed in [1, 7, 42] {
                let mut solver = Solver::from_dimacs_seeded(input, heuristic, seed).unwrap();
                let verdict = solver.solve().is_sat();
                assert_eq!(
                    verdict, expect_sat,
                    "heuristic {heuristic} with seed {seed} disagrees"
                );
            }
        }
    }
}

#[test]
fn every_heuristic_produces_a_sound_model() {
    let sat_instances = [
        SINGLE_UNIT,
        UNITS_CASCADE,
        IMPLICATION_CHAIN,
        TRIANGLE_COLORING,
    ];

    for input in sat_instances {
        for heuristic in ALL_HEURISTICS {
            let mut solver = Solver::from_dimacs_seeded(input, heuristic, 0xC0FFEE).unwrap();
            match solver.solve() {
                Result::Sat(model) => assert_model_satisfies(input, &model.as_vec()),
                Result::Unsat(_) => panic!("{heuristic} found a satisfiable instance unsat"),
            }
        }
    }
}

#[test]
fn tautologies_do_not_change_the_verdict() {
    let with_tautology = |input: &str| -> String {
        // Bump the clause count in the header and append x1 v -x1.
        let mut out = String::new();
        for line in input.lines() {
            if let Some(rest) = line.trim().strip_prefix("p cnf ") {
                let mut fields = rest.split_whitespace();
                let vars: usize = fields.next().unwrap().parse().unwrap();
                let clauses: usize = fields.next().unwrap().parse().unwrap();
                out.push_str(&format!("p cnf {} {}\n", vars.max(1), clauses + 1));
                out.push_str("1 -1 0\n");
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    };

    let instances = [
        (IMPLICATION_CHAIN, true),
        (TWO_VARS_EXHAUSTED, false),
        (PIGEONHOLE_3_2, false),
        (EMPTY, true),
    ];

    for (input, expect_sat) in instances {
        let mut solver = Solver::from_dimacs(&with_tautology(input)).unwrap();
        assert_eq!(solver.solve().is_sat(), expect_sat);
    }
}

#[test]
fn pure_literals_are_respected() {
    // x2 only occurs positively, x3 only negatively.
    let input = "p cnf 3 3\n1 2 0\n-1 2 0\n2 -3 0\n";
    let mut solver = Solver::from_dimacs(input).unwrap();
    let model = solver.solve().unwrap_sat();
    assert!(model.lit(2));
    assert!(!model.lit(3));
}

#[test]
fn parse_errors_surface() {
    assert!(Solver::from_dimacs("p cnf 1\n1 0\n").is_err());
    assert!(Solver::from_dimacs("p cnf 1 1\n2 0\n").is_err());
}
