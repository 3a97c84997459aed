use std::path::Path;

use test_support::load_cases;

/// `(case name, program source)` for every fixture flagged for benchmarking.
pub fn workloads() -> Vec<(String, String)> {
    let cases = load_cases(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load fixture cases: {err:#}"));
    cases
        .into_iter()
        .filter(|case| case.spec.bench.enabled)
        .map(|case| {
            let source = case
                .read_program()
                .unwrap_or_else(|err| panic!("read {}: {err:#}", case.name));
            (case.name, source)
        })
        .collect()
}
