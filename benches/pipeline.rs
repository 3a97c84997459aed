mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loopquest::interpreter::Interpreter;
use loopquest::{run, translator, validator};

fn bench_pipeline(c: &mut Criterion) {
    for (label, source) in common::workloads() {
        let program = translator::translate(&source)
            .expect("translate")
            .program;

        c.bench_function(&format!("validate_{label}"), |b| {
            b.iter(|| {
                validator::validate(black_box(&source)).expect("validate");
            })
        });

        c.bench_function(&format!("translate_{label}"), |b| {
            b.iter(|| {
                let out = translator::translate(black_box(&source)).expect("translate");
                black_box(out);
            })
        });

        c.bench_function(&format!("interpret_{label}"), |b| {
            let interpreter = Interpreter::default();
            b.iter(|| {
                let output = interpreter.run(black_box(&program)).expect("run");
                black_box(output);
            })
        });

        c.bench_function(&format!("run_total_{label}"), |b| {
            b.iter(|| {
                let result = run(black_box(&source));
                black_box(result);
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
