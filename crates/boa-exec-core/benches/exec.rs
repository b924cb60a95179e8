use boa_exec_core::{execute, BoaEngine, ConsoleTarget, ExecConfig, ScriptEngine, SourceText};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

// block-scoped so a reused context can run it repeatedly
const SCRIPT: &str = "{ let s = 0; for (let i = 0; i < 1000; i++) { s += i; } s }";

fn bench_fresh_engine(c: &mut Criterion) {
    let config = ExecConfig::default().with_console(ConsoleTarget::Silent);
    c.bench_function("execute/fresh_engine", |b| {
        b.iter(|| execute(black_box(SCRIPT), &config))
    });
}

fn bench_reused_engine(c: &mut Criterion) {
    let config = ExecConfig::default().with_console(ConsoleTarget::Silent);
    let mut engine = BoaEngine::new(config).expect("engine");
    let source = SourceText::new(SCRIPT, engine.max_source_len()).expect("source");
    c.bench_function("execute/reused_engine", |b| {
        b.iter(|| engine.evaluate(black_box(&source)))
    });
}

criterion_group!(benches, bench_fresh_engine, bench_reused_engine);
criterion_main!(benches);
