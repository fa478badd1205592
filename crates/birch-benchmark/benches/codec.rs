use std::hint::black_box;

use birch_tree::{FlatValue, TreeKind, decode, encode};
use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

static MODULE: &str = r#"
def fib(n):
    a, b = 0, 1
    for _ in range(n):
        a, b = b, a + b
    return a

table = {k: [fib(i) for i in range(k) if i % 2] for k in range(10)}
while table:
    key, value = table.popitem()
    assert len(value) <= key, "shrunk"
"#;

fn nested(depth: usize) -> String {
    format!("{}{}", "[".repeat(depth), "]".repeat(depth))
}

fn benchmark_codec(c: &mut Criterion) {
    let inputs = [("Module", MODULE.to_owned()), ("Nested", format!("x = {}\n", nested(90)))];

    let mut group = c.benchmark_group("Codec Benchmark");

    for (name, source) in inputs {
        let (Ok(tree), Ok(copy)) = (birch_parse::suite(&source), birch_parse::suite(&source)) else {
            continue;
        };
        let flat = encode(&tree, true);

        group.throughput(Throughput::Elements(tree.root().node_count() as u64));
        group.bench_with_input(BenchmarkId::new("encode", name), &tree, |b, tree| {
            b.iter(|| black_box(encode(tree, true)));
        });
        group.bench_with_input(BenchmarkId::new("decode", name), &flat, |b, flat| {
            b.iter(|| black_box(decode(flat, TreeKind::Suite)));
        });
        group.bench_with_input(BenchmarkId::new("compare", name), &tree, |b, tree| {
            b.iter(|| black_box(tree.cmp(&copy)));
        });
    }

    group.finish();
}

fn benchmark_json(c: &mut Criterion) {
    let Ok(tree) = birch_parse::suite(MODULE) else { return };
    let Ok(json) = serde_json::to_string(&encode(&tree, false)) else { return };

    let mut group = c.benchmark_group("JSON Benchmark");
    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("from_json", |b| {
        b.iter(|| black_box(serde_json::from_str::<FlatValue>(&json)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_codec, benchmark_json);
criterion_main!(benches);
