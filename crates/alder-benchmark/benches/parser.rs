use std::hint::black_box;

use alder::{Parser, samples};
use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

fn arithmetic_source(terms: usize) -> String {
    let mut source = String::from("1");
    for i in 0..terms {
        let op = if i % 3 == 0 { '*' } else { '+' };
        source.push(op);
        source.push_str(&format!("({}+{})", i % 7, i % 5));
    }
    source
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for terms in [16usize, 256, 2048] {
        let source = arithmetic_source(terms);
        let mut parser = Parser::new(samples::arithmetic());
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("full_parse", terms),
            &source,
            |b, source| {
                b.iter(|| {
                    let tree = parser.parse(source, None);
                    black_box(tree);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
