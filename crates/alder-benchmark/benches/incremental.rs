use std::hint::black_box;

use alder::{InputEdit, Parser, Point, samples};
use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use text_size::TextSize;

fn arithmetic_source(terms: usize) -> String {
    let mut source = String::from("1");
    for i in 0..terms {
        let op = if i % 3 == 0 { '*' } else { '+' };
        source.push(op);
        source.push_str(&format!("({}+{})", i % 7, i % 5));
    }
    source
}

/// Replaces one digit near the middle of `source` with itself: the text is
/// unchanged, but the token is damaged and must be reparsed.
fn middle_digit_edit(source: &str) -> InputEdit {
    let at = source[source.len() / 2..]
        .find(|c: char| c.is_ascii_digit())
        .map(|found| source.len() / 2 + found)
        .expect("the source contains digits");
    let offset = TextSize::new(at as u32);
    let end = TextSize::new(at as u32 + 1);
    InputEdit {
        start_byte: offset,
        old_end_byte: end,
        new_end_byte: end,
        start_point: Point::new(0, u32::from(offset)),
        old_end_point: Point::new(0, u32::from(end)),
        new_end_point: Point::new(0, u32::from(end)),
    }
}

fn benchmark_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");

    for terms in [256usize, 2048] {
        let source = arithmetic_source(terms);
        let mut parser = Parser::new(samples::arithmetic());
        let tree = parser.parse(&source, None);
        let edit = middle_digit_edit(&source);

        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("reparse_after_small_edit", terms),
            &source,
            |b, source| {
                b.iter(|| {
                    let edited = tree.edit(&edit).expect("edit is in bounds");
                    let reparsed = parser.parse(source, Some(&edited));
                    black_box(reparsed);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_incremental);
criterion_main!(benches);
