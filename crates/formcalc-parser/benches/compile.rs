//! Lexer and compiler benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use formcalc_parser::{compile, Lexer, TokenKind};

const SAMPLE_SOURCE: &str = r#"
; Invoice totals
var subtotal = 0
var taxRate = 0.0825

func LineTotal(qty, price) do
  Round(qty * price, 2)
endfunc

foreach row in (Invoice.Items.Row[*]) do
  subtotal = subtotal + LineTotal(row.Qty, row.Price)
endfor

if (subtotal > 1000) then
  Discount.rawValue = Round(subtotal * 0.05, 2)
elseif (subtotal > 500) then
  Discount.rawValue = Round(subtotal * 0.02, 2)
else
  Discount.rawValue = 0
endif

for i = 1 upto Count(Invoice.Items.Row[*]) step 1 do
  Invoice.Items.Row[i - 1].#Index = i
endfor

Summary.Text = Concat("Total: ", Format("z,zzz,zz9.99", subtotal * (1 + taxRate)))
xfa.host.messageBox(Summary.Text)
$ = subtotal
"#;

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(SAMPLE_SOURCE));
            loop {
                let token = lexer.next_token();
                if matches!(token.kind, TokenKind::Eof | TokenKind::Reserved) {
                    break;
                }
            }
        });
    });

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| compile(black_box(SAMPLE_SOURCE)));
    });

    let wide = vec!["field.value"; 1000].join(" + ");
    group.bench_function("wide_expression", |b| {
        b.iter(|| compile(black_box(&wide)));
    });

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_compile);
criterion_main!(benches);
