//! Benchmarks for order assembly hot paths.

use common::{BuyerId, Money, SellerId};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{Contact, Order, OrderLine, Receiver};

fn build_order(line_count: u32) -> Order {
    let lines: Vec<OrderLine> = (0..line_count)
        .map(|i| {
            OrderLine::new(
                format!("SKU-{i:04}"),
                format!("Product {i}"),
                (i % 5) + 1,
                Money::from_cents(1000 + i64::from(i)),
            )
            .unwrap()
        })
        .collect();

    Order::new(
        BuyerId::new(),
        SellerId::new(),
        Contact::new("Bench", "010-0000-0000"),
        Receiver::new("Bench", "010-0000-0000", "1 Bench St"),
        lines,
    )
    .unwrap()
}

fn bench_order_construction(c: &mut Criterion) {
    c.bench_function("order_new_20_lines", |b| {
        b.iter(|| black_box(build_order(20)));
    });
}

fn bench_total_amount(c: &mut Criterion) {
    let order = build_order(50);
    c.bench_function("order_total_50_lines", |b| {
        b.iter(|| black_box(order.total_amount()));
    });
}

criterion_group!(benches, bench_order_construction, bench_total_amount);
criterion_main!(benches);
