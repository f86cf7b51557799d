use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cashpoint_dispenser::{
    available_denominations, deposit, withdraw, Denomination, DenominationSet, Inventory,
};

fn stocked(notes_per_denomination: u64) -> Inventory {
    Inventory::from_counts(
        DenominationSet::standard()
            .as_slice()
            .iter()
            .map(|d| (*d, notes_per_denomination)),
    )
    .unwrap()
}

fn bench_withdraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("withdraw");
    group.throughput(Throughput::Elements(1));

    for amount in [1u64, 145, 475, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("feasible", amount), amount, |b, &amount| {
            let inventory = stocked(100);
            b.iter(|| black_box(withdraw(black_box(&inventory), black_box(amount))));
        });
    }

    // Only fifties on hand: the pass walks the whole list and gives up.
    group.bench_function("infeasible_only_fifties", |b| {
        let fifty = Denomination::new(50).unwrap();
        let inventory = Inventory::from_counts([(fifty, 1000)]).unwrap();
        b.iter(|| black_box(withdraw(black_box(&inventory), black_box(10))));
    });

    group.finish();
}

fn bench_deposit_and_availability(c: &mut Criterion) {
    let mut group = c.benchmark_group("inventory");

    group.bench_function("deposit_full_set", |b| {
        let inventory = stocked(10);
        let deposited = stocked(5);
        b.iter(|| black_box(deposit(black_box(&inventory), deposited.iter())));
    });

    group.bench_function("available_denominations", |b| {
        let inventory = stocked(10);
        b.iter(|| black_box(available_denominations(black_box(&inventory))));
    });

    group.finish();
}

criterion_group!(benches, bench_withdraw, bench_deposit_and_availability);
criterion_main!(benches);
