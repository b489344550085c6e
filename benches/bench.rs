// Criterion benchmarks for the StaySwipe reconciliation policy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stayswipe::core::lifecycle::MatchPatch;
use stayswipe::core::reconciler::{ordered_pair, Reconciler};
use stayswipe::models::requests::SwipeRequest;
use uuid::Uuid;

fn swipe_request(i: usize) -> SwipeRequest {
    let on_listing = i % 2 == 0;
    SwipeRequest {
        swiper_type: if on_listing { "tenant" } else { "host" }.to_string(),
        action: match i % 4 {
            0 => "like",
            1 => "dislike",
            2 => "super_like",
            _ => "skip",
        }
        .to_string(),
        swiped_listing_id: on_listing.then(Uuid::new_v4),
        swiped_requirement_id: (!on_listing).then(Uuid::new_v4),
        swiped_user_id: Uuid::new_v4(),
    }
}

fn bench_validate_swipe(c: &mut Criterion) {
    let reconciler = Reconciler::default();
    let actor = Uuid::new_v4();
    let request = swipe_request(0);

    c.bench_function("validate_swipe", |b| {
        b.iter(|| reconciler.validate(black_box(actor), black_box(&request)));
    });
}

fn bench_ordered_pair(c: &mut Criterion) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    c.bench_function("ordered_pair", |bench| {
        bench.iter(|| ordered_pair(black_box(a), black_box(b)));
    });
}

fn bench_reconcile_policy(c: &mut Criterion) {
    let reconciler = Reconciler::default();
    let actor = Uuid::new_v4();

    let mut group = c.benchmark_group("reconcile_policy");

    for batch in [100usize, 1_000, 10_000].iter() {
        let requests: Vec<SwipeRequest> = (0..*batch).map(swipe_request).collect();

        group.bench_with_input(BenchmarkId::new("validate_and_seed", batch), batch, |b, _| {
            b.iter(|| {
                let mut seeds = 0usize;
                for request in &requests {
                    if let Ok(cmd) = reconciler.validate(actor, request) {
                        if reconciler.should_reconcile(cmd.action) {
                            black_box(reconciler.seed(&cmd));
                            seeds += 1;
                        }
                    }
                }
                black_box(seeds)
            });
        });
    }

    group.finish();
}

fn bench_patch_builders(c: &mut Criterion) {
    let now = chrono::Utc::now();

    c.bench_function("lifecycle_patches", |b| {
        b.iter(|| {
            black_box(MatchPatch::schedule_visit(black_box(now)));
            black_box(MatchPatch::close_deal(black_box(Some(1450.0)), black_box(now)));
            black_box(MatchPatch::unmatch(black_box(now)));
        });
    });
}

criterion_group!(
    benches,
    bench_validate_swipe,
    bench_ordered_pair,
    bench_reconcile_policy,
    bench_patch_builders
);

criterion_main!(benches);
