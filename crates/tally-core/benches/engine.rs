use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tally_core::{
    rank_channel, rank_global, ChannelState, IncomingMessage, MemberRecord, Metric, DEFAULT_TOP,
    evaluate,
};

// Evaluation cost is dominated by the tokenizer and the state clone, so the
// member table size matters more than the message content.

fn guild_with_members(members: usize) -> ChannelState {
    let mut state = ChannelState::enabled("counting");
    state.count = 41;
    for i in 0..members {
        state
            .members
            .insert(format!("member{:06}", i), MemberRecord::new(i as u64, (i % 7) as u64));
    }
    state
}

fn evaluation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.throughput(Throughput::Elements(1));

    for members in [10usize, 1_000] {
        let state = guild_with_members(members);
        let accept = IncomingMessage::new("m42", "alice", "42");
        let talking = IncomingMessage::new("m42", "alice", "42 and some chatter: here");

        group.bench_with_input(BenchmarkId::new("accept", members), &state, |b, state| {
            b.iter(|| evaluate(black_box(state), black_box(&accept)))
        });
        group.bench_with_input(BenchmarkId::new("talking", members), &state, |b, state| {
            b.iter(|| evaluate(black_box(state), black_box(&talking)))
        });
    }

    group.finish();
}

fn ranking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    let guild = guild_with_members(10_000);
    group.bench_function("channel_cf_ratio", |b| {
        b.iter(|| rank_channel(black_box(&guild), Metric::CfRatio, DEFAULT_TOP))
    });

    let guilds: Vec<ChannelState> = (0..50).map(|_| guild_with_members(500)).collect();
    group.bench_function("global_counts", |b| {
        b.iter(|| rank_global(black_box(guilds.iter()), Metric::Counts, DEFAULT_TOP))
    });

    group.finish();
}

criterion_group!(benches, evaluation_benchmark, ranking_benchmark);
criterion_main!(benches);
