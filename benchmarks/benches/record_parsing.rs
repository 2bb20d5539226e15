use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vigil_core::InMemorySink;
use vigil_leader::{ElectionRecord, InMemoryRecordSource, RecordKind};
use vigil_testing::{leader_check, RecordBuilder, RAW_VALID_RECORD};

fn benchmark_record_decoding(c: &mut Criterion) {
    c.bench_function("record_parse_valid", |b| {
        b.iter(|| ElectionRecord::parse(black_box(RAW_VALID_RECORD)).unwrap())
    });

    let malformed = RecordBuilder::new()
        .holder("me")
        .lease_duration(30)
        .renew("not a timestamp")
        .acquire("0000-12-18T12:32:22Z")
        .build();
    c.bench_function("record_parse_malformed_timestamps", |b| {
        b.iter(|| ElectionRecord::parse(black_box(&malformed)).unwrap())
    });
}

fn benchmark_record_validation(c: &mut Criterion) {
    let valid = ElectionRecord::parse(RAW_VALID_RECORD).unwrap();
    let missing_acquire = ElectionRecord::parse(
        &RecordBuilder::new()
            .holder("me")
            .lease_duration(30)
            .renew("2018-12-18T12:32:22Z")
            .build(),
    )
    .unwrap();

    c.bench_function("record_validate_valid", |b| {
        b.iter(|| black_box(&valid).validate())
    });

    c.bench_function("record_validate_missing_field", |b| {
        b.iter(|| black_box(&missing_acquire).validate())
    });

    c.bench_function("record_summary", |b| b.iter(|| black_box(&valid).summary()));
}

fn benchmark_check_cycle(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let source = InMemoryRecordSource::new();
    source.insert_record(RecordKind::Endpoints, "thisrecord", "myns", RAW_VALID_RECORD);
    let check = leader_check("ep", "dd-cluster-agent-568f458dd6-kj6vt", &["custom:tag"], source);

    c.bench_function("leader_check_cycle", |b| {
        b.iter(|| {
            let sink = InMemorySink::new();
            runtime
                .block_on(check.check_election_status(&sink))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_record_decoding,
    benchmark_record_validation,
    benchmark_check_cycle
);
criterion_main!(benches);
