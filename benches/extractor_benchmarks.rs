use chrono::{FixedOffset, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use crm_assistant_lib::extractor::extract_patch;
use crm_assistant_lib::models::InteractionRecord;
use crm_assistant_lib::summary::build_interaction_log;

const NOTES: [(&str, &str); 4] = [
    ("short", "Called Dr. Rao"),
    (
        "typical",
        "Met Dr. Smith with Nurse Joy, discussed Product X efficacy. Shared brochure and samples, she was very interested.",
    ),
    (
        "no_match",
        "Quiet afternoon, nothing noteworthy to report from the clinic today.",
    ),
    (
        "long",
        "Visited dr patel at the oncology ward with the regional lead. We talked about the OncoBoost \
         Phase III study, dosing questions, and pricing concerns. Left a presentation, the pdf, two \
         trial pack boxes and a product sample. He will consider it and discuss internally before \
         the advisory board.",
    ),
];

const REPLY: &str = "Logged the interaction. Would you like me to schedule a follow-up meeting?";

fn benchmark_extract_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Extract patch");
    let now = FixedOffset::east_opt(5 * 3600 + 1800)
        .unwrap()
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .unwrap();

    let empty = InteractionRecord::default();
    let dated = InteractionRecord {
        date: "2025-03-14".to_string(),
        time: "09:30".to_string(),
        ..Default::default()
    };

    for (name, note) in NOTES.iter() {
        group.bench_with_input(BenchmarkId::new("empty_record", name), note, |b, note| {
            b.iter(|| black_box(extract_patch(black_box(&empty), note, REPLY, now)));
        });
        group.bench_with_input(BenchmarkId::new("dated_record", name), note, |b, note| {
            b.iter(|| black_box(extract_patch(black_box(&dated), note, REPLY, now)));
        });
    }

    group.finish();
}

fn benchmark_summary(c: &mut Criterion) {
    let record = InteractionRecord {
        hcp_name: "Dr. Smith".to_string(),
        materials_shared: vec!["Product Brochure".to_string(), "PDF Document".to_string()],
        samples_distributed: vec!["Trial Pack".to_string()],
        ai_description: NOTES[1].1.to_string(),
        ..Default::default()
    };

    c.bench_function("build_interaction_log", |b| {
        b.iter(|| black_box(build_interaction_log(black_box(&record))));
    });
}

criterion_group!(benches, benchmark_extract_patch, benchmark_summary);
criterion_main!(benches);
