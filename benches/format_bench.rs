use criterion::{black_box, criterion_group, criterion_main, Criterion};

use phonenumbers::{PhoneNumber, PhoneNumberFormat, PHONE_NUMBER_UTIL};

fn setup_numbers() -> Vec<PhoneNumber> {
    [
        ("+14435550100", "US"),
        ("+442087654321", "GB"),
        ("+5491161234567", "AR"),
        ("+390236618300", "IT"),
        ("+6433316005", "NZ"),
        ("+80012345678", "ZZ"),
    ]
    .iter()
    .map(|(number, region)| {
        PHONE_NUMBER_UTIL
            .parse(number, region)
            .expect("benchmark corpus numbers parse")
    })
    .collect()
}

fn formatting_benchmark(c: &mut Criterion) {
    let numbers = setup_numbers();

    let mut group = c.benchmark_group("Formatting");
    for format in [
        PhoneNumberFormat::E164,
        PhoneNumberFormat::International,
        PhoneNumberFormat::National,
        PhoneNumberFormat::RFC3966,
    ] {
        group.bench_function(format!("format({format:?})"), |b| {
            b.iter(|| {
                for number in &numbers {
                    let _ = PHONE_NUMBER_UTIL.format(black_box(number), format);
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, formatting_benchmark);
criterion_main!(benches);
