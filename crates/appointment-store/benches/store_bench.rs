use appointment_store::{AppointmentStore, InMemoryAppointmentStore, StaffId};
use chrono::{NaiveDate, NaiveTime};
use common::{BusinessId, ClientId, ServiceId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Appointment, NewAppointment, TimeSlot};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn make_appointment(staff_id: StaffId, hour: u32) -> Appointment {
    Appointment::schedule(NewAppointment {
        business_id: BusinessId::new(),
        client_id: ClientId::new(),
        staff_id,
        service_id: ServiceId::new(),
        date: day(),
        slot: TimeSlot::starting_at(NaiveTime::from_hms_opt(hour, 0, 0).unwrap(), 45).unwrap(),
        notes: None,
        client_timezone: None,
    })
    .0
}

fn bench_save_single(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("appointment_store/save_single", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryAppointmentStore::new();
                store
                    .save(make_appointment(StaffId::new(), 10))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_save_full_day(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("appointment_store/save_full_day_12", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryAppointmentStore::new();
                let staff_id = StaffId::new();
                for hour in 8..20 {
                    store
                        .save(make_appointment(staff_id, hour))
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_find_overlapping(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryAppointmentStore::new();
    let staff_id = StaffId::new();
    rt.block_on(async {
        for hour in 8..20 {
            store
                .save(make_appointment(staff_id, hour))
                .await
                .unwrap();
        }
    });
    let requested = TimeSlot::starting_at(NaiveTime::from_hms_opt(12, 30, 0).unwrap(), 30).unwrap();

    c.bench_function("appointment_store/find_overlapping", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .find_overlapping(staff_id, day(), std::hint::black_box(requested))
                    .await
                    .unwrap()
            })
        });
    });
}

fn bench_rejected_overlap(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryAppointmentStore::new();
    let staff_id = StaffId::new();
    rt.block_on(async {
        store
            .save(make_appointment(staff_id, 10))
            .await
            .unwrap();
    });

    c.bench_function("appointment_store/rejected_overlap", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = store.save(make_appointment(staff_id, 10)).await;
                assert!(result.is_err());
            });
        });
    });
}

criterion_group!(
    benches,
    bench_save_single,
    bench_save_full_day,
    bench_find_overlapping,
    bench_rejected_overlap
);
criterion_main!(benches);
