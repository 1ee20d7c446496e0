use chrono::{NaiveDate, NaiveTime};
use common::{BusinessId, ClientId, ServiceId, StaffId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Appointment, AppointmentEvent, NewAppointment, StaffDailyAvailability, TimeSlot,
};
use projections::{AvailableSlotsView, Projection, ProjectionProcessor, StaffAgendaView};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// Sixteen 15 minute bookings spread across a 09:00-17:00 day.
fn full_day(staff_id: StaffId, business_id: BusinessId) -> Vec<AppointmentEvent> {
    (0..16u32)
        .map(|i| {
            let start = NaiveTime::from_hms_opt(9 + i / 2, (i % 2) * 30, 0).unwrap();
            Appointment::schedule(NewAppointment {
                business_id,
                client_id: ClientId::new(),
                staff_id,
                service_id: ServiceId::new(),
                date: day(),
                slot: TimeSlot::starting_at(start, 15).unwrap(),
                notes: None,
                client_timezone: None,
            })
            .1
        })
        .collect()
}

fn availability(staff_id: StaffId, business_id: BusinessId) -> StaffDailyAvailability {
    let open = TimeSlot::new(
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    )
    .unwrap();
    StaffDailyAvailability::new(staff_id, business_id, day(), [open])
}

fn bench_open_slots(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let staff_id = StaffId::new();
    let business_id = BusinessId::new();

    let view = AvailableSlotsView::new();
    view.seed(&availability(staff_id, business_id));
    rt.block_on(async {
        for event in full_day(staff_id, business_id) {
            view.handle(&event).await.unwrap();
        }
    });

    c.bench_function("projections/open_slots_16_bookings", |b| {
        b.iter(|| view.open_slots(staff_id, std::hint::black_box(day())));
    });
}

fn bench_replay_full_day(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let staff_id = StaffId::new();
    let business_id = BusinessId::new();
    let events = full_day(staff_id, business_id);

    c.bench_function("projections/replay_16_events_two_views", |b| {
        b.iter(|| {
            rt.block_on(async {
                let slots = AvailableSlotsView::new();
                slots.seed(&availability(staff_id, business_id));

                let mut processor = ProjectionProcessor::new();
                processor.register(Box::new(slots));
                processor.register(Box::new(StaffAgendaView::new()));
                processor.replay(events.clone()).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_open_slots, bench_replay_full_day);
criterion_main!(benches);
