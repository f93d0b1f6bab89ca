//! Property-based tests for the runtime loop.
//!
//! Arbitrary interleavings of user intents, timer ticks, and transport
//! outcomes must keep the App's view consistent with the controllers and must
//! never leak a timer in the driver.

mod common;

use std::collections::BTreeSet;

use common::{RecordingDriver, Step};
use proptest::prelude::*;
use safeline_app::{AppEvent, Intent, Runtime, SessionConfig};
use safeline_core::{
    DeliveryReport, DeliveryStatus, DispatchError, Relationship, SosStatus, TimerId,
    env::test_utils::MockEnv,
};
use safeline_store::MemoryStorage;

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop_oneof![
        3 => Just(Intent::TriggerSos),
        2 => Just(Intent::CancelSos),
        2 => Just(Intent::ResolveSos),
        1 => Just(Intent::RetryAlert),
        1 => prop::sample::select(vec![0u32, 1, 5, 2000]).prop_map(Intent::SelectCheckInDuration),
        2 => Just(Intent::StartCheckIn),
        1 => Just(Intent::PauseCheckIn),
        1 => Just(Intent::ResumeCheckIn),
        1 => Just(Intent::DismissCheckIn),
        1 => Just(Intent::EscalateCheckIn),
        1 => Just(Intent::ResetCheckIn),
        1 => prop::sample::select(vec![0u32, 3, 301]).prop_map(Intent::SelectFakeCallDelay),
        2 => Just(Intent::ScheduleFakeCall),
        1 => Just(Intent::AnswerFakeCall),
        1 => Just(Intent::EndFakeCall),
        1 => Just(Intent::ToggleAlarm),
        1 => Just(Intent::ToggleLocationSharing),
        1 => Just(Intent::ToggleRecording),
        1 => Just(Intent::AddContact {
            name: "Ana".into(),
            phone: "555".into(),
            relationship: Relationship::Friend,
        }),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => intent_strategy().prop_map(|i| Step::Events(vec![AppEvent::Intent(i)])),
        6 => Just(Step::Fire(vec![])),
        2 => intent_strategy().prop_map(|i| Step::Fire(vec![AppEvent::Intent(i)])),
        1 => Just(Step::Complete(Ok(DeliveryReport { recipients: 1, status: DeliveryStatus::Sent }))),
        1 => Just(Step::Complete(Err(DispatchError::Failed("carrier rejected".into())))),
    ]
}

proptest! {
    #[test]
    fn prop_view_tracks_controllers(steps in prop::collection::vec(step_strategy(), 0..120)) {
        let env = MockEnv::default();
        let config = SessionConfig::default();
        let (driver, record) = RecordingDriver::new(env.clone(), []);
        let mut runtime = Runtime::new(driver, env, MemoryStorage::new(), config);
        runtime.start().unwrap();

        for step in steps {
            runtime.driver_mut().push(step);
            let batch = runtime.driver_mut().next_batch();
            let quit = runtime.process_events(batch).unwrap();
            prop_assert!(!quit);

            let bridge = runtime.bridge();
            let app = runtime.app();

            let driver_timers: BTreeSet<TimerId> = record.lock().unwrap().armed.keys().copied().collect();
            let controller_timers: BTreeSet<TimerId> = bridge.armed_timers().into_iter().collect();
            prop_assert_eq!(driver_timers, controller_timers);

            prop_assert_eq!(app.sos(), &bridge.sos().state());
            prop_assert_eq!(app.checkin(), &bridge.checkin().state());
            prop_assert_eq!(app.fake_call(), &bridge.fake_call().state());
            prop_assert_eq!(app.recorder(), &bridge.recorder().state());
            prop_assert_eq!(app.recordings(), bridge.recordings().recordings());
            prop_assert_eq!(app.contacts(), bridge.contacts().contacts());
            prop_assert_eq!(app.is_alarm_on(), bridge.is_alarm_on());

            let sos = app.sos();
            prop_assert_eq!(sos.activated_at_ms.is_some(), sos.status == SosStatus::Active);
        }

        runtime.shutdown().unwrap();
        prop_assert!(record.lock().unwrap().armed.is_empty());
        prop_assert!(!record.lock().unwrap().capturing);
        prop_assert!(!runtime.bridge().is_alarm_on());
    }
}
