//! Standard invariant checks.
//!
//! These capture properties that must hold after every batch, whatever the
//! script that led there.

use safeline_core::{CheckInStatus, SosStatus};

use super::{Invariant, InvariantKind, InvariantResult, SessionSnapshot, Violation};

/// `activated_at_ms` is set exactly while SOS is active.
pub struct ActivatedAtIffActive;

impl Invariant for ActivatedAtIffActive {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ActivatedAtIffActive
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let sos = &state.sos;
        let active = sos.status == SosStatus::Active;
        if sos.activated_at_ms.is_some() != active || sos.escalation.is_some() != active {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "status {} with activated_at {:?} and escalation {:?}",
                    sos.status, sos.activated_at_ms, sos.escalation
                ),
            });
        }
        Ok(())
    }
}

/// Countdown seconds stay within the grace period.
///
/// Counting shows `1..=countdown_secs`, active shows zero, and idle or
/// resolved show the configured default.
pub struct CountdownInRange;

impl Invariant for CountdownInRange {
    fn kind(&self) -> InvariantKind {
        InvariantKind::CountdownInRange
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let shown = state.sos.countdown_seconds;
        let ok = match state.sos.status {
            SosStatus::Countdown => (1..=state.countdown_secs).contains(&shown),
            SosStatus::Active => shown == 0,
            SosStatus::Idle | SosStatus::Resolved => shown == state.countdown_secs,
        };
        if !ok {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "status {} shows {shown}s with a {}s grace period",
                    state.sos.status, state.countdown_secs
                ),
            });
        }
        Ok(())
    }
}

/// Check-in remaining seconds stay within the selected duration.
pub struct CheckInRemainingInRange;

impl Invariant for CheckInRemainingInRange {
    fn kind(&self) -> InvariantKind {
        InvariantKind::CheckInRemainingInRange
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let checkin = &state.checkin;
        let full = checkin.duration_secs();
        let remaining = checkin.remaining_secs;
        let ok = match checkin.status {
            CheckInStatus::Setup => remaining == full,
            CheckInStatus::Running | CheckInStatus::Paused => (1..=full).contains(&remaining),
            CheckInStatus::Expired => remaining == 0,
        };
        if !ok {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("status {} with {remaining}s of {full}s left", checkin.status),
            });
        }
        Ok(())
    }
}

/// The platform has armed exactly the timers the controllers hold.
///
/// A timer armed on the platform but unknown to its controller would tick
/// forever; one held by a controller but not armed would never fire.
pub struct NoLeakedTimers;

impl Invariant for NoLeakedTimers {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NoLeakedTimers
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.controller_timers != state.driver_timers {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "controllers hold {:?}, platform has {:?}",
                    state.controller_timers, state.driver_timers
                ),
            });
        }
        Ok(())
    }
}

/// No escalation sends more alerts than the attempts it is allowed, and no
/// alert names an escalation that never happened.
pub struct AlertsWithinAttemptBudget;

impl Invariant for AlertsWithinAttemptBudget {
    fn kind(&self) -> InvariantKind {
        InvariantKind::AlertsWithinAttemptBudget
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (escalation, &sent) in &state.alerts_per_escalation {
            if sent > state.max_dispatch_attempts {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "escalation {escalation} sent {sent} alerts, {} allowed",
                        state.max_dispatch_attempts
                    ),
                });
            }
            if escalation.value() > state.escalations {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("alert for {escalation} after only {} escalations", state.escalations),
                });
            }
        }
        Ok(())
    }
}

/// The view mirrors the controllers and session data.
pub struct ViewMatchesControllers;

impl Invariant for ViewMatchesControllers {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ViewMatchesControllers
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mismatch = if state.view_sos != state.sos {
            Some(format!("sos view {:?} != {:?}", state.view_sos, state.sos))
        } else if state.view_checkin != state.checkin {
            Some(format!("check-in view {:?} != {:?}", state.view_checkin, state.checkin))
        } else if state.view_fake_call != state.fake_call {
            Some(format!("fake call view {:?} != {:?}", state.view_fake_call, state.fake_call))
        } else if state.view_recorder != state.recorder {
            Some(format!("recorder view {:?} != {:?}", state.view_recorder, state.recorder))
        } else if state.recordings.0 != state.recordings.1 {
            Some(format!("recordings bridge={} view={}", state.recordings.0, state.recordings.1))
        } else if state.view_contacts != state.contacts {
            Some(format!(
                "view shows {} contacts, bridge holds {}",
                state.view_contacts.len(),
                state.contacts.len()
            ))
        } else if state.alarm_on.0 != state.alarm_on.1 {
            Some(format!("alarm bridge={} view={}", state.alarm_on.0, state.alarm_on.1))
        } else if state.sharing_location.0 != state.sharing_location.1 {
            Some(format!(
                "location sharing bridge={} view={}",
                state.sharing_location.0, state.sharing_location.1
            ))
        } else {
            None
        };

        match mismatch {
            Some(message) => Err(Violation { invariant: self.kind(), message }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use safeline_core::{
        CheckInState, Escalation, FakeCallState, FakeCallStatus, RecorderState, RecorderStatus, SosState,
        TimerId, TimerOwner, TimerSlot, TimerMode,
    };

    use super::*;

    fn idle() -> SessionSnapshot {
        let sos = SosState {
            status: SosStatus::Idle,
            activated_at_ms: None,
            countdown_seconds: 5,
            escalation: None,
            dispatch: None,
        };
        let checkin = CheckInState { status: CheckInStatus::Setup, duration_minutes: 1, remaining_secs: 60 };
        let fake_call = FakeCallState {
            status: FakeCallStatus::Setup,
            delay_secs: 5,
            elapsed_secs: 0,
            caller_name: "Mom".into(),
        };
        let recorder = RecorderState { status: RecorderStatus::Idle, elapsed_secs: 0 };
        SessionSnapshot {
            view_sos: sos.clone(),
            sos,
            countdown_secs: 5,
            max_dispatch_attempts: 3,
            escalations: 0,
            view_checkin: checkin,
            checkin,
            view_fake_call: fake_call.clone(),
            fake_call,
            view_recorder: recorder,
            recorder,
            recordings: (0, 0),
            contacts: vec![],
            view_contacts: vec![],
            alarm_on: (false, false),
            sharing_location: (false, false),
            controller_timers: BTreeSet::new(),
            driver_timers: BTreeSet::new(),
            alerts_per_escalation: BTreeMap::new(),
        }
    }

    fn some_timer() -> TimerId {
        let mut slot = TimerSlot::new(TimerOwner::Sos);
        let _ = slot.arm(std::time::Duration::from_secs(1), TimerMode::Repeating);
        slot.armed().unwrap()
    }

    #[test]
    fn resting_session_holds_everything() {
        let snapshot = idle();
        let registry = crate::InvariantRegistry::standard();
        assert!(registry.check_all(&snapshot).is_ok());
    }

    #[test]
    fn detects_activation_time_outside_active() {
        let mut snapshot = idle();
        snapshot.sos.activated_at_ms = Some(1);
        assert!(ActivatedAtIffActive.check(&snapshot).is_err());
    }

    #[test]
    fn detects_leaked_platform_timer() {
        let mut snapshot = idle();
        snapshot.driver_timers.insert(some_timer());
        let violation = NoLeakedTimers.check(&snapshot).unwrap_err();
        assert_eq!(violation.invariant, InvariantKind::NoLeakedTimers);
    }

    #[test]
    fn detects_alert_storm() {
        let mut snapshot = idle();
        snapshot.escalations = 1;
        snapshot.alerts_per_escalation.insert(Escalation::new(1), 4);
        assert!(AlertsWithinAttemptBudget.check(&snapshot).is_err());
    }

    #[test]
    fn detects_stale_view() {
        let mut snapshot = idle();
        snapshot.view_checkin.remaining_secs = 59;
        assert!(ViewMatchesControllers.check(&snapshot).is_err());
        assert!(CheckInRemainingInRange.check(&snapshot).is_ok());
    }

    #[test]
    fn detects_recorder_clock_out_of_step() {
        let mut snapshot = idle();
        snapshot.recorder.status = RecorderStatus::Recording;
        snapshot.recorder.elapsed_secs = 3;
        assert!(ViewMatchesControllers.check(&snapshot).is_err());

        snapshot.view_recorder = snapshot.recorder;
        snapshot.recordings = (2, 1);
        assert!(ViewMatchesControllers.check(&snapshot).is_err());
    }

    #[test]
    fn detects_countdown_overrun() {
        let mut snapshot = idle();
        snapshot.sos.status = SosStatus::Countdown;
        snapshot.sos.countdown_seconds = 6;
        assert!(CountdownInRange.check(&snapshot).is_err());
    }
}
