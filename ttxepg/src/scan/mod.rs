//! Channel scan state machine, grounded in `epgctl/epgscan.c`'s per-channel
//! state machine (RESET → WAIT_SIGNAL → WAIT_DVB_PID → WAIT_ANY → WAIT_NI →
//! DONE).

use std::time::Duration;

/// TTX_DETECTION threshold: a scan window counts as "teletext found" once
/// both bounds are met.
const MIN_PACKETS: u32 = 15;
const MIN_PAGES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Reset,
    WaitSignal,
    WaitDvbPid,
    WaitAny,
    WaitNi,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    TtxFound,
    NoTtx,
}

/// Per-channel acquisition evidence the controller watches while waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanEvidence {
    pub video_present: bool,
    pub dvb_pid: Option<i32>,
    pub packet_count: u32,
    pub distinct_pages: u32,
    pub cni_wait_hint: bool,
    pub cni_confirmed: bool,
}

impl ScanEvidence {
    fn ttx_detected(&self) -> bool {
        self.packet_count >= MIN_PACKETS && self.distinct_pages >= MIN_PAGES
    }
}

#[derive(Debug, Clone)]
pub struct ScanController {
    state: ScanState,
    slow_mode: bool,
    predefined_list: bool,
    elapsed: Duration,
    pub result: Option<ScanResult>,
}

impl ScanController {
    pub fn new(slow_mode: bool, predefined_list: bool) -> Self {
        ScanController {
            state: ScanState::Reset,
            slow_mode,
            predefined_list,
            elapsed: Duration::ZERO,
            result: None,
        }
    }

    fn deadline(&self, base_secs: u64) -> Duration {
        let secs = if self.slow_mode { base_secs * 2 } else { base_secs };
        Duration::from_secs(secs)
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Advances the state machine by `tick` and returns the number of
    /// milliseconds to wait before the next tick, per the host's scheduling
    /// contract.
    pub fn tick(&mut self, tick: Duration, evidence: &ScanEvidence) -> u64 {
        self.elapsed += tick;

        match self.state {
            ScanState::Reset => {
                self.elapsed = Duration::ZERO;
                self.state = ScanState::WaitSignal;
            }
            ScanState::WaitSignal => {
                let advance = evidence.video_present
                    || evidence.packet_count > 0
                    || self.slow_mode
                    || self.predefined_list;
                if advance {
                    self.elapsed = Duration::ZERO;
                    self.state = ScanState::WaitDvbPid;
                } else if self.elapsed >= self.deadline(2) {
                    self.finish(ScanResult::NoTtx);
                }
            }
            ScanState::WaitDvbPid => {
                if let Some(pid) = evidence.dvb_pid {
                    self.elapsed = Duration::ZERO;
                    if pid > 0 {
                        self.state = ScanState::WaitAny;
                    } else {
                        self.finish(ScanResult::NoTtx);
                    }
                } else if self.elapsed >= self.deadline(4) {
                    self.finish(ScanResult::NoTtx);
                }
            }
            ScanState::WaitAny => {
                if evidence.ttx_detected() {
                    self.elapsed = Duration::ZERO;
                    self.state = ScanState::WaitNi;
                } else {
                    let extended = evidence.packet_count > 1;
                    let deadline = self.deadline(if extended { 4 } else { 2 });
                    if self.elapsed >= deadline {
                        self.finish(if evidence.ttx_detected() { ScanResult::TtxFound } else { ScanResult::NoTtx });
                    }
                }
            }
            ScanState::WaitNi => {
                if evidence.cni_confirmed {
                    self.finish(ScanResult::TtxFound);
                } else if self.elapsed >= self.deadline(6) {
                    self.finish(ScanResult::TtxFound);
                }
            }
            ScanState::Done => {}
        }

        50 + (self.elapsed.as_millis() % 200) as u64
    }

    fn finish(&mut self, result: ScanResult) {
        self.result = Some(result);
        self.state = ScanState::Done;
    }

    pub fn reset_for_next_channel(&mut self) {
        self.state = ScanState::Reset;
        self.elapsed = Duration::ZERO;
        self.result = None;
    }
}

/// `channels_scanned / (total_channels + 1)`, or `1.0` once the total is
/// unknown and scanning has stopped.
pub fn fraction_done(channels_scanned: u32, total_channels: Option<u32>) -> f64 {
    match total_channels {
        Some(total) => channels_scanned as f64 / (total as f64 + 1.0),
        None => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_signal_advances_immediately_with_video_present() {
        let mut ctl = ScanController::new(false, false);
        ctl.tick(Duration::from_millis(100), &ScanEvidence::default());
        assert_eq!(ctl.state(), ScanState::WaitSignal);
        let evidence = ScanEvidence { video_present: true, ..Default::default() };
        ctl.tick(Duration::from_millis(100), &evidence);
        assert_eq!(ctl.state(), ScanState::WaitDvbPid);
    }

    #[test]
    fn wait_signal_times_out_to_done_without_evidence() {
        let mut ctl = ScanController::new(false, false);
        ctl.tick(Duration::from_millis(0), &ScanEvidence::default());
        ctl.tick(Duration::from_secs(3), &ScanEvidence::default());
        assert_eq!(ctl.state(), ScanState::Done);
        assert_eq!(ctl.result, Some(ScanResult::NoTtx));
    }

    #[test]
    fn fraction_done_computes_against_total_plus_one() {
        assert!((fraction_done(4, Some(9)) - 0.4).abs() < 1e-9);
        assert_eq!(fraction_done(4, None), 1.0);
    }
}
