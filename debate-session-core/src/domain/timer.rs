/// State of the local debate countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not yet started (or stopped on leave).
    Idle,
    /// Counting down once per tick.
    Running,
    /// Reached zero; will not tick again.
    Expired,
}

/// Events produced by advancing the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining_secs: u32 },
    Expired,
}

/// Local countdown for one debate.
///
/// Both participants run their own copy, started by the shared
/// `timerStarted` flag; the countdowns are not synchronized after start
/// and drift between the two sides is accepted. The caller drives
/// [`DebateTimer::tick`] once per second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateTimer {
    total_secs: u32,
    remaining_secs: u32,
    state: TimerState,
}

impl DebateTimer {
    pub fn new(duration_minutes: u32) -> Self {
        let total_secs = duration_minutes * 60;
        Self {
            total_secs,
            remaining_secs: total_secs,
            state: TimerState::Idle,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Start the countdown. Returns `false` when already started or
    /// expired; the flag is one-way.
    pub fn start(&mut self) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.remaining_secs = self.total_secs;
        self.state = TimerState::Running;
        tracing::debug!(total_secs = self.total_secs, "debate countdown started");
        true
    }

    /// Advance by one second. Emits `Expired` exactly once when the
    /// countdown reaches zero; returns `None` when not running.
    ///
    /// Saturates at zero so a record that slipped in with a zero
    /// duration expires on its first tick instead of underflowing.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            return Some(TimerEvent::Expired);
        }
        Some(TimerEvent::Tick {
            remaining_secs: self.remaining_secs,
        })
    }

    /// Halt the countdown on leave. Safe to call in any state.
    pub fn stop(&mut self) {
        self.state = TimerState::Idle;
    }

    /// `mm:ss` rendering of the remaining time.
    pub fn format_remaining(&self) -> String {
        let mins = self.remaining_secs / 60;
        let secs = self.remaining_secs % 60;
        format!("{mins:02}:{secs:02}")
    }
}
