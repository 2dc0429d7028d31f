//! Gemeinsame Mocks für die Integration Tests
//!
//! - MockDutyWriter: merkt sich alle geschriebenen Duty-Werte
//! - RecordingSink: merkt sich alle gesendeten Frames

#![allow(dead_code)]

use esp_core::{
    ChannelDuties, DutyWriter, FrameSink, LampController, OutboundFrame, OutputError, StatePayload, SyncAck,
};

// ============================================================================
// Mock Duty Writer
// ============================================================================

#[derive(Default)]
pub struct MockDutyWriter {
    pub writes: Vec<ChannelDuties>,
    pub fail_next_write: bool,
}

impl MockDutyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<ChannelDuties> {
        self.writes.last().copied()
    }
}

impl DutyWriter for MockDutyWriter {
    fn write(&mut self, duties: ChannelDuties) -> Result<(), OutputError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(OutputError::WriteFailed);
        }
        self.writes.push(duties);
        Ok(())
    }
}

// ============================================================================
// Recording Frame Sink
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<OutboundFrame>,
}

impl RecordingSink {
    pub fn states(&self) -> Vec<StatePayload> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                OutboundFrame::State(s) => Some(*s),
                OutboundFrame::Ack(_) => None,
            })
            .collect()
    }

    pub fn acks(&self) -> Vec<SyncAck> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                OutboundFrame::Ack(a) => Some(*a),
                OutboundFrame::State(_) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl FrameSink for RecordingSink {
    fn broadcast(&mut self, frame: OutboundFrame) {
        self.frames.push(frame);
    }
}

// ============================================================================
// Helfer
// ============================================================================

pub type TestController = LampController<MockDutyWriter, RecordingSink>;

pub fn controller() -> TestController {
    LampController::new(MockDutyWriter::new(), RecordingSink::default())
}

/// Unix-Zeit in ms für 2024-01-15 hh:mm:00 UTC
pub fn epoch_ms_at(hour: u32, minute: u32) -> i64 {
    const MIDNIGHT_2024_01_15_MS: i64 = 1_705_276_800_000;
    MIDNIGHT_2024_01_15_MS + i64::from(hour * 3600 + minute * 60) * 1000
}

/// Sendet einen Frame und erwartet, dass er akzeptiert wird
pub fn send(controller: &mut TestController, frame: &str, now_ms: u64) {
    controller
        .handle_frame(frame.as_bytes(), now_ms)
        .expect("frame should parse");
}

/// Setzt die Uhr per time_sync auf hh:mm (UTC) zum Zeitpunkt `now_ms`
pub fn set_clock(controller: &mut TestController, hour: u32, minute: u32, now_ms: u64) {
    let frame = format!(r#"{{"type":"time_sync","timestamp":{}}}"#, epoch_ms_at(hour, minute));
    send(controller, &frame, now_ms);
}
