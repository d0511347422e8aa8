use anyhow::{anyhow, Context, Result};
use std::fs;
use tracing::info;
use ventlink_core::states::{Ping, SensorMeasurements};
use ventlink_core::{
    BackendMessage, BackendSender, FrameBuffer, MessageType, States, STATE_SYNC_SCHEDULE,
};
use ventlink_protocol::{Crc32c, StateSynchronizer};

/// One frame emitted by the schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub time: u32,
    pub seq: u8,
    pub tag: MessageType,
    pub bytes: Vec<u8>,
}

/// Run the output schedule for `ticks` ticks after `start_time`
///
/// The sensor measurements and ping records are stamped with the current
/// tick so consecutive frames differ.
pub fn encode_frames(start_time: u32, ticks: u32) -> Result<Vec<EncodedFrame>> {
    let mut states = States::new();
    let mut synchronizer = StateSynchronizer::new(&STATE_SYNC_SCHEDULE);
    let mut sender = BackendSender::new(Crc32c);
    let mut message = BackendMessage::new();
    let mut frame = FrameBuffer::new();
    let mut frames = Vec::new();

    for tick in 1..=ticks {
        let time = start_time.wrapping_add(tick);
        states.set_sensor_measurements(SensorMeasurements {
            time,
            ..*states.sensor_measurements()
        });
        states.set_ping(Ping { time, id: tick });

        synchronizer.input_time(time);
        let status = synchronizer
            .output(&states, &mut message)
            .map_err(|err| anyhow!("Schedule output failed at tick {}: {:?}", time, err))?;
        if !status.is_available() {
            continue;
        }

        let seq = sender.next_seq();
        sender
            .transform(&message, &mut frame)
            .map_err(|err| anyhow!("Failed to encode {}: {:?}", message.tag().name(), err))?;
        frames.push(EncodedFrame {
            time,
            seq,
            tag: message.tag(),
            bytes: frame.to_vec(),
        });
    }

    Ok(frames)
}

pub fn execute(ticks: u32, start_time: u32, output: Option<&str>) -> Result<()> {
    info!("Running schedule for {} ticks from t={}", ticks, start_time);

    let frames = encode_frames(start_time, ticks)?;
    for frame in &frames {
        println!(
            "t={:<8} seq={:<3} {:<20} {}",
            frame.time,
            frame.seq,
            frame.tag.name(),
            hex::encode(&frame.bytes)
        );
    }

    if let Some(path) = output {
        let stream: Vec<u8> = frames.iter().flat_map(|frame| frame.bytes.iter().copied()).collect();
        fs::write(path, &stream)
            .with_context(|| format!("Failed to write output file: {}", path))?;
        info!("Wrote {} bytes to {}", stream.len(), path);
    }

    info!("Encoded {} frames", frames.len());
    Ok(())
}
