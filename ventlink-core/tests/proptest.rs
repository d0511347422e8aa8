//! Property-based tests using proptest

use proptest::prelude::*;
use ventlink_core::states::{Announcement, CycleMeasurements, Ping, SensorMeasurements};
use ventlink_core::{
    BackendMessage, BackendReceiver, BackendSender, FrameBuffer, StateSegment,
};
use ventlink_protocol::{Crc32c, OutputStatus};

fn segment_strategy() -> impl Strategy<Value = StateSegment> {
    prop_oneof![
        (any::<u32>(), any::<u32>()).prop_map(|(time, id)| StateSegment::Ping(Ping { time, id })),
        (any::<u32>(), any::<u32>(), -100.0f32..100.0, 0.0f32..120.0).prop_map(
            |(time, cycle, paw, flow)| {
                StateSegment::SensorMeasurements(SensorMeasurements {
                    time,
                    cycle,
                    paw,
                    flow,
                    ..Default::default()
                })
            }
        ),
        (any::<u32>(), 0.0f32..60.0).prop_map(|(time, rr)| {
            StateSegment::CycleMeasurements(CycleMeasurements {
                time,
                rr,
                ..Default::default()
            })
        }),
        (any::<u32>(), prop::collection::vec(any::<u8>(), 0..=64)).prop_map(|(time, bytes)| {
            let mut announcement = Announcement {
                time,
                ..Default::default()
            };
            announcement.announcement.extend_from_slice(&bytes).unwrap();
            StateSegment::Announcement(announcement)
        }),
    ]
}

proptest! {
    #[test]
    fn prop_full_stack_round_trip(
        segments in prop::collection::vec(segment_strategy(), 1..16)
    ) {
        let mut sender = BackendSender::new(Crc32c);
        let mut receiver = BackendReceiver::new(Crc32c);
        let mut frame = FrameBuffer::new();
        let mut received = BackendMessage::new();

        for segment in segments {
            let message = BackendMessage::from_payload(segment);
            sender.transform(&message, &mut frame).unwrap();

            for &byte in frame.iter() {
                receiver.input(byte).unwrap();
            }
            prop_assert_eq!(receiver.output(&mut received), Ok(OutputStatus::Available));
            prop_assert_eq!(&received, &message);
        }
    }

    #[test]
    fn prop_receiver_survives_noise(
        noise in prop::collection::vec(any::<u8>(), 0..1024),
        id in any::<u32>()
    ) {
        let mut receiver = BackendReceiver::new(Crc32c);
        let mut received = BackendMessage::new();
        for byte in noise {
            let _ = receiver.input(byte);
            let _ = receiver.output(&mut received);
        }
        // Flush whatever partial chunk the noise left behind
        let _ = receiver.input(0x00);
        let _ = receiver.output(&mut received);

        let mut sender = BackendSender::new(Crc32c);
        let mut frame = FrameBuffer::new();
        let message = BackendMessage::from_payload(StateSegment::Ping(Ping { time: 0, id }));
        sender.transform(&message, &mut frame).unwrap();
        for &byte in frame.iter() {
            receiver.input(byte).unwrap();
        }
        prop_assert_eq!(receiver.output(&mut received), Ok(OutputStatus::Available));
        prop_assert_eq!(received.payload(), message.payload());
    }
}
