//! Periodic state synchronization
//!
//! The synchronizer walks a fixed schedule of record types cyclically. Each
//! entry waits `delay` ticks after the previous output before its record is
//! emitted; at most one record is emitted per output call, and missed slots
//! are not queued. Inbound records go straight to the state store,
//! independent of the outbound schedule.

use crate::messages::{Message, TaggedUnion};
use crate::status::OutputStatus;

/// Errors reported by the state synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Message carries no record, or the store has no record for the tag
    InvalidType,
}

/// One slot of an output schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleEntry<Tag> {
    /// Ticks to wait after the previous output
    pub delay: u32,
    /// Record type emitted in this slot
    pub tag: Tag,
}

impl<Tag> ScheduleEntry<Tag> {
    pub const fn new(delay: u32, tag: Tag) -> Self {
        Self { delay, tag }
    }
}

/// Application state exchanged over the link
pub trait StateStore<T: TaggedUnion> {
    /// Store a received record
    fn input(&mut self, record: &T);

    /// Current record of type `tag`, if the type is one the store holds
    fn output(&self, tag: T::Tag) -> Option<T>;
}

/// Decides which record to emit on each tick
///
/// The synchronizer holds only the schedule and its clock. The state store
/// is borrowed for each [`input`](Self::input) or [`output`](Self::output)
/// call, so the owner can update it between ticks.
#[derive(Debug, Clone)]
pub struct StateSynchronizer<'a, Tag> {
    schedule: &'a [ScheduleEntry<Tag>],
    current_time: u32,
    last_output_time: u32,
    cursor: usize,
}

impl<'a, Tag: Copy + Eq> StateSynchronizer<'a, Tag> {
    /// Create a synchronizer starting at the first schedule entry at time 0
    pub fn new(schedule: &'a [ScheduleEntry<Tag>]) -> Self {
        Self {
            schedule,
            current_time: 0,
            last_output_time: 0,
            cursor: 0,
        }
    }

    /// Current time in ticks
    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    /// The schedule entry that will be emitted next
    pub fn next_entry(&self) -> Option<&ScheduleEntry<Tag>> {
        self.schedule.get(self.cursor)
    }

    /// Advance the clock
    ///
    /// Time is compared with wrapping arithmetic, so the tick counter may
    /// roll over.
    pub fn input_time(&mut self, time: u32) {
        self.current_time = time;
    }

    /// Store the record carried by an inbound message
    pub fn input<T, S>(&self, store: &mut S, message: &Message<T>) -> Result<(), SyncError>
    where
        T: TaggedUnion<Tag = Tag>,
        S: StateStore<T>,
    {
        let record = message.payload().ok_or(SyncError::InvalidType)?;
        store.input(record);
        Ok(())
    }

    /// Write the next scheduled record into `message` once its delay elapsed
    ///
    /// The cursor moves on even when the store cannot provide the record.
    pub fn output<T, S>(
        &mut self,
        store: &S,
        message: &mut Message<T>,
    ) -> Result<OutputStatus, SyncError>
    where
        T: TaggedUnion<Tag = Tag>,
        S: StateStore<T>,
    {
        let Some(entry) = self.schedule.get(self.cursor).copied() else {
            return Ok(OutputStatus::Waiting);
        };
        if self.current_time.wrapping_sub(self.last_output_time) < entry.delay {
            return Ok(OutputStatus::Waiting);
        }

        self.cursor = (self.cursor + 1) % self.schedule.len();
        self.last_output_time = self.current_time;

        match store.output(entry.tag) {
            Some(record) if record.tag() == entry.tag => {
                message.set(record);
                Ok(OutputStatus::Available)
            }
            _ => Err(SyncError::InvalidType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::tests::{TestRecord, TestTag};

    #[derive(Debug, Default)]
    struct TestStore {
        counter: u32,
        pair: (u8, u8),
    }

    impl StateStore<TestRecord> for TestStore {
        fn input(&mut self, record: &TestRecord) {
            match *record {
                TestRecord::Counter(value) => self.counter = value,
                TestRecord::Pair(a, b) => self.pair = (a, b),
            }
        }

        fn output(&self, tag: TestTag) -> Option<TestRecord> {
            match tag {
                TestTag::Counter => Some(TestRecord::Counter(self.counter)),
                TestTag::Pair => Some(TestRecord::Pair(self.pair.0, self.pair.1)),
                TestTag::Unrecognized => None,
            }
        }
    }

    const SCHEDULE: [ScheduleEntry<TestTag>; 3] = [
        ScheduleEntry::new(10, TestTag::Counter),
        ScheduleEntry::new(10, TestTag::Pair),
        ScheduleEntry::new(10, TestTag::Counter),
    ];

    #[test]
    fn test_waits_for_delay() {
        let store = TestStore::default();
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        let mut message = Message::<TestRecord>::new();

        sync.input_time(8);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Waiting));
        assert_eq!(message.tag(), TestTag::Unrecognized);

        sync.input_time(18);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Available));
        assert_eq!(message.payload(), Some(&TestRecord::Counter(0)));
    }

    #[test]
    fn test_clock_follows_input_time() {
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        assert_eq!(sync.current_time(), 0);

        sync.input_time(25);
        assert_eq!(sync.current_time(), 25);
        sync.input_time(3);
        assert_eq!(sync.current_time(), 3);
    }

    #[test]
    fn test_one_output_per_interval() {
        let store = TestStore::default();
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        let mut message = Message::<TestRecord>::new();

        // Long gap: only one output, no catching up
        sync.input_time(100);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Available));
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Waiting));
        assert_eq!(sync.next_entry().map(|entry| entry.tag), Some(TestTag::Pair));
    }

    #[test]
    fn test_schedule_fairness() {
        let store = TestStore::default();
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        let mut message = Message::<TestRecord>::new();
        let mut emitted = [TestTag::Unrecognized; 6];
        let mut count = 0;

        for time in 1..=(10 * 2 * SCHEDULE.len() as u32) {
            sync.input_time(time);
            if sync.output(&store, &mut message) == Ok(OutputStatus::Available) {
                emitted[count] = message.tag();
                count += 1;
            }
        }

        assert_eq!(count, 6);
        for (index, tag) in emitted.iter().enumerate() {
            assert_eq!(*tag, SCHEDULE[index % SCHEDULE.len()].tag);
        }
    }

    #[test]
    fn test_time_rollover() {
        let store = TestStore::default();
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        let mut message = Message::<TestRecord>::new();

        sync.input_time(u32::MAX - 4);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Available));

        sync.input_time(3);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Waiting));
        sync.input_time(5);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Available));
        assert_eq!(message.tag(), TestTag::Pair);
    }

    #[test]
    fn test_empty_schedule() {
        let store = TestStore::default();
        let mut sync = StateSynchronizer::<TestTag>::new(&[]);
        let mut message = Message::<TestRecord>::new();

        sync.input_time(1000);
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Waiting));
    }

    #[test]
    fn test_unavailable_record_advances_cursor() {
        let schedule = [
            ScheduleEntry::new(0, TestTag::Unrecognized),
            ScheduleEntry::new(0, TestTag::Pair),
        ];
        let store = TestStore::default();
        let mut sync = StateSynchronizer::new(&schedule);
        let mut message = Message::<TestRecord>::new();

        assert_eq!(sync.output(&store, &mut message), Err(SyncError::InvalidType));
        assert_eq!(sync.output(&store, &mut message), Ok(OutputStatus::Available));
        assert_eq!(message.tag(), TestTag::Pair);
    }

    #[test]
    fn test_input_updates_store() {
        let mut store = TestStore::default();
        let sync = StateSynchronizer::new(&SCHEDULE);

        let message = Message::from_payload(TestRecord::Pair(3, 4));
        sync.input(&mut store, &message).unwrap();
        assert_eq!(store.pair, (3, 4));

        assert_eq!(
            sync.input(&mut store, &Message::<TestRecord>::new()),
            Err(SyncError::InvalidType)
        );
    }

    #[test]
    fn test_output_reflects_latest_state() {
        let mut store = TestStore::default();
        let mut sync = StateSynchronizer::new(&SCHEDULE);
        let mut message = Message::<TestRecord>::new();

        store.counter = 42;
        sync.input_time(10);
        sync.output(&store, &mut message).unwrap();
        assert_eq!(message.payload(), Some(&TestRecord::Counter(42)));
    }
}
