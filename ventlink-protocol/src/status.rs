//! Status and error values shared by every protocol layer

use heapless::Vec;

/// Fixed-capacity byte buffer used at every layer boundary
pub type ByteBuffer<const N: usize> = Vec<u8, N>;

/// Result of polling a layer for its next output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputStatus {
    /// An output was written to the caller's buffer
    Available,
    /// Nothing to output yet
    Waiting,
}

impl OutputStatus {
    /// Returns true if an output was produced
    pub fn is_available(&self) -> bool {
        matches!(self, OutputStatus::Available)
    }
}

/// Buffer indexing failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndexError {
    /// The read or write would fall outside the buffer
    OutOfBounds,
}

/// Replace the contents of `buffer` with `bytes`
///
/// Fails without touching `buffer` if `bytes` does not fit.
pub(crate) fn overwrite<const N: usize>(
    buffer: &mut ByteBuffer<N>,
    bytes: &[u8],
) -> Result<(), IndexError> {
    if bytes.len() > N {
        return Err(IndexError::OutOfBounds);
    }
    buffer.clear();
    buffer
        .extend_from_slice(bytes)
        .map_err(|_| IndexError::OutOfBounds)
}
