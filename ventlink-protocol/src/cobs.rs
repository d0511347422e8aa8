//! Consistent Overhead Byte Stuffing
//!
//! Encoded data never contains the delimiter byte `0x00`. Each run of
//! non-zero bytes is prefixed with a code byte holding the run length plus
//! one; a code of `0xFF` marks a maximal run of 254 bytes that is not
//! followed by an implicit zero.
//!
//! ```text
//! 98 DB E3 55 01 05 01 02 03 04 05
//!   -> 0C 98 DB E3 55 01 05 01 02 03 04 05
//! 11 22 00 33
//!   -> 03 11 22 02 33
//! ```
//!
//! The encoder does not append the delimiter itself; see
//! [`FrameSender`](crate::frames::FrameSender).

use crate::status::ByteBuffer;

/// Delimiter that byte stuffing removes from the data
pub const DELIMITER: u8 = 0x00;

/// Longest run of non-zero bytes a single code byte can describe
pub const MAX_RUN: usize = 254;

/// Code byte marking a maximal run without an implicit trailing zero
const MAX_CODE: u8 = 0xFF;

/// Errors that can occur while byte stuffing or unstuffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CobsError {
    /// Destination buffer cannot hold the result
    BufferTooSmall,
    /// Input is not a valid byte-stuffed sequence
    InvalidEncoding,
}

/// Number of bytes `input` occupies once encoded
pub fn encoded_len(input: &[u8]) -> usize {
    let mut len = 1;
    let mut code: u8 = 1;
    for &byte in input {
        if byte != DELIMITER {
            len += 1;
            code += 1;
        }
        if byte == DELIMITER || code == MAX_CODE {
            len += 1;
            code = 1;
        }
    }
    len
}

/// Encode `input` into `output`, replacing the previous contents
///
/// Returns the encoded length. Fails with [`CobsError::BufferTooSmall`]
/// before touching `output` if the encoded form does not fit.
pub fn encode<const N: usize>(input: &[u8], output: &mut ByteBuffer<N>) -> Result<usize, CobsError> {
    let len = encoded_len(input);
    if len > N {
        return Err(CobsError::BufferTooSmall);
    }

    output.clear();
    let mut code_index = 0;
    let mut code: u8 = 1;
    output.push(code).map_err(|_| CobsError::BufferTooSmall)?;

    for &byte in input {
        if byte != DELIMITER {
            output.push(byte).map_err(|_| CobsError::BufferTooSmall)?;
            code += 1;
        }
        if byte == DELIMITER || code == MAX_CODE {
            output[code_index] = code;
            code = 1;
            code_index = output.len();
            output.push(code).map_err(|_| CobsError::BufferTooSmall)?;
        }
    }
    output[code_index] = code;

    Ok(output.len())
}

/// Number of bytes `input` decodes to
///
/// Fails with [`CobsError::InvalidEncoding`] if `input` contains a zero byte
/// or a run that extends past its end.
pub fn decoded_len(input: &[u8]) -> Result<usize, CobsError> {
    let mut len = 0;
    let mut index = 0;
    while index < input.len() {
        let code = input[index];
        if code == DELIMITER {
            return Err(CobsError::InvalidEncoding);
        }
        index += 1;

        let run = usize::from(code) - 1;
        let end = index + run;
        if end > input.len() || input[index..end].contains(&DELIMITER) {
            return Err(CobsError::InvalidEncoding);
        }
        len += run;
        index = end;

        if code != MAX_CODE && index < input.len() {
            len += 1;
        }
    }
    Ok(len)
}

/// Decode `input` into `output`, replacing the previous contents
///
/// Returns the decoded length. On failure `output` is left unchanged.
pub fn decode<const N: usize>(input: &[u8], output: &mut ByteBuffer<N>) -> Result<usize, CobsError> {
    if decoded_len(input)? > N {
        return Err(CobsError::BufferTooSmall);
    }

    output.clear();
    let mut index = 0;
    while index < input.len() {
        let code = input[index];
        index += 1;

        let end = index + usize::from(code) - 1;
        output
            .extend_from_slice(&input[index..end])
            .map_err(|_| CobsError::BufferTooSmall)?;
        index = end;

        if code != MAX_CODE && index < input.len() {
            output.push(DELIMITER).map_err(|_| CobsError::BufferTooSmall)?;
        }
    }

    Ok(output.len())
}
