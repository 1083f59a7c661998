// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire framing: 2-byte little-endian length prefix.
//!
//! The codec is a pure framing boundary and never interprets payload
//! contents.

/// Protocol ceiling for a single frame payload.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Size of the length header in bytes.
pub const HEADER_LEN: usize = 2;

/// Wrap a command payload in a length-prefixed frame.
///
/// # Panics
///
/// Panics if the payload exceeds [`MAX_PAYLOAD`] bytes. The protocol
/// cannot represent such a frame, so this is a programming error rather
/// than a recoverable condition.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD,
        "frame payload of {} bytes exceeds the protocol ceiling",
        payload.len()
    );

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Read the payload length from a frame header.
pub fn decode_length(header: [u8; HEADER_LEN]) -> u16 {
    u16::from_le_bytes(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_prepends_length() {
        let frame = encode(&[0x00, 0x0C]);
        assert_eq!(frame, vec![0x02, 0x00, 0x00, 0x0C]);
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode(&[]), vec![0x00, 0x00]);
    }

    #[test]
    fn test_length_is_little_endian() {
        let payload = vec![0xAA; 0x0201];
        let frame = encode(&payload);
        assert_eq!(frame[0], 0x01);
        assert_eq!(frame[1], 0x02);
    }

    #[test]
    fn test_roundtrip() {
        for len in [0usize, 1, 2, 16, 255, 256, 1000, MAX_PAYLOAD] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let frame = encode(&payload);
            let length = decode_length([frame[0], frame[1]]);
            assert_eq!(length as usize, payload.len());
            assert_eq!(&frame[HEADER_LEN..], &payload[..]);
        }
    }

    #[test]
    #[should_panic(expected = "exceeds the protocol ceiling")]
    fn test_oversized_payload_panics() {
        encode(&vec![0u8; MAX_PAYLOAD + 1]);
    }
}
