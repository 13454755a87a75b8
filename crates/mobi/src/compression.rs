use crate::error::{MobiError, Result};

/// Decompresses one PalmDoc-compressed text record.
///
/// Each input byte is a control byte:
/// - `0x00`, `0x09..=0x7F`: a literal byte.
/// - `0x01..=0x08`: that many following bytes are copied verbatim.
/// - `0x80..=0xBF`: with the next byte, an 11-bit distance and a 3-bit
///   length (plus 3) into the output decoded so far.
/// - `0xC0..=0xFF`: a space followed by `byte ^ 0x80`.
///
/// Back-references may overlap the bytes they produce, so they are copied one
/// byte at a time from the growing output.
pub fn palmdoc_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(data.len() * 2);
    let mut i = 0usize;

    while i < data.len() {
        let frame = data[i];
        i += 1;

        match frame {
            0x01..=0x08 => {
                let n = frame as usize;
                let run = data.get(i..i + n).ok_or_else(|| {
                    MobiError::Decompression(format!(
                        "literal run of {n} bytes at input offset {} has only {} bytes left",
                        i - 1,
                        data.len() - i
                    ))
                })?;
                out.extend_from_slice(run);
                i += n;
            }

            0x00 | 0x09..=0x7F => out.push(frame),

            0x80..=0xBF => {
                let second = *data.get(i).ok_or_else(|| {
                    MobiError::Decompression(format!(
                        "back-reference at input offset {} is truncated",
                        i - 1
                    ))
                })?;
                i += 1;

                let token = u16::from_be_bytes([frame, second]);
                let distance = ((token >> 3) & 0x07FF) as usize;
                let length = ((token & 0x07) + 3) as usize;

                if distance == 0 || distance > out.len() {
                    return Err(MobiError::Decompression(format!(
                        "back-reference distance {distance} at input offset {} exceeds {} decoded bytes",
                        i - 2,
                        out.len()
                    )));
                }

                let start = out.len() - distance;
                for k in 0..length {
                    let byte = out[start + k];
                    out.push(byte);
                }
            }

            0xC0..=0xFF => {
                out.push(b' ');
                out.push(frame ^ 0x80);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::literal_run(&[0x03, b'a', b'b', b'c'], b"abc")]
    #[case::space_and_letter(&[0xC1], b" A")]
    #[case::plain_literal(&[0x41], b"A")]
    #[case::nul_literal(&[0x00, 0x7F], b"\x00\x7F")]
    #[case::overlapping_copy(&[b'a', b'b', 0x80, 0x11], b"ababab")]
    #[case::run_of_one_byte(&[b'x', 0x80, 0x0F], b"xxxxxxxxxxx")]
    #[case::empty(&[], b"")]
    fn decodes(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(palmdoc_decompress(input).unwrap(), expected);
    }

    #[test]
    fn binary_run_keeps_high_bytes() {
        let input = [0x02, 0xC1, 0x80, b'!'];
        assert_eq!(palmdoc_decompress(&input).unwrap(), [0xC1, 0x80, b'!']);
    }

    #[rstest]
    #[case::reference_before_start(&[b'a', 0x80, 0x11])]
    #[case::zero_distance(&[b'a', 0x80, 0x01])]
    #[case::reference_on_empty_output(&[0x80, 0x11])]
    #[case::truncated_reference(&[b'a', 0x80])]
    #[case::truncated_run(&[0x04, b'a', b'b'])]
    fn rejects(#[case] input: &[u8]) {
        let err = palmdoc_decompress(input).unwrap_err();
        assert!(matches!(err, MobiError::Decompression(_)), "{err}");
    }

    #[test]
    fn round_trips_reference_compressor() {
        let text = b"It was the best of times, it was the worst of times, \
                     it was the age of wisdom, it was the age of foolishness.";
        let compressed = palmdoc_compression::compress(text);
        assert_eq!(palmdoc_decompress(&compressed).unwrap(), text);
    }

    #[test]
    fn is_deterministic() {
        let input = [0x03, b'a', b'b', b'c', 0x80, 0x1A, 0xE9, 0x21];
        assert_eq!(
            palmdoc_decompress(&input).unwrap(),
            palmdoc_decompress(&input).unwrap()
        );
    }
}
