use std::fs;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use crate::codec::{self, deinterlace};
use crate::container::{ContainerError, parse_gif};
use crate::document::{DecodedFrame, DecodedGif, Frame, Gif, Pixel, color_table_len};
use crate::{DEFAULT_GENERATED_AT, FrameSummary, IndexCount, Report, ScreenSummary, make_stub_report};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GIF container error: {0}")]
    Container(#[from] ContainerError),
    #[error("frame {frame} has neither a local nor a global color table")]
    MissingColorTable { frame: usize },
}

/// Knobs for frame decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reorder interlaced frames into top-to-bottom rows.
    pub deinterlace: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { deinterlace: true }
    }
}

/// Decode every frame of a parsed document with default options.
pub fn decode_gif(gif: Gif) -> DecodedGif {
    decode_gif_with(gif, &DecodeOptions::default())
}

pub fn decode_gif_with(gif: Gif, options: &DecodeOptions) -> DecodedGif {
    let frames = gif
        .frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            let decoded = decode_frame(frame, options);
            if decoded.padded_pixels() > 0 {
                match &decoded.lzw_error {
                    Some(err) => warn!(
                        frame = index,
                        padded = decoded.padded_pixels(),
                        error = %err,
                        "LZW stream cut short; padding with index 0"
                    ),
                    None => warn!(
                        frame = index,
                        padded = decoded.padded_pixels(),
                        "LZW stream ended early; padding with index 0"
                    ),
                }
            }
            decoded
        })
        .collect();

    DecodedGif {
        screen: gif.screen,
        global_color_table: gif.global_color_table,
        frames,
        loop_count: gif.loop_count,
        comments: gif.comments,
    }
}

/// Expand one frame into `width * height` color indexes.
pub fn decode_frame(frame: Frame, options: &DecodeOptions) -> DecodedFrame {
    let descriptor = frame.descriptor;
    let output = codec::decode(
        frame.image_data.lzw_minimum_code_size,
        &frame.image_data.data,
        descriptor.pixel_count(),
    );
    let color_indexes = if descriptor.interlace_flag && options.deinterlace {
        deinterlace(
            &output.indexes,
            descriptor.width as usize,
            descriptor.height as usize,
        )
    } else {
        output.indexes
    };
    DecodedFrame {
        frame,
        color_indexes,
        decoded_pixels: output.decoded,
        lzw_error: output.error,
    }
}

/// Parse and decode a GIF held in memory.
pub fn decode_bytes(data: &[u8]) -> Result<DecodedGif, DecodeError> {
    decode_bytes_with(data, &DecodeOptions::default())
}

pub fn decode_bytes_with(data: &[u8], options: &DecodeOptions) -> Result<DecodedGif, DecodeError> {
    let gif = parse_gif(data)?;
    debug!(frames = gif.frames.len(), "parsed GIF document");
    Ok(decode_gif_with(gif, options))
}

pub fn decode_gif_file(path: &Path) -> Result<DecodedGif, DecodeError> {
    let data = fs::read(path)?;
    decode_bytes(&data)
}

/// Decode a GIF file and summarize it as a report.
pub fn analyze_gif_file(path: &Path) -> Result<Report, DecodeError> {
    analyze_gif_file_with(path, &DecodeOptions::default())
}

pub fn analyze_gif_file_with(path: &Path, options: &DecodeOptions) -> Result<Report, DecodeError> {
    let data = fs::read(path)?;
    let gif = decode_bytes_with(&data, options)?;
    let mut report = build_report(&path.display().to_string(), data.len() as u64, &gif);
    report.generated_at = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| OffsetDateTime::from(modified).format(&Rfc3339).ok())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    Ok(report)
}

/// Summarize a decoded document; frames keep stream order.
pub fn build_report(input_path: &str, input_bytes: u64, gif: &DecodedGif) -> Report {
    let mut report = make_stub_report(input_path, input_bytes);
    report.screen = ScreenSummary {
        width: gif.screen.width,
        height: gif.screen.height,
        background_color_index: gif.screen.background_color_index,
        global_color_table_size: gif.global_color_table.as_ref().map(Vec::len),
    };
    report.loop_count = gif.loop_count;
    report.comments = gif.comments.clone();
    report.frames = gif
        .frames
        .iter()
        .enumerate()
        .map(|(index, decoded)| summarize_frame(index, decoded))
        .collect();
    report
}

fn summarize_frame(index: usize, decoded: &DecodedFrame) -> FrameSummary {
    let frame = &decoded.frame;
    let descriptor = frame.descriptor;
    FrameSummary {
        index,
        left: descriptor.left,
        top: descriptor.top,
        width: descriptor.width,
        height: descriptor.height,
        interlaced: descriptor.interlace_flag,
        local_color_table_size: descriptor
            .local_color_table_flag
            .then(|| color_table_len(descriptor.size_of_local_color_table)),
        disposal_method: frame.control.disposal_method,
        delay_time: frame.control.delay_time,
        transparent_color_index: frame.control.transparent_index(),
        lzw_minimum_code_size: frame.image_data.lzw_minimum_code_size,
        compressed_bytes: frame.image_data.data.len(),
        pixels: decoded.color_indexes.len(),
        padded_pixels: decoded.padded_pixels(),
        lzw_error: decoded.lzw_error.as_ref().map(ToString::to_string),
        index_histogram: index_histogram(&decoded.color_indexes),
    }
}

fn index_histogram(indexes: &[u8]) -> Vec<IndexCount> {
    let mut counts = [0u64; 256];
    for &index in indexes {
        counts[index as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(index, &count)| IndexCount {
            index: index as u8,
            count,
        })
        .collect()
}

impl DecodedGif {
    /// Palette a frame draws with: its local table, else the global one.
    pub fn color_table(&self, frame: usize) -> Result<&[Pixel], DecodeError> {
        let decoded = self
            .frames
            .get(frame)
            .ok_or(DecodeError::MissingColorTable { frame })?;
        let table = if decoded.frame.descriptor.local_color_table_flag {
            decoded.frame.local_color_table.as_ref()
        } else {
            self.global_color_table.as_ref()
        };
        table
            .map(Vec::as_slice)
            .ok_or(DecodeError::MissingColorTable { frame })
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, DecodeOptions, build_report, decode_bytes, decode_bytes_with};
    use crate::codec::LzwError;
    use crate::document::{DisposalMethod, Pixel};

    // 10x10, four-color global table, one frame behind a control extension
    const SAMPLE: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0a, 0x00, 0x0a, 0x00, 0x91, 0x00, 0x00, 0xff, 0xff,
        0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x0a, 0x00, 0x00, 0x02, 0x16,
        0x8c, 0x2d, 0x99, 0x87, 0x2a, 0x1c, 0xdc, 0x33, 0xa0, 0x02, 0x75, 0xec, 0x95, 0xfa, 0xa8,
        0xde, 0x60, 0x8c, 0x04, 0x91, 0x4c, 0x01, 0x00, 0x3b,
    ];

    const SAMPLE_ROWS: [[u8; 10]; 10] = [
        [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
        [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
        [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
        [1, 1, 1, 0, 0, 0, 0, 2, 2, 2],
        [1, 1, 1, 0, 0, 0, 0, 2, 2, 2],
        [2, 2, 2, 0, 0, 0, 0, 1, 1, 1],
        [2, 2, 2, 0, 0, 0, 0, 1, 1, 1],
        [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
        [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
        [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
    ];

    fn single_pixel_gif(image_packed: u8, local_table: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0x2c, 0, 0, 0, 0, 1, 0, 1, 0, image_packed]);
        bytes.extend_from_slice(local_table);
        bytes.push(2);
        bytes.push(payload.len() as u8);
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&[0, 0x3b]);
        bytes
    }

    #[test]
    fn decode_sample_image() {
        let gif = decode_bytes(SAMPLE).unwrap();
        assert_eq!(gif.frames.len(), 1);
        let frame = &gif.frames[0];
        let expected: Vec<u8> = SAMPLE_ROWS.iter().flatten().copied().collect();
        assert_eq!(frame.color_indexes, expected);
        assert_eq!(frame.decoded_pixels, 100);
        assert_eq!(frame.lzw_error, None);

        let palette = gif.color_table(0).unwrap();
        assert_eq!(palette.len(), 4);
        assert_eq!(palette[1], Pixel { r: 255, g: 0, b: 0 });
        assert_eq!(palette[2], Pixel { r: 0, g: 0, b: 255 });
    }

    #[test]
    fn sample_report_counts_indexes() {
        let gif = decode_bytes(SAMPLE).unwrap();
        let report = build_report("sample.gif", SAMPLE.len() as u64, &gif);
        assert_eq!(report.screen.global_color_table_size, Some(4));
        let frame = &report.frames[0];
        assert_eq!(frame.disposal_method, DisposalMethod::Unspecified);
        assert_eq!(frame.compressed_bytes, 22);
        assert_eq!(frame.padded_pixels, 0);
        let counts: Vec<(u8, u64)> = frame
            .index_histogram
            .iter()
            .map(|entry| (entry.index, entry.count))
            .collect();
        assert_eq!(counts, vec![(0, 16), (1, 42), (2, 42)]);
    }

    #[test]
    fn missing_color_table() {
        // CLEAR, 0, END at three bits
        let bytes = single_pixel_gif(0, &[], &[0x44, 0x01]);
        let gif = decode_bytes(&bytes).unwrap();
        let err = gif.color_table(0).unwrap_err();
        assert!(matches!(err, DecodeError::MissingColorTable { frame: 0 }));
        assert!(matches!(
            gif.color_table(3),
            Err(DecodeError::MissingColorTable { frame: 3 })
        ));
    }

    #[test]
    fn local_color_table_takes_precedence() {
        let bytes = single_pixel_gif(0b1000_0000, &[9, 8, 7, 6, 5, 4], &[0x44, 0x01]);
        let gif = decode_bytes(&bytes).unwrap();
        assert_eq!(gif.color_table(0).unwrap()[0], Pixel { r: 9, g: 8, b: 7 });
    }

    #[test]
    fn corrupt_payload_is_padded_not_fatal() {
        // CLEAR then code 7 with next key 6
        let bytes = single_pixel_gif(0, &[], &[0x3c]);
        let gif = decode_bytes(&bytes).unwrap();
        let frame = &gif.frames[0];
        assert_eq!(frame.color_indexes, vec![0]);
        assert_eq!(frame.decoded_pixels, 0);
        assert!(matches!(
            frame.lzw_error,
            Some(LzwError::CorruptLzwStream { code: 7, .. })
        ));

        let report = build_report("corrupt.gif", bytes.len() as u64, &gif);
        assert_eq!(report.frames[0].padded_pixels, 1);
        assert!(
            report.frames[0]
                .lzw_error
                .as_deref()
                .unwrap()
                .contains("corrupt LZW stream")
        );
    }

    #[test]
    fn interlaced_frames_can_stay_in_transmission_order() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 3, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0x2c, 0, 0, 0, 0, 1, 0, 3, 0, 0b0100_0000]);
        // CLEAR, 0, 1, CLEAR, 2, END at three bits
        bytes.extend_from_slice(&[2, 3, 0x44, 0xa8, 0x02, 0, 0x3b]);

        let gif = decode_bytes(&bytes).unwrap();
        assert_eq!(gif.frames[0].color_indexes, vec![0, 2, 1]);

        let options = DecodeOptions { deinterlace: false };
        let gif = decode_bytes_with(&bytes, &options).unwrap();
        assert_eq!(gif.frames[0].color_indexes, vec![0, 1, 2]);
    }

    #[test]
    fn container_errors_are_fatal() {
        let err = decode_bytes(b"GIF87a").unwrap_err();
        assert!(matches!(err, DecodeError::Container(_)));
    }
}
