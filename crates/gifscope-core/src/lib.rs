//! gifscope core library for GIF89a decoding.
//!
//! This crate parses the GIF89a block grammar into an owned document and then
//! expands each frame's LZW payload into palette indexes. The pipeline is
//! bytes -> `container` (layout/reader/blocks/parser) -> document ->
//! `codec` (bit reader, LZW, deinterlacing) -> decoded document -> report.
//! Parsing and decoding are pure and synchronous; the only I/O is reading the
//! input file in `decode`.
//!
//! Invariants:
//! - Container errors abort the whole document; there is no partial parse.
//! - Each decoded frame holds exactly `width * height` indexes; short or
//!   corrupt LZW payloads are zero-padded and reported, never fatal.
//! - Report frames keep stream order and histogram entries ascend by index.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use gifscope_core::analyze_gif_file;
//!
//! let report = analyze_gif_file(Path::new("animation.gif"))?;
//! println!("frames: {}", report.frames.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod container;
mod decode;
mod document;

pub use container::{ContainerError, parse_gif};
pub use decode::{
    DecodeError, DecodeOptions, analyze_gif_file, analyze_gif_file_with, build_report,
    decode_bytes, decode_bytes_with, decode_frame, decode_gif, decode_gif_file, decode_gif_with,
};
pub use document::{
    ColorTable, DecodedFrame, DecodedGif, DisposalMethod, Frame, Gif, GraphicControlExtension,
    ImageData, ImageDescriptor, LogicalScreenDescriptor, Pixel, color_table_len,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the input has no modification time.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Summary of a decoded GIF.
///
/// # Examples
/// ```
/// use gifscope_core::make_stub_report;
///
/// let report = make_stub_report("animation.gif", 123);
/// assert_eq!(report.report_version, gifscope_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 modification time of the input.
    pub generated_at: String,

    /// Input file metadata.
    pub input: InputInfo,

    /// Logical screen attributes.
    pub screen: ScreenSummary,
    /// NETSCAPE loop count; 0 loops forever, absent plays once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u16>,
    /// Comment extension text in stream order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Frame summaries in stream order.
    pub frames: Vec<FrameSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use gifscope_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "gifscope".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "gifscope");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "gifscope").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input file metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Logical screen attributes.
///
/// # Examples
/// ```
/// use gifscope_core::ScreenSummary;
///
/// let screen = ScreenSummary {
///     width: 10,
///     height: 10,
///     background_color_index: 0,
///     global_color_table_size: Some(4),
/// };
/// assert_eq!(screen.global_color_table_size, Some(4));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub width: u16,
    pub height: u16,
    pub background_color_index: u8,
    /// Entry count of the global color table, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_color_table_size: Option<usize>,
}

/// Per-frame summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Position in the frame list.
    pub index: usize,
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    /// Entry count of the local color table, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_color_table_size: Option<usize>,
    pub disposal_method: DisposalMethod,
    /// Delay in hundredths of a second.
    pub delay_time: u16,
    /// Transparent index, only when the transparency flag is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent_color_index: Option<u8>,
    pub lzw_minimum_code_size: u8,
    /// Size of the concatenated LZW payload.
    pub compressed_bytes: usize,
    /// Decoded index count (`width * height`).
    pub pixels: usize,
    /// Trailing indexes filled with 0 because the payload ended early.
    pub padded_pixels: usize,
    /// Why LZW decoding stopped early, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lzw_error: Option<String>,
    /// Occurrences of each color index used by the frame, ascending.
    pub index_histogram: Vec<IndexCount>,
}

/// Occurrence count of one color index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCount {
    pub index: u8,
    pub count: u64,
}

/// Build a stub report with base fields filled and no frames.
///
/// # Examples
/// ```
/// use gifscope_core::make_stub_report;
///
/// let report = make_stub_report("animation.gif", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.frames.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "gifscope".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        screen: ScreenSummary::default(),
        loop_count: None,
        comments: vec![],
        frames: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("animation.gif", 1);
        report.frames.push(FrameSummary {
            index: 0,
            left: 0,
            top: 0,
            width: 1,
            height: 1,
            interlaced: false,
            local_color_table_size: None,
            disposal_method: DisposalMethod::RestoreToPrevious,
            delay_time: 0,
            transparent_color_index: None,
            lzw_minimum_code_size: 2,
            compressed_bytes: 2,
            pixels: 1,
            padded_pixels: 0,
            lzw_error: None,
            index_histogram: vec![IndexCount { index: 0, count: 1 }],
        });

        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("loop_count").is_none());
        assert!(value.get("comments").is_none());
        assert!(value["screen"].get("global_color_table_size").is_none());

        let frame = &value["frames"][0];
        assert!(frame.get("local_color_table_size").is_none());
        assert!(frame.get("transparent_color_index").is_none());
        assert!(frame.get("lzw_error").is_none());
        assert_eq!(frame["disposal_method"], "restore_to_previous");
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut report = make_stub_report("animation.gif", 1);
        report.loop_count = Some(0);
        report.comments.push("hello".to_string());

        let json = serde_json::to_string(&report).expect("serialize");
        let parsed: Report = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.loop_count, Some(0));
        assert_eq!(parsed.comments, vec!["hello".to_string()]);
    }
}
