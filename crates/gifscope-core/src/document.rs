//! Document model produced by the container parser.
//!
//! A [`Gif`] is immutable once assembled: every frame owns its compressed
//! payload, so nothing borrows from the input buffer after parsing. Decoding
//! turns it into a [`DecodedGif`], where each frame additionally carries its
//! color indexes in top-to-bottom row order.

use serde::{Deserialize, Serialize};

use crate::codec::LzwError;

/// One RGB entry of a color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Ordered palette; its length is always `2^(size + 1)` for a size in `0..=7`.
pub type ColorTable = Vec<Pixel>;

/// Number of entries a color table of the given size selector holds.
///
/// # Examples
/// ```
/// use gifscope_core::color_table_len;
///
/// assert_eq!(color_table_len(0), 2);
/// assert_eq!(color_table_len(7), 256);
/// ```
pub fn color_table_len(size: u8) -> usize {
    1usize << ((size & 0b111) + 1)
}

/// Screen-level attributes decoded from the logical screen descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub width: u16,
    pub height: u16,
    /// Size selector of the global color table (three bits).
    pub size_of_global_color_table: u8,
    pub background_color_index: u8,
    pub global_color_table_flag: bool,
}

/// How the area of a frame is treated before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalMethod {
    /// No disposal specified; also used for the reserved values 4 through 7.
    #[default]
    Unspecified,
    DoNotDispose,
    RestoreToBackground,
    RestoreToPrevious,
}

impl DisposalMethod {
    /// Map the three-bit disposal field of a graphic control extension.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::DoNotDispose,
            2 => Self::RestoreToBackground,
            3 => Self::RestoreToPrevious,
            _ => Self::Unspecified,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::DoNotDispose => 1,
            Self::RestoreToBackground => 2,
            Self::RestoreToPrevious => 3,
        }
    }
}

/// Per-frame rendering metadata. Frames without a control extension use
/// [`GraphicControlExtension::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicControlExtension {
    pub disposal_method: DisposalMethod,
    pub transparent_color_flag: bool,
    /// Delay in hundredths of a second.
    pub delay_time: u16,
    pub transparent_color_index: u8,
}

impl GraphicControlExtension {
    /// Transparent index, only when the transparency flag is set.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_color_flag
            .then_some(self.transparent_color_index)
    }
}

/// Frame geometry and local palette flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub local_color_table_flag: bool,
    pub interlace_flag: bool,
    /// Always 0 when `local_color_table_flag` is false.
    pub size_of_local_color_table: u8,
}

impl ImageDescriptor {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Raw LZW payload of one image, with its sub-blocks concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub lzw_minimum_code_size: u8,
    pub data: Vec<u8>,
}

/// A frame as assembled by the parser, still LZW-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub control: GraphicControlExtension,
    pub descriptor: ImageDescriptor,
    pub local_color_table: Option<ColorTable>,
    pub image_data: ImageData,
}

/// Parsed GIF document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gif {
    pub screen: LogicalScreenDescriptor,
    pub global_color_table: Option<ColorTable>,
    pub frames: Vec<Frame>,
    /// Loop count of the last NETSCAPE looping extension; 0 means forever.
    pub loop_count: Option<u16>,
    /// Text of comment extensions, in stream order.
    pub comments: Vec<String>,
}

/// A frame with its decompressed color indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame: Frame,
    /// `width * height` palette indexes in top-to-bottom row order.
    pub color_indexes: Vec<u8>,
    /// Indexes actually produced by the LZW stream; the rest are zero padding.
    pub decoded_pixels: usize,
    /// Reason decoding stopped early, if the payload was corrupt or short.
    pub lzw_error: Option<LzwError>,
}

impl DecodedFrame {
    pub fn padded_pixels(&self) -> usize {
        self.color_indexes.len().saturating_sub(self.decoded_pixels)
    }
}

/// Parsed document whose frames have been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGif {
    pub screen: LogicalScreenDescriptor,
    pub global_color_table: Option<ColorTable>,
    pub frames: Vec<DecodedFrame>,
    pub loop_count: Option<u16>,
    pub comments: Vec<String>,
}
