use std::fs;
use std::path::PathBuf;

const SIGNATURE: &[u8; 6] = b"GIF89a";
const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHIC_CONTROL_LABEL: u8 = 0xf9;
const APPLICATION_LABEL: u8 = 0xff;
const COMMENT_LABEL: u8 = 0xfe;
const IMAGE_SEPARATOR: u8 = 0x2c;
const TRAILER: u8 = 0x3b;
const MAX_SUB_BLOCK_LEN: usize = 255;

// 10x10 four-color image from the GIF89a walkthrough by Matthew Flickinger.
const SAMPLE_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0a, 0x00, 0x0a, 0x00, 0x91, 0x00, 0x00, 0xff, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x0a, 0x00, 0x00, 0x02, 0x16, 0x8c, 0x2d, 0x99,
    0x87, 0x2a, 0x1c, 0xdc, 0x33, 0xa0, 0x02, 0x75, 0xec, 0x95, 0xfa, 0xa8, 0xde, 0x60, 0x8c, 0x04,
    0x91, 0x4c, 0x01, 0x00, 0x3b,
];

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_fixture(root.join("sample").join("input.gif"), SAMPLE_GIF)?;
    write_fixture(root.join("animation").join("input.gif"), &animation_gif())?;
    write_fixture(root.join("interlaced").join("input.gif"), &interlaced_gif())?;
    write_fixture(root.join("truncated").join("input.gif"), &truncated_gif())?;
    Ok(())
}

fn write_fixture(path: PathBuf, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(&path, bytes).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

/// Three frames: a full 4x4 frame, a 2x2 transparent patch with its own
/// palette, and a frame without a control extension. Loops forever.
fn animation_gif() -> Vec<u8> {
    let palette = [[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 0, 255]];
    let mut gif = GifBuilder::new(4, 4, Some(&palette));
    gif.netscape_loop(0);
    gif.comment(b"gifscope fixture");

    gif.control(1, None, 10);
    let stripes: Vec<u8> = (0..16).map(|i| (i % 4) as u8).collect();
    gif.image(ImageSpec::new(0, 0, 4, 4, 2, &stripes));

    gif.control(2, Some(0), 20);
    let mut patch = ImageSpec::new(1, 1, 2, 2, 2, &[1, 0, 0, 1]);
    patch.local_table = Some(vec![[0, 255, 0], [255, 255, 0]]);
    gif.image(patch);

    gif.image(ImageSpec::new(0, 0, 4, 4, 2, &[3; 16]));
    gif.finish()
}

/// 3x10 interlaced frame whose row `r` is filled with index `r`.
fn interlaced_gif() -> Vec<u8> {
    let palette: Vec<[u8; 3]> = (0..16u8).map(|i| [i * 16, i * 16, i * 16]).collect();
    let mut gif = GifBuilder::new(3, 10, Some(&palette));

    let (width, height) = (3usize, 10usize);
    let mut transmitted = Vec::with_capacity(width * height);
    for (first, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for row in (first..height).step_by(step) {
            transmitted.extend(std::iter::repeat_n(row as u8, width));
        }
    }
    let mut image = ImageSpec::new(0, 0, width as u16, height as u16, 4, &transmitted);
    image.interlaced = true;
    gif.image(image);
    gif.finish()
}

/// 4x2 frame whose payload stops after five pixels with no end code.
fn truncated_gif() -> Vec<u8> {
    let palette = [[0, 0, 0], [255, 255, 255]];
    let mut gif = GifBuilder::new(4, 2, Some(&palette));
    let mut image = ImageSpec::new(0, 0, 4, 2, 2, &[1, 0, 1, 0, 1]);
    image.terminate = false;
    gif.image(image);
    gif.finish()
}

struct ImageSpec {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    interlaced: bool,
    local_table: Option<Vec<[u8; 3]>>,
    min_code_size: u8,
    indexes: Vec<u8>,
    terminate: bool,
}

impl ImageSpec {
    fn new(left: u16, top: u16, width: u16, height: u16, min_code_size: u8, indexes: &[u8]) -> Self {
        Self {
            left,
            top,
            width,
            height,
            interlaced: false,
            local_table: None,
            min_code_size,
            indexes: indexes.to_vec(),
            terminate: true,
        }
    }
}

struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    fn new(width: u16, height: u16, global_table: Option<&[[u8; 3]]>) -> Self {
        let mut bytes = SIGNATURE.to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        let packed = global_table.map_or(0, |table| 0b1000_0000 | table_size_bits(table.len()));
        bytes.extend_from_slice(&[packed, 0, 0]);
        if let Some(table) = global_table {
            push_table(&mut bytes, table);
        }
        Self { bytes }
    }

    fn control(&mut self, disposal: u8, transparent: Option<u8>, delay: u16) {
        let packed = (disposal << 2) | u8::from(transparent.is_some());
        self.bytes.extend_from_slice(&[EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, packed]);
        self.bytes.extend_from_slice(&delay.to_le_bytes());
        self.bytes.extend_from_slice(&[transparent.unwrap_or(0), 0]);
    }

    fn netscape_loop(&mut self, loop_count: u16) {
        self.bytes.extend_from_slice(&[EXTENSION_INTRODUCER, APPLICATION_LABEL, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1]);
        self.bytes.extend_from_slice(&loop_count.to_le_bytes());
        self.bytes.push(0);
    }

    fn comment(&mut self, text: &[u8]) {
        self.bytes.extend_from_slice(&[EXTENSION_INTRODUCER, COMMENT_LABEL]);
        push_sub_blocks(&mut self.bytes, text);
    }

    fn image(&mut self, spec: ImageSpec) {
        self.bytes.push(IMAGE_SEPARATOR);
        for value in [spec.left, spec.top, spec.width, spec.height] {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut packed = 0u8;
        if let Some(table) = &spec.local_table {
            packed |= 0b1000_0000 | table_size_bits(table.len());
        }
        if spec.interlaced {
            packed |= 0b0100_0000;
        }
        self.bytes.push(packed);
        if let Some(table) = &spec.local_table {
            push_table(&mut self.bytes, table);
        }
        self.bytes.push(spec.min_code_size);
        let payload = encode_literals(spec.min_code_size, &spec.indexes, spec.terminate);
        push_sub_blocks(&mut self.bytes, &payload);
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes.push(TRAILER);
        self.bytes
    }
}

fn table_size_bits(len: usize) -> u8 {
    (len.trailing_zeros() as u8).saturating_sub(1)
}

fn push_table(bytes: &mut Vec<u8>, table: &[[u8; 3]]) {
    for rgb in table {
        bytes.extend_from_slice(rgb);
    }
}

fn push_sub_blocks(bytes: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(MAX_SUB_BLOCK_LEN) {
        bytes.push(chunk.len() as u8);
        bytes.extend_from_slice(chunk);
    }
    bytes.push(0);
}

/// Encode every index as a literal code, clearing the dictionary before the
/// decoder would widen its codes so the width stays `min_code_size + 1`.
fn encode_literals(min_code_size: u8, indexes: &[u8], terminate: bool) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let width = min_code_size + 1;
    let run = (clear - 2) as usize;

    let mut writer = CodeWriter::default();
    for (i, &index) in indexes.iter().enumerate() {
        if i % run == 0 {
            writer.push(clear, width);
        }
        writer.push(index as u16, width);
    }
    if terminate {
        writer.push(clear + 1, width);
    }
    writer.finish()
}

#[derive(Default)]
struct CodeWriter {
    bytes: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl CodeWriter {
    fn push(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.bytes.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push(self.acc as u8);
        }
        self.bytes
    }
}
