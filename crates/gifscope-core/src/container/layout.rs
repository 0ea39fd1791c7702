pub const SIGNATURE: &[u8; 6] = b"GIF89a";

pub const SCREEN_DESCRIPTOR_LEN: usize = 7;
pub const IMAGE_DESCRIPTOR_LEN: usize = 9;
pub const COLOR_TABLE_ENTRY_LEN: usize = 3;

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const IMAGE_SEPARATOR: u8 = 0x2c;
pub const TRAILER: u8 = 0x3b;
pub const BLOCK_TERMINATOR: u8 = 0x00;

pub const GRAPHIC_CONTROL_LABEL: u8 = 0xf9;
pub const APPLICATION_LABEL: u8 = 0xff;
pub const COMMENT_LABEL: u8 = 0xfe;
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

pub const GRAPHIC_CONTROL_BLOCK_SIZE: u8 = 4;
pub const APPLICATION_BLOCK_SIZE: u8 = 11;
pub const PLAIN_TEXT_BLOCK_SIZE: u8 = 12;

pub const COLOR_TABLE_FLAG_MASK: u8 = 0b1000_0000;
pub const INTERLACE_FLAG_MASK: u8 = 0b0100_0000;
pub const COLOR_TABLE_SIZE_MASK: u8 = 0b0000_0111;
pub const DISPOSAL_SHIFT: u8 = 2;
pub const DISPOSAL_MASK: u8 = 0b0000_0111;
pub const TRANSPARENCY_FLAG_MASK: u8 = 0b0000_0001;

pub const APPLICATION_IDENTIFIER_LEN: usize = 8;
pub const APPLICATION_AUTH_CODE_LEN: usize = 3;
pub const NETSCAPE_IDENTIFIER: &[u8; 8] = b"NETSCAPE";
pub const NETSCAPE_LOOP_SUB_BLOCK_LEN: usize = 3;
pub const NETSCAPE_LOOP_SUB_BLOCK_ID: u8 = 0x01;

pub const MIN_LZW_CODE_SIZE: u8 = 1;
pub const MAX_LZW_CODE_SIZE: u8 = 8;
