use tracing::{debug, trace};

use super::blocks::{
    ApplicationExtension, Block, CommentExtension, GraphicBlock, PlainTextExtension,
    RenderingBlock, SpecialPurposeBlock, TableBasedImage,
};
use super::error::ContainerError;
use super::layout;
use super::reader::GifReader;
use crate::document::{
    ColorTable, DisposalMethod, Frame, Gif, GraphicControlExtension, ImageData, ImageDescriptor,
    LogicalScreenDescriptor,
};

/// Parse a complete GIF89a buffer into a document.
///
/// Frames keep their LZW payload compressed; see [`crate::decode_gif`] to
/// expand them into color indexes.
pub fn parse_gif(data: &[u8]) -> Result<Gif, ContainerError> {
    let mut reader = GifReader::new(data);
    let (screen, global_color_table, blocks) = read_data_stream(&mut reader)?;
    Ok(assemble_document(screen, global_color_table, blocks))
}

/// `<GIF Data Stream> ::= Header <Logical Screen> <Data>* Trailer`
pub(crate) fn read_data_stream(
    reader: &mut GifReader<'_>,
) -> Result<(LogicalScreenDescriptor, Option<ColorTable>, Vec<Block>), ContainerError> {
    read_header(reader)?;
    let (screen, global_color_table) = read_logical_screen(reader)?;

    let mut blocks = Vec::new();
    loop {
        reader.require_len(1)?;
        if reader.peek_matches(&[layout::TRAILER]) {
            reader.skip(1)?;
            break;
        }
        match read_data(reader)? {
            Some(block) => blocks.push(block),
            None => {
                let byte = reader.peek(0).unwrap_or_default();
                return Err(malformed(
                    reader.offset(),
                    format!("unrecognized block introducer 0x{byte:02x}"),
                ));
            }
        }
    }

    if reader.remaining() > 0 {
        debug!(
            trailing = reader.remaining(),
            "ignoring bytes after trailer"
        );
    }
    Ok((screen, global_color_table, blocks))
}

fn read_header(reader: &mut GifReader<'_>) -> Result<(), ContainerError> {
    if !reader.peek_matches(layout::SIGNATURE) {
        let len = reader.remaining().min(layout::SIGNATURE.len());
        return Err(ContainerError::InvalidFormat {
            found: reader.read_slice(len)?.to_vec(),
        });
    }
    reader.skip(layout::SIGNATURE.len())
}

/// `<Logical Screen> ::= Logical Screen Descriptor [Global Color Table]`
fn read_logical_screen(
    reader: &mut GifReader<'_>,
) -> Result<(LogicalScreenDescriptor, Option<ColorTable>), ContainerError> {
    reader.require_len(layout::SCREEN_DESCRIPTOR_LEN)?;
    let width = reader.read_u16_le()?;
    let height = reader.read_u16_le()?;
    let packed = reader.read_u8()?;
    let background_color_index = reader.read_u8()?;
    // pixel aspect ratio
    reader.skip(1)?;

    let screen = LogicalScreenDescriptor {
        width,
        height,
        size_of_global_color_table: packed & layout::COLOR_TABLE_SIZE_MASK,
        background_color_index,
        global_color_table_flag: packed & layout::COLOR_TABLE_FLAG_MASK != 0,
    };
    let global_color_table = if screen.global_color_table_flag {
        Some(reader.read_color_table(screen.size_of_global_color_table)?)
    } else {
        None
    };
    debug!(
        width,
        height,
        global_colors = ?global_color_table.as_ref().map(Vec::len),
        "logical screen"
    );
    Ok((screen, global_color_table))
}

/// `<Data> ::= <Graphic Block> | <Special-Purpose Block>`
fn read_data(reader: &mut GifReader<'_>) -> Result<Option<Block>, ContainerError> {
    if let Some(graphic) = read_graphic_block(reader)? {
        return Ok(Some(Block::Graphic(graphic)));
    }
    Ok(read_special_purpose_block(reader)?.map(Block::Special))
}

fn read_graphic_block(reader: &mut GifReader<'_>) -> Result<Option<GraphicBlock>, ContainerError> {
    let control = read_graphic_control_extension(reader)?;
    let rendering = read_rendering_block(reader)?;
    if control.is_none() && rendering.is_none() {
        return Ok(None);
    }
    Ok(Some(GraphicBlock { control, rendering }))
}

fn read_rendering_block(
    reader: &mut GifReader<'_>,
) -> Result<Option<RenderingBlock>, ContainerError> {
    if let Some(image) = read_table_based_image(reader)? {
        return Ok(Some(RenderingBlock::TableImage(image)));
    }
    Ok(read_plain_text_extension(reader)?.map(RenderingBlock::PlainText))
}

fn read_special_purpose_block(
    reader: &mut GifReader<'_>,
) -> Result<Option<SpecialPurposeBlock>, ContainerError> {
    if let Some(application) = read_application_extension(reader)? {
        return Ok(Some(SpecialPurposeBlock::Application(application)));
    }
    Ok(read_comment_extension(reader)?.map(SpecialPurposeBlock::Comment))
}

fn read_graphic_control_extension(
    reader: &mut GifReader<'_>,
) -> Result<Option<GraphicControlExtension>, ContainerError> {
    if !reader.peek_matches(&[
        layout::EXTENSION_INTRODUCER,
        layout::GRAPHIC_CONTROL_LABEL,
        layout::GRAPHIC_CONTROL_BLOCK_SIZE,
    ]) {
        return Ok(None);
    }
    trace!(offset = reader.offset(), "graphic control extension");
    reader.skip(3)?;

    let packed = reader.read_u8()?;
    let delay_time = reader.read_u16_le()?;
    let transparent_color_index = reader.read_u8()?;
    // block terminator
    reader.skip(1)?;

    Ok(Some(GraphicControlExtension {
        disposal_method: DisposalMethod::from_bits(
            (packed >> layout::DISPOSAL_SHIFT) & layout::DISPOSAL_MASK,
        ),
        transparent_color_flag: packed & layout::TRANSPARENCY_FLAG_MASK != 0,
        delay_time,
        transparent_color_index,
    }))
}

/// `<Table-Based Image> ::= Image Descriptor [Local Color Table] Image Data`
fn read_table_based_image(
    reader: &mut GifReader<'_>,
) -> Result<Option<TableBasedImage>, ContainerError> {
    let Some(descriptor) = read_image_descriptor(reader)? else {
        return Ok(None);
    };
    let local_color_table = if descriptor.local_color_table_flag {
        Some(reader.read_color_table(descriptor.size_of_local_color_table)?)
    } else {
        None
    };
    let image_data = read_image_data(reader)?;
    trace!(
        width = descriptor.width,
        height = descriptor.height,
        payload = image_data.data.len(),
        "table-based image"
    );
    Ok(Some(TableBasedImage {
        descriptor,
        local_color_table,
        image_data,
    }))
}

fn read_image_descriptor(
    reader: &mut GifReader<'_>,
) -> Result<Option<ImageDescriptor>, ContainerError> {
    if !reader.peek_matches(&[layout::IMAGE_SEPARATOR]) {
        return Ok(None);
    }
    let start = reader.offset();
    reader.require_len(1 + layout::IMAGE_DESCRIPTOR_LEN)?;
    reader.skip(1)?;

    let left = reader.read_u16_le()?;
    let top = reader.read_u16_le()?;
    let width = reader.read_u16_le()?;
    let height = reader.read_u16_le()?;
    let packed = reader.read_u8()?;

    let local_color_table_flag = packed & layout::COLOR_TABLE_FLAG_MASK != 0;
    let size_of_local_color_table = packed & layout::COLOR_TABLE_SIZE_MASK;
    if !local_color_table_flag && size_of_local_color_table != 0 {
        return Err(malformed(
            start,
            format!(
                "local color table size must be 0 without a local table, got {size_of_local_color_table}"
            ),
        ));
    }

    Ok(Some(ImageDescriptor {
        left,
        top,
        width,
        height,
        local_color_table_flag,
        interlace_flag: packed & layout::INTERLACE_FLAG_MASK != 0,
        size_of_local_color_table,
    }))
}

fn read_image_data(reader: &mut GifReader<'_>) -> Result<ImageData, ContainerError> {
    let start = reader.offset();
    let lzw_minimum_code_size = reader.read_u8()?;
    if !(layout::MIN_LZW_CODE_SIZE..=layout::MAX_LZW_CODE_SIZE).contains(&lzw_minimum_code_size) {
        return Err(malformed(
            start,
            format!(
                "LZW minimum code size must be within {}..={}, got {lzw_minimum_code_size}",
                layout::MIN_LZW_CODE_SIZE,
                layout::MAX_LZW_CODE_SIZE
            ),
        ));
    }
    Ok(ImageData {
        lzw_minimum_code_size,
        data: reader.read_sub_block_data()?,
    })
}

fn read_plain_text_extension(
    reader: &mut GifReader<'_>,
) -> Result<Option<PlainTextExtension>, ContainerError> {
    if !reader.peek_matches(&[
        layout::EXTENSION_INTRODUCER,
        layout::PLAIN_TEXT_LABEL,
        layout::PLAIN_TEXT_BLOCK_SIZE,
    ]) {
        return Ok(None);
    }
    trace!(offset = reader.offset(), "plain text extension");
    reader.skip(3)?;
    // text grid geometry, cell size and colors
    reader.skip(layout::PLAIN_TEXT_BLOCK_SIZE as usize)?;
    Ok(Some(PlainTextExtension {
        text: reader.read_sub_block_data()?,
    }))
}

fn read_application_extension(
    reader: &mut GifReader<'_>,
) -> Result<Option<ApplicationExtension>, ContainerError> {
    if !reader.peek_matches(&[
        layout::EXTENSION_INTRODUCER,
        layout::APPLICATION_LABEL,
        layout::APPLICATION_BLOCK_SIZE,
    ]) {
        return Ok(None);
    }
    trace!(offset = reader.offset(), "application extension");
    reader.skip(3)?;

    let mut identifier = [0u8; layout::APPLICATION_IDENTIFIER_LEN];
    identifier.copy_from_slice(reader.read_slice(layout::APPLICATION_IDENTIFIER_LEN)?);
    let mut auth_code = [0u8; layout::APPLICATION_AUTH_CODE_LEN];
    auth_code.copy_from_slice(reader.read_slice(layout::APPLICATION_AUTH_CODE_LEN)?);
    let sub_blocks = reader.read_sub_blocks()?;

    if &identifier == layout::NETSCAPE_IDENTIFIER {
        if let Some(first) = sub_blocks.first() {
            if first.len() == layout::NETSCAPE_LOOP_SUB_BLOCK_LEN
                && first[0] == layout::NETSCAPE_LOOP_SUB_BLOCK_ID
            {
                return Ok(Some(ApplicationExtension::NetscapeLooping {
                    loop_count: u16::from_le_bytes([first[1], first[2]]),
                }));
            }
        }
    }

    Ok(Some(ApplicationExtension::Unrecognized {
        identifier,
        auth_code,
        data: sub_blocks.concat(),
    }))
}

fn read_comment_extension(
    reader: &mut GifReader<'_>,
) -> Result<Option<CommentExtension>, ContainerError> {
    if !reader.peek_matches(&[layout::EXTENSION_INTRODUCER, layout::COMMENT_LABEL]) {
        return Ok(None);
    }
    trace!(offset = reader.offset(), "comment extension");
    reader.skip(2)?;
    Ok(Some(CommentExtension {
        text: reader.read_sub_block_data()?,
    }))
}

/// Pair control extensions with images and collect document-level metadata.
///
/// A control extension without its own image stays pending until the next
/// rendering block; a later control extension replaces a pending one.
fn assemble_document(
    screen: LogicalScreenDescriptor,
    global_color_table: Option<ColorTable>,
    blocks: Vec<Block>,
) -> Gif {
    let mut frames = Vec::new();
    let mut loop_count = None;
    let mut comments = Vec::new();
    let mut pending: Option<GraphicControlExtension> = None;

    for block in blocks {
        match block {
            Block::Special(SpecialPurposeBlock::Application(application)) => match application {
                ApplicationExtension::NetscapeLooping { loop_count: count } => {
                    loop_count = Some(count);
                }
                ApplicationExtension::Unrecognized { identifier, .. } => {
                    debug!(
                        identifier = %String::from_utf8_lossy(&identifier),
                        "skipping unrecognized application extension"
                    );
                }
            },
            Block::Special(SpecialPurposeBlock::Comment(comment)) => {
                comments.push(String::from_utf8_lossy(&comment.text).into_owned());
            }
            Block::Graphic(GraphicBlock { control, rendering }) => match rendering {
                Some(RenderingBlock::TableImage(image)) => {
                    let control = control.or(pending.take()).unwrap_or_default();
                    frames.push(Frame {
                        control,
                        descriptor: image.descriptor,
                        local_color_table: image.local_color_table,
                        image_data: image.image_data,
                    });
                }
                Some(RenderingBlock::PlainText(_)) => {
                    debug!("dropping plain text extension");
                    pending = None;
                }
                None => {
                    if pending.is_some() {
                        debug!("replacing pending graphic control extension");
                    }
                    pending = control;
                }
            },
        }
    }

    Gif {
        screen,
        global_color_table,
        frames,
        loop_count,
        comments,
    }
}

fn malformed(offset: usize, reason: String) -> ContainerError {
    ContainerError::MalformedBlock { offset, reason }
}

#[cfg(test)]
mod tests {
    use super::{parse_gif, read_data_stream};
    use crate::container::blocks::{Block, RenderingBlock};
    use crate::container::error::ContainerError;
    use crate::container::layout;
    use crate::container::reader::GifReader;
    use crate::document::{DisposalMethod, GraphicControlExtension};

    // min code size 2, codes CLEAR, 0, END
    const ONE_PIXEL_PAYLOAD: [u8; 5] = [0x02, 0x02, 0x44, 0x01, 0x00];

    fn screen(packed: u8) -> Vec<u8> {
        let mut bytes = layout::SIGNATURE.to_vec();
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&[packed, 0, 0]);
        bytes
    }

    fn control(packed: u8, delay: u16, transparent: u8) -> Vec<u8> {
        let mut bytes = vec![0x21, 0xf9, 0x04, packed];
        bytes.extend_from_slice(&delay.to_le_bytes());
        bytes.extend_from_slice(&[transparent, 0x00]);
        bytes
    }

    fn image(packed: u8) -> Vec<u8> {
        let mut bytes = vec![0x2c, 0, 0, 0, 0, 1, 0, 1, 0, packed];
        bytes.extend_from_slice(&ONE_PIXEL_PAYLOAD);
        bytes
    }

    fn netscape(loop_count: u16) -> Vec<u8> {
        let mut bytes = vec![0x21, 0xff, 0x0b];
        bytes.extend_from_slice(b"NETSCAPE2.0");
        bytes.extend_from_slice(&[3, 1]);
        bytes.extend_from_slice(&loop_count.to_le_bytes());
        bytes.push(0);
        bytes
    }

    fn file(parts: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = screen(0);
        for part in parts {
            bytes.extend_from_slice(part);
        }
        bytes.push(layout::TRAILER);
        bytes
    }

    #[test]
    fn parse_minimal_file() {
        let gif = parse_gif(&file(&[image(0)])).unwrap();
        assert_eq!(gif.screen.width, 2);
        assert_eq!(gif.screen.height, 1);
        assert!(gif.global_color_table.is_none());
        assert_eq!(gif.frames.len(), 1);
        let frame = &gif.frames[0];
        assert_eq!(frame.control, GraphicControlExtension::default());
        assert_eq!(frame.image_data.lzw_minimum_code_size, 2);
        assert_eq!(frame.image_data.data, vec![0x44, 0x01]);
        assert!(gif.loop_count.is_none());
    }

    #[test]
    fn parse_global_color_table() {
        let mut bytes = screen(0b1000_0001);
        bytes.extend((0..12).map(|i| i as u8));
        bytes.extend_from_slice(&image(0));
        bytes.push(layout::TRAILER);

        let gif = parse_gif(&bytes).unwrap();
        let table = gif.global_color_table.unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!((table[3].r, table[3].g, table[3].b), (9, 10, 11));
        assert_eq!(gif.screen.size_of_global_color_table, 1);
    }

    #[test]
    fn control_extension_applies_to_first_image_only() {
        let gif = parse_gif(&file(&[
            control(0b0000_1001, 25, 3),
            image(0),
            image(0),
        ]))
        .unwrap();
        assert_eq!(gif.frames.len(), 2);
        let first = gif.frames[0].control;
        assert_eq!(first.disposal_method, DisposalMethod::RestoreToBackground);
        assert_eq!(first.delay_time, 25);
        assert_eq!(first.transparent_index(), Some(3));
        assert_eq!(gif.frames[1].control, GraphicControlExtension::default());
    }

    #[test]
    fn pending_control_extension_survives_special_blocks() {
        let gif = parse_gif(&file(&[control(0b0000_0100, 7, 0), netscape(0), image(0)])).unwrap();
        assert_eq!(gif.frames.len(), 1);
        assert_eq!(gif.frames[0].control.delay_time, 7);
        assert_eq!(
            gif.frames[0].control.disposal_method,
            DisposalMethod::DoNotDispose
        );
    }

    #[test]
    fn later_pending_control_extension_wins() {
        let gif = parse_gif(&file(&[
            control(0, 1, 0),
            netscape(0),
            control(0, 2, 0),
            netscape(0),
            image(0),
        ]))
        .unwrap();
        assert_eq!(gif.frames.len(), 1);
        assert_eq!(gif.frames[0].control.delay_time, 2);
    }

    #[test]
    fn plain_text_discards_pending_control() {
        let mut plain_text = vec![0x21, 0x01, 0x0c];
        plain_text.extend_from_slice(&[0u8; 12]);
        plain_text.extend_from_slice(&[2, b'h', b'i', 0]);

        let gif = parse_gif(&file(&[
            control(0, 9, 0),
            netscape(0),
            plain_text.clone(),
            image(0),
        ]))
        .unwrap();
        assert_eq!(gif.frames.len(), 1);
        assert_eq!(gif.frames[0].control, GraphicControlExtension::default());

        let mut paired = control(0, 9, 0);
        paired.extend_from_slice(&plain_text);
        let gif = parse_gif(&file(&[paired])).unwrap();
        assert!(gif.frames.is_empty());
    }

    #[test]
    fn last_loop_count_wins() {
        let gif = parse_gif(&file(&[netscape(3), image(0), netscape(0x0102)])).unwrap();
        assert_eq!(gif.loop_count, Some(0x0102));
    }

    #[test]
    fn short_netscape_block_is_not_a_loop_directive() {
        let mut app = vec![0x21, 0xff, 0x0b];
        app.extend_from_slice(b"NETSCAPE2.0");
        app.extend_from_slice(&[2, 1, 5, 0]);
        let gif = parse_gif(&file(&[app])).unwrap();
        assert!(gif.loop_count.is_none());
    }

    #[test]
    fn comments_are_collected() {
        let comment = vec![0x21, 0xfe, 3, b'a', b'b', b'c', 2, b'd', b'e', 0];
        let gif = parse_gif(&file(&[comment, image(0)])).unwrap();
        assert_eq!(gif.comments, vec!["abcde".to_string()]);
    }

    #[test]
    fn local_table_size_without_flag_is_malformed() {
        let err = parse_gif(&file(&[image(0b0000_0011)])).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedBlock { offset: 13, .. }));
        assert!(err.to_string().contains("local color table size"));
    }

    #[test]
    fn local_table_is_read_when_flagged() {
        let mut bytes = vec![0x2c, 0, 0, 0, 0, 1, 0, 1, 0, 0b1100_0000];
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        bytes.extend_from_slice(&ONE_PIXEL_PAYLOAD);
        let gif = parse_gif(&file(&[bytes])).unwrap();
        let frame = &gif.frames[0];
        assert!(frame.descriptor.interlace_flag);
        assert_eq!(frame.local_color_table.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn invalid_signature() {
        let mut bytes = file(&[image(0)]);
        bytes[4] = b'7';
        let err = parse_gif(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidFormat { .. }));

        let err = parse_gif(b"GIF").unwrap_err();
        assert!(matches!(err, ContainerError::InvalidFormat { .. }));
    }

    #[test]
    fn missing_trailer_is_end_of_data() {
        let mut bytes = file(&[image(0)]);
        bytes.pop();
        let err = parse_gif(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::EndOfData { .. }));
    }

    #[test]
    fn truncated_image_is_end_of_data() {
        let mut bytes = screen(0);
        bytes.extend_from_slice(&image(0)[..6]);
        let err = parse_gif(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::EndOfData { offset: 13, .. }));
    }

    #[test]
    fn unknown_block_is_malformed() {
        let err = parse_gif(&file(&[vec![0x42]])).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedBlock { offset: 13, .. }));
    }

    #[test]
    fn lzw_code_size_out_of_range_is_malformed() {
        let mut bytes = image(0);
        bytes[10] = 9;
        let err = parse_gif(&file(&[bytes])).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedBlock { .. }));
    }

    #[test]
    fn blocks_keep_grammar_shape() {
        let bytes = file(&[control(0, 0, 0), image(0), netscape(1)]);
        let mut reader = GifReader::new(&bytes);
        let (_, _, blocks) = read_data_stream(&mut reader).unwrap();
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Graphic(graphic) => {
                assert!(graphic.control.is_some());
                assert!(matches!(
                    graphic.rendering,
                    Some(RenderingBlock::TableImage(_))
                ));
            }
            Block::Special(_) => panic!("expected graphic block"),
        }
        assert!(matches!(blocks[1], Block::Special(_)));
        assert_eq!(reader.remaining(), 0);
    }
}
