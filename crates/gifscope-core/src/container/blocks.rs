//! Blocks recognised by the grammar, before frame assembly.

use crate::document::{ColorTable, GraphicControlExtension, ImageData, ImageDescriptor};

/// `<Data> ::= <Graphic Block> | <Special-Purpose Block>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Graphic(GraphicBlock),
    Special(SpecialPurposeBlock),
}

/// `<Graphic Block> ::= [Graphic Control Extension] <Graphic-Rendering Block>`
///
/// Either half may be missing: a control extension followed by a
/// special-purpose block is kept on its own and applied to a later image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicBlock {
    pub control: Option<GraphicControlExtension>,
    pub rendering: Option<RenderingBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderingBlock {
    TableImage(TableBasedImage),
    PlainText(PlainTextExtension),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBasedImage {
    pub descriptor: ImageDescriptor,
    pub local_color_table: Option<ColorTable>,
    pub image_data: ImageData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextExtension {
    pub text: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialPurposeBlock {
    Application(ApplicationExtension),
    Comment(CommentExtension),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationExtension {
    /// NETSCAPE2.0 looping directive; 0 loops forever.
    NetscapeLooping { loop_count: u16 },
    Unrecognized {
        identifier: [u8; 8],
        auth_code: [u8; 3],
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentExtension {
    pub text: Vec<u8>,
}
