//! Tag definitions
//!
//! One-byte discriminators written in front of every stored payload.

/// Type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Int = b'i',
    Float = b'f',
    Str = b's',
    Dict = b'd',
    List = b'l',
    Tuple = b't',
}

impl Tag {
    /// Parse a tag byte
    pub fn from_byte(byte: u8) -> Option<Tag> {
        match byte {
            b'i' => Some(Tag::Int),
            b'f' => Some(Tag::Float),
            b's' => Some(Tag::Str),
            b'd' => Some(Tag::Dict),
            b'l' => Some(Tag::List),
            b't' => Some(Tag::Tuple),
            _ => None,
        }
    }
}
