//! Minimal class-file reader.
//!
//! Only the parts needed to list referenced classes are decoded: the constant
//! pool, `this_class`, and field and method descriptors. Attribute bodies are
//! skipped, so generic signatures and annotations are not inspected.

use std::collections::BTreeSet;

const MAGIC: u32 = 0xCAFE_BABE;

/// A class file could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassFormatError {
    /// The file does not start with `0xCAFEBABE`.
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    /// The data ended before the structure was complete.
    #[error("truncated at byte {offset}")]
    Truncated {
        /// Offset at which more bytes were needed.
        offset: usize,
    },

    /// An unknown constant pool tag.
    #[error("unknown constant pool tag {tag} at index {index}")]
    BadConstantTag {
        /// The tag byte.
        tag: u8,
        /// The constant pool slot.
        index: u16,
    },

    /// A reference to a constant pool slot that is missing or of the wrong kind.
    #[error("invalid constant pool reference {index}")]
    BadIndex {
        /// The referenced slot.
        index: u16,
    },
}

/// Classes referenced by one class file, as internal names (`org/example/A`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRefs {
    /// The class the file defines.
    pub this_class: String,
    /// Every class named by the constant pool or a member descriptor. Always
    /// contains `this_class`.
    pub referenced: BTreeSet<String>,
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    NameAndType(u16),
    MethodType(u16),
    Other,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFormatError::Truncated { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFormatError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFormatError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(r: &mut Reader<'_>) -> Result<Self, ClassFormatError> {
        let count = r.u16()?;
        // Slot 0 is unused.
        let mut entries = vec![Constant::Other];
        let mut index = 1u16;
        while index < count {
            let tag = r.u8()?;
            let (constant, slots) = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    let raw = r.bytes(len)?;
                    (Constant::Utf8(String::from_utf8_lossy(raw).into_owned()), 1)
                }
                3 | 4 => {
                    r.bytes(4)?;
                    (Constant::Other, 1)
                }
                5 | 6 => {
                    r.bytes(8)?;
                    (Constant::Other, 2)
                }
                7 => (Constant::Class(r.u16()?), 1),
                8 | 19 | 20 => {
                    r.u16()?;
                    (Constant::Other, 1)
                }
                9 | 10 | 11 | 17 | 18 => {
                    r.bytes(4)?;
                    (Constant::Other, 1)
                }
                12 => {
                    r.u16()?;
                    (Constant::NameAndType(r.u16()?), 1)
                }
                15 => {
                    r.bytes(3)?;
                    (Constant::Other, 1)
                }
                16 => (Constant::MethodType(r.u16()?), 1),
                _ => return Err(ClassFormatError::BadConstantTag { tag, index }),
            };
            entries.push(constant);
            if slots == 2 {
                entries.push(Constant::Other);
            }
            index = index.saturating_add(slots);
        }
        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ClassFormatError::BadIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ClassFormatError::BadIndex { index }),
        }
    }
}

/// Lists the classes a class file refers to.
pub fn parse_class_refs(data: &[u8]) -> Result<ClassRefs, ClassFormatError> {
    let mut r = Reader::new(data);
    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic(magic));
    }
    r.u16()?; // minor
    r.u16()?; // major
    let pool = ConstantPool::read(&mut r)?;

    let mut referenced = BTreeSet::new();
    for constant in &pool.0 {
        match constant {
            Constant::Class(name) => {
                let name = pool.utf8(*name)?;
                if name.starts_with('[') {
                    descriptor_classes(name, &mut referenced);
                } else {
                    referenced.insert(name.to_string());
                }
            }
            Constant::NameAndType(descriptor) | Constant::MethodType(descriptor) => {
                descriptor_classes(pool.utf8(*descriptor)?, &mut referenced);
            }
            Constant::Utf8(_) | Constant::Other => {}
        }
    }

    r.u16()?; // access flags
    let this_class = pool.class_name(r.u16()?)?.to_string();
    referenced.insert(this_class.clone());
    r.u16()?; // super class
    let interfaces = r.u16()?;
    r.bytes(interfaces as usize * 2)?;

    // fields, then methods
    for _ in 0..2 {
        let members = r.u16()?;
        for _ in 0..members {
            r.u16()?; // access flags
            r.u16()?; // name
            let descriptor = r.u16()?;
            descriptor_classes(pool.utf8(descriptor)?, &mut referenced);
            skip_attributes(&mut r)?;
        }
    }

    Ok(ClassRefs {
        this_class,
        referenced,
    })
}

fn skip_attributes(r: &mut Reader<'_>) -> Result<(), ClassFormatError> {
    let count = r.u16()?;
    for _ in 0..count {
        r.u16()?;
        let len = r.u32()?;
        r.bytes(len as usize)?;
    }
    Ok(())
}

/// Collects every `Lname;` class reference in a field or method descriptor.
fn descriptor_classes(descriptor: &str, out: &mut BTreeSet<String>) {
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                if end > 0 {
                    out.insert(after[..end].to_string());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
}
