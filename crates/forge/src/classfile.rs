//! JVM class-file decoding, reduced to what marker introspection needs.
//!
//! Reads the constant pool, the access flags, `this_class`, and the
//! class-level `RuntimeVisibleAnnotations` attribute. Fields and methods are
//! skipped by length. Only runtime-visible annotations are reported, which is
//! what a reflective `getAnnotations()` would return.

use crate::ForgeError;

pub(crate) const MAGIC: u32 = 0xCAFE_BABE;

/// `ACC_INTERFACE` access flag.
pub const ACC_INTERFACE: u16 = 0x0200;
/// `ACC_ANNOTATION` access flag.
pub const ACC_ANNOTATION: u16 = 0x2000;

pub(crate) const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

/// The facts decoded from one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    /// Canonical dotted name (`a.b.Outer.Inner`).
    pub name: String,
    pub access_flags: u16,
    /// Canonical names of the class-level runtime-visible annotations, in
    /// declaration order.
    pub annotations: Vec<String>,
}

impl ClassSummary {
    /// Returns `true` if the class is an annotation type (`@interface`).
    pub fn is_annotation(&self) -> bool {
        self.access_flags & ACC_ANNOTATION != 0
    }
}

/// Constant-pool entries we care about; everything else is a placeholder.
#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    Other,
}

/// Bounds-checked big-endian cursor over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ForgeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(ForgeError::Truncated(self.pos))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), ForgeError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, ForgeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ForgeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ForgeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decodes a class file.
///
/// # Errors
/// - `BadMagic` if the buffer does not start with `0xCAFEBABE`.
/// - `Truncated` if any structure runs past the end of the buffer.
/// - `Malformed` for dangling constant-pool references or unknown tags.
pub fn parse_class(bytes: &[u8]) -> Result<ClassSummary, ForgeError> {
    let mut r = Reader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ForgeError::BadMagic(magic));
    }
    r.skip(4)?; // minor_version, major_version

    let pool = read_constant_pool(&mut r)?;

    let access_flags = r.u16()?;
    let this_class = r.u16()?;
    r.skip(2)?; // super_class

    let interface_count = r.u16()? as usize;
    r.skip(interface_count * 2)?;

    skip_members(&mut r)?; // fields
    skip_members(&mut r)?; // methods

    let internal_name = class_name(&pool, this_class)?;
    let name = internal_to_canonical(internal_name);

    let mut annotations = Vec::new();
    let attribute_count = r.u16()?;
    for _ in 0..attribute_count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        let body = r.take(len)?;
        if utf8(&pool, name_index)? == RUNTIME_VISIBLE_ANNOTATIONS {
            annotations = read_annotation_types(&pool, body)?;
        }
    }

    Ok(ClassSummary {
        name,
        access_flags,
        annotations,
    })
}

fn read_constant_pool(r: &mut Reader<'_>) -> Result<Vec<Constant>, ForgeError> {
    let count = r.u16()? as usize;
    // Index 0 is unused by the format.
    let mut pool = Vec::with_capacity(count);
    pool.push(Constant::Other);

    while pool.len() < count {
        let tag = r.u8()?;
        match tag {
            1 => {
                let len = r.u16()? as usize;
                let raw = r.take(len)?;
                // Modified UTF-8 differs from UTF-8 only for NUL and
                // supplementary characters, neither of which appear in
                // type names.
                pool.push(Constant::Utf8(String::from_utf8_lossy(raw).into_owned()));
            }
            7 => pool.push(Constant::Class(r.u16()?)),
            8 | 16 | 19 | 20 => {
                r.skip(2)?;
                pool.push(Constant::Other);
            }
            15 => {
                r.skip(3)?;
                pool.push(Constant::Other);
            }
            3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                r.skip(4)?;
                pool.push(Constant::Other);
            }
            5 | 6 => {
                // Long and Double occupy two slots.
                r.skip(8)?;
                pool.push(Constant::Other);
                pool.push(Constant::Other);
            }
            other => {
                return Err(ForgeError::Malformed(format!(
                    "unknown constant pool tag {other} at index {}",
                    pool.len()
                )))
            }
        }
    }

    Ok(pool)
}

fn skip_members(r: &mut Reader<'_>) -> Result<(), ForgeError> {
    let count = r.u16()?;
    for _ in 0..count {
        r.skip(6)?; // access_flags, name_index, descriptor_index
        let attribute_count = r.u16()?;
        for _ in 0..attribute_count {
            r.skip(2)?;
            let len = r.u32()? as usize;
            r.skip(len)?;
        }
    }
    Ok(())
}

fn utf8(pool: &[Constant], index: u16) -> Result<&str, ForgeError> {
    match pool.get(index as usize) {
        Some(Constant::Utf8(s)) => Ok(s),
        _ => Err(ForgeError::Malformed(format!(
            "constant {index} is not a Utf8 entry"
        ))),
    }
}

fn class_name(pool: &[Constant], index: u16) -> Result<&str, ForgeError> {
    match pool.get(index as usize) {
        Some(Constant::Class(name_index)) => utf8(pool, *name_index),
        _ => Err(ForgeError::Malformed(format!(
            "constant {index} is not a Class entry"
        ))),
    }
}

/// Reads the annotation type descriptors from a `RuntimeVisibleAnnotations`
/// attribute body, skipping every element value.
fn read_annotation_types(pool: &[Constant], body: &[u8]) -> Result<Vec<String>, ForgeError> {
    let mut r = Reader::new(body);
    let count = r.u16()?;
    let mut types = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let type_index = r.u16()?;
        skip_element_pairs(&mut r)?;
        if let Some(name) = descriptor_to_canonical(utf8(pool, type_index)?) {
            types.push(name);
        }
    }
    Ok(types)
}

fn skip_element_pairs(r: &mut Reader<'_>) -> Result<(), ForgeError> {
    let pairs = r.u16()?;
    for _ in 0..pairs {
        r.skip(2)?; // element_name_index
        skip_element_value(r)?;
    }
    Ok(())
}

fn skip_element_value(r: &mut Reader<'_>) -> Result<(), ForgeError> {
    let tag = r.u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => r.skip(2),
        b'e' => r.skip(4),
        b'@' => {
            r.skip(2)?;
            skip_element_pairs(r)
        }
        b'[' => {
            let n = r.u16()?;
            for _ in 0..n {
                skip_element_value(r)?;
            }
            Ok(())
        }
        other => Err(ForgeError::Malformed(format!(
            "unknown element value tag {:?}",
            other as char
        ))),
    }
}

/// Converts an internal binary name (`a/b/Outer$Inner`) to a canonical name
/// (`a.b.Outer.Inner`).
///
/// # Examples
/// ```
/// # use forge::classfile::internal_to_canonical;
/// assert_eq!(internal_to_canonical("a/b/Outer$Inner"), "a.b.Outer.Inner");
/// ```
pub fn internal_to_canonical(internal: &str) -> String {
    internal.replace(['/', '$'], ".")
}

/// Converts a field descriptor (`La/b/C;`) to a canonical name.
/// Returns `None` for primitive and array descriptors.
pub fn descriptor_to_canonical(descriptor: &str) -> Option<String> {
    descriptor
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .map(internal_to_canonical)
}

/// Returns `true` for classes no source reference can name: anonymous and
/// local classes (`Outer$1`, `Outer$1Local`).
pub fn is_synthetic_name(internal: &str) -> bool {
    internal
        .split('$')
        .skip(1)
        .any(|segment| segment.starts_with(|c: char| c.is_ascii_digit()))
}
