//! Builders for class files and jars, shared with downstream test suites.

use crate::classfile::{MAGIC, RUNTIME_VISIBLE_ANNOTATIONS};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Assembles a minimal class file.
///
/// `annotations` are internal names (`a/b/C`); the first one carries a
/// `value = "x"` string element when `with_values` is set.
pub fn class_bytes(
    internal_name: &str,
    access_flags: u16,
    annotations: &[&str],
    with_values: bool,
) -> Vec<u8> {
    fn utf8_entry(out: &mut Vec<u8>, s: &str) {
        out.push(1);
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    let mut pool = Vec::new();
    utf8_entry(&mut pool, internal_name); // #1
    pool.extend_from_slice(&[7, 0, 1]); // #2 Class -> #1
    utf8_entry(&mut pool, "java/lang/Object"); // #3
    pool.extend_from_slice(&[7, 0, 3]); // #4 Class -> #3
    utf8_entry(&mut pool, RUNTIME_VISIBLE_ANNOTATIONS); // #5
    pool.push(5); // #6-#7 Long
    pool.extend_from_slice(&42u64.to_be_bytes());
    utf8_entry(&mut pool, "value"); // #8
    utf8_entry(&mut pool, "x"); // #9
    let first_annotation_index = 10u16;
    for a in annotations {
        utf8_entry(&mut pool, &format!("L{a};"));
    }
    let pool_count = first_annotation_index + annotations.len() as u16;

    let mut body = Vec::new();
    body.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for (i, _) in annotations.iter().enumerate() {
        body.extend_from_slice(&(first_annotation_index + i as u16).to_be_bytes());
        if with_values && i == 0 {
            body.extend_from_slice(&2u16.to_be_bytes());
            // value = "x"
            body.extend_from_slice(&8u16.to_be_bytes());
            body.push(b's');
            body.extend_from_slice(&9u16.to_be_bytes());
            // value = { 42L, ElementType }
            body.extend_from_slice(&8u16.to_be_bytes());
            body.push(b'[');
            body.extend_from_slice(&2u16.to_be_bytes());
            body.push(b'J');
            body.extend_from_slice(&6u16.to_be_bytes());
            body.push(b'e');
            body.extend_from_slice(&3u16.to_be_bytes());
            body.extend_from_slice(&9u16.to_be_bytes());
        } else {
            body.extend_from_slice(&0u16.to_be_bytes());
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 52]);
    out.extend_from_slice(&pool_count.to_be_bytes());
    out.extend_from_slice(&pool);
    out.extend_from_slice(&access_flags.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes()); // this_class
    out.extend_from_slice(&4u16.to_be_bytes()); // super_class
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    // one field with one (ignored) attribute
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0, 1, 0, 8, 0, 9]);
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&8u16.to_be_bytes());
    out.extend_from_slice(&3u32.to_be_bytes());
    out.extend_from_slice(&[1, 2, 3]);
    out.extend_from_slice(&0u16.to_be_bytes()); // methods
    if annotations.is_empty() {
        out.extend_from_slice(&0u16.to_be_bytes());
    } else {
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&5u16.to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
    }
    out
}

/// Writes an uncompressed jar holding `entries` in order.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) -> io::Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(path)?);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    writer.finish()?;
    Ok(())
}
