//! Canonical object encoding.
//!
//! Every object is framed as `"<kind> <len>\0"` followed by its payload, and
//! its identity is the SHA-1 of that framing. Payload formats:
//!
//! ```text
//! tree:   ( "<mode-octal> <kind> <name>\0" <20-byte digest> )*   sorted by name
//! commit: tree <hex>\n
//!         parent <hex>\n          (zero or more, in order)
//!         author <name> <<email>> <secs> <+hhmm>\n
//!         \n
//!         <message>
//! ```
//!
//! [`encode`] is total on validated values; [`decode`] rejects anything that
//! would not encode back to the same bytes.

use grove_crypto::ContentHasher;
use grove_types::{ObjectId, DIGEST_LEN};

use crate::error::{StoreError, StoreResult};
use crate::object::{
    validate_entry_name, Commit, EntryMode, Object, ObjectKind, Signature, StoredObject, Tree,
    TreeEntry,
};

/// Canonical bytes (header included) of an object.
pub fn encode(object: &Object) -> Vec<u8> {
    object.to_stored_object().to_bytes()
}

/// Parse canonical bytes back into an object.
pub fn decode(bytes: &[u8]) -> StoreResult<Object> {
    let stored = StoredObject::from_bytes(bytes)?;
    Object::from_stored_object(&stored)
}

/// Digest of already-encoded bytes. Pure; no I/O.
pub fn digest_of(bytes: &[u8]) -> ObjectId {
    ContentHasher::raw_hash(bytes)
}

// ---------------------------------------------------------------------------
// Tree payload
// ---------------------------------------------------------------------------

pub(crate) fn encode_tree(tree: &Tree) -> Vec<u8> {
    let mut out = Vec::with_capacity(tree.entries.len() * 48);
    for entry in &tree.entries {
        out.extend_from_slice(
            format!("{:o} {} {}\0", entry.mode.mode_bits(), entry.kind(), entry.name).as_bytes(),
        );
        out.extend_from_slice(entry.object_id.as_bytes());
    }
    out
}

pub(crate) fn decode_tree(mut data: &[u8]) -> StoreResult<Tree> {
    let mut entries: Vec<TreeEntry> = Vec::new();

    while !data.is_empty() {
        let (mode_field, rest) = split_at_byte(data, b' ')
            .ok_or_else(|| StoreError::malformed("tree entry has no mode"))?;
        let (kind_field, rest) = split_at_byte(rest, b' ')
            .ok_or_else(|| StoreError::malformed("tree entry has no kind"))?;
        let (name_field, rest) = split_at_byte(rest, b'\0')
            .ok_or_else(|| StoreError::malformed("tree entry name is not terminated"))?;
        if rest.len() < DIGEST_LEN {
            return Err(StoreError::malformed("tree entry digest is truncated"));
        }
        let (digest, rest) = rest.split_at(DIGEST_LEN);

        let mode = std::str::from_utf8(mode_field)
            .ok()
            .filter(|s| !s.is_empty() && !s.starts_with('0'))
            .and_then(|s| u32::from_str_radix(s, 8).ok())
            .and_then(EntryMode::from_mode_bits)
            .ok_or_else(|| {
                StoreError::malformed(format!(
                    "invalid tree entry mode {:?}",
                    String::from_utf8_lossy(mode_field)
                ))
            })?;

        let kind = ObjectKind::from_tag(kind_field)
            .filter(|k| *k != ObjectKind::Commit)
            .ok_or_else(|| StoreError::malformed("invalid tree entry kind"))?;
        if kind != mode.object_kind() {
            return Err(StoreError::malformed(format!(
                "tree entry kind {kind} does not match mode {mode}"
            )));
        }

        let name = std::str::from_utf8(name_field)
            .map_err(|_| StoreError::malformed("tree entry name is not UTF-8"))?;
        validate_entry_name(name)?;
        if let Some(prev) = entries.last() {
            if prev.name.as_str() >= name {
                return Err(StoreError::malformed(format!(
                    "tree entries not sorted by name: {:?} after {:?}",
                    name, prev.name
                )));
            }
        }

        let object_id =
            ObjectId::from_slice(digest).map_err(|e| StoreError::malformed(e.to_string()))?;
        entries.push(TreeEntry::new(mode, name, object_id));
        data = rest;
    }

    Ok(Tree { entries })
}

fn split_at_byte(data: &[u8], sep: u8) -> Option<(&[u8], &[u8])> {
    let pos = data.iter().position(|&b| b == sep)?;
    Some((&data[..pos], &data[pos + 1..]))
}

// ---------------------------------------------------------------------------
// Commit payload
// ---------------------------------------------------------------------------

pub(crate) fn encode_commit(commit: &Commit) -> Vec<u8> {
    let mut out = format!("tree {}\n", commit.tree);
    for parent in &commit.parents {
        out.push_str(&format!("parent {parent}\n"));
    }
    out.push_str(&format!("author {}\n\n", format_signature(&commit.author)));
    out.push_str(&commit.message);
    out.into_bytes()
}

pub(crate) fn decode_commit(data: &[u8]) -> StoreResult<Commit> {
    let text =
        std::str::from_utf8(data).map_err(|_| StoreError::malformed("commit is not UTF-8"))?;
    let (headers, message) = text
        .split_once("\n\n")
        .ok_or_else(|| StoreError::malformed("commit has no message separator"))?;

    let mut lines = headers.split('\n');

    let tree = lines
        .next()
        .and_then(|line| line.strip_prefix("tree "))
        .ok_or_else(|| StoreError::malformed("commit does not start with a tree line"))
        .and_then(parse_hex_id)?;

    let mut parents = Vec::new();
    let mut author = None;
    for line in lines {
        if let Some(hex) = line.strip_prefix("parent ") {
            if author.is_some() {
                return Err(StoreError::malformed("parent line after author line"));
            }
            parents.push(parse_hex_id(hex)?);
        } else if let Some(sig) = line.strip_prefix("author ") {
            if author.is_some() {
                return Err(StoreError::malformed("duplicate author line"));
            }
            author = Some(parse_signature(sig)?);
        } else {
            return Err(StoreError::malformed(format!(
                "unexpected commit header line {line:?}"
            )));
        }
    }

    let author = author.ok_or_else(|| StoreError::malformed("commit has no author"))?;
    Ok(Commit::new(tree, parents, author, message))
}

fn parse_hex_id(hex: &str) -> StoreResult<ObjectId> {
    if hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(StoreError::malformed(format!("digest {hex:?} is not lowercase")));
    }
    ObjectId::from_hex(hex).map_err(|e| StoreError::malformed(format!("bad digest {hex:?}: {e}")))
}

fn format_signature(sig: &Signature) -> String {
    let sign = if sig.tz_offset_minutes < 0 { '-' } else { '+' };
    let minutes = sig.tz_offset_minutes.abs();
    format!(
        "{} <{}> {} {}{:02}{:02}",
        sig.name,
        sig.email,
        sig.timestamp,
        sign,
        minutes / 60,
        minutes % 60
    )
}

fn parse_signature(s: &str) -> StoreResult<Signature> {
    let bad = || StoreError::malformed(format!("invalid author line {s:?}"));

    let lt = s.find('<').ok_or_else(bad)?;
    let gt = s[lt..].find('>').map(|i| lt + i).ok_or_else(bad)?;
    let name = s[..lt].strip_suffix(' ').ok_or_else(bad)?;
    let email = &s[lt + 1..gt];
    let (secs, tz) = s[gt + 1..]
        .strip_prefix(' ')
        .and_then(|rest| rest.split_once(' '))
        .ok_or_else(bad)?;

    let timestamp: i64 = secs.parse().map_err(|_| bad())?;
    if timestamp.to_string() != secs {
        return Err(bad());
    }
    let tz = tz.as_bytes();
    if tz.len() != 5 || !tz[1..].iter().all(u8::is_ascii_digit) {
        return Err(bad());
    }
    let sign = match tz[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(bad()),
    };
    let digit = |i: usize| i32::from(tz[i] - b'0');
    let hours = digit(1) * 10 + digit(2);
    let minutes = digit(3) * 10 + digit(4);
    // `-0000` would re-encode as `+0000`.
    if minutes >= 60 || (sign < 0 && hours == 0 && minutes == 0) {
        return Err(bad());
    }

    Ok(Signature::new(
        name,
        email,
        timestamp,
        sign * (hours * 60 + minutes),
    ))
}
