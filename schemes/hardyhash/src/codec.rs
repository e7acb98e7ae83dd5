//! Deterministic binary codec for persisted structures.
//!
//! One codec serves signer states, signatures, and the public key.
//! Layout rules: fixed-size byte arrays are raw bytes; dynamic
//! sequences are a little-endian `u64` length prefix followed by
//! elements; `bool` is one byte; integers are little-endian at their
//! declared width; structs are their fields in declaration order.
//! The layout matches the state files written by earlier releases,
//! so field order and integer widths must not change.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::node::MerkleNode;
use crate::params::HASH_SIZE;
use crate::state::{Signature, SignerState};
use crate::treehash::Treehash;
use crate::wots::OtsSignature;

/// Append-only byte sink for encoding.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Writer::default()
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn put_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over encoded bytes for decoding.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(Error::Decoding { context });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn get_hash(&mut self, context: &'static str) -> Result<[u8; HASH_SIZE]> {
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(self.take(HASH_SIZE, context)?);
        Ok(out)
    }

    fn get_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.take(1, context)?[0])
    }

    fn get_bool(&mut self, context: &'static str) -> Result<bool> {
        Ok(self.get_u8(context)? != 0)
    }

    fn get_u32(&mut self, context: &'static str) -> Result<u32> {
        let mut out = [0u8; 4];
        out.copy_from_slice(self.take(4, context)?);
        Ok(u32::from_le_bytes(out))
    }

    fn get_u64(&mut self, context: &'static str) -> Result<u64> {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.take(8, context)?);
        Ok(u64::from_le_bytes(out))
    }

    fn get_len(&mut self, context: &'static str) -> Result<usize> {
        let len = self.get_u64(context)?;
        // A length prefix larger than the remaining input is corrupt.
        if len > (self.buf.len() - self.pos) as u64 {
            return Err(Error::Decoding { context });
        }
        Ok(len as usize)
    }
}

fn encode_node(w: &mut Writer, node: &MerkleNode) {
    w.put_bytes(&node.hash);
    w.put_u8(node.height);
    w.put_u32(node.index);
}

fn decode_node(r: &mut Reader<'_>) -> Result<MerkleNode> {
    Ok(MerkleNode {
        hash: r.get_hash("merkle node hash")?,
        height: r.get_u8("merkle node height")?,
        index: r.get_u32("merkle node index")?,
    })
}

fn encode_nodes(w: &mut Writer, nodes: &[MerkleNode]) {
    w.put_u64(nodes.len() as u64);
    for node in nodes {
        encode_node(w, node);
    }
}

fn decode_nodes(r: &mut Reader<'_>) -> Result<Vec<MerkleNode>> {
    let len = r.get_len("merkle node sequence")?;
    let mut nodes = Vec::with_capacity(len);
    for _ in 0..len {
        nodes.push(decode_node(r)?);
    }
    Ok(nodes)
}

fn encode_treehash(w: &mut Writer, t: &Treehash) {
    w.put_bool(t.initialized);
    w.put_u64(t.n_updates);
    w.put_bytes(&t.secret);
    w.put_u64(t.leaf_index);
    w.put_u64(t.nodes_on_stack);
    encode_node(w, &t.node);
    w.put_u64(t.h as u64);
}

fn decode_treehash(r: &mut Reader<'_>) -> Result<Treehash> {
    let initialized = r.get_bool("treehash running flag")?;
    let n_updates = r.get_u64("treehash update count")?;
    let secret = r.get_hash("treehash secret")?;
    let leaf_index = r.get_u64("treehash leaf index")?;
    let nodes_on_stack = r.get_u64("treehash stack claim")?;
    let node = decode_node(r)?;
    let h = r.get_u64("treehash target height")?;
    let mut t = Treehash::new(secret, leaf_index, h as u8);
    t.initialized = initialized;
    t.n_updates = n_updates;
    t.nodes_on_stack = nodes_on_stack;
    t.node = node;
    Ok(t)
}

fn encode_ots(w: &mut Writer, ots: &OtsSignature) {
    w.put_u64(ots.len() as u64);
    for element in ots {
        w.put_bytes(element);
    }
}

fn decode_ots(r: &mut Reader<'_>) -> Result<OtsSignature> {
    let len = r.get_len("one-time signature")?;
    let mut ots = Vec::with_capacity(len);
    for _ in 0..len {
        ots.push(r.get_hash("one-time signature element")?);
    }
    Ok(ots)
}

/// Encodes a signature.
pub fn encode_signature(signature: &Signature) -> Vec<u8> {
    let mut w = Writer::new();
    encode_nodes(&mut w, &signature.auth_path);
    encode_node(&mut w, &signature.leaf);
    encode_ots(&mut w, &signature.ots);
    w.into_bytes()
}

/// Decodes a signature.
pub fn decode_signature(bytes: &[u8]) -> Result<Signature> {
    let mut r = Reader::new(bytes);
    Ok(Signature {
        auth_path: decode_nodes(&mut r)?,
        leaf: decode_node(&mut r)?,
        ots: decode_ots(&mut r)?,
    })
}

/// Encodes a signer state.
///
/// The subtree root is intentionally absent: it is only meaningful
/// in memory between subtree construction and tree-top assembly.
pub fn encode_signer_state(state: &SignerState) -> Vec<u8> {
    let mut w = Writer::new();
    w.put_bytes(&state.secret_key);
    encode_nodes(&mut w, &state.auth_path);
    encode_node(&mut w, &state.retain);
    w.put_u64(state.treehash_instances.len() as u64);
    for t in &state.treehash_instances {
        encode_treehash(&mut w, t);
    }
    encode_nodes(&mut w, &state.keep);
    w.put_bool(state.exhausted);
    encode_nodes(&mut w, &state.treehash_stack);
    w.into_bytes()
}

/// Decodes a signer state. The treehash instances address the
/// decoded `treehash_stack` by owning counts alone, so nothing needs
/// re-attaching.
pub fn decode_signer_state(bytes: &[u8]) -> Result<SignerState> {
    let mut r = Reader::new(bytes);
    let secret_key = r.get_hash("signer secret key")?;
    let auth_path = decode_nodes(&mut r)?;
    let retain = decode_node(&mut r)?;
    let n_instances = r.get_len("treehash instance sequence")?;
    let mut treehash_instances = Vec::with_capacity(n_instances);
    for _ in 0..n_instances {
        treehash_instances.push(decode_treehash(&mut r)?);
    }
    let keep = decode_nodes(&mut r)?;
    let exhausted = r.get_bool("exhausted flag")?;
    let treehash_stack = decode_nodes(&mut r)?;
    Ok(SignerState {
        secret_key,
        auth_path,
        retain,
        treehash_instances,
        keep,
        treehash_stack,
        root: MerkleNode::default(),
        exhausted,
    })
}

/// Encodes the public key file: the raw root hash.
pub fn encode_public_key(public_key: &[u8; HASH_SIZE]) -> Vec<u8> {
    public_key.to_vec()
}

/// Decodes the public key file.
pub fn decode_public_key(bytes: &[u8]) -> Result<[u8; HASH_SIZE]> {
    if bytes.len() != HASH_SIZE {
        return Err(Error::Decoding {
            context: "public key",
        });
    }
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Writes `bytes` to `path` through a temporary file and rename, so
/// a crash mid-write never leaves a torn file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|source| Error::Io {
        context: "writing temporary file",
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| Error::Io {
        context: "renaming temporary file into place",
        source,
    })
}
