//! In-memory Crate file builder for integration tests.
//!
//! Emits the wire layout the reader commits to: bootstrap, a payload blob
//! area, the six sections, and a trailing TOC. Layout:
//!
//! ```text
//! [bootstrap][value blobs][TOKENS][STRINGS][FIELDS][FIELDSETS][PATHS][SPECS][TOC]
//! ```

use byteorder::{LittleEndian, WriteBytesExt};
use half::f16;

use usd::usdc::compression::compress_frame;
use usd::usdc::format::*;
use usd::usdc::integer_coding::{encode_u32, encode_u64};
use usd::value::type_id::*;
use usd::value::{Specifier, Variability};

/// One node of the path tree to encode, in authored (DFS) order.
pub struct PathSpec {
    pub token: &'static str,
    pub is_property: bool,
    pub children: Vec<PathSpec>,
}

impl PathSpec {
    pub fn root(children: Vec<PathSpec>) -> Self {
        Self {
            token: "",
            is_property: false,
            children,
        }
    }

    pub fn prim(token: &'static str, children: Vec<PathSpec>) -> Self {
        Self {
            token,
            is_property: false,
            children,
        }
    }

    pub fn prop(token: &'static str) -> Self {
        Self {
            token,
            is_property: true,
            children: Vec::new(),
        }
    }

    fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(PathSpec::subtree_size).sum::<usize>()
    }
}

#[derive(Default)]
pub struct CrateBuilder {
    tokens: Vec<String>,
    strings: Vec<u32>,
    fields: Vec<(u32, u64)>,
    fieldsets: Vec<u32>,
    specs: Vec<(u32, u32, u32)>,
    path_entries: Vec<(u32, i32, i32)>,
    blob: Vec<u8>,
    pub compress_tokens: bool,
}

impl CrateBuilder {
    pub fn new() -> Self {
        let mut b = Self::default();
        // Reserve index 0 so property element tokens can be negated.
        b.tokens.push(String::new());
        b
    }

    /// Intern a token, returning its index.
    pub fn token(&mut self, s: &str) -> u32 {
        if let Some(pos) = self.tokens.iter().position(|t| t == s) {
            return pos as u32;
        }
        self.tokens.push(s.to_string());
        (self.tokens.len() - 1) as u32
    }

    /// Intern a string (token-backed), returning its STRINGS index.
    pub fn string(&mut self, s: &str) -> u32 {
        let tok = self.token(s);
        if let Some(pos) = self.strings.iter().position(|&t| t == tok) {
            return pos as u32;
        }
        self.strings.push(tok);
        (self.strings.len() - 1) as u32
    }

    /// Add a field, returning its index.
    pub fn field(&mut self, name: &str, rep: ValueRep) -> u32 {
        let tok = self.token(name);
        self.fields.push((tok, rep.to_u64()));
        (self.fields.len() - 1) as u32
    }

    /// Add a fieldset run, returning the index its spec refers to.
    pub fn fieldset(&mut self, field_indices: &[u32]) -> u32 {
        let start = self.fieldsets.len() as u32;
        self.fieldsets.extend_from_slice(field_indices);
        self.fieldsets.push(INDEX_SENTINEL);
        start
    }

    pub fn spec(&mut self, path_index: u32, fieldset_index: u32, spec_type: SpecType) {
        self.specs
            .push((path_index, fieldset_index, spec_type as u32));
    }

    /// Encode the path tree. Path indices are assigned in DFS preorder
    /// (the root is 0).
    pub fn paths(&mut self, root: &PathSpec) {
        self.path_entries.clear();
        self.emit_path(root, false);
    }

    fn emit_path(&mut self, node: &PathSpec, has_sibling: bool) {
        let index = self.path_entries.len() as u32;
        let tok = if node.token.is_empty() {
            0
        } else {
            self.token(node.token) as i32
        };
        let elem_token = if node.is_property { -tok } else { tok };

        let child_block: usize = node.children.iter().map(PathSpec::subtree_size).sum();
        let jump = match (node.children.is_empty(), has_sibling) {
            (true, true) => JUMP_SIBLING_ONLY,
            (true, false) => JUMP_LEAF,
            (false, false) => JUMP_CHILD_ONLY,
            (false, true) => (1 + child_block) as i32,
        };
        self.path_entries.push((index, elem_token, jump));

        let n = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            self.emit_path(child, i + 1 < n);
        }
    }

    fn blob_offset(&self) -> u64 {
        BOOTSTRAP_SIZE as u64 + self.blob.len() as u64
    }

    // === Inline value reps ===

    pub fn inline_bool(v: bool) -> ValueRep {
        ValueRep::inlined(TYPE_ID_BOOL as u8, u64::from(v))
    }

    pub fn inline_int(v: i32) -> ValueRep {
        ValueRep::inlined(TYPE_ID_INT as u8, u64::from(v as u32))
    }

    pub fn inline_float(v: f32) -> ValueRep {
        ValueRep::inlined(TYPE_ID_FLOAT as u8, u64::from(v.to_bits()))
    }

    /// Inline double: the reader widens the stored float image.
    pub fn inline_double(v: f32) -> ValueRep {
        ValueRep::inlined(TYPE_ID_DOUBLE as u8, u64::from(v.to_bits()))
    }

    pub fn inline_half3(x: f32, y: f32, z: f32) -> ValueRep {
        let payload = u64::from(f16::from_f32(x).to_bits())
            | u64::from(f16::from_f32(y).to_bits()) << 16
            | u64::from(f16::from_f32(z).to_bits()) << 32;
        ValueRep::inlined(TYPE_ID_HALF3 as u8, payload)
    }

    pub fn inline_specifier(v: Specifier) -> ValueRep {
        ValueRep::inlined(TYPE_ID_SPECIFIER as u8, v as u64)
    }

    pub fn inline_variability(v: Variability) -> ValueRep {
        ValueRep::inlined(TYPE_ID_VARIABILITY as u8, v as u64)
    }

    pub fn inline_block() -> ValueRep {
        ValueRep::inlined(TYPE_ID_VALUE_BLOCK as u8, 0)
    }

    pub fn inline_token(&mut self, s: &str) -> ValueRep {
        let tok = self.token(s);
        ValueRep::inlined(TYPE_ID_TOKEN as u8, u64::from(tok))
    }

    pub fn inline_string(&mut self, s: &str) -> ValueRep {
        let idx = self.string(s);
        ValueRep::inlined(TYPE_ID_STRING as u8, u64::from(idx))
    }

    pub fn inline_asset(&mut self, s: &str) -> ValueRep {
        let tok = self.token(s);
        ValueRep::inlined(TYPE_ID_ASSET_PATH as u8, u64::from(tok))
    }

    // === Blob-backed values ===

    pub fn blob_double(&mut self, v: f64) -> ValueRep {
        let off = self.blob_offset();
        self.blob.extend_from_slice(&v.to_le_bytes());
        ValueRep::offset(TYPE_ID_DOUBLE as u8, off)
    }

    pub fn blob_float3(&mut self, x: f32, y: f32, z: f32) -> ValueRep {
        let off = self.blob_offset();
        for f in [x, y, z] {
            self.blob.extend_from_slice(&f.to_le_bytes());
        }
        ValueRep::offset(TYPE_ID_FLOAT3 as u8, off)
    }

    pub fn timesamples(&mut self, samples: &[(f64, Option<ValueRep>)]) -> ValueRep {
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(samples.len() as u64)
            .expect("vec write");
        for (t, rep) in samples {
            self.blob.write_f64::<LittleEndian>(*t).expect("vec write");
            let rep = rep.unwrap_or_else(Self::inline_block);
            self.blob
                .write_u64::<LittleEndian>(rep.to_u64())
                .expect("vec write");
        }
        ValueRep::offset(TYPE_ID_TIMESAMPLES as u8, off)
    }

    pub fn token_array(&mut self, items: &[&str]) -> ValueRep {
        let indices: Vec<u32> = items.iter().map(|s| self.token(s)).collect();
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(indices.len() as u64)
            .expect("vec write");
        for idx in indices {
            self.blob.write_u32::<LittleEndian>(idx).expect("vec write");
        }
        ValueRep::array(TYPE_ID_TOKEN as u8, off)
    }

    pub fn float_array(&mut self, items: &[f32]) -> ValueRep {
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(items.len() as u64)
            .expect("vec write");
        for v in items {
            self.blob.write_f32::<LittleEndian>(*v).expect("vec write");
        }
        ValueRep::array(TYPE_ID_FLOAT as u8, off)
    }

    /// Float array stored behind an LZ4 frame.
    pub fn float_array_lz4(&mut self, items: &[f32]) -> ValueRep {
        let mut raw = Vec::with_capacity(items.len() * 4);
        for v in items {
            raw.write_f32::<LittleEndian>(*v).expect("vec write");
        }
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(items.len() as u64)
            .expect("vec write");
        let frame = compress_frame(&raw);
        self.blob.extend_from_slice(&frame);
        ValueRep::compressed_array(TYPE_ID_FLOAT as u8, off)
    }

    /// Int array stored integer-coded inside an LZ4 frame.
    pub fn int_array_compressed(&mut self, items: &[i32]) -> ValueRep {
        let as_u32: Vec<u32> = items.iter().map(|&v| v as u32).collect();
        let coded = encode_u32(&as_u32);
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(items.len() as u64)
            .expect("vec write");
        let frame = compress_frame(&coded);
        self.blob.extend_from_slice(&frame);
        ValueRep::compressed_array(TYPE_ID_INT as u8, off)
    }

    /// Uint64 array stored integer-coded inside an LZ4 frame.
    pub fn uint64_array_compressed(&mut self, items: &[u64]) -> ValueRep {
        let coded = encode_u64(items);
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(items.len() as u64)
            .expect("vec write");
        let frame = compress_frame(&coded);
        self.blob.extend_from_slice(&frame);
        ValueRep::compressed_array(TYPE_ID_UINT64 as u8, off)
    }

    pub fn float3_array(&mut self, items: &[[f32; 3]]) -> ValueRep {
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(items.len() as u64)
            .expect("vec write");
        for v in items {
            for f in v {
                self.blob.write_f32::<LittleEndian>(*f).expect("vec write");
            }
        }
        ValueRep::array(TYPE_ID_FLOAT3 as u8, off)
    }

    /// Explicit path list op (the only form connections use).
    pub fn path_listop_explicit(&mut self, path_indices: &[u32]) -> ValueRep {
        let off = self.blob_offset();
        self.blob.push(LISTOP_IS_EXPLICIT | LISTOP_HAS_EXPLICIT);
        self.blob
            .write_u64::<LittleEndian>(path_indices.len() as u64)
            .expect("vec write");
        for idx in path_indices {
            self.blob.write_u32::<LittleEndian>(*idx).expect("vec write");
        }
        ValueRep::offset(TYPE_ID_PATH_LISTOP as u8, off)
    }

    /// Token list op with arbitrary buckets, written in header-bit order:
    /// explicit, added, deleted, ordered, prepended, appended.
    #[allow(clippy::too_many_arguments)]
    pub fn token_listop(
        &mut self,
        explicit: Option<&[&str]>,
        added: &[&str],
        deleted: &[&str],
        ordered: &[&str],
        prepended: &[&str],
        appended: &[&str],
    ) -> ValueRep {
        let mut header = 0u8;
        if explicit.is_some() {
            header |= LISTOP_IS_EXPLICIT;
        }
        if explicit.is_some_and(|e| !e.is_empty()) {
            header |= LISTOP_HAS_EXPLICIT;
        }
        if !added.is_empty() {
            header |= LISTOP_HAS_ADDED;
        }
        if !deleted.is_empty() {
            header |= LISTOP_HAS_DELETED;
        }
        if !ordered.is_empty() {
            header |= LISTOP_HAS_ORDERED;
        }
        if !prepended.is_empty() {
            header |= LISTOP_HAS_PREPENDED;
        }
        if !appended.is_empty() {
            header |= LISTOP_HAS_APPENDED;
        }

        // Intern before taking the offset so token growth cannot interleave.
        let runs: Vec<Vec<u32>> = [
            explicit.unwrap_or(&[]),
            added,
            deleted,
            ordered,
            prepended,
            appended,
        ]
        .iter()
        .map(|items| items.iter().map(|s| self.token(s)).collect())
        .collect();

        let off = self.blob_offset();
        self.blob.push(header);
        for (run, present) in runs.iter().zip([
            header & LISTOP_HAS_EXPLICIT != 0,
            header & LISTOP_HAS_ADDED != 0,
            header & LISTOP_HAS_DELETED != 0,
            header & LISTOP_HAS_ORDERED != 0,
            header & LISTOP_HAS_PREPENDED != 0,
            header & LISTOP_HAS_APPENDED != 0,
        ]) {
            if !present {
                continue;
            }
            self.blob
                .write_u64::<LittleEndian>(run.len() as u64)
                .expect("vec write");
            for idx in run {
                self.blob.write_u32::<LittleEndian>(*idx).expect("vec write");
            }
        }
        ValueRep::offset(TYPE_ID_TOKEN_LISTOP as u8, off)
    }

    pub fn dictionary(&mut self, entries: &[(&str, ValueRep)]) -> ValueRep {
        let keys: Vec<u32> = entries.iter().map(|(k, _)| self.string(k)).collect();
        let off = self.blob_offset();
        self.blob
            .write_u64::<LittleEndian>(entries.len() as u64)
            .expect("vec write");
        for (key, (_, rep)) in keys.iter().zip(entries) {
            self.blob.write_u32::<LittleEndian>(*key).expect("vec write");
            self.blob
                .write_u64::<LittleEndian>(rep.to_u64())
                .expect("vec write");
        }
        ValueRep::offset(TYPE_ID_DICTIONARY as u8, off)
    }

    // === Assembly ===

    /// Assemble the file bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[
            CURRENT_VERSION.0,
            CURRENT_VERSION.1,
            CURRENT_VERSION.2,
        ]);
        out.extend_from_slice(&0u64.to_le_bytes()); // TOC offset, patched below
        assert_eq!(out.len(), BOOTSTRAP_SIZE);

        out.extend_from_slice(&self.blob);

        let mut sections: Vec<(&str, u64, u64)> = Vec::new();

        // TOKENS
        let start = out.len() as u64;
        let joined = self.tokens.join("\0");
        let raw = joined.as_bytes();
        let payload = if self.compress_tokens {
            let c = usd::usdc::compression::compress_block(raw);
            if c.len() < raw.len() {
                c
            } else {
                raw.to_vec()
            }
        } else {
            raw.to_vec()
        };
        let compressed_size = payload.len() as u64;
        out.extend_from_slice(&(self.tokens.len() as u64).to_le_bytes());
        out.extend_from_slice(&(raw.len() as u64).to_le_bytes());
        out.extend_from_slice(&compressed_size.to_le_bytes());
        out.extend_from_slice(&payload);
        sections.push((SECTION_TOKENS, start, out.len() as u64 - start));

        // STRINGS
        let start = out.len() as u64;
        out.extend_from_slice(&(self.strings.len() as u64).to_le_bytes());
        for idx in &self.strings {
            out.extend_from_slice(&idx.to_le_bytes());
        }
        sections.push((SECTION_STRINGS, start, out.len() as u64 - start));

        // FIELDS
        let start = out.len() as u64;
        out.extend_from_slice(&(self.fields.len() as u64).to_le_bytes());
        for (tok, _) in &self.fields {
            out.extend_from_slice(&tok.to_le_bytes());
        }
        for (_, rep) in &self.fields {
            out.extend_from_slice(&rep.to_le_bytes());
        }
        sections.push((SECTION_FIELDS, start, out.len() as u64 - start));

        // FIELDSETS
        let start = out.len() as u64;
        out.extend_from_slice(&(self.fieldsets.len() as u64).to_le_bytes());
        for idx in &self.fieldsets {
            out.extend_from_slice(&idx.to_le_bytes());
        }
        sections.push((SECTION_FIELDSETS, start, out.len() as u64 - start));

        // PATHS
        let start = out.len() as u64;
        out.extend_from_slice(&(self.path_entries.len() as u64).to_le_bytes());
        for (pi, _, _) in &self.path_entries {
            out.extend_from_slice(&pi.to_le_bytes());
        }
        for (_, et, _) in &self.path_entries {
            out.extend_from_slice(&et.to_le_bytes());
        }
        for (_, _, j) in &self.path_entries {
            out.extend_from_slice(&j.to_le_bytes());
        }
        sections.push((SECTION_PATHS, start, out.len() as u64 - start));

        // SPECS
        let start = out.len() as u64;
        out.extend_from_slice(&(self.specs.len() as u64).to_le_bytes());
        for (pi, fi, st) in &self.specs {
            out.extend_from_slice(&pi.to_le_bytes());
            out.extend_from_slice(&fi.to_le_bytes());
            out.extend_from_slice(&st.to_le_bytes());
        }
        sections.push((SECTION_SPECS, start, out.len() as u64 - start));

        // TOC
        let toc_offset = out.len() as u64;
        out.extend_from_slice(&(sections.len() as u64).to_le_bytes());
        for (name, start, size) in &sections {
            let mut name_bytes = [0u8; 16];
            name_bytes[..name.len()].copy_from_slice(name.as_bytes());
            out.extend_from_slice(&name_bytes);
            out.extend_from_slice(&start.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
        out[TOC_OFFSET_POS..TOC_OFFSET_POS + 8].copy_from_slice(&toc_offset.to_le_bytes());
        out
    }
}
