//! Crate table decoder.
//!
//! Reads the six Crate sections into their in-memory tables and decodes
//! every field value into a [`Value`], producing the inputs the
//! reconstruction phase walks: nodes, specs, fields, paths, element paths,
//! and live fieldsets. Field values decode independently, so the value pass
//! fans out over a rayon pool when `num_threads` allows; every other table
//! is decoded by the calling thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use half::f16;
use rayon::prelude::*;

use super::compression;
use super::format::*;
use super::integer_coding;
use super::reader::{Bootstrap, CrateSource, Toc};
use super::CrateReaderConfig;
use crate::attr::TimeSamples;
use crate::listop::ListOp;
use crate::path::Path;
use crate::util::{
    DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, Error, Half2, Half3, Half4, IVec2, IVec3,
    IVec4, Mat4, Quat, Quath, Result, Vec2, Vec3, Vec4,
};
use crate::value::type_id::*;
use crate::value::{
    AssetPath, Dictionary, LayerOffset, Payload, Permission, Reference, Specifier, Token, Value,
    Variability,
};

/// Nested value structures (dictionaries, time samples) deeper than this
/// abort the read.
const VALUE_RECURSION_LIMIT: u32 = 32;

/// One node of the path tree, indexed by path index.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Parent path index, -1 for the pseudo-root.
    pub parent: i64,
    /// Child path indices in file order.
    pub children: Vec<u32>,
}

/// One FIELDS entry.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub token_index: u32,
    pub rep: ValueRep,
}

/// One SPECS entry.
#[derive(Clone, Copy, Debug)]
pub struct Spec {
    pub path_index: u32,
    pub fieldset_index: u32,
    pub spec_type: SpecType,
}

/// Decoded `(field name, value)` pairs of one fieldset.
pub type FieldValuePairVector = Vec<(Token, Value)>;

/// Streaming-positioned Crate decoder.
pub struct CrateReader {
    source: CrateSource,
    config: CrateReaderConfig,
    version: (u8, u8, u8),
    toc: Toc,
    tokens: Vec<Token>,
    string_indices: Vec<u32>,
    fields: Vec<Field>,
    fieldset_indices: Vec<u32>,
    paths: Vec<Path>,
    elem_paths: Vec<Path>,
    nodes: Vec<Node>,
    specs: Vec<Spec>,
    live_fieldsets: HashMap<u32, FieldValuePairVector>,
    warnings: Vec<String>,
    memory_used: AtomicU64,
}

impl CrateReader {
    /// Parse the bootstrap and TOC; table reads follow in
    /// [`CrateReader::read_tables`].
    pub fn new(source: CrateSource, config: CrateReaderConfig) -> Result<Self> {
        let bootstrap = Bootstrap::read(&source)?;
        let toc = Toc::read(&source, bootstrap.toc_offset)?;

        let mut warnings = Vec::new();
        for name in toc.unknown_sections() {
            let msg = format!("skipping unknown section `{name}`");
            log::warn!("[USDC] {msg}");
            warnings.push(msg);
        }

        Ok(Self {
            source,
            config,
            version: bootstrap.version,
            toc,
            tokens: Vec::new(),
            string_indices: Vec::new(),
            fields: Vec::new(),
            fieldset_indices: Vec::new(),
            paths: Vec::new(),
            elem_paths: Vec::new(),
            nodes: Vec::new(),
            specs: Vec::new(),
            live_fieldsets: HashMap::new(),
            warnings,
            memory_used: AtomicU64::new(0),
        })
    }

    /// Decode every table. All-or-nothing: any failure leaves no usable
    /// tables behind.
    pub fn read_tables(&mut self) -> Result<()> {
        self.read_tokens()?;
        self.read_strings()?;
        self.read_fields()?;
        self.read_fieldsets()?;
        self.read_paths()?;
        self.read_specs()?;
        self.build_live_fieldsets()
    }

    #[inline]
    pub fn version(&self) -> (u8, u8, u8) {
        self.version
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[inline]
    pub fn specs(&self) -> &[Spec] {
        &self.specs
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    #[inline]
    pub fn elem_paths(&self) -> &[Path] {
        &self.elem_paths
    }

    #[inline]
    pub fn config(&self) -> &CrateReaderConfig {
        &self.config
    }

    /// Decoded pairs for a fieldset, keyed by the index of its first entry
    /// in the FIELDSETS table.
    pub fn fieldset_pairs(&self, fieldset_index: u32) -> Option<&FieldValuePairVector> {
        self.live_fieldsets.get(&fieldset_index)
    }

    #[inline]
    pub fn live_fieldsets(&self) -> &HashMap<u32, FieldValuePairVector> {
        &self.live_fieldsets
    }

    /// Warnings accumulated so far.
    #[inline]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn push_warning(&mut self, msg: String) {
        log::warn!("[USDC] {msg}");
        self.warnings.push(msg);
    }

    /// Estimated bytes allocated for decoded tables. Monotone
    /// non-decreasing during a read.
    pub fn memory_used(&self) -> u64 {
        self.memory_used.load(Ordering::Relaxed)
    }

    fn track_memory(&self, bytes: u64) {
        self.memory_used.fetch_add(bytes, Ordering::Relaxed);
    }

    fn section(&self, name: &'static str) -> Result<(u64, u64)> {
        self.toc
            .find(name)
            .map(|s| (s.start, s.size))
            .ok_or_else(|| Error::structural(name, 0, "section missing from TOC"))
    }

    fn token(&self, index: u64) -> Result<&Token> {
        self.tokens.get(index as usize).ok_or_else(|| {
            Error::structural(
                SECTION_TOKENS,
                index,
                format!("token index {index} out of range ({})", self.tokens.len()),
            )
        })
    }

    fn string(&self, index: u64) -> Result<String> {
        let token_index = *self.string_indices.get(index as usize).ok_or_else(|| {
            Error::structural(
                SECTION_STRINGS,
                index,
                format!(
                    "string index {index} out of range ({})",
                    self.string_indices.len()
                ),
            )
        })?;
        Ok(self.token(u64::from(token_index))?.as_str().to_string())
    }

    fn path(&self, index: u64) -> Result<&Path> {
        self.paths.get(index as usize).ok_or_else(|| {
            Error::structural(
                SECTION_PATHS,
                index,
                format!("path index {index} out of range ({})", self.paths.len()),
            )
        })
    }

    // === Section readers ===

    fn read_tokens(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_TOKENS)?;
        if size < 24 {
            return Err(Error::structural(SECTION_TOKENS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        let uncompressed_size = self.source.read_u64(start + 8)?;
        let compressed_size = self.source.read_u64(start + 16)?;

        if compressed_size > size - 24 {
            return Err(Error::structural(
                SECTION_TOKENS,
                start + 16,
                "compressed blob extends past section",
            ));
        }
        self.track_memory(uncompressed_size);

        let blob = self
            .source
            .read_bytes(start + 24, compressed_size as usize)?;
        let raw = if compressed_size == uncompressed_size {
            blob
        } else {
            compression::decompress_block(&blob, uncompressed_size as usize)?
        };

        if count == 0 {
            if !raw.is_empty() {
                return Err(Error::structural(
                    SECTION_TOKENS,
                    start,
                    "token blob not empty for zero tokens",
                ));
            }
            return Ok(());
        }

        let mut tokens = Vec::with_capacity(count as usize);
        for piece in raw.split(|&b| b == 0) {
            let s = std::str::from_utf8(piece)
                .map_err(|_| Error::structural(SECTION_TOKENS, start, "token is not UTF-8"))?;
            tokens.push(Token::new(s));
        }
        if tokens.len() as u64 != count {
            return Err(Error::structural(
                SECTION_TOKENS,
                start,
                format!("expected {count} tokens, found {}", tokens.len()),
            ));
        }
        self.tokens = tokens;
        Ok(())
    }

    fn read_strings(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_STRINGS)?;
        if size < 8 {
            return Err(Error::structural(SECTION_STRINGS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        if count > (size - 8) / 4 {
            return Err(Error::structural(
                SECTION_STRINGS,
                start,
                "index array extends past section",
            ));
        }
        self.track_memory(count * 4);

        let bytes = self.source.read_bytes(start + 8, (count * 4) as usize)?;
        let mut indices = Vec::with_capacity(count as usize);
        for chunk in bytes.chunks_exact(4) {
            let idx = le_u32(chunk);
            if idx as usize >= self.tokens.len() {
                return Err(Error::structural(
                    SECTION_STRINGS,
                    start,
                    format!("token index {idx} out of range"),
                ));
            }
            indices.push(idx);
        }
        self.string_indices = indices;
        Ok(())
    }

    fn read_fields(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_FIELDS)?;
        if size < 8 {
            return Err(Error::structural(SECTION_FIELDS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        if count > (size - 8) / 12 {
            return Err(Error::structural(
                SECTION_FIELDS,
                start,
                "field arrays extend past section",
            ));
        }
        self.track_memory(count * 12);

        let index_bytes = self.source.read_bytes(start + 8, (count * 4) as usize)?;
        let rep_bytes = self
            .source
            .read_bytes(start + 8 + count * 4, (count * 8) as usize)?;

        let mut fields = Vec::with_capacity(count as usize);
        for (ic, rc) in index_bytes.chunks_exact(4).zip(rep_bytes.chunks_exact(8)) {
            let token_index = le_u32(ic);
            if token_index as usize >= self.tokens.len() {
                return Err(Error::structural(
                    SECTION_FIELDS,
                    start,
                    format!("field name token index {token_index} out of range"),
                ));
            }
            fields.push(Field {
                token_index,
                rep: ValueRep::from_u64(le_u64(rc)),
            });
        }
        self.fields = fields;
        Ok(())
    }

    fn read_fieldsets(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_FIELDSETS)?;
        if size < 8 {
            return Err(Error::structural(SECTION_FIELDSETS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        if count > (size - 8) / 4 {
            return Err(Error::structural(
                SECTION_FIELDSETS,
                start,
                "index array extends past section",
            ));
        }
        self.track_memory(count * 4);

        let bytes = self.source.read_bytes(start + 8, (count * 4) as usize)?;
        let mut indices = Vec::with_capacity(count as usize);
        for chunk in bytes.chunks_exact(4) {
            let idx = le_u32(chunk);
            if idx != INDEX_SENTINEL && idx as usize >= self.fields.len() {
                return Err(Error::structural(
                    SECTION_FIELDSETS,
                    start,
                    format!("field index {idx} out of range ({})", self.fields.len()),
                ));
            }
            indices.push(idx);
        }
        if let Some(&last) = indices.last() {
            if last != INDEX_SENTINEL {
                return Err(Error::structural(
                    SECTION_FIELDSETS,
                    start,
                    "last fieldset run is unterminated",
                ));
            }
        }
        self.fieldset_indices = indices;
        Ok(())
    }

    fn read_paths(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_PATHS)?;
        if size < 8 {
            return Err(Error::structural(SECTION_PATHS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        if count > (size - 8) / 12 {
            return Err(Error::structural(
                SECTION_PATHS,
                start,
                "path arrays extend past section",
            ));
        }
        if count == 0 {
            return Err(Error::structural(
                SECTION_PATHS,
                start,
                "path tree has no pseudo-root",
            ));
        }
        self.track_memory(count * 12);

        let pi_bytes = self.source.read_bytes(start + 8, (count * 4) as usize)?;
        let et_bytes = self
            .source
            .read_bytes(start + 8 + count * 4, (count * 4) as usize)?;
        let j_bytes = self
            .source
            .read_bytes(start + 8 + count * 8, (count * 4) as usize)?;

        let path_indexes: Vec<u32> = pi_bytes.chunks_exact(4).map(le_u32).collect();
        let elem_tokens: Vec<i32> = et_bytes.chunks_exact(4).map(le_i32).collect();
        let jumps: Vec<i32> = j_bytes.chunks_exact(4).map(le_i32).collect();

        for &pi in &path_indexes {
            if pi as u64 >= count {
                return Err(Error::structural(
                    SECTION_PATHS,
                    start,
                    format!("path index {pi} out of range ({count})"),
                ));
            }
        }

        self.build_path_tree(start, &path_indexes, &elem_tokens, &jumps)
    }

    /// Walk the delta-coded entries into the expanded path and element
    /// tables and the node tree.
    fn build_path_tree(
        &mut self,
        section_start: u64,
        path_indexes: &[u32],
        elem_tokens: &[i32],
        jumps: &[i32],
    ) -> Result<()> {
        let count = path_indexes.len();
        let mut paths = vec![Path::invalid(); count];
        let mut elem_paths = vec![Path::invalid(); count];
        let mut nodes: Vec<Node> = vec![
            Node {
                parent: -1,
                children: Vec::new(),
            };
            count
        ];

        // (entry cursor, parent path index, depth) resumption points for
        // siblings of entries that also had a child.
        let mut pending: Vec<(usize, i64, u32)> = Vec::new();
        let mut cur = 0usize;
        let mut parent: i64 = -1;
        let mut depth = 0u32;
        let mut visited = 0usize;

        loop {
            if cur >= count {
                return Err(Error::structural(
                    SECTION_PATHS,
                    section_start,
                    format!("entry cursor {cur} runs past {count} entries"),
                ));
            }
            visited += 1;
            if visited > count {
                return Err(Error::structural(
                    SECTION_PATHS,
                    section_start,
                    "jump table cycles",
                ));
            }

            let this = path_indexes[cur] as usize;
            if paths[this].is_valid() {
                return Err(Error::structural(
                    SECTION_PATHS,
                    section_start,
                    format!("path index {this} assigned twice"),
                ));
            }

            if parent < 0 {
                paths[this] = Path::root();
                elem_paths[this] = Path::root();
            } else {
                let tok_index = elem_tokens[cur];
                let tok = self.token(tok_index.unsigned_abs().into())?.clone();
                let parent_path = &paths[parent as usize];
                let is_prop = tok_index < 0;
                let (full, elem) = if is_prop {
                    (
                        parent_path.append_property(tok.as_str()),
                        Path::new("", tok.as_str()),
                    )
                } else {
                    (
                        parent_path.append_element(tok.as_str()),
                        Path::new(tok.as_str(), ""),
                    )
                };
                if !full.is_valid() {
                    return Err(Error::structural(
                        SECTION_PATHS,
                        section_start,
                        format!("element token `{tok}` does not form a valid path"),
                    ));
                }
                paths[this] = full;
                elem_paths[this] = elem;
                nodes[this].parent = parent;
                nodes[parent as usize].children.push(this as u32);
            }

            let jump = jumps[cur];
            let has_child = jump > JUMP_SIBLING_ONLY || jump == JUMP_CHILD_ONLY;
            let has_sibling = jump >= JUMP_SIBLING_ONLY;

            if has_child {
                if has_sibling {
                    let sibling = cur
                        .checked_add(jump as usize)
                        .filter(|&s| s < count)
                        .ok_or_else(|| {
                            Error::structural(
                                SECTION_PATHS,
                                section_start,
                                format!("sibling jump {jump} from entry {cur} out of range"),
                            )
                        })?;
                    pending.push((sibling, parent, depth));
                }
                parent = this as i64;
                cur += 1;
                depth += 1;
                if depth > self.config.max_prim_nest_level {
                    return Err(Error::bounds(
                        SECTION_PATHS,
                        format!(
                            "path nesting exceeds max_prim_nest_level ({})",
                            self.config.max_prim_nest_level
                        ),
                    ));
                }
            } else if has_sibling {
                cur += 1;
            } else {
                match pending.pop() {
                    Some((c, p, d)) => {
                        cur = c;
                        parent = p;
                        depth = d;
                    }
                    None => break,
                }
            }
        }

        self.paths = paths;
        self.elem_paths = elem_paths;
        self.nodes = nodes;
        Ok(())
    }

    fn read_specs(&mut self) -> Result<()> {
        let (start, size) = self.section(SECTION_SPECS)?;
        if size < 8 {
            return Err(Error::structural(SECTION_SPECS, start, "section truncated"));
        }
        let count = self.source.read_u64(start)?;
        if count > (size - 8) / 12 {
            return Err(Error::structural(
                SECTION_SPECS,
                start,
                "spec array extends past section",
            ));
        }
        self.track_memory(count * 12);

        let bytes = self.source.read_bytes(start + 8, (count * 12) as usize)?;
        let mut specs = Vec::with_capacity(count as usize);
        for chunk in bytes.chunks_exact(12) {
            let path_index = le_u32(&chunk[0..4]);
            let fieldset_index = le_u32(&chunk[4..8]);
            let spec_type_raw = le_u32(&chunk[8..12]);

            if path_index as usize >= self.paths.len() {
                return Err(Error::structural(
                    SECTION_SPECS,
                    start,
                    format!("spec path index {path_index} out of range"),
                ));
            }
            if fieldset_index as usize >= self.fieldset_indices.len() {
                return Err(Error::structural(
                    SECTION_SPECS,
                    start,
                    format!("spec fieldset index {fieldset_index} out of range"),
                ));
            }
            let spec_type = SpecType::from_u32(spec_type_raw).ok_or_else(|| {
                Error::structural(
                    SECTION_SPECS,
                    start,
                    format!("unknown spec type {spec_type_raw}"),
                )
            })?;

            specs.push(Spec {
                path_index,
                fieldset_index,
                spec_type,
            });
        }
        self.specs = specs;
        Ok(())
    }

    // === Live fieldset construction ===

    fn build_live_fieldsets(&mut self) -> Result<()> {
        let values = self.decode_all_field_values()?;

        let mut map = HashMap::new();
        let mut run_start = 0usize;
        for (i, &idx) in self.fieldset_indices.iter().enumerate() {
            if idx != INDEX_SENTINEL {
                continue;
            }
            let run = &self.fieldset_indices[run_start..i];
            if run.len() as u32 > self.config.max_field_value_pairs_per_spec {
                return Err(Error::bounds(
                    SECTION_FIELDSETS,
                    format!(
                        "fieldset carries {} pairs, cap is {}",
                        run.len(),
                        self.config.max_field_value_pairs_per_spec
                    ),
                ));
            }
            let mut pairs = Vec::with_capacity(run.len());
            for &field_index in run {
                let field = &self.fields[field_index as usize];
                let name = self.tokens[field.token_index as usize].clone();
                pairs.push((name, values[field_index as usize].clone()));
            }
            map.insert(run_start as u32, pairs);
            run_start = i + 1;
        }
        self.live_fieldsets = map;
        Ok(())
    }

    /// Decode every field's value. Values are independent, so this is the
    /// one place the decoder fans out.
    fn decode_all_field_values(&mut self) -> Result<Vec<Value>> {
        let threads = self.config.resolved_num_threads();
        if threads > 1 && self.fields.len() > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => {
                    return pool.install(|| {
                        self.fields
                            .par_iter()
                            .map(|f| self.unpack_value(f.rep, 0))
                            .collect::<Result<Vec<_>>>()
                    });
                }
                Err(e) => {
                    self.push_warning(format!(
                        "thread pool unavailable ({e}), decoding single-threaded"
                    ));
                }
            }
        }
        self.fields
            .iter()
            .map(|f| self.unpack_value(f.rep, 0))
            .collect()
    }

    // === Value decoding ===

    /// Decode one value described by a [`ValueRep`].
    pub fn unpack_value(&self, rep: ValueRep, depth: u32) -> Result<Value> {
        if depth > VALUE_RECURSION_LIMIT {
            return Err(Error::structural(
                SECTION_FIELDS,
                0,
                "value nesting too deep",
            ));
        }
        if rep.is_inlined() {
            return self.unpack_inlined(rep);
        }
        if rep.is_array() {
            return self.unpack_array(rep);
        }
        self.unpack_scalar_blob(rep, depth)
    }

    fn unpack_inlined(&self, rep: ValueRep) -> Result<Value> {
        let tid = u32::from(rep.type_id());
        let p = rep.payload();

        if rep.is_array() {
            // Inlined arrays are empty arrays.
            return empty_array_value(tid | ARRAY_BIT).ok_or_else(|| {
                Error::structural(
                    SECTION_FIELDS,
                    p,
                    format!("type id {tid} has no array form"),
                )
            });
        }

        let value = match tid {
            TYPE_ID_BOOL => Value::Bool(p & 1 == 1),
            TYPE_ID_UCHAR => Value::UChar(p as u8),
            TYPE_ID_INT => Value::Int(p as u32 as i32),
            TYPE_ID_UINT => Value::UInt(p as u32),
            // Sign-extend the 48-bit payload.
            TYPE_ID_INT64 => Value::Int64(((p << 16) as i64) >> 16),
            TYPE_ID_UINT64 => Value::UInt64(p),
            TYPE_ID_HALF => Value::Half(f16::from_bits(p as u16)),
            // Half vectors fit the 48-bit payload, 16 bits per component.
            TYPE_ID_HALF2 => Value::Half2(Half2::new(
                f16::from_bits(p as u16),
                f16::from_bits((p >> 16) as u16),
            )),
            TYPE_ID_HALF3 => Value::Half3(Half3::new(
                f16::from_bits(p as u16),
                f16::from_bits((p >> 16) as u16),
                f16::from_bits((p >> 32) as u16),
            )),
            TYPE_ID_FLOAT => Value::Float(f32::from_bits(p as u32)),
            // Inlined doubles are stored as their float image.
            TYPE_ID_DOUBLE => Value::Double(f64::from(f32::from_bits(p as u32))),
            TYPE_ID_TOKEN => Value::Token(self.token(p)?.clone()),
            TYPE_ID_STRING => Value::String(self.string(p)?),
            TYPE_ID_ASSET_PATH => Value::AssetPath(AssetPath::new(self.token(p)?.as_str())),
            TYPE_ID_SPECIFIER => Value::Specifier(Specifier::from_u32(p as u32).ok_or_else(
                || Error::structural(SECTION_FIELDS, p, format!("invalid specifier {p}")),
            )?),
            TYPE_ID_PERMISSION => Value::Permission(Permission::from_u32(p as u32).ok_or_else(
                || Error::structural(SECTION_FIELDS, p, format!("invalid permission {p}")),
            )?),
            TYPE_ID_VARIABILITY => Value::Variability(Variability::from_u32(p as u32)
                .ok_or_else(|| {
                    Error::structural(SECTION_FIELDS, p, format!("invalid variability {p}"))
                })?),
            TYPE_ID_VALUE_BLOCK => Value::Block,
            TYPE_ID_DICTIONARY if p == 0 => Value::Dictionary(Dictionary::new()),
            _ => {
                return Err(Error::structural(
                    SECTION_FIELDS,
                    p,
                    format!("type id {tid} cannot be inlined"),
                ))
            }
        };
        Ok(value)
    }

    fn unpack_scalar_blob(&self, rep: ValueRep, depth: u32) -> Result<Value> {
        let tid = u32::from(rep.type_id());
        let offset = rep.payload();

        if let Some(size) = element_byte_size(tid) {
            let bytes = self.source.read_bytes(offset, size)?;
            return parse_pod_scalar(tid, &bytes).ok_or_else(|| {
                Error::structural(SECTION_FIELDS, offset, format!("bad scalar blob for {tid}"))
            });
        }

        match tid {
            TYPE_ID_TOKEN => {
                let idx = self.source.read_u32(offset)?;
                Ok(Value::Token(self.token(u64::from(idx))?.clone()))
            }
            TYPE_ID_STRING => {
                let idx = self.source.read_u32(offset)?;
                Ok(Value::String(self.string(u64::from(idx))?))
            }
            TYPE_ID_ASSET_PATH => {
                let idx = self.source.read_u32(offset)?;
                Ok(Value::AssetPath(AssetPath::new(
                    self.token(u64::from(idx))?.as_str(),
                )))
            }
            TYPE_ID_REFERENCE => Ok(Value::Reference(self.read_reference(offset)?)),
            TYPE_ID_PAYLOAD => {
                let r = self.read_reference(offset)?;
                Ok(Value::Payload(Payload {
                    asset_path: r.asset_path,
                    prim_path: r.prim_path,
                    layer_offset: r.layer_offset,
                }))
            }
            TYPE_ID_PATH_VECTOR => {
                let count = self.bounded_count(offset)?;
                let bytes = self.source.read_bytes(offset + 8, (count * 4) as usize)?;
                let mut out = Vec::with_capacity(count as usize);
                for chunk in bytes.chunks_exact(4) {
                    out.push(self.path(u64::from(le_u32(chunk)))?.clone());
                }
                Ok(Value::PathVector(out))
            }
            TYPE_ID_TIMESAMPLES => self.read_timesamples(offset, depth),
            TYPE_ID_DICTIONARY => self.read_dictionary(offset, depth),
            TYPE_ID_TOKEN_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_token_items(pos))
                    .map(Value::TokenListOp)
            }
            TYPE_ID_STRING_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_string_items(pos))
                    .map(Value::StringListOp)
            }
            TYPE_ID_PATH_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_path_items(pos))
                    .map(Value::PathListOp)
            }
            TYPE_ID_REFERENCE_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_reference_items(pos))
                    .map(Value::ReferenceListOp)
            }
            TYPE_ID_PAYLOAD_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_payload_items(pos))
                    .map(Value::PayloadListOp)
            }
            TYPE_ID_INT_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_pod_items(pos, le_i32))
                    .map(Value::IntListOp)
            }
            TYPE_ID_UINT_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_pod_items(pos, le_u32))
                    .map(Value::UIntListOp)
            }
            TYPE_ID_INT64_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_pod_items8(pos, le_i64))
                    .map(Value::Int64ListOp)
            }
            TYPE_ID_UINT64_LISTOP => {
                self.read_listop(offset, |r, pos| r.read_pod_items8(pos, le_u64))
                    .map(Value::UInt64ListOp)
            }
            _ => Err(Error::structural(
                SECTION_FIELDS,
                offset,
                format!("unknown type id {tid}"),
            )),
        }
    }

    fn read_reference(&self, offset: u64) -> Result<Reference> {
        let bytes = self.source.read_bytes(offset, 24)?;
        let asset_tok = le_u32(&bytes[0..4]);
        let path_idx = le_u32(&bytes[4..8]);
        let time_offset = le_f64(&bytes[8..16]);
        let scale = le_f64(&bytes[16..24]);
        Ok(Reference {
            asset_path: AssetPath::new(self.token(u64::from(asset_tok))?.as_str()),
            prim_path: self.path(u64::from(path_idx))?.clone(),
            layer_offset: LayerOffset {
                offset: time_offset,
                scale,
            },
            custom_data: Dictionary::new(),
        })
    }

    fn read_timesamples(&self, offset: u64, depth: u32) -> Result<Value> {
        let count = self.bounded_count(offset)?;
        let bytes = self.source.read_bytes(offset + 8, (count * 16) as usize)?;
        self.track_memory(count * 16);

        let mut ts = TimeSamples::new();
        for chunk in bytes.chunks_exact(16) {
            let t = le_f64(&chunk[0..8]);
            let rep = ValueRep::from_u64(le_u64(&chunk[8..16]));
            if u32::from(rep.type_id()) == TYPE_ID_VALUE_BLOCK {
                ts.add_blocked_sample(t);
            } else {
                ts.add_sample(t, self.unpack_value(rep, depth + 1)?);
            }
        }
        ts.update();
        Ok(Value::TimeSamples(ts))
    }

    fn read_dictionary(&self, offset: u64, depth: u32) -> Result<Value> {
        let count = self.bounded_count(offset)?;
        let bytes = self.source.read_bytes(offset + 8, (count * 12) as usize)?;

        let mut dict = Dictionary::new();
        for chunk in bytes.chunks_exact(12) {
            let key = self.string(u64::from(le_u32(&chunk[0..4])))?;
            let rep = ValueRep::from_u64(le_u64(&chunk[4..12]));
            dict.set(key, self.unpack_value(rep, depth + 1)?);
        }
        Ok(Value::Dictionary(dict))
    }

    /// Read a list op: header byte, then one length-prefixed item run per
    /// populated bucket in header-bit order.
    fn read_listop<T, F>(&self, offset: u64, read_items: F) -> Result<ListOp<T>>
    where
        F: Fn(&Self, &mut u64) -> Result<Vec<T>>,
    {
        let header = self.source.read_u8(offset)?;
        let mut pos = offset + 1;
        let mut op = ListOp::new();

        if header & LISTOP_IS_EXPLICIT != 0 {
            if header
                & (LISTOP_HAS_ADDED
                    | LISTOP_HAS_DELETED
                    | LISTOP_HAS_ORDERED
                    | LISTOP_HAS_PREPENDED
                    | LISTOP_HAS_APPENDED)
                != 0
            {
                return Err(Error::structural(
                    SECTION_FIELDS,
                    offset,
                    "explicit list op also carries edit buckets",
                ));
            }
            let items = if header & LISTOP_HAS_EXPLICIT != 0 {
                read_items(self, &mut pos)?
            } else {
                Vec::new()
            };
            op.set_explicit_items(items);
            return Ok(op);
        }

        if header & LISTOP_HAS_EXPLICIT != 0 {
            op.set_explicit_items(read_items(self, &mut pos)?);
        }
        if header & LISTOP_HAS_ADDED != 0 {
            op.set_added_items(read_items(self, &mut pos)?);
        }
        if header & LISTOP_HAS_DELETED != 0 {
            op.set_deleted_items(read_items(self, &mut pos)?);
        }
        if header & LISTOP_HAS_ORDERED != 0 {
            op.set_ordered_items(read_items(self, &mut pos)?);
        }
        if header & LISTOP_HAS_PREPENDED != 0 {
            op.set_prepended_items(read_items(self, &mut pos)?);
        }
        if header & LISTOP_HAS_APPENDED != 0 {
            op.set_appended_items(read_items(self, &mut pos)?);
        }
        Ok(op)
    }

    fn read_token_items(&self, pos: &mut u64) -> Result<Vec<Token>> {
        let count = self.bounded_count(*pos)?;
        let bytes = self.source.read_bytes(*pos + 8, (count * 4) as usize)?;
        *pos += 8 + count * 4;
        bytes
            .chunks_exact(4)
            .map(|c| self.token(u64::from(le_u32(c))).cloned())
            .collect()
    }

    fn read_string_items(&self, pos: &mut u64) -> Result<Vec<String>> {
        let count = self.bounded_count(*pos)?;
        let bytes = self.source.read_bytes(*pos + 8, (count * 4) as usize)?;
        *pos += 8 + count * 4;
        bytes
            .chunks_exact(4)
            .map(|c| self.string(u64::from(le_u32(c))))
            .collect()
    }

    fn read_path_items(&self, pos: &mut u64) -> Result<Vec<Path>> {
        let count = self.bounded_count(*pos)?;
        let bytes = self.source.read_bytes(*pos + 8, (count * 4) as usize)?;
        *pos += 8 + count * 4;
        bytes
            .chunks_exact(4)
            .map(|c| self.path(u64::from(le_u32(c))).cloned())
            .collect()
    }

    fn read_reference_items(&self, pos: &mut u64) -> Result<Vec<Reference>> {
        let count = self.bounded_count(*pos)?;
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count {
            out.push(self.read_reference(*pos + 8 + i * 24)?);
        }
        *pos += 8 + count * 24;
        Ok(out)
    }

    fn read_payload_items(&self, pos: &mut u64) -> Result<Vec<Payload>> {
        let refs = self.read_reference_items(pos)?;
        Ok(refs
            .into_iter()
            .map(|r| Payload {
                asset_path: r.asset_path,
                prim_path: r.prim_path,
                layer_offset: r.layer_offset,
            })
            .collect())
    }

    fn read_pod_items<T>(&self, pos: &mut u64, parse: fn(&[u8]) -> T) -> Result<Vec<T>> {
        let count = self.bounded_count(*pos)?;
        let bytes = self.source.read_bytes(*pos + 8, (count * 4) as usize)?;
        *pos += 8 + count * 4;
        Ok(bytes.chunks_exact(4).map(parse).collect())
    }

    fn read_pod_items8<T>(&self, pos: &mut u64, parse: fn(&[u8]) -> T) -> Result<Vec<T>> {
        let count = self.bounded_count(*pos)?;
        let bytes = self.source.read_bytes(*pos + 8, (count * 8) as usize)?;
        *pos += 8 + count * 8;
        Ok(bytes.chunks_exact(8).map(parse).collect())
    }

    /// Read a u64 item count and check it against the array cap before any
    /// allocation sized by it.
    fn bounded_count(&self, offset: u64) -> Result<u64> {
        let count = self.source.read_u64(offset)?;
        if count > self.config.max_array_elements {
            return Err(Error::bounds(
                SECTION_FIELDS,
                format!(
                    "element count {count} exceeds max_array_elements ({})",
                    self.config.max_array_elements
                ),
            ));
        }
        Ok(count)
    }

    fn unpack_array(&self, rep: ValueRep) -> Result<Value> {
        let tid = u32::from(rep.type_id());
        let offset = rep.payload();
        let count = self.bounded_count(offset)?;
        if count == 0 {
            return empty_array_value(tid | ARRAY_BIT).ok_or_else(|| {
                Error::structural(
                    SECTION_FIELDS,
                    offset,
                    format!("type id {tid} has no array form"),
                )
            });
        }
        let data_pos = offset + 8;

        // Integer arrays may be integer-coded inside an LZ4 frame.
        if rep.is_compressed() {
            match tid {
                TYPE_ID_INT | TYPE_ID_UINT => {
                    let cap = count * 5 + 8;
                    let raw = self.read_lz4_frames(data_pos, cap)?;
                    let ints = integer_coding::decode_u32(&raw, count as usize)?;
                    self.track_memory(count * 4);
                    return Ok(match tid {
                        TYPE_ID_INT => Value::IntArray(ints.into_iter().map(|v| v as i32).collect()),
                        _ => Value::UIntArray(ints),
                    });
                }
                TYPE_ID_INT64 | TYPE_ID_UINT64 => {
                    let cap = count * 9 + 16;
                    let raw = self.read_lz4_frames(data_pos, cap)?;
                    let ints = integer_coding::decode_u64(&raw, count as usize)?;
                    self.track_memory(count * 8);
                    return Ok(match tid {
                        TYPE_ID_INT64 => {
                            Value::Int64Array(ints.into_iter().map(|v| v as i64).collect())
                        }
                        _ => Value::UInt64Array(ints),
                    });
                }
                _ => {}
            }
        }

        if let Some(elt) = element_byte_size(tid) {
            let total = count.checked_mul(elt as u64).ok_or_else(|| {
                Error::bounds(SECTION_FIELDS, "array byte size overflows".to_string())
            })?;
            self.track_memory(total);

            let bytes = if rep.is_compressed() {
                self.read_compressed_bytes(data_pos, total)?
            } else {
                if data_pos + total > self.source.size() {
                    return Err(Error::UnexpectedEof(data_pos + total));
                }
                self.source.read_bytes(data_pos, total as usize)?
            };
            return parse_pod_array(tid, &bytes, count as usize).ok_or_else(|| {
                Error::structural(SECTION_FIELDS, offset, format!("bad array blob for {tid}"))
            });
        }

        match tid {
            TYPE_ID_TOKEN => {
                let bytes = self.source.read_bytes(data_pos, (count * 4) as usize)?;
                let items: Result<Vec<Token>> = bytes
                    .chunks_exact(4)
                    .map(|c| self.token(u64::from(le_u32(c))).cloned())
                    .collect();
                Ok(Value::TokenArray(items?))
            }
            TYPE_ID_STRING => {
                let bytes = self.source.read_bytes(data_pos, (count * 4) as usize)?;
                let items: Result<Vec<String>> = bytes
                    .chunks_exact(4)
                    .map(|c| self.string(u64::from(le_u32(c))))
                    .collect();
                Ok(Value::StringArray(items?))
            }
            TYPE_ID_ASSET_PATH => {
                let bytes = self.source.read_bytes(data_pos, (count * 4) as usize)?;
                let items: Result<Vec<AssetPath>> = bytes
                    .chunks_exact(4)
                    .map(|c| {
                        self.token(u64::from(le_u32(c)))
                            .map(|t| AssetPath::new(t.as_str()))
                    })
                    .collect();
                Ok(Value::AssetPathArray(items?))
            }
            _ => Err(Error::structural(
                SECTION_FIELDS,
                offset,
                format!("type id {tid} has no array decoding"),
            )),
        }
    }

    /// Read consecutive LZ4 frames at `pos`, producing at most `max_size`
    /// bytes. Used for payloads whose exact decoded size is only known
    /// from the integer-coding header inside.
    fn read_lz4_frames(&self, pos: u64, max_size: u64) -> Result<Vec<u8>> {
        let header = self.source.read_bytes(pos, 16)?;
        let compressed_size = le_u64(&header[8..16]);
        let frame = self
            .source
            .read_bytes(pos, (16 + compressed_size) as usize)?;
        let (out, _) = compression::decompress_frame(&frame, max_size)?;
        Ok(out)
    }

    /// Read exactly `total` decompressed bytes from one or more frames.
    fn read_compressed_bytes(&self, pos: u64, total: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(total as usize);
        let mut pos = pos;
        while (out.len() as u64) < total {
            let remaining = total - out.len() as u64;
            let header = self.source.read_bytes(pos, 16)?;
            let compressed_size = le_u64(&header[8..16]);
            let frame = self
                .source
                .read_bytes(pos, (16 + compressed_size) as usize)?;
            let (block, consumed) = compression::decompress_frame(&frame, remaining)?;
            if block.is_empty() {
                return Err(Error::structural(SECTION_FIELDS, pos, "empty LZ4 frame"));
            }
            out.extend_from_slice(&block);
            pos += consumed as u64;
        }
        Ok(out)
    }
}

// === Little-endian chunk parsing helpers ===

fn le_u16(c: &[u8]) -> u16 {
    u16::from_le_bytes([c[0], c[1]])
}

fn le_u32(c: &[u8]) -> u32 {
    u32::from_le_bytes([c[0], c[1], c[2], c[3]])
}

fn le_i32(c: &[u8]) -> i32 {
    i32::from_le_bytes([c[0], c[1], c[2], c[3]])
}

fn le_u64(c: &[u8]) -> u64 {
    u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
}

fn le_i64(c: &[u8]) -> i64 {
    le_u64(c) as i64
}

fn le_f32(c: &[u8]) -> f32 {
    f32::from_bits(le_u32(c))
}

fn le_f64(c: &[u8]) -> f64 {
    f64::from_bits(le_u64(c))
}

fn le_f16(c: &[u8]) -> f16 {
    f16::from_bits(le_u16(c))
}

fn dmat_array<const N: usize>(c: &[u8]) -> [f64; N] {
    std::array::from_fn(|i| le_f64(&c[i * 8..]))
}

fn fmat_array<const N: usize>(c: &[u8]) -> [f32; N] {
    std::array::from_fn(|i| le_f32(&c[i * 4..]))
}

/// Parse one fixed-size scalar from its little-endian image.
fn parse_pod_scalar(tid: u32, c: &[u8]) -> Option<Value> {
    let v = match tid {
        TYPE_ID_BOOL => Value::Bool(c[0] != 0),
        TYPE_ID_UCHAR => Value::UChar(c[0]),
        TYPE_ID_INT => Value::Int(le_i32(c)),
        TYPE_ID_UINT => Value::UInt(le_u32(c)),
        TYPE_ID_INT64 => Value::Int64(le_i64(c)),
        TYPE_ID_UINT64 => Value::UInt64(le_u64(c)),
        TYPE_ID_HALF => Value::Half(le_f16(c)),
        TYPE_ID_FLOAT => Value::Float(le_f32(c)),
        TYPE_ID_DOUBLE => Value::Double(le_f64(c)),
        TYPE_ID_HALF2 => Value::Half2(Half2::new(le_f16(c), le_f16(&c[2..]))),
        TYPE_ID_HALF3 => Value::Half3(Half3::new(le_f16(c), le_f16(&c[2..]), le_f16(&c[4..]))),
        TYPE_ID_HALF4 => Value::Half4(Half4::new(
            le_f16(c),
            le_f16(&c[2..]),
            le_f16(&c[4..]),
            le_f16(&c[6..]),
        )),
        TYPE_ID_FLOAT2 => Value::Float2(Vec2::new(le_f32(c), le_f32(&c[4..]))),
        TYPE_ID_FLOAT3 => Value::Float3(Vec3::new(le_f32(c), le_f32(&c[4..]), le_f32(&c[8..]))),
        TYPE_ID_FLOAT4 => Value::Float4(Vec4::new(
            le_f32(c),
            le_f32(&c[4..]),
            le_f32(&c[8..]),
            le_f32(&c[12..]),
        )),
        TYPE_ID_DOUBLE2 => Value::Double2(DVec2::new(le_f64(c), le_f64(&c[8..]))),
        TYPE_ID_DOUBLE3 => {
            Value::Double3(DVec3::new(le_f64(c), le_f64(&c[8..]), le_f64(&c[16..])))
        }
        TYPE_ID_DOUBLE4 => Value::Double4(DVec4::new(
            le_f64(c),
            le_f64(&c[8..]),
            le_f64(&c[16..]),
            le_f64(&c[24..]),
        )),
        TYPE_ID_INT2 => Value::Int2(IVec2::new(le_i32(c), le_i32(&c[4..]))),
        TYPE_ID_INT3 => Value::Int3(IVec3::new(le_i32(c), le_i32(&c[4..]), le_i32(&c[8..]))),
        TYPE_ID_INT4 => Value::Int4(IVec4::new(
            le_i32(c),
            le_i32(&c[4..]),
            le_i32(&c[8..]),
            le_i32(&c[12..]),
        )),
        TYPE_ID_QUATH => Value::Quath(Quath::new(
            le_f16(c),
            le_f16(&c[2..]),
            le_f16(&c[4..]),
            le_f16(&c[6..]),
        )),
        TYPE_ID_QUATF => Value::Quatf(Quat::from_xyzw(
            le_f32(c),
            le_f32(&c[4..]),
            le_f32(&c[8..]),
            le_f32(&c[12..]),
        )),
        TYPE_ID_QUATD => Value::Quatd(DQuat::from_xyzw(
            le_f64(c),
            le_f64(&c[8..]),
            le_f64(&c[16..]),
            le_f64(&c[24..]),
        )),
        TYPE_ID_MATRIX2D => Value::Matrix2d(DMat2::from_cols_array(&dmat_array::<4>(c))),
        TYPE_ID_MATRIX3D => Value::Matrix3d(DMat3::from_cols_array(&dmat_array::<9>(c))),
        TYPE_ID_MATRIX4D => Value::Matrix4d(DMat4::from_cols_array(&dmat_array::<16>(c))),
        TYPE_ID_MATRIX4F => Value::Matrix4f(Mat4::from_cols_array(&fmat_array::<16>(c))),
        TYPE_ID_LAYER_OFFSET => Value::LayerOffset(LayerOffset {
            offset: le_f64(c),
            scale: le_f64(&c[8..]),
        }),
        _ => return None,
    };
    Some(v)
}

macro_rules! pod_array {
    ($bytes:expr, $elt:expr, $variant:ident, $parse:expr) => {
        Value::$variant($bytes.chunks_exact($elt).map($parse).collect())
    };
}

/// Parse a packed little-endian array of a fixed-size element type.
fn parse_pod_array(tid: u32, bytes: &[u8], count: usize) -> Option<Value> {
    let elt = element_byte_size(tid)?;
    if bytes.len() != elt * count {
        return None;
    }
    let v = match tid {
        TYPE_ID_BOOL => pod_array!(bytes, 1, BoolArray, |c| c[0] != 0),
        TYPE_ID_UCHAR => Value::UCharArray(bytes.to_vec()),
        TYPE_ID_INT => pod_array!(bytes, 4, IntArray, le_i32),
        TYPE_ID_UINT => pod_array!(bytes, 4, UIntArray, le_u32),
        TYPE_ID_INT64 => pod_array!(bytes, 8, Int64Array, le_i64),
        TYPE_ID_UINT64 => pod_array!(bytes, 8, UInt64Array, le_u64),
        TYPE_ID_HALF => pod_array!(bytes, 2, HalfArray, le_f16),
        TYPE_ID_FLOAT => pod_array!(bytes, 4, FloatArray, le_f32),
        TYPE_ID_DOUBLE => pod_array!(bytes, 8, DoubleArray, le_f64),
        TYPE_ID_HALF2 => pod_array!(bytes, 4, Half2Array, |c: &[u8]| Half2::new(
            le_f16(c),
            le_f16(&c[2..])
        )),
        TYPE_ID_HALF3 => pod_array!(bytes, 6, Half3Array, |c: &[u8]| Half3::new(
            le_f16(c),
            le_f16(&c[2..]),
            le_f16(&c[4..])
        )),
        TYPE_ID_HALF4 => pod_array!(bytes, 8, Half4Array, |c: &[u8]| Half4::new(
            le_f16(c),
            le_f16(&c[2..]),
            le_f16(&c[4..]),
            le_f16(&c[6..])
        )),
        TYPE_ID_FLOAT2 => pod_array!(bytes, 8, Float2Array, |c: &[u8]| Vec2::new(
            le_f32(c),
            le_f32(&c[4..])
        )),
        TYPE_ID_FLOAT3 => pod_array!(bytes, 12, Float3Array, |c: &[u8]| Vec3::new(
            le_f32(c),
            le_f32(&c[4..]),
            le_f32(&c[8..])
        )),
        TYPE_ID_FLOAT4 => pod_array!(bytes, 16, Float4Array, |c: &[u8]| Vec4::new(
            le_f32(c),
            le_f32(&c[4..]),
            le_f32(&c[8..]),
            le_f32(&c[12..])
        )),
        TYPE_ID_DOUBLE2 => pod_array!(bytes, 16, Double2Array, |c: &[u8]| DVec2::new(
            le_f64(c),
            le_f64(&c[8..])
        )),
        TYPE_ID_DOUBLE3 => pod_array!(bytes, 24, Double3Array, |c: &[u8]| DVec3::new(
            le_f64(c),
            le_f64(&c[8..]),
            le_f64(&c[16..])
        )),
        TYPE_ID_DOUBLE4 => pod_array!(bytes, 32, Double4Array, |c: &[u8]| DVec4::new(
            le_f64(c),
            le_f64(&c[8..]),
            le_f64(&c[16..]),
            le_f64(&c[24..])
        )),
        TYPE_ID_INT2 => pod_array!(bytes, 8, Int2Array, |c: &[u8]| IVec2::new(
            le_i32(c),
            le_i32(&c[4..])
        )),
        TYPE_ID_INT3 => pod_array!(bytes, 12, Int3Array, |c: &[u8]| IVec3::new(
            le_i32(c),
            le_i32(&c[4..]),
            le_i32(&c[8..])
        )),
        TYPE_ID_INT4 => pod_array!(bytes, 16, Int4Array, |c: &[u8]| IVec4::new(
            le_i32(c),
            le_i32(&c[4..]),
            le_i32(&c[8..]),
            le_i32(&c[12..])
        )),
        TYPE_ID_QUATH => pod_array!(bytes, 8, QuathArray, |c: &[u8]| Quath::new(
            le_f16(c),
            le_f16(&c[2..]),
            le_f16(&c[4..]),
            le_f16(&c[6..])
        )),
        TYPE_ID_QUATF => pod_array!(bytes, 16, QuatfArray, |c: &[u8]| Quat::from_xyzw(
            le_f32(c),
            le_f32(&c[4..]),
            le_f32(&c[8..]),
            le_f32(&c[12..])
        )),
        TYPE_ID_QUATD => pod_array!(bytes, 32, QuatdArray, |c: &[u8]| DQuat::from_xyzw(
            le_f64(c),
            le_f64(&c[8..]),
            le_f64(&c[16..]),
            le_f64(&c[24..])
        )),
        TYPE_ID_MATRIX2D => pod_array!(bytes, 32, Matrix2dArray, |c: &[u8]| {
            DMat2::from_cols_array(&dmat_array::<4>(c))
        }),
        TYPE_ID_MATRIX3D => pod_array!(bytes, 72, Matrix3dArray, |c: &[u8]| {
            DMat3::from_cols_array(&dmat_array::<9>(c))
        }),
        TYPE_ID_MATRIX4D => pod_array!(bytes, 128, Matrix4dArray, |c: &[u8]| {
            DMat4::from_cols_array(&dmat_array::<16>(c))
        }),
        TYPE_ID_MATRIX4F => pod_array!(bytes, 64, Matrix4fArray, |c: &[u8]| {
            Mat4::from_cols_array(&fmat_array::<16>(c))
        }),
        _ => return None,
    };
    Some(v)
}

/// The empty array value for an array type id.
fn empty_array_value(tid: u32) -> Option<Value> {
    let v = match tid & !ARRAY_BIT {
        TYPE_ID_BOOL => Value::BoolArray(Vec::new()),
        TYPE_ID_UCHAR => Value::UCharArray(Vec::new()),
        TYPE_ID_INT => Value::IntArray(Vec::new()),
        TYPE_ID_UINT => Value::UIntArray(Vec::new()),
        TYPE_ID_INT64 => Value::Int64Array(Vec::new()),
        TYPE_ID_UINT64 => Value::UInt64Array(Vec::new()),
        TYPE_ID_HALF => Value::HalfArray(Vec::new()),
        TYPE_ID_FLOAT => Value::FloatArray(Vec::new()),
        TYPE_ID_DOUBLE => Value::DoubleArray(Vec::new()),
        TYPE_ID_STRING => Value::StringArray(Vec::new()),
        TYPE_ID_TOKEN => Value::TokenArray(Vec::new()),
        TYPE_ID_ASSET_PATH => Value::AssetPathArray(Vec::new()),
        TYPE_ID_HALF2 => Value::Half2Array(Vec::new()),
        TYPE_ID_HALF3 => Value::Half3Array(Vec::new()),
        TYPE_ID_HALF4 => Value::Half4Array(Vec::new()),
        TYPE_ID_FLOAT2 => Value::Float2Array(Vec::new()),
        TYPE_ID_FLOAT3 => Value::Float3Array(Vec::new()),
        TYPE_ID_FLOAT4 => Value::Float4Array(Vec::new()),
        TYPE_ID_DOUBLE2 => Value::Double2Array(Vec::new()),
        TYPE_ID_DOUBLE3 => Value::Double3Array(Vec::new()),
        TYPE_ID_DOUBLE4 => Value::Double4Array(Vec::new()),
        TYPE_ID_INT2 => Value::Int2Array(Vec::new()),
        TYPE_ID_INT3 => Value::Int3Array(Vec::new()),
        TYPE_ID_INT4 => Value::Int4Array(Vec::new()),
        TYPE_ID_QUATH => Value::QuathArray(Vec::new()),
        TYPE_ID_QUATF => Value::QuatfArray(Vec::new()),
        TYPE_ID_QUATD => Value::QuatdArray(Vec::new()),
        TYPE_ID_MATRIX2D => Value::Matrix2dArray(Vec::new()),
        TYPE_ID_MATRIX3D => Value::Matrix3dArray(Vec::new()),
        TYPE_ID_MATRIX4D => Value::Matrix4dArray(Vec::new()),
        TYPE_ID_MATRIX4F => Value::Matrix4fArray(Vec::new()),
        _ => return None,
    };
    Some(v)
}
