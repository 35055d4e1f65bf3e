//! Stage reconstruction.
//!
//! Walks the decoded node tree, classifies each node by spec type, builds
//! per-prim property maps, materializes typed prim bodies, and emits the
//! Stage. Reconstruction is sequential: it preserves authored property and
//! child order, which a parallel walk would have to restore in a second
//! pass.

use std::collections::HashMap;

use super::decoder::{CrateReader, FieldValuePairVector};
use super::format::SpecType;
use crate::attr::{Attribute, Connection, PrimVar, Property, PropertyKind, Relationship,
    TimeSamples};
use crate::listop::{ListEditQual, ListOp};
use crate::path::Path;
use crate::prim::{ApiSchemaName, ApiSchemas, Prim, PrimMeta, PropertyMap};
use crate::schema::PrimBody;
use crate::stage::Stage;
use crate::value::{
    upcast_numeric, value_type_from_name, Axis, Dictionary, Interpolation, Kind, Payload,
    Reference, Specifier, Token, Value, Variability,
};
use crate::util::{Error, Result};

/// Reconstruct a [`Stage`] from a fully-decoded reader. Returns the stage
/// and the warnings the walk accumulated.
pub fn reconstruct_stage(reader: &CrateReader, base_dir: &str) -> Result<(Stage, Vec<String>)> {
    let mut r = Reconstructor {
        reader,
        psmap: HashMap::new(),
        warnings: Vec::new(),
        base_dir,
    };
    let stage = r.run()?;
    Ok((stage, r.warnings))
}

struct Reconstructor<'a> {
    reader: &'a CrateReader,
    /// path index -> spec index
    psmap: HashMap<u32, u32>,
    warnings: Vec<String>,
    base_dir: &'a str,
}

/// Prim-level fields parsed out of one fieldset.
#[derive(Default)]
struct ParsedPrimFields {
    type_name: Option<String>,
    specifier: Option<Specifier>,
    properties: Vec<Token>,
    prim_children: Vec<Token>,
    meta: PrimMeta,
}

impl<'a> Reconstructor<'a> {
    fn warn(&mut self, msg: String) {
        log::warn!("[Stage] {msg}");
        self.warnings.push(msg);
    }

    fn run(&mut self) -> Result<Stage> {
        self.build_spec_map()?;

        let root_spec_index = *self
            .psmap
            .get(&0)
            .ok_or_else(|| Error::semantic("no spec for the pseudo-root node"))?;
        let root_spec = self.reader.specs()[root_spec_index as usize];
        if root_spec.spec_type != SpecType::PseudoRoot {
            return Err(Error::semantic(format!(
                "root spec must be PseudoRoot, got {:?}",
                root_spec.spec_type
            )));
        }

        let fvs = self
            .reader
            .fieldset_pairs(root_spec.fieldset_index)
            .ok_or_else(|| {
                Error::semantic(format!(
                    "fieldset {} of the pseudo-root is not live",
                    root_spec.fieldset_index
                ))
            })?
            .clone();

        let mut stage = Stage::new();
        let prim_children = self.parse_stage_metas(&fvs, &mut stage)?;

        let child_indices = self.reader.nodes()[0].children.clone();
        let mut roots = Vec::new();
        for child in child_indices {
            if let Some(prim) = self.reconstruct_prim_node(child, 1)? {
                roots.push(prim);
            }
        }
        if !prim_children.is_empty() {
            reorder_by_tokens(&mut roots, &prim_children);
        }
        *stage.root_prims_mut() = roots;
        Ok(stage)
    }

    /// Build the path-index to spec-index map, rejecting duplicates.
    fn build_spec_map(&mut self) -> Result<()> {
        for (i, spec) in self.reader.specs().iter().enumerate() {
            if self
                .psmap
                .insert(spec.path_index, i as u32)
                .is_some()
            {
                return Err(Error::semantic(format!(
                    "duplicate spec for path index {}",
                    spec.path_index
                )));
            }
        }
        Ok(())
    }

    fn node_display_path(&self, node_index: u32) -> String {
        self.reader.paths()[node_index as usize].full_path_name()
    }

    fn reconstruct_prim_node(&mut self, node_index: u32, level: u32) -> Result<Option<Prim>> {
        if level > self.reader.config().max_prim_nest_level {
            return Err(Error::bounds(
                "SPECS",
                format!(
                    "prim nesting exceeds max_prim_nest_level ({})",
                    self.reader.config().max_prim_nest_level
                ),
            ));
        }

        let Some(&spec_index) = self.psmap.get(&node_index) else {
            // A path can exist without a spec; nothing to build.
            return Ok(None);
        };
        let spec = self.reader.specs()[spec_index as usize];

        match spec.spec_type {
            // Properties are gathered by their owning prim.
            SpecType::Attribute | SpecType::Relationship => Ok(None),
            SpecType::PseudoRoot => Err(Error::semantic(format!(
                "PseudoRoot spec below the root at `{}`",
                self.node_display_path(node_index)
            ))),
            SpecType::Variant | SpecType::VariantSet => {
                let path = self.node_display_path(node_index);
                self.warn(format!(
                    "variant machinery is not applied yet, skipping `{path}`"
                ));
                Ok(None)
            }
            SpecType::Prim => self.reconstruct_prim(node_index, spec, level),
            other => {
                let path = self.node_display_path(node_index);
                self.warn(format!("unsupported spec type {other:?} at `{path}`, skipping"));
                Ok(None)
            }
        }
    }

    fn reconstruct_prim(
        &mut self,
        node_index: u32,
        spec: super::decoder::Spec,
        level: u32,
    ) -> Result<Option<Prim>> {
        let display_path = self.node_display_path(node_index);
        let fvs = self
            .reader
            .fieldset_pairs(spec.fieldset_index)
            .ok_or_else(|| {
                Error::semantic(format!(
                    "fieldset {} of `{display_path}` is not live",
                    spec.fieldset_index
                ))
            })?
            .clone();

        let parsed = self.parse_prim_fields(&fvs, &display_path)?;

        let specifier = parsed.specifier.ok_or_else(|| {
            Error::semantic(format!("prim `{display_path}` is missing its specifier"))
        })?;
        match specifier {
            Specifier::Def => {}
            Specifier::Class | Specifier::Over => {
                // Needs a composition pass; record and skip the subtree.
                self.warn(format!(
                    "`{}` specifier at `{display_path}` is not composed yet, skipping subtree",
                    specifier
                ));
                return Ok(None);
            }
        }

        let type_name = match parsed.type_name {
            Some(name) => name,
            None => {
                self.warn(format!(
                    "prim `{display_path}` has no typeName, treating as Model"
                ));
                "Model".to_string()
            }
        };
        let mut body = match PrimBody::from_type_name(&type_name) {
            Some(body) => body,
            None => {
                self.warn(format!(
                    "unknown prim type `{type_name}` at `{display_path}`, emitting Model"
                ));
                PrimBody::from(crate::schema::Model::default())
            }
        };

        let child_indices = self.reader.nodes()[node_index as usize].children.clone();

        let mut props = PropertyMap::new();
        self.build_property_map(&child_indices, &parsed.properties, &mut props)?;

        let mut children = Vec::new();
        for &child in &child_indices {
            if let Some(prim) = self.reconstruct_prim_node(child, level + 1)? {
                children.push(prim);
            }
        }
        if !parsed.prim_children.is_empty() {
            reorder_by_tokens(&mut children, &parsed.prim_children);
        }

        body.harvest(&props);

        let name = self.reader.elem_paths()[node_index as usize]
            .element_name()
            .to_string();
        let mut prim = Prim::new(name, body);
        prim.set_specifier(specifier);
        prim.set_abs_path(self.reader.paths()[node_index as usize].clone());
        prim.meta = parsed.meta;
        *prim.properties_mut() = props;
        for child in children {
            prim.add_child(child);
        }
        Ok(Some(prim))
    }

    /// Gather the attribute/relationship children of a prim node into its
    /// property map. The authored `properties` token list drives insertion
    /// order; stray property nodes follow in file order.
    fn build_property_map(
        &mut self,
        child_indices: &[u32],
        authored_order: &[Token],
        props: &mut PropertyMap,
    ) -> Result<()> {
        let mut pending: Vec<(String, u32)> = Vec::new();
        for &child in child_indices {
            let Some(&spec_index) = self.psmap.get(&child) else {
                continue;
            };
            let spec = self.reader.specs()[spec_index as usize];
            if matches!(
                spec.spec_type,
                SpecType::Attribute | SpecType::Relationship
            ) {
                let name = self.reader.paths()[child as usize].prop_part().to_string();
                pending.push((name, child));
            }
        }

        for tok in authored_order {
            match pending.iter().position(|(n, _)| n == tok.as_str()) {
                Some(pos) => {
                    let (name, child) = pending.remove(pos);
                    let prop = self.parse_property_node(child)?;
                    props.insert(name, prop);
                }
                None => self.warn(format!(
                    "property `{tok}` is listed in `properties` but has no spec"
                )),
            }
        }
        for (name, child) in pending {
            let prop = self.parse_property_node(child)?;
            props.insert(name, prop);
        }
        Ok(())
    }

    fn parse_property_node(&mut self, node_index: u32) -> Result<Property> {
        let spec_index = *self.psmap.get(&node_index).ok_or_else(|| {
            Error::semantic(format!(
                "property node {} has no spec",
                self.node_display_path(node_index)
            ))
        })?;
        let spec = self.reader.specs()[spec_index as usize];
        let fvs = self
            .reader
            .fieldset_pairs(spec.fieldset_index)
            .ok_or_else(|| {
                Error::semantic(format!(
                    "fieldset {} of property `{}` is not live",
                    spec.fieldset_index,
                    self.node_display_path(node_index)
                ))
            })?
            .clone();
        let name = self.reader.paths()[node_index as usize]
            .prop_part()
            .to_string();
        self.parse_property(spec.spec_type, &fvs, &name)
    }

    /// Classify one property fieldset and build the [`Property`].
    fn parse_property(
        &mut self,
        spec_type: SpecType,
        fvs: &FieldValuePairVector,
        name: &str,
    ) -> Result<Property> {
        let mut custom = false;
        let mut type_name: Option<String> = None;
        let mut variability: Option<Variability> = None;
        let mut scalar: Option<Value> = None;
        let mut samples: Option<TimeSamples> = None;
        let mut conn: Option<Relationship> = None;
        let mut targets: Option<Relationship> = None;
        let mut meta = crate::attr::AttrMeta::default();

        // Last write wins for repeated fields.
        for (fname, fvalue) in fvs {
            match fname.as_str() {
                "custom" => {
                    custom = fvalue.get::<bool>().ok_or_else(|| {
                        field_type_error(name, "custom", "bool", fvalue)
                    })?;
                }
                "variability" => {
                    variability = Some(fvalue.get::<Variability>().ok_or_else(|| {
                        field_type_error(name, "variability", "variability", fvalue)
                    })?);
                }
                "typeName" => {
                    let tok = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error(name, "typeName", "token", fvalue)
                    })?;
                    type_name = Some(tok.as_str().to_string());
                }
                "default" => {
                    scalar = Some(fvalue.clone());
                    samples = None;
                }
                "timeSamples" => {
                    samples = Some(fvalue.get::<TimeSamples>().ok_or_else(|| {
                        field_type_error(name, "timeSamples", "timeSamples", fvalue)
                    })?);
                    scalar = None;
                }
                "interpolation" => {
                    let tok = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error(name, "interpolation", "token", fvalue)
                    })?;
                    meta.interpolation =
                        Some(Interpolation::from_str(tok.as_str()).ok_or_else(|| {
                            Error::semantic(format!(
                                "invalid `interpolation` token `{tok}` on `{name}`"
                            ))
                        })?);
                }
                "elementSize" => {
                    let v = fvalue.get::<i32>().ok_or_else(|| {
                        field_type_error(name, "elementSize", "int", fvalue)
                    })?;
                    let cap = self.reader.config().max_element_size;
                    if v < 1 || v as u32 > cap {
                        return Err(Error::bounds(
                            "FIELDS",
                            format!("`elementSize` {v} on `{name}` outside [1, {cap}]"),
                        ));
                    }
                    meta.element_size = Some(v as u32);
                }
                "hidden" => {
                    meta.hidden = Some(fvalue.get::<bool>().ok_or_else(|| {
                        field_type_error(name, "hidden", "bool", fvalue)
                    })?);
                }
                "connectionPaths" => {
                    let op = fvalue.get::<ListOp<Path>>().ok_or_else(|| {
                        field_type_error(name, "connectionPaths", "pathListOp", fvalue)
                    })?;
                    if !op.is_explicit() {
                        return Err(Error::semantic(format!(
                            "`connectionPaths` on `{name}` must be explicit"
                        )));
                    }
                    let items = op.explicit_items();
                    if items.is_empty() {
                        return Err(Error::semantic(format!(
                            "`connectionPaths` on `{name}` has no items"
                        )));
                    }
                    let mut c = Relationship::new();
                    if items.len() == 1 {
                        c.set_single(items[0].clone());
                    } else {
                        c.set_vector(items.to_vec());
                    }
                    c.list_edit = ListEditQual::ResetToExplicit;
                    conn = Some(c);
                }
                "targetPaths" => {
                    let op = fvalue.get::<ListOp<Path>>().ok_or_else(|| {
                        field_type_error(name, "targetPaths", "pathListOp", fvalue)
                    })?;
                    let decoded = op.decode();
                    let Some((qual, items)) = decoded.first().cloned() else {
                        return Err(Error::semantic(format!(
                            "`targetPaths` on `{name}` is empty"
                        )));
                    };
                    if decoded.len() > 1 {
                        self.warn(format!(
                            "`targetPaths` on `{name}` carries multiple qualifiers, using {qual}"
                        ));
                    }
                    if items.is_empty() {
                        return Err(Error::semantic(format!(
                            "`targetPaths` on `{name}` is empty"
                        )));
                    }
                    let mut r = Relationship::new();
                    if items.len() == 1 {
                        r.set_single(items[0].clone());
                    } else {
                        r.set_vector(items);
                    }
                    r.list_edit = qual;
                    targets = Some(r);
                }
                "targetChildren" | "connectionChildren" => {
                    // Presence-validation lists; the paths themselves are
                    // what count.
                    fvalue.get::<Vec<Path>>().ok_or_else(|| {
                        field_type_error(name, fname.as_str(), "path[]", fvalue)
                    })?;
                }
                "customData" => {
                    meta.custom_data = Some(fvalue.get::<Dictionary>().ok_or_else(|| {
                        field_type_error(name, "customData", "dictionary", fvalue)
                    })?);
                }
                "documentation" => {
                    meta.doc = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(name, "documentation", "string", fvalue)
                    })?);
                }
                "comment" => {
                    meta.comment = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(name, "comment", "string", fvalue)
                    })?);
                }
                other => {
                    self.warn(format!(
                        "unrecognized field `{other}` on property `{name}`, keeping raw"
                    ));
                    meta.meta.set(other, fvalue.clone());
                }
            }
        }

        // Classification is by field presence: connections first (a
        // connection may record a scalar transiently, never time samples),
        // then relationships, then valued attributes.
        if let Some(conn) = conn {
            if samples.is_some() {
                return Err(Error::semantic(format!(
                    "property `{name}` carries both connectionPaths and timeSamples"
                )));
            }
            let declared = type_name.ok_or_else(|| {
                Error::semantic(format!("connection `{name}` is missing `typeName`"))
            })?;
            let mut connection = Connection::new(declared);
            if conn.is_single() {
                connection.set_single(conn.targets()[0].clone());
            } else {
                connection.set_vector(conn.targets().to_vec());
            }
            connection.list_edit = conn.list_edit;
            return Ok(Property::new_connection(connection, custom));
        }

        if let Some(rel) = targets {
            return Ok(Property::new_relationship(rel, custom));
        }

        if scalar.is_some() || samples.is_some() {
            let declared = type_name.clone().unwrap_or_default();
            let mut attr = Attribute::new(name, declared.clone());
            if let Some(v) = variability {
                attr.set_variability(v);
            }
            attr.meta = meta;

            if let Some(mut value) = scalar {
                if value.is_block() {
                    attr.set_blocked(true);
                } else {
                    if !declared.is_empty() {
                        self.coerce_to_declared(name, &declared, &mut value)?;
                    }
                    attr.set_scalar(value);
                }
            }
            if let Some(ts) = samples {
                attr.set_var(PrimVar::TimeSamples(ts));
            }
            return Ok(Property::new_attribute(attr, custom));
        }

        match type_name {
            Some(ty) => Ok(Property::new_empty_attribute(ty, custom)),
            None => {
                if spec_type == SpecType::Relationship {
                    Ok(Property::new(PropertyKind::NoTargetsRelationship, custom))
                } else {
                    Err(Error::semantic(format!(
                        "property `{name}` has neither `typeName` nor targets"
                    )))
                }
            }
        }
    }

    /// Ensure a stored scalar matches its declared type, widening narrowed
    /// numeric payloads in place.
    fn coerce_to_declared(
        &mut self,
        name: &str,
        declared: &str,
        value: &mut Value,
    ) -> Result<()> {
        let Some(vt) = value_type_from_name(declared) else {
            self.warn(format!(
                "unknown typeName `{declared}` on `{name}`, keeping stored type `{}`",
                value.type_name()
            ));
            return Ok(());
        };
        if value.type_id() == vt.underlying_id {
            return Ok(());
        }
        if !upcast_numeric(declared, value) {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: declared.to_string(),
                actual: value.type_name().to_string(),
            });
        }
        Ok(())
    }

    /// Parse Prim-level fields and metadata out of one fieldset.
    fn parse_prim_fields(
        &mut self,
        fvs: &FieldValuePairVector,
        display_path: &str,
    ) -> Result<ParsedPrimFields> {
        let mut out = ParsedPrimFields::default();

        for (fname, fvalue) in fvs {
            match fname.as_str() {
                "typeName" => {
                    let tok = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error(display_path, "typeName", "token", fvalue)
                    })?;
                    out.type_name = Some(tok.as_str().to_string());
                }
                "specifier" => {
                    out.specifier = Some(fvalue.get::<Specifier>().ok_or_else(|| {
                        field_type_error(display_path, "specifier", "specifier", fvalue)
                    })?);
                }
                "properties" => {
                    out.properties = fvalue.get::<Vec<Token>>().ok_or_else(|| {
                        field_type_error(display_path, "properties", "token[]", fvalue)
                    })?;
                }
                "primChildren" => {
                    out.prim_children = fvalue.get::<Vec<Token>>().ok_or_else(|| {
                        field_type_error(display_path, "primChildren", "token[]", fvalue)
                    })?;
                }
                "active" => {
                    out.meta.active = Some(fvalue.get::<bool>().ok_or_else(|| {
                        field_type_error(display_path, "active", "bool", fvalue)
                    })?);
                }
                "hidden" => {
                    out.meta.hidden = Some(fvalue.get::<bool>().ok_or_else(|| {
                        field_type_error(display_path, "hidden", "bool", fvalue)
                    })?);
                }
                "kind" => {
                    let tok = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error(display_path, "kind", "token", fvalue)
                    })?;
                    out.meta.kind = Some(Kind::from_str(tok.as_str()).ok_or_else(|| {
                        Error::semantic(format!(
                            "invalid `kind` token `{tok}` on `{display_path}`"
                        ))
                    })?);
                }
                "assetInfo" => {
                    out.meta.asset_info = Some(fvalue.get::<Dictionary>().ok_or_else(|| {
                        field_type_error(display_path, "assetInfo", "dictionary", fvalue)
                    })?);
                }
                "customData" => {
                    out.meta.custom_data = Some(fvalue.get::<Dictionary>().ok_or_else(|| {
                        field_type_error(display_path, "customData", "dictionary", fvalue)
                    })?);
                }
                "apiSchemas" => {
                    let op = fvalue.get::<ListOp<Token>>().ok_or_else(|| {
                        field_type_error(display_path, "apiSchemas", "tokenListOp", fvalue)
                    })?;
                    out.meta.api_schemas = self.to_api_schemas(&op, display_path)?;
                }
                "documentation" => {
                    out.meta.doc = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(display_path, "documentation", "string", fvalue)
                    })?);
                }
                "comment" => {
                    out.meta.comment = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(display_path, "comment", "string", fvalue)
                    })?);
                }
                "displayName" => {
                    out.meta.display_name = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(display_path, "displayName", "string", fvalue)
                    })?);
                }
                "sceneName" => {
                    out.meta.scene_name = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error(display_path, "sceneName", "string", fvalue)
                    })?);
                }
                "references" => {
                    let op = fvalue.get::<ListOp<Reference>>().ok_or_else(|| {
                        field_type_error(display_path, "references", "referenceListOp", fvalue)
                    })?;
                    out.meta.references = self.arc_items(&op, "references", display_path);
                }
                "payload" => {
                    let op = fvalue.get::<ListOp<Payload>>().ok_or_else(|| {
                        field_type_error(display_path, "payload", "payloadListOp", fvalue)
                    })?;
                    out.meta.payload = self.arc_items(&op, "payload", display_path);
                }
                "inheritPaths" | "inherits" => {
                    let op = fvalue.get::<ListOp<Path>>().ok_or_else(|| {
                        field_type_error(display_path, "inherits", "pathListOp", fvalue)
                    })?;
                    out.meta.inherits = self.arc_items(&op, "inherits", display_path);
                }
                "specializes" => {
                    let op = fvalue.get::<ListOp<Path>>().ok_or_else(|| {
                        field_type_error(display_path, "specializes", "pathListOp", fvalue)
                    })?;
                    out.meta.specializes = self.arc_items(&op, "specializes", display_path);
                }
                "variantSetNames" | "variantSets" => {
                    // Authored either as a plain token list or a list op.
                    if let Some(tokens) = fvalue.get::<Vec<Token>>() {
                        out.meta.variant_sets = Some((ListEditQual::ResetToExplicit, tokens));
                    } else {
                        let op = fvalue.get::<ListOp<Token>>().ok_or_else(|| {
                            field_type_error(display_path, "variantSets", "tokenListOp", fvalue)
                        })?;
                        out.meta.variant_sets = self.arc_items(&op, "variantSets", display_path);
                    }
                }
                "variantSelection" => {
                    let dict = fvalue.get::<Dictionary>().ok_or_else(|| {
                        field_type_error(display_path, "variantSelection", "dictionary", fvalue)
                    })?;
                    let mut selections = Vec::with_capacity(dict.len());
                    for (set, choice) in dict.iter() {
                        let choice = choice.get::<String>().ok_or_else(|| {
                            Error::semantic(format!(
                                "variant selection `{set}` on `{display_path}` is not a string"
                            ))
                        })?;
                        selections.push((set.to_string(), choice));
                    }
                    out.meta.variants = Some(selections);
                }
                other => {
                    self.warn(format!(
                        "unrecognized prim field `{other}` on `{display_path}`, keeping raw"
                    ));
                    out.meta.meta.set(other, fvalue.clone());
                }
            }
        }
        Ok(out)
    }

    /// Decompose a composition-arc list op into `(qualifier, items)`,
    /// warning when more than one bucket is populated.
    fn arc_items<T: Clone + PartialEq>(
        &mut self,
        op: &ListOp<T>,
        field: &str,
        display_path: &str,
    ) -> Option<(ListEditQual, Vec<T>)> {
        let decoded = op.decode();
        let (qual, items) = decoded.first().cloned()?;
        if decoded.len() > 1 {
            self.warn(format!(
                "`{field}` on `{display_path}` carries multiple qualifiers, using {qual}"
            ));
        }
        Some((qual, items))
    }

    /// Validate an `apiSchemas` list op: exactly one qualifier bucket,
    /// every name from the recognized set. The Ordered bucket is not
    /// implemented and downgrades to a warning.
    fn to_api_schemas(
        &mut self,
        op: &ListOp<Token>,
        display_path: &str,
    ) -> Result<Option<ApiSchemas>> {
        if op.is_empty() {
            return Ok(None);
        }
        let Some((qual, items)) = op.single_qualifier() else {
            return Err(Error::semantic(format!(
                "`apiSchemas` on `{display_path}` mixes list-edit buckets"
            )));
        };
        if qual == ListEditQual::Order {
            self.warn(format!(
                "ordered `apiSchemas` on `{display_path}` is not implemented, ignoring"
            ));
            return Ok(None);
        }
        let mut names = Vec::with_capacity(items.len());
        for tok in items {
            let name = ApiSchemaName::from_str(tok.as_str()).ok_or_else(|| {
                Error::semantic(format!(
                    "unrecognized apiSchema `{tok}` on `{display_path}`"
                ))
            })?;
            names.push(name);
        }
        Ok(Some(ApiSchemas {
            list_edit: qual,
            names,
        }))
    }

    /// Parse pseudo-root fields into StageMetas. Returns the
    /// `primChildren` ordering tokens.
    fn parse_stage_metas(
        &mut self,
        fvs: &FieldValuePairVector,
        stage: &mut Stage,
    ) -> Result<Vec<Token>> {
        let mut prim_children = Vec::new();
        let metas = stage.metas_mut();

        for (fname, fvalue) in fvs {
            match fname.as_str() {
                "upAxis" => {
                    let tok = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error("stage", "upAxis", "token", fvalue)
                    })?;
                    metas.up_axis = Axis::from_str(tok.as_str()).ok_or_else(|| {
                        Error::semantic(format!(
                            "`upAxis` must be `X`, `Y` or `Z`, got `{tok}`"
                        ))
                    })?;
                }
                "metersPerUnit" => {
                    metas.meters_per_unit = double_or_float(fvalue).ok_or_else(|| {
                        field_type_error("stage", "metersPerUnit", "double", fvalue)
                    })?;
                }
                "timeCodesPerSecond" => {
                    metas.time_codes_per_second = double_or_float(fvalue).ok_or_else(|| {
                        field_type_error("stage", "timeCodesPerSecond", "double", fvalue)
                    })?;
                }
                "startTimeCode" => {
                    metas.start_time_code = double_or_float(fvalue).ok_or_else(|| {
                        field_type_error("stage", "startTimeCode", "double", fvalue)
                    })?;
                }
                "endTimeCode" => {
                    metas.end_time_code = double_or_float(fvalue).ok_or_else(|| {
                        field_type_error("stage", "endTimeCode", "double", fvalue)
                    })?;
                }
                "defaultPrim" => {
                    metas.default_prim = fvalue.get::<Token>().ok_or_else(|| {
                        field_type_error("stage", "defaultPrim", "token", fvalue)
                    })?;
                }
                "customLayerData" => {
                    let mut dict = fvalue.get::<Dictionary>().ok_or_else(|| {
                        field_type_error("stage", "customLayerData", "dictionary", fvalue)
                    })?;
                    resolve_asset_paths(&mut dict, self.base_dir);
                    metas.custom_layer_data = dict;
                }
                "primChildren" => {
                    prim_children = fvalue.get::<Vec<Token>>().ok_or_else(|| {
                        field_type_error("stage", "primChildren", "token[]", fvalue)
                    })?;
                }
                "documentation" => {
                    metas.doc = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error("stage", "documentation", "string", fvalue)
                    })?);
                }
                "comment" => {
                    metas.comment = Some(fvalue.get::<String>().ok_or_else(|| {
                        field_type_error("stage", "comment", "string", fvalue)
                    })?);
                }
                other => {
                    self.warn(format!("unrecognized stage metadatum `{other}`, ignoring"));
                }
            }
        }
        Ok(prim_children)
    }
}

fn field_type_error(owner: &str, field: &str, expected: &str, got: &Value) -> Error {
    Error::TypeMismatch {
        name: format!("{owner}.{field}"),
        expected: expected.to_string(),
        actual: got.type_name().to_string(),
    }
}

/// Some encoders narrow stage-meta doubles to float; accept both.
fn double_or_float(value: &Value) -> Option<f64> {
    value
        .get::<f64>()
        .or_else(|| value.get::<f32>().map(f64::from))
}

/// Resolve every asset path inside a dictionary against the layer's base
/// directory. The core records the resolved location; it never opens it.
fn resolve_asset_paths(dict: &mut Dictionary, base_dir: &str) {
    if base_dir.is_empty() {
        return;
    }
    for (_, value) in dict.iter_mut() {
        match value {
            Value::AssetPath(ap) => ap.resolve(base_dir),
            Value::AssetPathArray(aps) => {
                for ap in aps {
                    ap.resolve(base_dir);
                }
            }
            Value::Dictionary(inner) => resolve_asset_paths(inner, base_dir),
            _ => {}
        }
    }
}

/// Stable reorder: prims named in `order` come first, in that order;
/// everything else keeps its relative position after them.
fn reorder_by_tokens(prims: &mut Vec<Prim>, order: &[Token]) {
    let mut ordered = Vec::with_capacity(prims.len());
    for tok in order {
        if let Some(pos) = prims.iter().position(|p| p.name() == tok.as_str()) {
            ordered.push(prims.remove(pos));
        }
    }
    ordered.append(prims);
    *prims = ordered;
}
