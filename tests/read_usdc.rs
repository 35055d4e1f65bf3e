//! End-to-end Crate read tests against builder-generated files.

mod common;

use common::{CrateBuilder, PathSpec};
use usd::attr::PropertyKind;
use usd::prelude::*;
use usd::schema::PrimBody;
use usd::usdc::format::SpecType;
use usd::util::Vec3;
use usd::attr::TimeSampleInterpolation::{Held, Linear};
use usd::value::{Axis, Specifier, Value, Variability};

fn config() -> CrateReaderConfig {
    CrateReaderConfig::default()
}

/// Empty stage: a pseudo-root with stage metadata and no prims.
#[test]
fn test_empty_stage() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![]));

    let up = b.inline_token("Y");
    let f_up = b.field("upAxis", up);
    let mpu = b.blob_double(0.01);
    let f_mpu = b.field("metersPerUnit", mpu);
    let fs = b.fieldset(&[f_up, f_mpu]);
    b.spec(0, fs, SpecType::PseudoRoot);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    assert_eq!(stage.metas().up_axis, Axis::Y);
    assert_eq!(stage.metas().meters_per_unit, 0.01);
    assert!(stage.root_prims().is_empty());
}

/// Single prim with one scalar attribute.
#[test]
fn test_single_scalar_attribute() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "Cube",
        vec![PathSpec::prop("size")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let spec_rep = CrateBuilder::inline_specifier(Specifier::Def);
    let f_spec = b.field("specifier", spec_rep);
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let fs_cube = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_cube, SpecType::Prim);

    let attr_ty = b.inline_token("float");
    let f_attr_ty = b.field("typeName", attr_ty);
    let f_default = b.field("default", CrateBuilder::inline_float(2.0));
    let fs_size = b.fieldset(&[f_attr_ty, f_default]);
    b.spec(2, fs_size, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    assert_eq!(stage.root_prims().len(), 1);

    let cube = &stage.root_prims()[0];
    assert_eq!(cube.name(), "Cube");
    assert_eq!(cube.element_path().element_name(), cube.name());
    assert_eq!(cube.type_name(), "Xform");
    assert_eq!(cube.abs_path().full_path_name(), "/Cube");

    let size = &cube.properties()["size"];
    let attr = size.attribute().unwrap();
    assert_eq!(attr.get_value::<f32>(), Some(2.0));
    assert_eq!(size.get_value_at::<f32>(0.0, Held), Some(2.0));
    assert_eq!(size.value_type_name(), Some("float"));
}

fn build_timesampled_radius(samples: &[(f64, Option<f32>)]) -> Vec<u8> {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "Sphere",
        vec![PathSpec::prop("radius")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let spec_rep = CrateBuilder::inline_specifier(Specifier::Def);
    let f_spec = b.field("specifier", spec_rep);
    let ty = b.inline_token("Sphere");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let reps: Vec<(f64, Option<usd::usdc::ValueRep>)> = samples
        .iter()
        .map(|(t, v)| (*t, v.map(CrateBuilder::inline_double)))
        .collect();
    let ts = b.timesamples(&reps);
    let attr_ty = b.inline_token("double");
    let f_attr_ty = b.field("typeName", attr_ty);
    let f_ts = b.field("timeSamples", ts);
    let fs_radius = b.fieldset(&[f_attr_ty, f_ts]);
    b.spec(2, fs_radius, SpecType::Attribute);

    b.build()
}

/// Held vs Linear lookup over decoded time samples.
#[test]
fn test_held_vs_linear() {
    let data = build_timesampled_radius(&[(0.0, Some(1.0)), (10.0, Some(3.0))]);
    let stage = load_usdc_from_memory(data, "", &config()).unwrap();
    let radius = &stage.root_prims()[0].properties()["radius"];

    assert_eq!(radius.get_value_at::<f64>(5.0, Held), Some(1.0));
    assert_eq!(radius.get_value_at::<f64>(10.0, Held), Some(3.0));
    assert_eq!(radius.get_value_at::<f64>(5.0, Linear), Some(2.0));
    assert_eq!(radius.get_value_at::<f64>(10.0, Linear), Some(3.0));
    assert_eq!(radius.get_value_at::<f64>(-1.0, Linear), Some(1.0));
    assert_eq!(radius.get_value_at::<f64>(11.0, Linear), Some(3.0));
}

/// A Blocked sample makes its span absent and is never interpolated
/// across.
#[test]
fn test_blocked_sample() {
    let data =
        build_timesampled_radius(&[(0.0, Some(1.0)), (5.0, None), (10.0, Some(3.0))]);
    let stage = load_usdc_from_memory(data, "", &config()).unwrap();
    let radius = &stage.root_prims()[0].properties()["radius"];

    assert_eq!(radius.get_value_at::<f64>(4.0, Held), Some(1.0));
    assert_eq!(radius.get_value_at::<f64>(5.0, Held), None);
    assert_eq!(radius.get_value_at::<f64>(6.0, Held), None);
    assert_eq!(radius.get_value_at::<f64>(10.0, Held), Some(3.0));
    assert_eq!(radius.get_value_at::<f64>(7.0, Linear), None);
    assert_eq!(radius.get_value_at::<f64>(2.0, Linear), None);
}

/// A half3 payload under a `color3f` typeName reads back widened.
#[test]
fn test_numeric_upcast() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "Mat",
        vec![PathSpec::prop("color")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Material");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let attr_ty = b.inline_token("color3f");
    let f_attr_ty = b.field("typeName", attr_ty);
    let f_default = b.field("default", CrateBuilder::inline_half3(0.25, 0.5, 1.0));
    let fs_color = b.fieldset(&[f_attr_ty, f_default]);
    b.spec(2, fs_color, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let color = &stage.root_prims()[0].properties()["color"];
    let attr = color.attribute().unwrap();

    // Stored half3 reads back as float3.
    assert_eq!(attr.var().as_scalar().map(Value::type_name), Some("float3"));
    assert_eq!(
        attr.get_value::<Vec3>(),
        Some(Vec3::new(0.25, 0.5, 1.0))
    );
}

/// apiSchemas mixing two edit buckets is a structured error.
#[test]
fn test_api_schemas_mixed_buckets_rejected() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("Geo", vec![])]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let listop = b.token_listop(
        None,
        &["MaterialBindingAPI"],
        &[],
        &[],
        &[],
        &["SkelBindingAPI"],
    );
    let f_api = b.field("apiSchemas", listop);
    let fs_prim = b.fieldset(&[f_spec, f_ty, f_api]);
    b.spec(1, fs_prim, SpecType::Prim);

    let err = load_usdc_from_memory(b.build(), "", &config()).unwrap_err();
    assert!(matches!(err, Error::Semantic(_)));
    assert!(err.to_string().contains("apiSchemas"));
}

/// A single-bucket apiSchemas list is accepted and recorded.
#[test]
fn test_api_schemas_single_bucket() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("Geo", vec![])]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let listop = b.token_listop(None, &[], &[], &[], &[], &["MaterialBindingAPI"]);
    let f_api = b.field("apiSchemas", listop);
    let fs_prim = b.fieldset(&[f_spec, f_ty, f_api]);
    b.spec(1, fs_prim, SpecType::Prim);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let schemas = stage.root_prims()[0].meta.api_schemas.as_ref().unwrap();
    assert_eq!(schemas.list_edit, ListEditQual::Append);
    assert_eq!(schemas.names.len(), 1);
}

/// Mesh with raw and compressed arrays; the typed body harvests them.
#[test]
fn test_mesh_arrays_and_harvest() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "Tri",
        vec![
            PathSpec::prop("points"),
            PathSpec::prop("faceVertexIndices"),
            PathSpec::prop("faceVertexCounts"),
            PathSpec::prop("widths"),
        ],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Mesh");
    let f_ty = b.field("typeName", ty);
    let props = b.token_array(&["points", "faceVertexIndices", "faceVertexCounts", "widths"]);
    let f_props = b.field("properties", props);
    let fs_prim = b.fieldset(&[f_spec, f_ty, f_props]);
    b.spec(1, fs_prim, SpecType::Prim);

    let points = b.float3_array(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let pt_ty = b.inline_token("point3f[]");
    let f_pt_ty = b.field("typeName", pt_ty);
    let f_points = b.field("default", points);
    let fs_points = b.fieldset(&[f_pt_ty, f_points]);
    b.spec(2, fs_points, SpecType::Attribute);

    let indices = b.int_array_compressed(&[0, 1, 2]);
    let idx_ty = b.inline_token("int[]");
    let f_idx_ty = b.field("typeName", idx_ty);
    let f_indices = b.field("default", indices);
    let fs_indices = b.fieldset(&[f_idx_ty, f_indices]);
    b.spec(3, fs_indices, SpecType::Attribute);

    let counts = b.int_array_compressed(&[3]);
    let cnt_ty = b.inline_token("int[]");
    let f_cnt_ty = b.field("typeName", cnt_ty);
    let f_counts = b.field("default", counts);
    let fs_counts = b.fieldset(&[f_cnt_ty, f_counts]);
    b.spec(4, fs_counts, SpecType::Attribute);

    let widths = b.float_array_lz4(&[0.1, 0.2, 0.3]);
    let w_ty = b.inline_token("float[]");
    let f_w_ty = b.field("typeName", w_ty);
    let f_widths = b.field("default", widths);
    let fs_widths = b.fieldset(&[f_w_ty, f_widths]);
    b.spec(5, fs_widths, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let tri = &stage.root_prims()[0];

    let names: Vec<&str> = tri.properties().names().collect();
    assert_eq!(
        names,
        vec!["points", "faceVertexIndices", "faceVertexCounts", "widths"]
    );

    let widths = &tri.properties()["widths"];
    assert_eq!(
        widths.get_value::<Vec<f32>>(),
        Some(vec![0.1, 0.2, 0.3])
    );

    let PrimBody::Mesh(mesh) = tri.body() else {
        panic!("expected a Mesh body");
    };
    assert_eq!(mesh.points.get_value().map(|p| p.len()), Some(3));
    assert_eq!(
        mesh.face_vertex_indices.get_value(),
        Some(vec![0, 1, 2])
    );
    assert_eq!(mesh.face_vertex_counts.get_value(), Some(vec![3]));
}

/// Authored property order from the `properties` field wins over file
/// order.
#[test]
fn test_property_order_follows_authored_list() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "P",
        vec![PathSpec::prop("a"), PathSpec::prop("b")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let props = b.token_array(&["b", "a"]);
    let f_props = b.field("properties", props);
    let fs_prim = b.fieldset(&[f_spec, f_ty, f_props]);
    b.spec(1, fs_prim, SpecType::Prim);

    for (path_index, name) in [(2u32, "a"), (3u32, "b")] {
        let ty = b.inline_token("float");
        let f_ty = b.field("typeName", ty);
        let f_default = b.field(
            "default",
            CrateBuilder::inline_float(if name == "a" { 1.0 } else { 2.0 }),
        );
        let fs = b.fieldset(&[f_ty, f_default]);
        b.spec(path_index, fs, SpecType::Attribute);
    }

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let names: Vec<&str> = stage.root_prims()[0].properties().names().collect();
    assert_eq!(names, vec!["b", "a"]);
}

/// Relationships carry their targets and qualifier.
#[test]
fn test_relationship_targets() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![
        PathSpec::prim("Looks", vec![]),
        PathSpec::prim("Geo", vec![PathSpec::prop("material:binding")]),
    ]));
    // Indices: 0 root, 1 Looks, 2 Geo, 3 material:binding.

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    for path_index in [1u32, 2u32] {
        let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
        let ty = b.inline_token("Xform");
        let f_ty = b.field("typeName", ty);
        let fs = b.fieldset(&[f_spec, f_ty]);
        b.spec(path_index, fs, SpecType::Prim);
    }

    let targets = b.path_listop_explicit(&[1]);
    let f_targets = b.field("targetPaths", targets);
    let fs_rel = b.fieldset(&[f_targets]);
    b.spec(3, fs_rel, SpecType::Relationship);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let geo = stage.find_prim_at_path(&Path::new("/Geo", "")).unwrap();
    let binding = &geo.properties()["material:binding"];

    assert!(binding.is_relationship());
    let rel = binding.relationship().unwrap();
    assert!(rel.is_single());
    assert_eq!(rel.targets()[0].full_path_name(), "/Looks");
    assert_eq!(rel.list_edit, ListEditQual::ResetToExplicit);
}

/// Connections keep the declared type name and defer evaluation.
#[test]
fn test_connection() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "Mat",
        vec![
            PathSpec::prim("Tex", vec![PathSpec::prop("outputs:rgb")]),
            PathSpec::prop("inputs:diffuseColor"),
        ],
    )]));
    // Indices: 0 root, 1 Mat, 2 Tex, 3 outputs:rgb, 4 inputs:diffuseColor.

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Material");
    let f_ty = b.field("typeName", ty);
    let fs_mat = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_mat, SpecType::Prim);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Shader");
    let f_ty = b.field("typeName", ty);
    let fs_tex = b.fieldset(&[f_spec, f_ty]);
    b.spec(2, fs_tex, SpecType::Prim);

    let ty = b.inline_token("color3f");
    let f_out_ty = b.field("typeName", ty);
    let fs_out = b.fieldset(&[f_out_ty]);
    b.spec(3, fs_out, SpecType::Attribute);

    let ty = b.inline_token("color3f");
    let f_in_ty = b.field("typeName", ty);
    let conn = b.path_listop_explicit(&[3]);
    let f_conn = b.field("connectionPaths", conn);
    let fs_in = b.fieldset(&[f_in_ty, f_conn]);
    b.spec(4, fs_in, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let mat = &stage.root_prims()[0];

    let input = &mat.properties()["inputs:diffuseColor"];
    assert!(input.is_connection());
    assert_eq!(input.value_type_name(), Some("color3f"));
    assert_eq!(input.connection_targets().len(), 1);
    assert_eq!(
        input.connection_targets()[0].full_path_name(),
        "/Mat/Tex.outputs:rgb"
    );
    // Connections never evaluate locally.
    assert_eq!(input.get_value::<Vec3>(), None);

    // The declared output is an empty attribute on the shader prim.
    let tex = mat.find_child("Tex").unwrap();
    let out = &tex.properties()["outputs:rgb"];
    assert!(matches!(out.kind(), PropertyKind::EmptyAttribute(ty) if ty == "color3f"));
}

/// Over prims are skipped with a warning, not an error.
#[test]
fn test_over_prim_skipped() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![
        PathSpec::prim("Kept", vec![]),
        PathSpec::prim("Sparse", vec![]),
    ]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let fs_kept = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_kept, SpecType::Prim);

    let f_over = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Over));
    let fs_over = b.fieldset(&[f_over]);
    b.spec(2, fs_over, SpecType::Prim);

    let (stage, warnings) =
        usd::usdc::load_usdc_with_warnings(CrateSource::from_memory(b.build()), "", &config())
            .unwrap();
    assert_eq!(stage.root_prims().len(), 1);
    assert_eq!(stage.root_prims()[0].name(), "Kept");
    assert!(warnings.iter().any(|w| w.contains("over")));
}

/// Duplicate specs for one path index abort the read.
#[test]
fn test_duplicate_path_index_rejected() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("A", vec![])]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let fs = b.fieldset(&[f_spec]);
    b.spec(1, fs, SpecType::Prim);
    b.spec(1, fs, SpecType::Prim);

    let err = load_usdc_from_memory(b.build(), "", &config()).unwrap_err();
    assert!(matches!(err, Error::Semantic(_)));
}

/// Prim metadata and stage metadata round out the read.
#[test]
fn test_metadata_and_custom_layer_data() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("Root", vec![])]));

    let def = b.inline_token("Root");
    let f_def = b.field("defaultPrim", def);
    let asset = b.inline_asset("textures/env.exr");
    let dict = b.dictionary(&[("envMap", asset)]);
    let f_dict = b.field("customLayerData", dict);
    let doc = b.inline_string("example layer");
    let f_doc = b.field("documentation", doc);
    let fs_root = b.fieldset(&[f_def, f_dict, f_doc]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let f_active = b.field("active", CrateBuilder::inline_bool(false));
    let kind = b.inline_token("component");
    let f_kind = b.field("kind", kind);
    let fs_prim = b.fieldset(&[f_spec, f_ty, f_active, f_kind]);
    b.spec(1, fs_prim, SpecType::Prim);

    let stage = load_usdc_from_memory(b.build(), "/scenes/env", &config()).unwrap();

    assert_eq!(stage.metas().default_prim.as_str(), "Root");
    assert_eq!(stage.metas().doc.as_deref(), Some("example layer"));
    let Some(Value::AssetPath(ap)) = stage.metas().custom_layer_data.get("envMap") else {
        panic!("expected asset path in customLayerData");
    };
    assert_eq!(
        ap.resolved_path.as_deref(),
        Some("/scenes/env/textures/env.exr")
    );

    let root = &stage.root_prims()[0];
    assert_eq!(root.meta.active, Some(false));
    assert_eq!(root.meta.kind, Some(usd::value::Kind::Component));
}

/// LZ4-compressed TOKENS section decodes identically to a raw one.
#[test]
fn test_compressed_tokens_section() {
    let mut b = CrateBuilder::new();
    b.compress_tokens = true;
    b.paths(&PathSpec::root(vec![PathSpec::prim("Cube", vec![])]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    // Plenty of repetitive tokens so LZ4 actually shrinks the blob.
    for i in 0..64 {
        b.token(&format!("prefix:common:name:{i}"));
    }
    let fs = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs, SpecType::Prim);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    assert_eq!(stage.root_prims()[0].name(), "Cube");
}

/// Blocked default value: authored but absent.
#[test]
fn test_blocked_default() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "S",
        vec![PathSpec::prop("radius")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Sphere");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let ty = b.inline_token("double");
    let f_attr_ty = b.field("typeName", ty);
    let f_var = b.field(
        "variability",
        CrateBuilder::inline_variability(Variability::Uniform),
    );
    let f_default = b.field("default", CrateBuilder::inline_block());
    let fs = b.fieldset(&[f_attr_ty, f_var, f_default]);
    b.spec(2, fs, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let radius = &stage.root_prims()[0].properties()["radius"];
    let attr = radius.attribute().unwrap();

    assert!(attr.is_blocked());
    assert!(attr.authored());
    assert_eq!(attr.variability(), Variability::Uniform);
    assert_eq!(attr.get_value::<f64>(), None);

    // Blocked leaves the Sphere record on its schema fallback.
    let PrimBody::Sphere(sphere) = stage.root_prims()[0].body() else {
        panic!("expected Sphere body");
    };
    assert_eq!(sphere.radius.get_value(), None);
    assert!(sphere.radius.is_blocked());
}

/// uint64 arrays survive the integer-coded path.
#[test]
fn test_uint64_compressed_array() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "P",
        vec![PathSpec::prop("ids")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Points");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let ids: Vec<u64> = vec![1, 1 << 40, 7, 7, 0];
    let arr = b.uint64_array_compressed(&ids);
    let ty = b.inline_token("uint64[]");
    let f_attr_ty = b.field("typeName", ty);
    let f_default = b.field("default", arr);
    let fs = b.fieldset(&[f_attr_ty, f_default]);
    b.spec(2, fs, SpecType::Attribute);

    let stage = load_usdc_from_memory(b.build(), "", &config()).unwrap();
    let prop = &stage.root_prims()[0].properties()["ids"];
    assert_eq!(prop.get_value::<Vec<u64>>(), Some(ids));
}

/// Structural failures return no stage.
#[test]
fn test_malformed_files_rejected() {
    // Bad magic.
    let err = load_usdc_from_memory(b"NOT-USDC-AT-ALL-----".to_vec(), "", &config()).unwrap_err();
    assert!(matches!(err, Error::InvalidMagic));

    // Truncation mid-TOC.
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![]));
    let fs = b.fieldset(&[]);
    b.spec(0, fs, SpecType::PseudoRoot);
    let mut bytes = b.build();
    bytes.truncate(bytes.len() - 10);
    assert!(load_usdc_from_memory(bytes, "", &config()).is_err());
}

/// Caps are enforced before allocation.
#[test]
fn test_array_cap_enforced() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim(
        "P",
        vec![PathSpec::prop("w")],
    )]));

    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Points");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let arr = b.float_array(&[1.0, 2.0, 3.0, 4.0]);
    let ty = b.inline_token("float[]");
    let f_attr_ty = b.field("typeName", ty);
    let f_default = b.field("default", arr);
    let fs = b.fieldset(&[f_attr_ty, f_default]);
    b.spec(2, fs, SpecType::Attribute);

    let mut cfg = config();
    cfg.max_array_elements = 2;
    let err = load_usdc_from_memory(b.build(), "", &cfg).unwrap_err();
    assert!(matches!(err, Error::Bounds { .. }));
}

/// The decoder's memory estimate grows as tables decode.
#[test]
fn test_memory_estimate() {
    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("A", vec![])]));
    let fs_root = b.fieldset(&[]);
    b.spec(0, fs_root, SpecType::PseudoRoot);
    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let fs = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs, SpecType::Prim);

    let mut reader = CrateReader::new(
        CrateSource::from_memory(b.build()),
        CrateReaderConfig::default(),
    )
    .unwrap();
    let before = reader.memory_used();
    reader.read_tables().unwrap();
    let after = reader.memory_used();
    assert!(after >= before);
    assert!(after > 0);
}

/// Single-threaded decode is a first-class configuration.
#[test]
fn test_single_threaded_decode() {
    let data = build_timesampled_radius(&[(0.0, Some(1.0)), (10.0, Some(3.0))]);
    let mut cfg = config();
    cfg.num_threads = 1;
    let stage = load_usdc_from_memory(data, "", &cfg).unwrap();
    assert_eq!(stage.root_prims().len(), 1);
}

/// Reading from a real file goes through the memory-mapped source and
/// resolves asset paths against the file's directory.
#[test]
fn test_load_from_file() {
    use std::io::Write;

    let mut b = CrateBuilder::new();
    b.paths(&PathSpec::root(vec![PathSpec::prim("Cube", vec![])]));

    let asset = b.inline_asset("textures/wood.png");
    let dict = b.dictionary(&[("tex", asset)]);
    let f_dict = b.field("customLayerData", dict);
    let fs_root = b.fieldset(&[f_dict]);
    b.spec(0, fs_root, SpecType::PseudoRoot);

    let f_spec = b.field("specifier", CrateBuilder::inline_specifier(Specifier::Def));
    let ty = b.inline_token("Xform");
    let f_ty = b.field("typeName", ty);
    let fs_prim = b.fieldset(&[f_spec, f_ty]);
    b.spec(1, fs_prim, SpecType::Prim);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&b.build()).unwrap();
    file.flush().unwrap();

    let stage = load_usdc_from_file(file.path(), &config()).unwrap();
    assert_eq!(stage.root_prims().len(), 1);
    assert_eq!(stage.root_prims()[0].name(), "Cube");

    // The base directory comes from the file's parent.
    let parent = file.path().parent().unwrap().to_string_lossy().into_owned();
    let Some(Value::AssetPath(ap)) = stage.metas().custom_layer_data.get("tex") else {
        panic!("expected asset path in customLayerData");
    };
    let resolved = ap.resolved_path.as_deref().unwrap();
    assert!(resolved.starts_with(parent.as_str()));
    assert!(resolved.ends_with("textures/wood.png"));
}

/// The buffered (non-mmap) source decodes the same bytes.
#[test]
fn test_load_from_file_without_mmap() {
    use std::io::Write;

    let data = build_timesampled_radius(&[(0.0, Some(1.0)), (10.0, Some(3.0))]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let source = CrateSource::open_opts(file.path(), false).unwrap();
    let (stage, _) = usd::usdc::load_usdc_with_warnings(source, "", &config()).unwrap();
    let radius = &stage.root_prims()[0].properties()["radius"];
    assert_eq!(radius.get_value_at::<f64>(5.0, Linear), Some(2.0));
}

/// A missing path reports FileNotFound, not a bare io error.
#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-scene.usdc");
    let err = load_usdc_from_file(&missing, &config()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert!(err.to_string().contains("no-such-scene.usdc"));
}
