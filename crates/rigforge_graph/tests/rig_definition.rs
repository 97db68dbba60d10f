// SPDX-License-Identifier: MIT OR Apache-2.0
//! Load/save pipeline tests against literal definition documents.

use rigforge_graph::codec::prepare_to_load;
use rigforge_graph::components::generic::GenericComponent;
use rigforge_graph::rig::ConnectionFailure;
use rigforge_graph::{
    Builder, ConnectionPolicy, DataType, DefinitionKind, DocumentError, Layer, PortError, Rig,
    RigContext, RigError, TraceBuilder, TypeResolutionError, Value,
};
use serde_json::json;

const GENERIC: &str = GenericComponent::TYPE_NAME;

fn document(json: serde_json::Value) -> Value {
    prepare_to_load(json).unwrap()
}

fn two_components(source_type: &str) -> serde_json::Value {
    json!({
        "name": "biped",
        "components": [
            {
                "class": GENERIC,
                "name": "A",
                "outputs": [{"name": "out", "dataType": source_type}]
            },
            {
                "class": GENERIC,
                "name": "B",
                "inputs": [{"name": "in", "dataType": "Xfo"}]
            }
        ],
        "connections": [
            {"source": "A.out", "target": "B.in", "targetIndex": 0}
        ],
        "graphPositions": {"A": [0.0, 0.0], "B": [200.0, 40.0]}
    })
}

fn load(json: serde_json::Value) -> Result<Rig, RigError> {
    let mut ctx = RigContext::default();
    let mut rig = Rig::default();
    rig.load_rig_definition(&mut ctx, &document(json))?;
    Ok(rig)
}

fn edges(rig: &Rig) -> Vec<String> {
    rig.connection_records()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_load_connects_by_decorated_name() {
    let rig = load(two_components("Xfo")).unwrap();
    assert_eq!(rig.name(), "biped");
    assert_eq!(rig.component_count(), 2);
    assert_eq!(edges(&rig), vec!["A.out -> B.in"]);

    let b = rig.component_id("B").unwrap();
    let source = rig.connection_source(b, "in").unwrap();
    assert_eq!(source.name(), "out");
    assert_eq!(source.data_type(), &DataType::Xfo);
    assert_eq!(
        rig.component(b).map(|c| c.graph_position()),
        Some([200.0, 40.0])
    );
}

#[test]
fn test_save_reload_round_trip() {
    let rig = load(two_components("Xfo")).unwrap();
    let saved = rig.get_data();

    let mut ctx = RigContext::default();
    let mut reloaded = Rig::default();
    reloaded.load_rig_definition(&mut ctx, &saved).unwrap();
    assert_eq!(reloaded.get_data(), saved);
    assert_eq!(edges(&reloaded), edges(&rig));
}

fn records(rig: &Rig) -> Vec<(String, String, usize)> {
    rig.connection_records()
        .into_iter()
        .map(|r| (r.source, r.target, r.target_index))
        .collect()
}

#[test]
fn test_round_trip_with_locations_and_indices() {
    let rig = load(json!({
        "name": "biped",
        "components": [
            {
                "class": GENERIC,
                "name": "root",
                "location": "M",
                "outputs": [
                    {"name": "a", "dataType": "Xfo"},
                    {"name": "b", "dataType": "Xfo"}
                ]
            },
            {
                "class": GENERIC,
                "name": "arm",
                "location": "L",
                "inputs": [
                    {"name": "x", "dataType": "Xfo"},
                    {"name": "y", "dataType": "Xfo"}
                ]
            },
            {
                "class": GENERIC,
                "name": "arm",
                "location": "R",
                "inputs": [
                    {"name": "x", "dataType": "Xfo"},
                    {"name": "y", "dataType": "Xfo"}
                ]
            }
        ],
        "connections": [
            {"source": "root_M.a", "target": "arm_L.x", "targetIndex": 0},
            {"source": "root_M.b", "target": "arm_L.y", "targetIndex": 2},
            {"source": "root_M.a", "target": "arm_R.y", "targetIndex": 3}
        ],
        "graphPositions": {
            "root_M": [0.0, 0.0],
            "arm_L": [-150.0, 80.0],
            "arm_R": [150.0, 80.0]
        }
    }))
    .unwrap();

    let expected = vec![
        ("root_M.a".to_string(), "arm_L.x".to_string(), 0),
        ("root_M.b".to_string(), "arm_L.y".to_string(), 2),
        ("root_M.a".to_string(), "arm_R.y".to_string(), 3),
    ];
    assert_eq!(records(&rig), expected);

    let saved = rig.get_data();
    let mut ctx = RigContext::default();
    let mut reloaded = Rig::default();
    reloaded.load_rig_definition(&mut ctx, &saved).unwrap();

    assert_eq!(records(&reloaded), expected);
    let names: Vec<String> = reloaded.components().map(|c| c.decorated_name()).collect();
    assert_eq!(names, vec!["root_M", "arm_L", "arm_R"]);
    assert_eq!(
        reloaded.get_data().get("graphPositions"),
        saved.get("graphPositions")
    );
    assert_eq!(
        reloaded
            .component_by_decorated_name("arm_L")
            .map(|c| c.graph_position()),
        Some([-150.0, 80.0])
    );
    assert_eq!(reloaded.get_data(), saved);
}

#[test]
fn test_dotted_component_name_refused() {
    let err = load(json!({
        "components": [{"class": GENERIC, "name": "arm.L"}]
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        RigError::Document(DocumentError::InvalidName { ref name, .. }) if name == "arm.L"
    ));

    let err = load(json!({
        "components": [
            {"class": GENERIC, "name": "arm", "inputs": [{"name": "tip.x", "dataType": "Xfo"}]}
        ]
    }))
    .unwrap_err();
    assert!(matches!(err, RigError::Document(DocumentError::InvalidName { .. })));
}

#[test]
fn test_connection_to_earlier_component() {
    // The source is listed after the target
    let rig = load(json!({
        "components": [
            {"class": GENERIC, "name": "B", "inputs": [{"name": "in", "dataType": "Xfo"}]},
            {"class": GENERIC, "name": "A", "outputs": [{"name": "out", "dataType": "Xfo"}]}
        ],
        "connections": [{"source": "A.out", "target": "B.in"}]
    }))
    .unwrap();
    assert_eq!(edges(&rig), vec!["A.out -> B.in"]);
}

#[test]
fn test_type_mismatch_fails_load() {
    let err = load(two_components("Vec3")).unwrap_err();
    assert!(matches!(
        err,
        RigError::Port(PortError::TypeMismatch { ref input, ref output })
            if *input == DataType::Xfo && *output == DataType::Vec3
    ));
    assert_eq!(
        err.to_string(),
        "Connected output data type 'Vec3' does not match input data type 'Xfo'"
    );
}

#[test]
fn test_missing_source_keeps_components() {
    let mut ctx = RigContext::default();
    let mut rig = Rig::default();
    let doc = document(json!({
        "components": [
            {"class": GENERIC, "name": "B", "inputs": [{"name": "in", "dataType": "Xfo"}]}
        ],
        "connections": [{"source": "ghost.out", "target": "B.in"}]
    }));

    let err = rig.load_rig_definition(&mut ctx, &doc).unwrap_err();
    match &err {
        RigError::Connection { from, to, reason } => {
            assert_eq!(from, "ghost.out");
            assert_eq!(to, "B.in");
            assert_eq!(
                reason,
                &ConnectionFailure::SourceComponentNotFound("ghost".to_string())
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "Error making connection: ghost.out -> B.in. Source component not found: ghost"
    );
    assert!(rig.component_by_decorated_name("B").is_some());
}

#[test]
fn test_missing_input_port() {
    let err = load(json!({
        "components": [
            {"class": GENERIC, "name": "A", "outputs": [{"name": "out", "dataType": "Xfo"}]},
            {"class": GENERIC, "name": "B"}
        ],
        "connections": [{"source": "A.out", "target": "B.in"}]
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        RigError::Connection { reason: ConnectionFailure::InputNotFound { .. }, .. }
    ));
}

#[test]
fn test_malformed_reference() {
    let err = load(json!({
        "components": [{"class": GENERIC, "name": "A"}],
        "connections": [{"source": "A", "target": "A.in"}]
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        RigError::Connection { reason: ConnectionFailure::MalformedReference(_), .. }
    ));
}

#[test]
fn test_unknown_module() {
    let err = load(json!({
        "components": [{"class": "nowhere.Thing", "name": "A"}]
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        RigError::TypeResolution(TypeResolutionError::UnknownModule { .. })
    ));
}

#[test]
fn test_connections_ignored_without_components() {
    let rig = load(json!({
        "name": "empty",
        "connections": [{"source": "A.out", "target": "B.in"}]
    }))
    .unwrap();
    assert_eq!(rig.name(), "empty");
    assert_eq!(rig.component_count(), 0);
}

#[test]
fn test_unknown_graph_position_ignored() {
    let rig = load(json!({
        "components": [{"class": GENERIC, "name": "A"}],
        "graphPositions": {"A": [10.0, 20.0], "ghost": [1.0, 1.0]}
    }))
    .unwrap();
    let a = rig.component_by_decorated_name("A").unwrap();
    assert_eq!(a.graph_position(), [10.0, 20.0]);
}

#[test]
fn test_duplicate_input_policy() {
    let json = json!({
        "components": [
            {"class": GENERIC, "name": "A", "outputs": [{"name": "out", "dataType": "Xfo"}]},
            {"class": GENERIC, "name": "C", "outputs": [{"name": "out", "dataType": "Xfo"}]},
            {"class": GENERIC, "name": "B", "inputs": [{"name": "in", "dataType": "Xfo"}]}
        ],
        "connections": [
            {"source": "A.out", "target": "B.in"},
            {"source": "C.out", "target": "B.in", "targetIndex": 1}
        ]
    });

    // Permissive: the later record wins
    let rig = load(json.clone()).unwrap();
    assert_eq!(edges(&rig), vec!["C.out -> B.in"]);
    assert_eq!(rig.connections()[0].index, 1);

    let mut ctx = RigContext::default().with_policy(ConnectionPolicy::Strict);
    let mut rig = Rig::default();
    let err = rig
        .load_rig_definition(&mut ctx, &document(json))
        .unwrap_err();
    assert!(matches!(
        err,
        RigError::Connection { reason: ConnectionFailure::InputAlreadyConnected(_), .. }
    ));
}

#[test]
fn test_layers_not_saved() {
    let mut rig = load(two_components("Xfo")).unwrap();
    rig.add_layer(Layer::new("controls"));
    let saved = rig.get_data();
    let names: Vec<&str> = saved
        .get("components")
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .filter_map(|c| c.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_definition_files_json_and_ron() {
    let dir = tempfile::tempdir().unwrap();
    let rig = load(two_components("Xfo")).unwrap();
    let ctx = RigContext::default();

    for file in ["biped.json", "biped.ron"] {
        let path = dir.path().join(file);
        rig.write_definition_file(&ctx, &path, DefinitionKind::Guide)
            .unwrap();

        let mut load_ctx = RigContext::default();
        let mut reloaded = Rig::default();
        reloaded.load_definition_file(&mut load_ctx, &path).unwrap();
        assert_eq!(reloaded.get_data(), rig.get_data(), "{file}");
    }

    let text = std::fs::read_to_string(dir.path().join("biped.json")).unwrap();
    assert!(text.contains("\"graphPositions\""));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let mut ctx = RigContext::default();
    let err = Rig::default()
        .load_definition_file(&mut ctx, &path)
        .unwrap_err();
    assert!(matches!(err, RigError::NotFound(p) if p == path));
}

#[test]
fn test_guide_to_build_file() {
    let guide = load(json!({
        "name": "hero",
        "components": [
            {
                "class": "rigforge.components.main_srt.MainSrtComponentGuide",
                "name": "mainSrt",
                "location": "M",
                "mainSrtXfo": {
                    "__mathObjectClass__": "Xfo",
                    "__mathObjectData__": {
                        "tr": [0.0, 1.0, 0.0],
                        "ori": [0.0, 0.0, 0.0, 1.0],
                        "sc": [1.0, 1.0, 1.0]
                    }
                },
                "mainSrtSize": 5.0
            },
            {
                "class": "rigforge.components.fk_chain.FkChainComponentGuide",
                "name": "tail",
                "location": "M",
                "numBones": 4
            }
        ],
        "connections": [
            {"source": "mainSrt_M.offsetSrt", "target": "tail_M.parentXfo"}
        ]
    }))
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.build.json");
    let ctx = RigContext::default();
    guide
        .write_definition_file(&ctx, &path, DefinitionKind::Build)
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("MainSrtComponentRig"));
    assert!(text.contains("\"offsetSrtSize\": 4.5"));

    let build = rigforge_graph::Format::Json
        .decode(text.as_bytes())
        .unwrap();
    let report = TraceBuilder::default().build(&build).unwrap();
    assert_eq!(report.rig_name, "hero");
    assert_eq!(report.components.len(), 2);
    assert_eq!(
        report.connections[0].to_string(),
        "mainSrt_M.offsetSrt -> tail_M.parentXfo"
    );
}
