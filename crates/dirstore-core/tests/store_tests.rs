//! End-to-end round-trip and invariant tests against real directories.

use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

use dirstore_core::{Namespace, NamespaceTree, Series, StoreError, Tensor, Value};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn scratch_namespace() -> Result<(TempDir, Namespace), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let ns = Namespace::create(tmp.path().join("root"))?;
    Ok((tmp, ns))
}

fn leaf_count(ns: &Namespace) -> Result<usize, Box<dyn std::error::Error>> {
    let mut count = 0;
    for entry in std::fs::read_dir(ns.root())? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[test]
fn float_array_round_trips_any_rank() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;

    for shape in [vec![], vec![5], vec![2, 3], vec![2, 2, 2]] {
        let len: usize = shape.iter().product();
        let data: Vec<f64> = (0..len.max(1)).map(|i| i as f64 * 0.5).collect();
        let tensor = Tensor::Float64(ArrayD::from_shape_vec(IxDyn(&shape), data)?);

        ns.insert("t", Value::Array(tensor.clone()))?;
        let loaded = ns.read("t")?;
        assert_eq!(loaded, Value::Array(tensor), "shape {shape:?}");
    }
    Ok(())
}

#[test]
fn int_array_keeps_dtype_class() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let tensor = Tensor::Int64(ArrayD::from_shape_vec(IxDyn(&[3, 2]), vec![1, 2, 3, 4, 5, 6])?);

    ns.insert("counts", Value::Array(tensor.clone()))?;
    let loaded = ns.read("counts")?;

    match loaded {
        Value::Array(Tensor::Int64(a)) => {
            assert_eq!(Tensor::Int64(a), tensor);
        }
        other => panic!("expected an Int64 array back, got {other:?}"),
    }
    Ok(())
}

#[test]
fn series_round_trips_values_and_label() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let series = Series::from(vec![1.5, 2.5, 3.5]);

    ns.insert("s", Value::Series(series.clone()))?;
    assert_eq!(ns.read("s")?, Value::Series(series));
    Ok(())
}

#[test]
fn series_label_coerces_to_data_on_write() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let values: arrow::array::ArrayRef = Arc::new(StringArray::from(vec!["a", "b"]));
    ns.insert("s", Value::Series(Series::new("temperature", values.clone())))?;

    let loaded = ns.read("s")?;
    let series = loaded.as_series().expect("a series back");
    assert_eq!(series.name(), "data");
    assert_eq!(series.values().to_data(), values.to_data());
    Ok(())
}

#[test]
fn frame_round_trips_exactly() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Float64, false),
        Field::new("volume", DataType::Int64, false),
        Field::new("symbol", DataType::Utf8, false),
    ]));
    let frame = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![101.25, 99.5])),
            Arc::new(Int64Array::from(vec![1200, 800])),
            Arc::new(StringArray::from(vec!["AAA", "BBB"])),
        ],
    )?;

    ns.insert("quotes", Value::Frame(frame.clone()))?;
    assert_eq!(ns.read("quotes")?, Value::Frame(frame));
    Ok(())
}

#[test]
fn object_round_trips_nested_containers() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let object = json!({
        "name": "calibration",
        "thresholds": [0.1, 0.25, 0.5],
        "meta": {"enabled": true, "note": null},
    });

    ns.insert("config", Value::Object(object.clone()))?;
    assert_eq!(ns.read("config")?, Value::Object(object));
    Ok(())
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Calibration {
    name: String,
    thresholds: Vec<f64>,
    enabled: bool,
}

#[test]
fn typed_objects_round_trip_through_the_blob_codec() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let cal = Calibration {
        name: "run-7".into(),
        thresholds: vec![0.25, 0.75],
        enabled: true,
    };

    ns.put_object("cal", &cal)?;
    assert_eq!(ns.get_object::<Calibration>("cal")?, cal);
    Ok(())
}

#[test]
fn overwrite_across_kinds_leaves_one_file() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    let tensor = Tensor::Float64(ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0])?);

    ns.insert("k", Value::Array(tensor))?;
    assert_eq!(leaf_count(&ns)?, 1);

    ns.insert("k", Value::Object(json!("now an object")))?;
    assert_eq!(leaf_count(&ns)?, 1, "stale kind variant must be removed");
    assert_eq!(ns.read("k")?, Value::Object(json!("now an object")));
    assert_eq!(ns.keys()?.len(), 1);
    Ok(())
}

#[test]
fn no_temp_residue_after_overwrites() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    for i in 0..3 {
        ns.insert("k", Value::Object(json!(i)))?;
    }
    for entry in std::fs::read_dir(ns.root())? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        assert!(!name.ends_with(".tmp"), "temp residue: {name}");
    }
    Ok(())
}

#[test]
fn keys_track_writes_and_deletes_without_duplicates() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;

    ns.insert("a", Value::Object(json!(1)))?;
    ns.insert("b", Value::Object(json!(2)))?;
    // Overwriting under a different kind must not add a key.
    let tensor = Tensor::Float64(ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0])?);
    ns.insert("b", Value::Array(tensor))?;
    ns.insert("c", Value::Object(json!(3)))?;
    ns.delete("a")?;

    // Three distinct keys written, one deleted.
    let keys = ns.keys()?;
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("b"));
    assert!(keys.contains("c"));
    Ok(())
}

#[test]
fn missing_key_strict_and_permissive() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;

    assert_eq!(ns.get_or("absent", 42_i64, false), Value::Object(json!(42)));
    assert!(ns.get("absent", true).is_none());

    let err = ns.read("absent").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));

    let err = ns.delete("absent").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
    Ok(())
}

#[test]
fn get_or_create_builds_an_empty_namespace() -> TestResult {
    let tmp = TempDir::new()?;
    let tree = NamespaceTree::create(tmp.path().join("tree"))?;

    assert!(!tree.contains("fresh")?);
    let ns = tree.get_or_create("fresh")?;
    assert_eq!(ns.keys()?.len(), 0);

    // A second call returns the same namespace, still with no leaves.
    let again = tree.get_or_create("fresh")?;
    assert_eq!(again.keys()?.len(), 0);
    assert_eq!(again.root(), ns.root());

    let err = tree.open("missing").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
    Ok(())
}

#[test]
fn corrupted_suffix_enumerates_but_fails_strict_read() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    std::fs::write(ns.root().join("k.bogus.parquetlike.dc"), b"junk")?;

    let keys = ns.keys()?;
    assert!(keys.contains("k"), "corrupted leaf still enumerates as its key");

    let err = ns.read("k").unwrap_err();
    assert!(matches!(err, StoreError::UnknownDataKind { .. }));

    // Permissive access swallows it.
    assert_eq!(ns.get_or("k", "fallback", true), Value::Object(json!("fallback")));
    Ok(())
}

#[test]
fn unknown_storage_extension_is_reported() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    std::fs::write(ns.root().join("k.frame.feather.dc"), b"junk")?;

    let err = ns.read("k").unwrap_err();
    assert!(matches!(err, StoreError::UnknownStorageKind { .. }));
    Ok(())
}

#[test]
fn invalid_keys_are_rejected_before_touching_disk() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    for bad in ["", "a.b", "a/b"] {
        let err = ns.insert(bad, Value::Object(json!(0))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }), "key {bad:?}");
    }
    assert_eq!(leaf_count(&ns)?, 0);
    Ok(())
}

#[test]
fn items_and_values_decode_every_key() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    ns.insert("a", Value::Object(json!(1)))?;
    ns.insert("b", Value::Object(json!(2)))?;
    ns.insert("c", Value::Object(json!(3)))?;

    let items: Vec<(String, Value)> = ns.items()?.collect::<Result<_, _>>()?;
    assert_eq!(
        items,
        vec![
            ("a".to_string(), Value::Object(json!(1))),
            ("b".to_string(), Value::Object(json!(2))),
            ("c".to_string(), Value::Object(json!(3))),
        ]
    );

    let values: Vec<Value> = ns.values()?.collect::<Result<_, _>>()?;
    assert_eq!(values.len(), 3);

    // Restartable: a second call re-scans.
    assert_eq!(ns.items()?.count(), 3);
    Ok(())
}

#[test]
fn clear_removes_every_leaf() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    ns.insert("a", Value::Object(json!(1)))?;
    ns.insert("b", Value::Object(json!(2)))?;

    ns.clear()?;
    assert_eq!(ns.keys()?.len(), 0);
    assert_eq!(leaf_count(&ns)?, 0);
    Ok(())
}

#[test]
fn tree_delete_requires_an_empty_namespace() -> TestResult {
    let tmp = TempDir::new()?;
    let tree = NamespaceTree::create(tmp.path())?;

    let ns = tree.get_or_create("busy")?;
    ns.insert("k", Value::Object(json!(1)))?;

    let err = tree.delete("busy").unwrap_err();
    assert!(matches!(err, StoreError::DirectoryNotEmpty { .. }));

    ns.clear()?;
    tree.delete("busy")?;
    assert!(!tree.contains("busy")?);

    let err = tree.delete("busy").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
    Ok(())
}

#[test]
fn namespaces_nest_recursively() -> TestResult {
    let tmp = TempDir::new()?;
    let root = Namespace::create(tmp.path().join("lab"))?;

    let inner = root.children().get_or_create("2026")?;
    let deepest = inner.children().get_or_create("aug")?;
    deepest.insert("readings", Value::Series(Series::from(vec![1_i64, 2, 3])))?;

    // Fresh views over the same directories observe the write.
    let reopened = Namespace::create(tmp.path().join("lab"))?
        .children()
        .open("2026")?
        .children()
        .open("aug")?;
    assert!(reopened.contains_key("readings")?);

    assert_eq!(root.children().keys()?.len(), 1);
    let names: Vec<String> = root.children().items()?.map(|(n, _)| n).collect();
    assert_eq!(names, vec!["2026".to_string()]);
    Ok(())
}

#[test]
fn foreign_files_and_directories_are_not_keys() -> TestResult {
    let (_tmp, ns) = scratch_namespace()?;
    ns.insert("real", Value::Object(json!(1)))?;
    std::fs::write(ns.root().join("README.txt"), b"not a leaf")?;
    std::fs::create_dir(ns.root().join("child"))?;

    let keys = ns.keys()?;
    assert_eq!(keys.len(), 1);
    assert!(keys.contains("real"));
    Ok(())
}
