use std::sync::Arc;

use sitewright_common::types::{SourceLocation, StyleChange};
use sitewright_engine::patch::apply::StyleUpdateInput;
use sitewright_engine::patch::{PatchError, Patcher};
use sitewright_engine::store::DiskStore;

const PAGE: &str = r#"export default function Page() {
  return (
    <article className="prose">
      <h2 className="section-title text-xl text-left">Pricing</h2>
      <p className="text-sm">Simple plans for every team</p>
    </article>
  );
}
"#;

fn disk_patcher(dir: &tempfile::TempDir) -> Patcher {
    std::fs::create_dir_all(dir.path().join("src/pages")).unwrap();
    std::fs::write(dir.path().join("src/pages/Pricing.tsx"), PAGE).unwrap();
    Patcher::new(Arc::new(DiskStore::new(dir.path())))
}

fn change(property: &str, old_value: &str, new_value: &str) -> StyleChange {
    StyleChange {
        property: property.to_string(),
        old_value: old_value.to_string(),
        new_value: new_value.to_string(),
    }
}

#[test]
fn sandbox_absolute_path_reaches_the_right_file() {
    let dir = tempfile::tempdir().unwrap();
    let patcher = disk_patcher(&dir);

    let input = StyleUpdateInput {
        selector: "sw-el-1".to_string(),
        source_location: Some(SourceLocation {
            file_path: "/workspace/inst-42/src/pages/Pricing.tsx".to_string(),
            line_number: 4,
            column_number: Some(7),
        }),
        changes: vec![change("textAlign", "left", "center")],
        ..Default::default()
    };

    let outcome = patcher.apply_style_update(&input).unwrap();
    assert_eq!(outcome.file_path, "src/pages/Pricing.tsx");

    let saved = std::fs::read_to_string(dir.path().join("src/pages/Pricing.tsx")).unwrap();
    assert!(saved.contains(r#"className="section-title text-xl text-center""#));
}

#[test]
fn edit_then_inverse_restores_the_file_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let patcher = disk_patcher(&dir);

    let forward = StyleUpdateInput {
        selector: "sw-el-1".to_string(),
        file_path: Some("src/pages/Pricing.tsx".to_string()),
        source_location: Some(SourceLocation {
            file_path: "src/pages/Pricing.tsx".to_string(),
            line_number: 4,
            column_number: None,
        }),
        changes: vec![
            change("fontSize", "20px", "36px"),
            change("textAlign", "left", "center"),
        ],
        ..Default::default()
    };
    patcher.apply_style_update(&forward).unwrap();

    let inverse = StyleUpdateInput {
        changes: forward.changes.iter().map(StyleChange::inverse).collect(),
        ..forward
    };
    patcher.apply_style_update(&inverse).unwrap();

    let restored = std::fs::read_to_string(dir.path().join("src/pages/Pricing.tsx")).unwrap();
    assert_eq!(restored, PAGE);
}

#[test]
fn traversal_path_never_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let patcher = disk_patcher(&dir);

    let input = StyleUpdateInput {
        selector: "sw-el-1".to_string(),
        file_path: Some("/app/../../../etc/passwd".to_string()),
        changes: vec![change("color", "#000000", "#ffffff")],
        ..Default::default()
    };

    assert!(matches!(patcher.apply_style_update(&input), Err(PatchError::FileNotFound(_))));
}
