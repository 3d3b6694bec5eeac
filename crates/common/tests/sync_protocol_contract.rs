use sitewright_common::protocol::sync::{SyncRequest, SyncResponse};
use uuid::Uuid;

fn load_contract() -> serde_json::Value {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts/sync-protocol.json");
    let content = std::fs::read_to_string(path).expect("contract file should be readable");
    serde_json::from_str(&content).expect("contract file should be valid JSON")
}

fn tag_of<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value).expect("message should serialize")["type"]
        .as_str()
        .expect("type tag should be a string")
        .to_string()
}

#[test]
fn request_tags_match_contract() {
    let contract = load_contract();
    let expected: Vec<&str> = contract["requests"]
        .as_array()
        .expect("requests should be an array")
        .iter()
        .map(|v| v.as_str().expect("tag should be a string"))
        .collect();

    let requests = [
        tag_of(&SyncRequest::StyleUpdate {
            selector: "sw-el-1".to_string(),
            file_path: None,
            text_content: None,
            changes: Vec::new(),
            skip_deploy: false,
            source_location: None,
            class_name: None,
        }),
        tag_of(&SyncRequest::TextUpdate {
            selector: "sw-el-1".to_string(),
            old_text: "a".to_string(),
            new_text: "b".to_string(),
            file_path: None,
            skip_deploy: false,
            source_location: None,
        }),
        tag_of(&SyncRequest::ImageUpload {
            upload_id: Uuid::nil(),
            chunk: String::new(),
            chunk_index: 0,
            total_chunks: 1,
            file_name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            file_size: 0,
            is_background: false,
            element_context: None,
        }),
    ];

    assert_eq!(requests.as_slice(), expected.as_slice());
}

#[test]
fn response_tags_match_contract() {
    let contract = load_contract();
    let expected: Vec<&str> = contract["responses"]
        .as_array()
        .expect("responses should be an array")
        .iter()
        .map(|v| v.as_str().expect("tag should be a string"))
        .collect();

    let responses = [
        tag_of(&SyncResponse::StyleUpdated {
            success: true,
            selector: "sw-el-1".to_string(),
            file_path: None,
            results: Vec::new(),
            error: None,
        }),
        tag_of(&SyncResponse::TextUpdated {
            success: true,
            selector: "sw-el-1".to_string(),
            file_path: None,
            error: None,
        }),
        tag_of(&SyncResponse::UploadProgress {
            upload_id: Uuid::nil(),
            received_chunks: 0,
            total_chunks: 1,
        }),
        tag_of(&SyncResponse::ImageUploaded {
            success: true,
            upload_id: Uuid::nil(),
            image_path: None,
            requires_manual_update: false,
            error: None,
        }),
    ];

    assert_eq!(responses.as_slice(), expected.as_slice());
}
