use mnemo_message::{
    collect_remote_references, Content, ContentPart, FlatMessage, MessageConverter, MessageRole,
    PartKind, WireMessage,
};
use serde_json::json;

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_single_text_part_as_text() {
    let content: Content = vec![ContentPart::text("only")].into();
    assert_eq!(content.as_text(), Some("only"));
}

#[test]
fn test_role_serialization() {
    assert_eq!(serde_json::to_value(MessageRole::Assistant).unwrap(), json!("assistant"));
    assert_eq!(MessageRole::Tool.as_str(), "tool");
}

#[test]
fn test_flat_message_deserialization_with_parts() {
    let json = json!({
        "id": "m1",
        "threadId": "t1",
        "role": "user",
        "content": [
            {"type": "text", "text": "see attached"},
            {"type": "image", "data": "https://example.com/a.png"},
            {"type": "file", "data": "aGVsbG8=", "mediaType": "text/plain", "filename": "a.txt"}
        ]
    });

    let message: FlatMessage = serde_json::from_value(json).unwrap();
    let Content::Parts(parts) = &message.content else {
        panic!("Expected parts");
    };
    assert_eq!(parts.len(), 3);
    assert!(parts[1].data().unwrap().is_remote());
    assert_eq!(parts[2].media_type(), Some("text/plain"));
}

#[test]
fn test_wire_message_serializes_in_own_format() {
    let flat = WireMessage::from(FlatMessage::user("t1", "plain"));
    let json = serde_json::to_value(&flat).unwrap();

    assert_eq!(json["content"], json!("plain"));
    assert_eq!(json["threadId"], json!("t1"));
    assert_eq!(flat.role(), MessageRole::User);
}

#[test]
fn test_collect_remote_references() {
    let converter = MessageConverter::new();
    let message = converter
        .to_structured(&FlatMessage::user(
            "t1",
            vec![
                ContentPart::text("two links"),
                ContentPart::image("https://example.com/a.png"),
                ContentPart::file("https://example.com/b.pdf", "application/pdf"),
                ContentPart::image(vec![0xFF, 0xD8, 0xFF, 0xE0]),
            ],
        ))
        .unwrap();

    let references = collect_remote_references(&[message]);

    assert_eq!(references.len(), 2);
    assert_eq!(references[0].media_type, "image/*");
    assert_eq!(references[0].kind, PartKind::Image);
    assert_eq!(references[1].url.as_str(), "https://example.com/b.pdf");
    assert_eq!(references[1].media_type, "application/pdf");
}
