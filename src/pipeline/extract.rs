//! Header and attachment extraction from message payloads

use crate::google::gmail::Message;

/// Sender and attachment descriptor pulled out of a message. Fields are
/// absent rather than an error when the message carries no attachment.
/// Derived, read-only, discarded after the invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageInfo {
    pub message_id: String,
    pub from: Option<String>,
    pub attachment_filename: Option<String>,
    pub attachment_id: Option<String>,
}

impl MessageInfo {
    /// Only messages with a real, named attachment are processed. Inline
    /// parts carry an attachment id with an empty filename and don't
    /// count.
    pub fn has_attachment(&self) -> bool {
        self.attachment_id.is_some()
            && self
                .attachment_filename
                .as_deref()
                .is_some_and(|filename| !filename.is_empty())
    }
}

/// Extract the sender and the first attachment descriptor from a
/// message. Both scans are first-match-wins: the first `From` header and
/// the first part whose body declares an attachment id. Messages with
/// multiple attachments only ever contribute their first one.
pub fn extract_message_info(message: &Message) -> MessageInfo {
    let mut from = None;
    let mut attachment_filename = None;
    let mut attachment_id = None;

    if let Some(payload) = &message.payload {
        if let Some(headers) = &payload.headers {
            from = headers
                .iter()
                .find(|header| header.name.eq_ignore_ascii_case("from"))
                .map(|header| header.value.clone());
        }

        if let Some(parts) = &payload.parts
            && let Some(part) = parts.iter().find(|part| {
                part.body
                    .as_ref()
                    .is_some_and(|body| body.attachment_id.is_some())
            })
        {
            attachment_filename = part.filename.clone();
            attachment_id = part
                .body
                .as_ref()
                .and_then(|body| body.attachment_id.clone());
        }
    }

    MessageInfo {
        message_id: message.id.clone(),
        from,
        attachment_filename,
        attachment_id,
    }
}

/// First Subject header value, used by the tag filter.
pub fn message_subject(message: &Message) -> Option<&str> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("subject"))
        .map(|header| header.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::gmail::{MessageHeader, MessagePart, MessagePartBody, MessagePayload};

    fn message(headers: Vec<MessageHeader>, parts: Vec<MessagePart>) -> Message {
        Message {
            id: "msg_001".to_string(),
            thread_id: "thr_001".to_string(),
            snippet: None,
            payload: Some(MessagePayload {
                headers: Some(headers),
                mimetype: Some("multipart/mixed".to_string()),
                body: None,
                parts: Some(parts),
            }),
            label_ids: None,
            internal_date: None,
        }
    }

    fn header(name: &str, value: &str) -> MessageHeader {
        MessageHeader {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn attachment_part(filename: &str, attachment_id: &str) -> MessagePart {
        MessagePart {
            part_id: None,
            mimetype: Some("image/png".to_string()),
            filename: Some(filename.to_string()),
            body: Some(MessagePartBody {
                attachment_id: Some(attachment_id.to_string()),
                size: Some(4),
                data: None,
            }),
        }
    }

    fn inline_part() -> MessagePart {
        MessagePart {
            part_id: None,
            mimetype: Some("text/plain".to_string()),
            filename: Some(String::new()),
            body: Some(MessagePartBody {
                attachment_id: None,
                size: Some(11),
                data: Some("SGVsbG8gV29ybGQ=".to_string()),
            }),
        }
    }

    #[test]
    fn test_extract_sender_and_attachment() {
        let message = message(
            vec![header("From", "a@x.com")],
            vec![attachment_part("f.png", "id1")],
        );
        let info = extract_message_info(&message);
        assert_eq!(info.from.as_deref(), Some("a@x.com"));
        assert_eq!(info.attachment_filename.as_deref(), Some("f.png"));
        assert_eq!(info.attachment_id.as_deref(), Some("id1"));
        assert!(info.has_attachment());
    }

    #[test]
    fn test_first_attachment_wins() {
        let message = message(
            vec![header("From", "a@x.com")],
            vec![
                inline_part(),
                attachment_part("first.png", "id1"),
                attachment_part("second.png", "id2"),
            ],
        );
        let info = extract_message_info(&message);
        assert_eq!(info.attachment_filename.as_deref(), Some("first.png"));
        assert_eq!(info.attachment_id.as_deref(), Some("id1"));
    }

    #[test]
    fn test_first_from_header_wins() {
        let message = message(
            vec![header("From", "first@x.com"), header("From", "second@x.com")],
            vec![],
        );
        let info = extract_message_info(&message);
        assert_eq!(info.from.as_deref(), Some("first@x.com"));
    }

    #[test]
    fn test_absent_fields_without_attachment() {
        let message = message(vec![header("From", "a@x.com")], vec![inline_part()]);
        let info = extract_message_info(&message);
        assert_eq!(info.attachment_filename, None);
        assert_eq!(info.attachment_id, None);
        assert!(!info.has_attachment());
    }

    #[test]
    fn test_empty_filename_does_not_count_as_attachment() {
        let message = message(
            vec![header("From", "a@x.com")],
            vec![attachment_part("", "id1")],
        );
        let info = extract_message_info(&message);
        assert!(!info.has_attachment());
    }

    #[test]
    fn test_empty_payload() {
        let message = Message {
            id: "msg_001".to_string(),
            thread_id: "thr_001".to_string(),
            snippet: None,
            payload: None,
            label_ids: None,
            internal_date: None,
        };
        let info = extract_message_info(&message);
        assert_eq!(info.message_id, "msg_001");
        assert_eq!(info.from, None);
        assert!(!info.has_attachment());
    }

    #[test]
    fn test_message_subject() {
        let with_subject = message(
            vec![
                header("From", "a@x.com"),
                header("Subject", "Re: [SUBMISSION] hw1"),
            ],
            vec![],
        );
        assert_eq!(message_subject(&with_subject), Some("Re: [SUBMISSION] hw1"));

        let without_subject = message(vec![header("From", "a@x.com")], vec![]);
        assert_eq!(message_subject(&without_subject), None);
    }
}
