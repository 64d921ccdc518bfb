//! JSON parsing of `commentThreads.list` responses.

use crate::error::CommentsError;
use crate::models::CommentRecord;
use crate::sanitizer::strip_html;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parses a YouTube RFC 3339 datetime string into a DateTime<Utc>.
///
/// Handles formats like "2024-01-30T23:06:02Z" and "2024-01-30T23:06:02.123Z"
pub fn parse_datetime(dt_str: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(dt_str).map(|dt| dt.with_timezone(&Utc))
}

/// Parses a single `comment` resource into a CommentRecord.
///
/// `parent_id` is the id of the top-level comment when `comment_data` is a
/// reply. Returns None when a required field is missing or malformed.
pub fn parse_comment(comment_data: &Value, parent_id: Option<&str>) -> Option<CommentRecord> {
    let comment_id = comment_data.get("id")?.as_str()?.to_string();
    let snippet = comment_data.get("snippet")?;

    let author = snippet.get("authorDisplayName")?.as_str()?.to_string();

    let raw_text = snippet.get("textDisplay")?.as_str()?;
    let text = strip_html(raw_text).into_owned();

    let published_at = parse_datetime(snippet.get("publishedAt")?.as_str()?).ok()?;

    // Unedited comments carry updatedAt == publishedAt, but be lenient
    let updated_at = snippet
        .get("updatedAt")
        .and_then(|v| v.as_str())
        .and_then(|s| parse_datetime(s).ok())
        .unwrap_or(published_at);

    let video_id = snippet
        .get("videoId")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let author_channel_id = snippet
        .get("authorChannelId")
        .and_then(|c| c.get("value"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let author_channel_url = snippet
        .get("authorChannelUrl")
        .and_then(|v| v.as_str())
        .map(String::from);

    let author_profile_image_url = snippet
        .get("authorProfileImageUrl")
        .and_then(|v| v.as_str())
        .map(String::from);

    let channel_id = snippet
        .get("channelId")
        .and_then(|v| v.as_str())
        .map(String::from);

    let like_count = snippet
        .get("likeCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    // Replies name their parent in the snippet; fall back to the thread's id
    let parent_id = snippet
        .get("parentId")
        .and_then(|v| v.as_str())
        .or(parent_id)
        .map(String::from);

    Some(CommentRecord {
        comment_id,
        parent_id,
        video_id,
        author,
        author_channel_id,
        author_channel_url,
        author_profile_image_url,
        channel_id,
        text,
        like_count,
        published_at,
        updated_at,
        sentiment: None,
    })
}

/// Parses one `commentThread` resource into its top-level comment followed by
/// the replies embedded in the thread.
pub fn parse_comment_thread(thread_data: &Value, include_replies: bool) -> Vec<CommentRecord> {
    let mut comments = Vec::new();

    let top_level = thread_data
        .get("snippet")
        .and_then(|s| s.get("topLevelComment"));

    let top_level_id = top_level
        .and_then(|c| c.get("id"))
        .and_then(|v| v.as_str());

    if let Some(comment) = top_level.and_then(|c| parse_comment(c, None)) {
        comments.push(comment);
    }

    if !include_replies {
        return comments;
    }

    let replies = thread_data
        .get("replies")
        .and_then(|r| r.get("comments"))
        .and_then(|c| c.as_array());

    if let Some(replies) = replies {
        comments.extend(
            replies
                .iter()
                .filter_map(|reply| parse_comment(reply, top_level_id)),
        );
    }

    comments
}

/// Parses every thread in a `commentThreads.list` response page, in order.
///
/// A page without an `items` array is not a listing response at all and is
/// rejected; malformed threads inside `items` are skipped.
pub fn parse_comment_threads(
    page: &Value,
    include_replies: bool,
) -> Result<Vec<CommentRecord>, CommentsError> {
    let items = page
        .get("items")
        .and_then(|items| items.as_array())
        .ok_or_else(|| {
            CommentsError::UpstreamRequest("response has no items array".to_string())
        })?;

    Ok(items
        .iter()
        .flat_map(|thread| parse_comment_thread(thread, include_replies))
        .collect())
}

/// Returns the continuation token of a response page, if there is another page.
pub fn next_page_token(page: &Value) -> Option<String> {
    page.get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// Extracts `error.message` from a Google API error body.
pub fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}

/// Extracts the first `error.errors[].reason` from a Google API error body.
pub fn api_error_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("reason").and_then(|r| r.as_str()))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn comment_json(id: &str, author: &str, text: &str) -> Value {
        json!({
            "kind": "youtube#comment",
            "id": id,
            "snippet": {
                "channelId": "UCchannel",
                "videoId": "XTjtPc0uiG8",
                "textDisplay": text,
                "textOriginal": text,
                "authorDisplayName": author,
                "authorProfileImageUrl": "https://yt3.ggpht.com/a",
                "authorChannelUrl": format!("http://www.youtube.com/{author}"),
                "authorChannelId": { "value": format!("UC{id}") },
                "canRate": true,
                "viewerRating": "none",
                "likeCount": 7,
                "publishedAt": "2024-01-15T10:30:00Z",
                "updatedAt": "2024-01-16T08:00:00Z"
            }
        })
    }

    fn thread_json(top: Value, replies: Vec<Value>) -> Value {
        let id = top["id"].clone();
        let mut thread = json!({
            "kind": "youtube#commentThread",
            "id": id,
            "snippet": {
                "videoId": "XTjtPc0uiG8",
                "topLevelComment": top,
                "canReply": true,
                "totalReplyCount": replies.len(),
                "isPublic": true
            }
        });
        if !replies.is_empty() {
            thread["replies"] = json!({ "comments": replies });
        }
        thread
    }

    #[test]
    fn test_parse_datetime_with_fraction() {
        let dt = parse_datetime("2024-01-30T23:06:02.123Z").unwrap();
        assert_eq!(dt.timestamp(), 1706655962);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_comment_fields() {
        let data = comment_json("Ugz1", "@alice", "Nice<br>video");
        let comment = parse_comment(&data, None).unwrap();

        assert_eq!(comment.comment_id, "Ugz1");
        assert_eq!(comment.parent_id, None);
        assert_eq!(comment.video_id, "XTjtPc0uiG8");
        assert_eq!(comment.author, "@alice");
        assert_eq!(comment.author_channel_id.as_deref(), Some("UCUgz1"));
        assert_eq!(
            comment.author_channel_url.as_deref(),
            Some("http://www.youtube.com/@alice")
        );
        assert_eq!(
            comment.author_profile_image_url.as_deref(),
            Some("https://yt3.ggpht.com/a")
        );
        assert_eq!(comment.channel_id.as_deref(), Some("UCchannel"));
        assert_eq!(comment.text, "Nice\nvideo");
        assert_eq!(comment.like_count, 7);
        assert_eq!(
            comment.published_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            comment.updated_at,
            Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap()
        );
        assert!(comment.sentiment.is_none());
    }

    #[test]
    fn test_parse_comment_missing_author() {
        let mut data = comment_json("Ugz1", "@alice", "hi");
        data["snippet"]
            .as_object_mut()
            .unwrap()
            .remove("authorDisplayName");
        assert!(parse_comment(&data, None).is_none());
    }

    #[test]
    fn test_parse_comment_optional_fields_absent() {
        let mut data = comment_json("Ugz1", "@alice", "hi");
        let snippet = data["snippet"].as_object_mut().unwrap();
        snippet.remove("channelId");
        snippet.remove("authorProfileImageUrl");
        let comment = parse_comment(&data, None).unwrap();
        assert_eq!(comment.channel_id, None);
        assert_eq!(comment.author_profile_image_url, None);
    }

    #[test]
    fn test_parse_comment_bad_timestamp() {
        let mut data = comment_json("Ugz1", "@alice", "hi");
        data["snippet"]["publishedAt"] = json!("not a date");
        assert!(parse_comment(&data, None).is_none());
    }

    #[test]
    fn test_parse_comment_defaults_optional_fields() {
        let data = json!({
            "id": "Ugz9",
            "snippet": {
                "authorDisplayName": "@bob",
                "textDisplay": "hi",
                "publishedAt": "2024-01-15T10:30:00Z"
            }
        });
        let comment = parse_comment(&data, Some("Ugz0")).unwrap();
        assert_eq!(comment.like_count, 0);
        assert_eq!(comment.updated_at, comment.published_at);
        assert_eq!(comment.author_channel_id, None);
        assert_eq!(comment.parent_id.as_deref(), Some("Ugz0"));
    }

    #[test]
    fn test_parse_reply_uses_snippet_parent_id() {
        let mut reply = comment_json("Ugz1.r1", "@carol", "agreed");
        reply["snippet"]["parentId"] = json!("Ugz1");
        let comment = parse_comment(&reply, Some("ignored")).unwrap();
        assert_eq!(comment.parent_id.as_deref(), Some("Ugz1"));
    }

    #[test]
    fn test_parse_thread_top_level_then_replies() {
        let thread = thread_json(
            comment_json("Ugz1", "@alice", "first"),
            vec![
                comment_json("Ugz1.r1", "@bob", "reply one"),
                comment_json("Ugz1.r2", "@carol", "reply two"),
            ],
        );

        let comments = parse_comment_thread(&thread, true);
        let ids: Vec<&str> = comments.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["Ugz1", "Ugz1.r1", "Ugz1.r2"]);
        assert!(!comments[0].is_reply());
        assert_eq!(comments[1].parent_id.as_deref(), Some("Ugz1"));
        assert_eq!(comments[2].parent_id.as_deref(), Some("Ugz1"));
    }

    #[test]
    fn test_parse_thread_top_level_only() {
        let thread = thread_json(
            comment_json("Ugz1", "@alice", "first"),
            vec![comment_json("Ugz1.r1", "@bob", "reply one")],
        );

        let comments = parse_comment_thread(&thread, false);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_id, "Ugz1");
    }

    #[test]
    fn test_parse_comment_threads_preserves_order() {
        let page = json!({
            "items": [
                thread_json(comment_json("a", "@a", "1"), vec![]),
                thread_json(comment_json("b", "@b", "2"), vec![comment_json("b.1", "@c", "3")]),
                thread_json(comment_json("c", "@d", "4"), vec![]),
            ]
        });

        let comments = parse_comment_threads(&page, true).unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_parse_comment_threads_skips_malformed() {
        let page = json!({
            "items": [
                { "id": "broken", "snippet": {} },
                thread_json(comment_json("ok", "@a", "fine"), vec![]),
            ]
        });
        let comments = parse_comment_threads(&page, true).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_id, "ok");
    }

    #[test]
    fn test_parse_comment_threads_empty_items() {
        let comments = parse_comment_threads(&json!({ "items": [] }), true).unwrap();
        assert!(comments.is_empty());
    }

    #[test]
    fn test_parse_comment_threads_missing_items() {
        for page in [
            json!({}),
            json!({ "kind": "youtube#something", "unexpected": true }),
            json!({ "items": { "id": "not-a-list" } }),
        ] {
            let err = parse_comment_threads(&page, true).unwrap_err();
            assert_eq!(
                err,
                CommentsError::UpstreamRequest("response has no items array".to_string())
            );
        }
    }

    #[test]
    fn test_next_page_token() {
        assert_eq!(
            next_page_token(&json!({ "nextPageToken": "QURTSl9p" })),
            Some("QURTSl9p".to_string())
        );
        assert_eq!(next_page_token(&json!({ "items": [] })), None);
        assert_eq!(next_page_token(&json!({ "nextPageToken": "" })), None);
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 404, "message": "The video identified by the <code><a href=\"/youtube/v3/docs/commentThreads/list#videoId\">videoId</a></code> parameter could not be found."}}"#;
        let message = api_error_message(body).unwrap();
        assert!(message.contains("could not be found"));

        assert_eq!(api_error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_api_error_reason() {
        let body = r#"{"error": {"code": 403, "message": "disabled", "errors": [{"message": "disabled", "domain": "youtube.commentThread", "reason": "commentsDisabled"}]}}"#;
        assert_eq!(api_error_reason(body).as_deref(), Some("commentsDisabled"));
        assert_eq!(api_error_reason(r#"{"error": {"code": 401}}"#), None);
    }
}
