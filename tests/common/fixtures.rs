//! Thread listings and media bodies served by the mock board

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One attachment in a fixture thread
pub struct FixtureMedia {
    /// Attachment identity
    pub tim: u64,
    /// Extension including the dot
    pub ext: &'static str,
}

impl FixtureMedia {
    /// Body served for the full resource
    pub fn body(&self) -> Vec<u8> {
        format!("full-{}{}", self.tim, self.ext).into_bytes()
    }

    /// Body served for the thumbnail
    pub fn thumb(&self) -> Vec<u8> {
        format!("thumb-{}", self.tim).into_bytes()
    }
}

/// Media attached to the fixture thread, including one duplicated post
pub const THREAD_MEDIA: &[FixtureMedia] = &[
    FixtureMedia { tim: 111, ext: ".jpg" },
    FixtureMedia { tim: 111, ext: ".jpg" },
    FixtureMedia { tim: 222, ext: ".webm" },
    FixtureMedia { tim: 333, ext: ".png" },
    FixtureMedia { tim: 444, ext: ".gif" },
];

/// Listing document for `media`, with a text-only opening post
pub fn thread_document(media: &[FixtureMedia]) -> serde_json::Value {
    let mut posts = vec![serde_json::json!({"no": 1, "com": "opening post"})];
    posts.extend(media.iter().enumerate().map(|(i, m)| {
        serde_json::json!({
            "no": i + 2,
            "tim": m.tim,
            "ext": m.ext,
            "filename": format!("upload{}", i),
            "fsize": m.body().len(),
        })
    }));
    serde_json::json!({ "posts": posts })
}

/// Mount the listing, thumbnails and full resources of one thread
pub async fn mount_thread(server: &MockServer, board: &str, thread_id: &str, media: &[FixtureMedia]) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/thread/{}.json", board, thread_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_document(media)))
        .mount(server)
        .await;

    for m in media {
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}s.jpg", board, m.tim)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(m.thumb()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}{}", board, m.tim, m.ext)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(m.body()))
            .mount(server)
            .await;
    }
}

/// Number of requests the server received whose path ends with `suffix`
pub async fn requests_ending_with(server: &MockServer, suffix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().ends_with(suffix))
        .count()
}
