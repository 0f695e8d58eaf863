//! Test doubles for crawling without a network or a real clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hubsize_registry::{FetchError, PageSource, Sleeper, TagPage};

/// Bytes in one GB (1024^3).
pub const GB: u64 = 1 << 30;

/// Sleeper that records requested durations and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Page source answering from a per-page script.
///
/// Each page number holds a queue of responses consumed one per request;
/// the last response repeats once the queue is down to it. Unscripted pages
/// answer HTTP 404.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<HashMap<u32, VecDeque<Scripted>>>,
    requests: Mutex<Vec<(u32, u32)>>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Page(TagPage),
    Status(u16),
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `page` with the given body.
    pub fn page(self, page: u32, body: TagPage) -> Self {
        self.push(page, Scripted::Page(body))
    }

    /// Answer `page` with an HTTP error status.
    pub fn status(self, page: u32, status: u16) -> Self {
        self.push(page, Scripted::Status(status))
    }

    /// Answer `page` with `count` consecutive HTTP 503s.
    pub fn failing(mut self, page: u32, count: usize) -> Self {
        for _ in 0..count {
            self = self.status(page, 503);
        }
        self
    }

    /// `(page, page_size)` of every request made so far.
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }

    /// Page numbers requested so far.
    pub fn pages_requested(&self) -> Vec<u32> {
        self.requests().into_iter().map(|(page, _)| page).collect()
    }

    fn push(self, page: u32, response: Scripted) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(response);
        self
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn get_page(&self, page: u32, page_size: u32) -> Result<TagPage, FetchError> {
        self.requests.lock().unwrap().push((page, page_size));

        let mut script = self.script.lock().unwrap();
        let Some(queue) = script.get_mut(&page) else {
            return Err(FetchError::Status { status: 404 });
        };

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match response {
            Some(Scripted::Page(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(FetchError::Status { status }),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// JSON for one tag record with a declared size.
pub fn tag_json(name: &str, full_size: u64) -> serde_json::Value {
    serde_json::json!({ "name": name, "full_size": full_size })
}

/// JSON for one tag record sized only through its images.
pub fn layered_tag_json(name: &str, image_sizes: &[u64]) -> serde_json::Value {
    let images: Vec<_> = image_sizes
        .iter()
        .map(|size| serde_json::json!({ "size": size }))
        .collect();
    serde_json::json!({ "name": name, "full_size": 0, "images": images })
}

/// JSON for a listing page. `next` is a URL when `has_next` and null otherwise.
pub fn page_json(records: Vec<serde_json::Value>, has_next: bool) -> serde_json::Value {
    let next = if has_next {
        serde_json::json!("https://registry.test/tags?page=next")
    } else {
        serde_json::Value::Null
    };
    serde_json::json!({ "count": records.len(), "results": records, "next": next })
}

/// A parsed listing page.
pub fn page(records: Vec<serde_json::Value>, has_next: bool) -> TagPage {
    serde_json::from_value(page_json(records, has_next)).expect("test page is valid")
}
