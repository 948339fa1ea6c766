use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, header};
use htmlpolish::{
    AdvisoryMode, Advisor, AppState, BoxFuture, ImproveError, RecordStore, StoredRecord,
};

#[macro_export]
macro_rules! assert_responses {
    (
        $(
            $test_name:ident : response => $response:expr, result => $result:expr
        ),+ $(,)?
    ) => {
        $(
            #[tokio::test]
            async fn $test_name() {
                let advisor = StubAdvisor::answering($response);
                let store = StubStore::default();
                let context = htmlpolish::improve::ImproveContext {
                    advisor: &advisor,
                    store: &store,
                    prompt_template: None,
                };
                let result = htmlpolish::improve::improve_html(&context, "<p>\n hi\n</p>\n")
                    .await
                    .expect("Expected successful processing.");

                assert_that(&result).is_equal_to($result.to_owned());
                assert_that(&store.records().len()).is_equal_to(1_usize);
            }
        )+
    }
}

/// Advisor that records prompts and answers with a canned string or fails.
pub(crate) struct StubAdvisor {
    answer: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubAdvisor {
    pub fn answering(answer: &str) -> Self {
        StubAdvisor {
            answer: Some(answer.to_owned()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        StubAdvisor {
            answer: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts mutex poisoned").clone()
    }
}

impl Advisor for StubAdvisor {
    fn advise<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ImproveError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompts mutex poisoned")
            .push(prompt.to_owned());

        Box::pin(async move {
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(ImproveError::ModelFailed {
                    model: "stub".to_owned(),
                    stderr: "model crashed".to_owned(),
                }),
            }
        })
    }
}

/// Store that keeps records in memory, or rejects every insert.
#[derive(Default)]
pub(crate) struct StubStore {
    fail: bool,
    records: Mutex<Vec<StoredRecord>>,
}

impl StubStore {
    pub fn failing() -> Self {
        StubStore {
            fail: true,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }
}

impl RecordStore for StubStore {
    fn insert<'a>(&'a self, record: &'a StoredRecord) -> BoxFuture<'a, Result<(), ImproveError>> {
        Box::pin(async move {
            if self.fail {
                return Err(ImproveError::Persistence {
                    reason: "table unavailable".to_owned(),
                });
            }
            self.records
                .lock()
                .expect("records mutex poisoned")
                .push(record.clone());
            Ok(())
        })
    }
}

pub(crate) fn app_state(
    advisor: &Arc<StubAdvisor>,
    store: &Arc<StubStore>,
    advisory: AdvisoryMode,
) -> AppState {
    AppState {
        advisor: advisor.clone(),
        store: store.clone(),
        prompt_template: None,
        advisory,
    }
}

const BOUNDARY: &str = "htmlpolish-test-boundary";

/// Builds a multipart POST carrying one file part.
pub(crate) fn upload_request(
    uri: &str,
    field: &str,
    content_type: Option<&str>,
    content: &[u8],
) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"page.html\"\r\n"
    )
    .into_bytes();
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}
