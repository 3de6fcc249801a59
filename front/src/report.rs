use {
    crate::{
        component::{push_notification, Notification},
        dataset::FileSummary,
        error::UploadError,
        transport::UploadResponse,
    },
    gloo::console::{error, log},
    std::{cell::RefCell, collections::HashMap},
};

/// What left with a dispatched upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<'a> {
    pub url: &'a str,
    pub files: usize,
    pub bytes: u64,
}

/// Side channel the relay reports through. Nothing is returned to the relay.
pub trait Reporter {
    /// Files collected from the form, one list per input. Only called when
    /// at least one file input matched.
    fn collected(&self, task: u32, files: &[Vec<FileSummary>]);

    fn dispatched(&self, _task: u32, _dispatch: &Dispatch<'_>) {}

    /// The upload was reported as dispatched but could not be started.
    fn discarded(&self, _task: u32) {}

    fn succeeded(&self, task: u32, response: &UploadResponse);

    fn failed(&self, task: u32, error: &UploadError);

    fn cancelled(&self, _task: u32) {}
}

struct Started {
    at_ms: f64,
    files: usize,
    bytes: u64,
}

/// Logs to the browser console, and to the notification block when it is
/// mounted.
pub struct ConsoleReporter {
    notification_timeout_s: f64,
    started: RefCell<HashMap<u32, Started>>,
}

impl ConsoleReporter {
    pub fn new(notification_timeout_s: f64) -> Self {
        Self {
            notification_timeout_s,
            started: RefCell::new(HashMap::new()),
        }
    }

    fn take_started(&self, task: u32) -> Option<Started> {
        self.started.borrow_mut().remove(&task)
    }
}

impl Reporter for ConsoleReporter {
    fn collected(&self, task: u32, files: &[Vec<FileSummary>]) {
        match serde_json::to_string(files) {
            Ok(json) => log!(format!("[{task}] Collected dataset: {json}")),
            Err(e) => error!(format!("[{task}] Could not serialize the dataset summary: {e}")),
        }
    }

    fn dispatched(&self, task: u32, dispatch: &Dispatch<'_>) {
        self.started.borrow_mut().insert(
            task,
            Started {
                at_ms: js_sys::Date::now(),
                files: dispatch.files,
                bytes: dispatch.bytes,
            },
        );
    }

    fn succeeded(&self, task: u32, response: &UploadResponse) {
        let started = self.take_started(task);

        let elapsed = started
            .as_ref()
            .map(|started| elapsed_since(started.at_ms))
            .unwrap_or_default();

        log!(format!(
            "[{task}] Success: data upload ({} {}) in {}",
            response.status,
            response.status_text,
            time::format(elapsed, 2)
        ));

        let detail = started
            .map(|started| {
                format!(
                    "{} file(s), {}",
                    started.files,
                    mem::format(started.bytes, &mem::Prefix::Binary)
                )
            })
            .unwrap_or_default();

        push_notification(Notification::info(
            "Dataset uploaded",
            vec![detail.as_str()],
            self.notification_timeout_s,
        ));
    }

    fn failed(&self, task: u32, upload_error: &UploadError) {
        self.take_started(task);

        error!(format!("[{task}] Fail: data upload, {upload_error}"));

        let reason = upload_error.to_string();
        push_notification(Notification::error(
            "Dataset upload failed",
            vec![reason.as_str()],
            self.notification_timeout_s,
        ));
    }

    fn discarded(&self, task: u32) {
        self.take_started(task);

        error!(format!("[{task}] Discarded: data upload could not be started"));
    }

    fn cancelled(&self, task: u32) {
        self.take_started(task);

        log!(format!("[{task}] Cancelled: data upload"));
    }
}

fn elapsed_since(start_ms: f64) -> std::time::Duration {
    let elapsed_ms = js_sys::Date::now() - start_ms;
    std::time::Duration::from_secs_f64(elapsed_ms.max(0.) / 1000.)
}
