//! Form submission interception.
//!
//! On submit the relay collects the files selected in the dataset inputs of
//! the form and POSTs them, as one multipart part per file under the dataset
//! field name, to the configured endpoint. The browser's own submission is
//! always prevented.
//!
//! The collected files are the request body. A form without dataset inputs
//! still triggers the request, with an empty body.

use {
    crate::{
        config::RelayConfig,
        dataset::{Describe, SelectedFileSet},
        dom::{FormScope, Submission},
        error::{RelayError, UploadError},
        report::{Dispatch, Reporter},
        task::{TaskState, UploadTask},
        transport::{Transport, UploadRequest},
    },
    futures::{
        future::{AbortHandle, Abortable},
        task::{LocalSpawn, LocalSpawnExt as _},
    },
    std::{cell::RefCell, rc::Rc},
};

pub struct FormUploadRelay<T, S, R> {
    config: RelayConfig,
    transport: T,
    spawner: S,
    reporter: Rc<R>,
    tasks: RefCell<Vec<UploadTask>>,
}

impl<T, S, R> FormUploadRelay<T, S, R>
where
    T: Transport,
    T::File: Describe + 'static,
    S: LocalSpawn,
    R: Reporter + 'static,
{
    pub fn new(config: RelayConfig, transport: T, spawner: S, reporter: R) -> Self {
        Self {
            config,
            transport,
            spawner,
            reporter: Rc::new(reporter),
            tasks: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Intercepts one submission and dispatches its upload.
    ///
    /// The upload is sent even when the form has no dataset file input.
    pub fn handle<E>(&self, event: &E) -> Result<UploadTask, RelayError>
    where
        E: Submission,
        E::Form: FormScope<File = T::File>,
    {
        event.prevent_default();

        let Some(form) = event.form() else {
            return Err(RelayError::NoForm);
        };

        let dataset = SelectedFileSet::collect(form.inputs_named(&self.config.field));

        let (abort, registration) = AbortHandle::new_pair();
        let (task, completion) = UploadTask::new(abort);
        let id = task.id();

        if !dataset.is_empty() {
            self.reporter.collected(id, &dataset.summaries());
        }

        let files = dataset.file_count();
        let bytes = dataset.files().map(|file| file.summary().size).sum();

        let request = UploadRequest::post(&self.config.endpoint, &self.config.field, dataset);
        let upload = Abortable::new(self.transport.post(request), registration);

        // Reported before spawning, a spawner may poll the upload inline
        self.reporter.dispatched(
            id,
            &Dispatch {
                url: &self.config.endpoint,
                files,
                bytes,
            },
        );

        let reporter = self.reporter.clone();
        let spawned = self.spawner.spawn_local(async move {
            let Ok(result) = upload.await else {
                completion.cancelled();
                reporter.cancelled(id);
                return;
            };

            let outcome = match result {
                Ok(response) if response.is_success() => TaskState::Succeeded(response),
                Ok(response) => TaskState::Failed(UploadError::Status {
                    status: response.status,
                    status_text: response.status_text,
                }),
                Err(e) => TaskState::Failed(UploadError::Transport(e)),
            };

            let report = outcome.clone();
            if !completion.finish(outcome) {
                reporter.cancelled(id);
                return;
            }

            match report {
                TaskState::Succeeded(response) => reporter.succeeded(id, &response),
                TaskState::Failed(e) => reporter.failed(id, &e),
                TaskState::Pending | TaskState::Cancelled => (),
            }
        });

        if let Err(e) = spawned {
            self.reporter.discarded(id);
            return Err(e.into());
        }

        let mut tasks = self.tasks.borrow_mut();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task.clone());

        Ok(task)
    }

    /// Uploads dispatched by this relay that have not finished yet.
    pub fn in_flight(&self) -> Vec<UploadTask> {
        self.tasks
            .borrow()
            .iter()
            .filter(|task| !task.is_finished())
            .cloned()
            .collect()
    }

    /// Returns how many uploads were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut tasks = self.tasks.borrow_mut();
        let cancelled = tasks.iter().filter(|task| task.cancel()).count();
        tasks.clear();
        cancelled
    }
}

/// Submit listeners attached by [`bind`], removed when dropped.
pub struct Bindings {
    listeners: Vec<gloo::events::EventListener>,
}

impl Bindings {
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Attaches the relay to every form of `document` matching the configured
/// selector. Forms added afterwards are not watched.
pub fn bind<T, S, R>(
    document: &web_sys::Document,
    relay: Rc<FormUploadRelay<T, S, R>>,
) -> Result<Bindings, RelayError>
where
    T: Transport<File = web_sys::File> + 'static,
    S: LocalSpawn + 'static,
    R: Reporter + 'static,
{
    use gloo::events::{EventListener, EventListenerOptions};

    let forms = crate::dom::forms(document, &relay.config().form_selector)?;

    let listeners = forms
        .iter()
        .map(|form| {
            let relay = relay.clone();
            EventListener::new_with_options(
                form,
                "submit",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    if let Err(e) = relay.handle(event) {
                        gloo::console::error!(format!("Could not relay the submission: {e}"));
                    }
                },
            )
        })
        .collect::<Vec<_>>();

    gloo::console::log!(format!(
        "Relaying {} form(s) to {}",
        listeners.len(),
        relay.config().endpoint
    ));

    Ok(Bindings { listeners })
}

#[cfg(test)]
mod tests {
    use {
        super::FormUploadRelay,
        crate::{
            config::RelayConfig,
            dataset::{Describe, FileSummary, InputSnapshot},
            dom::{FormScope, Submission},
            error::{RelayError, TransportError, UploadError},
            report::{Dispatch, Reporter},
            task::TaskState,
            transport::{Transport, UploadRequest, UploadResponse},
        },
        futures::{
            executor::{block_on, LocalPool, LocalSpawner},
            future::{self, FutureExt as _, LocalBoxFuture},
            task::{LocalFutureObj, LocalSpawn, SpawnError},
        },
        std::{
            cell::{Cell, RefCell},
            collections::VecDeque,
            rc::Rc,
        },
    };

    const FIELD: &str = "svm_dataset[]";
    const ENDPOINT: &str = "../../php/dataset.php";

    #[derive(Debug, Clone, PartialEq)]
    struct MockFile(&'static str);

    impl Describe for MockFile {
        fn summary(&self) -> FileSummary {
            FileSummary {
                name: self.0.to_string(),
                size: self.0.len() as u64,
                mime: String::from("application/xml"),
            }
        }
    }

    #[derive(Clone, Default)]
    struct MockForm {
        inputs: Vec<(&'static str, InputSnapshot<MockFile>)>,
    }

    impl MockForm {
        fn with(mut self, name: &'static str, input: InputSnapshot<MockFile>) -> Self {
            self.inputs.push((name, input));
            self
        }

        fn with_files(self, files: &[&'static str]) -> Self {
            self.with(
                FIELD,
                InputSnapshot::file(files.iter().copied().map(MockFile).collect()),
            )
        }
    }

    impl FormScope for MockForm {
        type File = MockFile;

        fn inputs_named(&self, name: &str) -> Vec<InputSnapshot<MockFile>> {
            self.inputs
                .iter()
                .filter(|(input_name, _)| *input_name == name)
                .map(|(_, input)| input.clone())
                .collect()
        }
    }

    struct MockEvent {
        form: Option<MockForm>,
        prevented: Cell<u32>,
    }

    impl MockEvent {
        fn new(form: Option<MockForm>) -> Self {
            Self {
                form,
                prevented: Cell::new(0),
            }
        }
    }

    impl Submission for MockEvent {
        type Form = MockForm;

        fn prevent_default(&self) {
            self.prevented.set(self.prevented.get() + 1);
        }

        fn form(&self) -> Option<MockForm> {
            self.form.clone()
        }
    }

    /// Answers requests from a queue, never answers once it is empty.
    #[derive(Default)]
    struct MockTransport {
        requests: RefCell<Vec<UploadRequest<MockFile>>>,
        answers: RefCell<VecDeque<Result<UploadResponse, TransportError>>>,
        dropped: Rc<Cell<u32>>,
    }

    impl MockTransport {
        fn answering(answers: Vec<Result<UploadResponse, TransportError>>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                ..Self::default()
            }
        }
    }

    struct DropCounter(Rc<Cell<u32>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    impl Transport for MockTransport {
        type File = MockFile;

        fn post(
            &self,
            request: UploadRequest<MockFile>,
        ) -> LocalBoxFuture<'static, Result<UploadResponse, TransportError>> {
            self.requests.borrow_mut().push(request);
            let answer = self.answers.borrow_mut().pop_front();
            let counter = DropCounter(self.dropped.clone());

            async move {
                let _counter = counter;
                match answer {
                    Some(answer) => answer,
                    None => future::pending().await,
                }
            }
            .boxed_local()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Reported {
        Collected(u32, Vec<usize>),
        Dispatched(u32, usize, u64),
        Succeeded(u32, u16),
        Failed(u32, UploadError),
        Cancelled(u32),
        Discarded(u32),
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: RefCell<Vec<Reported>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<Reported> {
            self.events.borrow().clone()
        }

        fn count(&self, pred: impl Fn(&Reported) -> bool) -> usize {
            self.events.borrow().iter().filter(|event| pred(event)).count()
        }
    }

    impl Reporter for RecordingReporter {
        fn collected(&self, task: u32, files: &[Vec<FileSummary>]) {
            self.events.borrow_mut().push(Reported::Collected(
                task,
                files.iter().map(Vec::len).collect(),
            ));
        }

        fn dispatched(&self, task: u32, dispatch: &Dispatch<'_>) {
            assert_eq!(dispatch.url, ENDPOINT);
            self.events.borrow_mut().push(Reported::Dispatched(
                task,
                dispatch.files,
                dispatch.bytes,
            ));
        }

        fn succeeded(&self, task: u32, response: &UploadResponse) {
            self.events
                .borrow_mut()
                .push(Reported::Succeeded(task, response.status));
        }

        fn failed(&self, task: u32, error: &UploadError) {
            self.events
                .borrow_mut()
                .push(Reported::Failed(task, error.clone()));
        }

        fn cancelled(&self, task: u32) {
            self.events.borrow_mut().push(Reported::Cancelled(task));
        }

        fn discarded(&self, task: u32) {
            self.events.borrow_mut().push(Reported::Discarded(task));
        }
    }

    type TestRelay = FormUploadRelay<MockTransport, LocalSpawner, RecordingReporter>;

    fn relay(pool: &LocalPool, transport: MockTransport) -> TestRelay {
        FormUploadRelay::new(
            RelayConfig::new(ENDPOINT, FIELD),
            transport,
            pool.spawner(),
            RecordingReporter::default(),
        )
    }

    fn status(status: u16, status_text: &str) -> Result<UploadResponse, TransportError> {
        Ok(UploadResponse {
            status,
            status_text: status_text.to_string(),
        })
    }

    #[test]
    fn uploads_every_file_input_in_dom_order() {
        let mut pool = LocalPool::new();
        let relay = relay(&pool, MockTransport::answering(vec![status(200, "OK")]));

        let form = MockForm::default()
            .with_files(&["iris.xml"])
            .with_files(&["wine.xml", "digits.xml"])
            .with_files(&["cars.json"]);
        let event = MockEvent::new(Some(form));

        let task = relay.handle(&event).expect("dispatched");
        pool.run_until_stalled();

        let requests = relay.transport().requests.borrow();
        assert_eq!(requests.len(), 1);

        let request = &requests[0];
        assert_eq!(request.url, ENDPOINT);
        assert_eq!(request.field, FIELD);
        assert_eq!(request.payload.len(), 3);
        assert_eq!(
            request.payload.files().map(|f| f.0).collect::<Vec<_>>(),
            vec!["iris.xml", "wine.xml", "digits.xml", "cars.json"]
        );

        let id = task.id();
        assert_eq!(
            relay.reporter().events(),
            vec![
                Reported::Collected(id, vec![1, 2, 1]),
                Reported::Dispatched(id, 4, 35),
                Reported::Succeeded(id, 200),
            ]
        );
        assert!(matches!(task.state(), TaskState::Succeeded(_)));
    }

    #[test]
    fn form_without_dataset_still_uploads() {
        let mut pool = LocalPool::new();
        let relay = relay(&pool, MockTransport::answering(vec![status(204, "No Content")]));

        let form = MockForm::default()
            .with(
                FIELD,
                InputSnapshot {
                    input_type: String::from("text"),
                    files: Vec::new(),
                },
            )
            .with("avatar", InputSnapshot::file(vec![MockFile("me.png")]));
        let event = MockEvent::new(Some(form));

        let task = relay.handle(&event).expect("dispatched");
        pool.run_until_stalled();

        let requests = relay.transport().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].payload.is_empty());

        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Collected(..))),
            0
        );
        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Succeeded(..))),
            1
        );
        assert!(matches!(task.state(), TaskState::Succeeded(_)));
    }

    #[test]
    fn native_submission_is_always_prevented() {
        let pool = LocalPool::new();
        let relay = relay(&pool, MockTransport::default());

        let with_form = MockEvent::new(Some(MockForm::default().with_files(&["a.xml"])));
        let without_form = MockEvent::new(None);

        relay.handle(&with_form).expect("dispatched");
        let result = relay.handle(&without_form);

        assert_eq!(with_form.prevented.get(), 1);
        assert_eq!(without_form.prevented.get(), 1);
        assert!(matches!(result, Err(RelayError::NoForm)));
        assert_eq!(relay.transport().requests.borrow().len(), 1);
    }

    #[test]
    fn error_status_reports_failure_once() {
        let mut pool = LocalPool::new();
        let relay = relay(
            &pool,
            MockTransport::answering(vec![status(500, "Internal Server Error")]),
        );

        let task = relay
            .handle(&MockEvent::new(Some(MockForm::default().with_files(&["a.xml"]))))
            .expect("dispatched");
        pool.run_until_stalled();

        let expected = UploadError::Status {
            status: 500,
            status_text: String::from("Internal Server Error"),
        };
        assert_eq!(task.state(), TaskState::Failed(expected.clone()));
        assert_eq!(
            relay
                .reporter()
                .count(|e| *e == Reported::Failed(task.id(), expected.clone())),
            1
        );
        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Succeeded(..))),
            0
        );
    }

    #[test]
    fn transport_error_reports_failure_once() {
        let mut pool = LocalPool::new();
        let network = TransportError::Network {
            why: String::from("TypeError: Failed to fetch"),
        };
        let relay = relay(&pool, MockTransport::answering(vec![Err(network.clone())]));

        let task = relay
            .handle(&MockEvent::new(Some(MockForm::default())))
            .expect("dispatched");
        pool.run_until_stalled();

        assert_eq!(
            task.state(),
            TaskState::Failed(UploadError::Transport(network))
        );
        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Failed(..))),
            1
        );
        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Succeeded(..))),
            0
        );
    }

    #[test]
    fn double_submission_sends_two_requests() {
        let mut pool = LocalPool::new();
        let relay = relay(
            &pool,
            MockTransport::answering(vec![status(200, "OK"), status(200, "OK")]),
        );
        let event = MockEvent::new(Some(MockForm::default().with_files(&["a.xml"])));

        let first = relay.handle(&event).expect("dispatched");
        let second = relay.handle(&event).expect("dispatched");
        assert_eq!(relay.in_flight().len(), 2);

        pool.run_until_stalled();

        assert_ne!(first.id(), second.id());
        assert_eq!(relay.transport().requests.borrow().len(), 2);
        assert_eq!(
            relay.reporter().count(|e| matches!(e, Reported::Succeeded(..))),
            2
        );
        assert!(relay.in_flight().is_empty());
    }

    #[test]
    fn cancelled_upload_reports_neither_outcome() {
        let mut pool = LocalPool::new();
        let relay = relay(&pool, MockTransport::default());

        let task = relay
            .handle(&MockEvent::new(Some(MockForm::default().with_files(&["a.xml"]))))
            .expect("dispatched");
        pool.run_until_stalled();
        assert_eq!(task.state(), TaskState::Pending);

        assert!(task.cancel());
        pool.run_until_stalled();

        assert_eq!(block_on(task.wait()), TaskState::Cancelled);
        assert_eq!(relay.transport().dropped.get(), 1);
        assert_eq!(
            relay.reporter().count(|e| *e == Reported::Cancelled(task.id())),
            1
        );
        assert_eq!(
            relay
                .reporter()
                .count(|e| matches!(e, Reported::Succeeded(..) | Reported::Failed(..))),
            0
        );
    }

    #[test]
    fn cancel_all_only_counts_pending_uploads() {
        let mut pool = LocalPool::new();
        let relay = relay(&pool, MockTransport::answering(vec![status(200, "OK")]));
        let event = MockEvent::new(Some(MockForm::default()));

        let done = relay.handle(&event).expect("dispatched");
        let pending = relay.handle(&event).expect("dispatched");
        pool.run_until_stalled();

        assert!(done.is_finished());
        assert_eq!(relay.in_flight().len(), 1);
        assert_eq!(relay.cancel_all(), 1);
        pool.run_until_stalled();

        assert_eq!(pending.state(), TaskState::Cancelled);
        assert!(relay.in_flight().is_empty());
    }

    /// Drives spawned futures to completion before returning.
    struct InlineSpawner;

    impl LocalSpawn for InlineSpawner {
        fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            block_on(future);
            Ok(())
        }
    }

    struct ShutdownSpawner;

    impl LocalSpawn for ShutdownSpawner {
        fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            Err(SpawnError::shutdown())
        }
    }

    #[test]
    fn dispatch_is_reported_before_an_inline_outcome() {
        let relay = FormUploadRelay::new(
            RelayConfig::new(ENDPOINT, FIELD),
            MockTransport::answering(vec![status(200, "OK")]),
            InlineSpawner,
            RecordingReporter::default(),
        );

        let task = relay
            .handle(&MockEvent::new(Some(MockForm::default().with_files(&["a.xml"]))))
            .expect("dispatched");

        let id = task.id();
        assert_eq!(
            relay.reporter().events(),
            vec![
                Reported::Collected(id, vec![1]),
                Reported::Dispatched(id, 1, 5),
                Reported::Succeeded(id, 200),
            ]
        );
        assert!(task.is_finished());
        assert!(relay.in_flight().is_empty());
    }

    #[test]
    fn refused_spawn_discards_the_dispatch() {
        let relay = FormUploadRelay::new(
            RelayConfig::new(ENDPOINT, FIELD),
            MockTransport::answering(vec![status(200, "OK")]),
            ShutdownSpawner,
            RecordingReporter::default(),
        );

        let result = relay.handle(&MockEvent::new(Some(MockForm::default())));

        assert!(matches!(result, Err(RelayError::Spawn(_))));

        let events = relay.reporter().events();
        assert_eq!(events.len(), 2);
        let Reported::Dispatched(id, 0, 0) = &events[0] else {
            panic!("expected a dispatch first, got {events:?}");
        };
        assert_eq!(events[1], Reported::Discarded(*id));
        assert!(relay.in_flight().is_empty());
    }
}
