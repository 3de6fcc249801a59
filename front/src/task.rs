use {
    crate::{error::UploadError, transport::UploadResponse},
    futures::{
        channel::oneshot,
        future::{AbortHandle, FutureExt as _, LocalBoxFuture, Shared},
        task::{LocalFutureObj, LocalSpawn, SpawnError},
    },
    std::{cell::RefCell, rc::Rc, sync::Mutex},
};

static CURRENT_ID: Mutex<u32> = Mutex::new(0);

pub(crate) fn new_id() -> u32 {
    let mut guard = CURRENT_ID.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard += 1;
    *guard - 1
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Succeeded(UploadResponse),
    Failed(UploadError),
    Cancelled,
}

impl TaskState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

/// Handle to one dispatched upload.
///
/// Clones share the same upload.
#[derive(Clone)]
pub struct UploadTask {
    id: u32,
    state: Rc<RefCell<TaskState>>,
    abort: AbortHandle,
    finished: Shared<LocalBoxFuture<'static, ()>>,
}

/// Driver side of an [`UploadTask`], owned by the spawned future.
pub(crate) struct Completion {
    state: Rc<RefCell<TaskState>>,
    done: oneshot::Sender<()>,
}

impl UploadTask {
    pub(crate) fn new(abort: AbortHandle) -> (Self, Completion) {
        let state = Rc::new(RefCell::new(TaskState::Pending));
        let (done, finished) = oneshot::channel();

        let task = Self {
            id: new_id(),
            state: state.clone(),
            abort,
            // A dropped sender still means the driver is gone
            finished: finished.map(|_| ()).boxed_local().shared(),
        };

        (task, Completion { state, done })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_finished()
    }

    /// Returns true if this call is the one that cancelled the upload.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.is_finished() {
            return false;
        }
        *state = TaskState::Cancelled;
        self.abort.abort();
        true
    }

    pub async fn wait(&self) -> TaskState {
        self.finished.clone().await;
        self.state()
    }
}

impl std::fmt::Debug for UploadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTask")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Completion {
    /// Records the outcome unless the task was cancelled in the meantime.
    ///
    /// Returns false when the outcome was dropped.
    pub(crate) fn finish(self, outcome: TaskState) -> bool {
        let recorded = {
            let mut state = self.state.borrow_mut();
            if state.is_finished() {
                false
            } else {
                *state = outcome;
                true
            }
        };
        let _ = self.done.send(());
        recorded
    }

    pub(crate) fn cancelled(self) {
        *self.state.borrow_mut() = TaskState::Cancelled;
        let _ = self.done.send(());
    }
}

/// Runs futures on the browser's microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
