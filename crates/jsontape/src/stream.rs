//! Batched streaming: parse a concatenation of documents in windows.
//!
//! The input is sliced into `batch_size` windows; stage 1 indexes a window
//! (trimming back to the last complete document), stage 2 then parses one
//! document per [`DocumentStream::next`] call. A document cut off by the
//! window boundary is retried at the start of the next window.
//!
//! With the `threads` feature (default), a single worker thread runs stage 1
//! of window N+1 while the caller runs stage 2 over window N. The rendezvous
//! is one mutex/condvar slot; two structural-index buffers alternate between
//! the caller and the worker so the stages never contend on one allocation.
//! Dropping the stream joins the worker.

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::padded::PaddedString;
use crate::parser::Parser;
use crate::stage1::{self, Stage1Mode};
use crate::stage2;

/// Windows smaller than this are not worth the bookkeeping; `parse_many`
/// silently clamps up.
pub const MINIMAL_BATCH_SIZE: usize = 32;

/// A sensible window size for multi-megabyte streams.
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// Streaming parser over many concatenated documents. Produced by
/// [`Parser::parse_many`]; documents are pulled with [`next`](Self::next).
pub struct DocumentStream<'p> {
    parser: &'p mut Parser,
    input: &'p PaddedString,
    batch_size: usize,
    batch_start: usize,
    doc_index: usize,
    started: bool,
    finished: bool,
    failed: Option<Error>,
    #[cfg(feature = "threads")]
    worker: Option<Worker>,
}

impl<'p> DocumentStream<'p> {
    pub(crate) fn new(
        parser: &'p mut Parser,
        input: &'p PaddedString,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(MINIMAL_BATCH_SIZE);
        parser.check_capacity(batch_size.min(input.len()))?;
        Ok(Self {
            parser,
            input,
            batch_size,
            batch_start: 0,
            doc_index: 0,
            started: false,
            finished: false,
            failed: None,
            #[cfg(feature = "threads")]
            worker: None,
        })
    }

    /// The next document, `None` at end of stream. Errors are yielded once
    /// and end the stream.
    #[allow(clippy::should_implement_trait)] // lending: Document borrows self
    pub fn next(&mut self) -> Option<Result<Document<'_>>> {
        if self.finished {
            return None;
        }
        let step = if self.started {
            self.advance_document()
        } else {
            self.started = true;
            self.start()
        };
        match step {
            Ok(()) => Some(Ok(Document {
                doc: &self.parser.doc,
            })),
            Err(Error::Empty) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                self.failed = Some(err);
                Some(Err(err))
            }
        }
    }

    /// Total input length in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.input.len()
    }

    /// Bytes at the end of the stream that belonged to no complete document:
    /// the truncated tail of the final window, or everything past the window
    /// start after a `Capacity` failure.
    #[must_use]
    pub fn truncated_bytes(&self) -> usize {
        if self.failed == Some(Error::Capacity) {
            return self.input.len() - self.batch_start;
        }
        self.parser.stage1.truncated_bytes
    }

    /// Byte offset of the current document within the input.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.doc_index
    }

    /// The raw bytes of the current document, trailing separators trimmed.
    #[must_use]
    pub fn source(&self) -> &'p [u8] {
        let bytes = self.input.as_bytes();
        let next = self.parser.stage1.next;
        let end = if matches!(bytes.get(self.doc_index), Some(b'{' | b'[')) {
            // The last consumed structural is the document's closing brace.
            let close = self.parser.stage1.indexes[next.saturating_sub(1)] as usize;
            self.batch_start + close + 1
        } else {
            // Scalar document: runs up to the next document's first
            // structural (or the window's consumed end), minus whitespace.
            let stop = self
                .parser
                .stage1
                .indexes
                .get(next)
                .map_or(self.parser.stage1.window_consumed, |&offset| {
                    offset as usize
                });
            let mut end = (self.batch_start + stop).min(bytes.len());
            while end > self.doc_index
                && matches!(bytes[end - 1], b' ' | b'\t' | b'\n' | b'\r' | b'\0')
            {
                end -= 1;
            }
            end
        };
        &bytes[self.doc_index..end.min(bytes.len())]
    }

    fn start(&mut self) -> Result<()> {
        self.batch_start = 0;
        self.load_first_window()?;
        #[cfg(feature = "threads")]
        self.spawn_and_prime();
        self.advance_document()
    }

    /// Loads windows directly until one holds at least one document.
    fn load_first_window(&mut self) -> Result<()> {
        loop {
            match self.run_stage1_here(self.batch_start) {
                Ok(()) => return Ok(()),
                Err(Error::Empty) => {
                    let next = self.batch_start + self.parser.stage1.window_consumed;
                    if next >= self.input.len() || next <= self.batch_start {
                        return Err(Error::Empty);
                    }
                    self.batch_start = next;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn advance_document(&mut self) -> Result<()> {
        loop {
            if let Some(offset) = self.parser.stage1.peek() {
                self.doc_index = self.batch_start + offset as usize;
            }
            let window = &self.input.padded_bytes()[self.batch_start..];
            let max_depth = self.parser.max_depth();
            match stage2::build(
                window,
                &mut self.parser.stage1,
                &mut self.parser.doc,
                max_depth,
                false,
            ) {
                Ok(()) => return Ok(()),
                Err(Error::Empty) => self.next_window()?,
                Err(err) => return Err(err),
            }
        }
    }

    /// Advances to the next window holding at least one document.
    fn next_window(&mut self) -> Result<()> {
        loop {
            let next = self.batch_start + self.parser.stage1.window_consumed;
            if next >= self.input.len() || next <= self.batch_start {
                return Err(Error::Empty);
            }
            self.batch_start = next;
            match self.load_window() {
                Ok(()) => return Ok(()),
                Err(Error::Empty) => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Stage 1 for the window at `self.batch_start`: from the worker when it
    /// was primed for exactly this window, directly otherwise.
    fn load_window(&mut self) -> Result<()> {
        #[cfg(feature = "threads")]
        if let Some(worker) = self.worker.as_mut() {
            if worker.pending_for == Some(self.batch_start) {
                let outcome = worker.collect(&mut self.parser.stage1);
                match outcome {
                    Ok(()) | Err(Error::Empty) => {
                        let next = self.batch_start + self.parser.stage1.window_consumed;
                        self.prime_worker(next);
                    }
                    Err(_) => {}
                }
                return outcome;
            }
        }
        let outcome = self.run_stage1_here(self.batch_start);
        #[cfg(feature = "threads")]
        if matches!(outcome, Ok(()) | Err(Error::Empty)) {
            let next = self.batch_start + self.parser.stage1.window_consumed;
            self.prime_worker(next);
        }
        outcome
    }

    fn run_stage1_here(&mut self, batch_start: usize) -> Result<()> {
        let (len, mode) = self.window_extent(batch_start);
        stage1::index(
            &self.input.padded_bytes()[batch_start..],
            len,
            mode,
            &mut self.parser.stage1,
        )
    }

    fn window_extent(&self, batch_start: usize) -> (usize, Stage1Mode) {
        let remaining = self.input.len() - batch_start;
        if remaining <= self.batch_size {
            (remaining, Stage1Mode::StreamingFinal)
        } else {
            (self.batch_size, Stage1Mode::StreamingPartial)
        }
    }

    #[cfg(feature = "threads")]
    fn spawn_and_prime(&mut self) {
        let next = self.batch_start + self.parser.stage1.window_consumed;
        if next >= self.input.len() {
            return;
        }
        self.worker = Some(Worker::spawn());
        self.prime_worker(next);
    }

    #[cfg(feature = "threads")]
    fn prime_worker(&mut self, batch_start: usize) {
        if batch_start >= self.input.len() {
            if let Some(worker) = self.worker.as_mut() {
                worker.pending_for = None;
            }
            return;
        }
        let (len, mode) = self.window_extent(batch_start);
        if let Some(worker) = self.worker.as_mut() {
            worker.submit(
                &self.input.padded_bytes()[batch_start..batch_start + len],
                mode,
                batch_start,
            );
        }
    }
}

#[cfg(feature = "threads")]
mod worker {
    use std::sync::{Arc, Condvar, Mutex, MutexGuard};
    use std::thread::JoinHandle;

    use crate::error::Result;
    use crate::stage1::{self, Stage1Mode, StructuralIndex};

    struct Job {
        window: Vec<u8>,
        mode: Stage1Mode,
        buffers: StructuralIndex,
    }

    struct Outcome {
        verdict: Result<()>,
        buffers: StructuralIndex,
        window: Vec<u8>,
    }

    #[derive(Default)]
    struct Slot {
        job: Option<Job>,
        outcome: Option<Outcome>,
        shutdown: bool,
    }

    struct Rendezvous {
        slot: Mutex<Slot>,
        cond: Condvar,
    }

    impl Rendezvous {
        fn lock(&self) -> MutexGuard<'_, Slot> {
            match self.slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }

        fn wait<'a>(&self, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
            match self.cond.wait(guard) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }

    /// One helper thread running stage 1 one window ahead. The window bytes
    /// are copied into the job so the thread borrows nothing from the
    /// caller; the structural buffers and the window allocation shuttle
    /// back and forth, so steady state allocates nothing.
    pub(super) struct Worker {
        shared: Arc<Rendezvous>,
        handle: Option<JoinHandle<()>>,
        /// The window the in-flight job is indexing, if any.
        pub(super) pending_for: Option<usize>,
        spare: StructuralIndex,
        window_pool: Vec<u8>,
    }

    impl Worker {
        pub(super) fn spawn() -> Self {
            let shared = Arc::new(Rendezvous {
                slot: Mutex::new(Slot::default()),
                cond: Condvar::new(),
            });
            let thread_shared = Arc::clone(&shared);
            let handle = std::thread::spawn(move || run(&thread_shared));
            Self {
                shared,
                handle: Some(handle),
                pending_for: None,
                spare: StructuralIndex::default(),
                window_pool: Vec::new(),
            }
        }

        /// Hands the worker a window to index. One job at a time; callers
        /// collect the previous result first.
        pub(super) fn submit(&mut self, window: &[u8], mode: Stage1Mode, batch_start: usize) {
            let mut copy = std::mem::take(&mut self.window_pool);
            copy.clear();
            copy.extend_from_slice(window);
            let job = Job {
                window: copy,
                mode,
                buffers: std::mem::take(&mut self.spare),
            };
            self.shared.lock().job = Some(job);
            self.shared.cond.notify_all();
            self.pending_for = Some(batch_start);
        }

        /// Blocks until the in-flight job finishes, swaps its buffers into
        /// `target`, and returns the stage-1 verdict.
        pub(super) fn collect(&mut self, target: &mut StructuralIndex) -> Result<()> {
            let outcome = {
                let mut slot = self.shared.lock();
                loop {
                    if let Some(outcome) = slot.outcome.take() {
                        break outcome;
                    }
                    slot = self.shared.wait(slot);
                }
            };
            self.pending_for = None;
            let mut buffers = outcome.buffers;
            std::mem::swap(target, &mut buffers);
            self.spare = buffers;
            self.window_pool = outcome.window;
            outcome.verdict
        }
    }

    impl Drop for Worker {
        fn drop(&mut self) {
            self.shared.lock().shutdown = true;
            self.shared.cond.notify_all();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn run(shared: &Rendezvous) {
        loop {
            let job = {
                let mut slot = shared.lock();
                loop {
                    if slot.shutdown {
                        return;
                    }
                    if let Some(job) = slot.job.take() {
                        break job;
                    }
                    slot = shared.wait(slot);
                }
            };
            let Job {
                window,
                mode,
                mut buffers,
            } = job;
            let verdict = stage1::index(&window, window.len(), mode, &mut buffers);
            shared.lock().outcome = Some(Outcome {
                verdict,
                buffers,
                window,
            });
            shared.cond.notify_all();
        }
    }
}

#[cfg(feature = "threads")]
use worker::Worker;
