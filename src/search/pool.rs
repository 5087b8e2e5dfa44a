//! The task queue behind the speculative worker pool.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

struct Inner<T> {
    tasks: VecDeque<Arc<T>>,
    stop: bool,
}

/// A mutex+condvar work queue. Workers block in [`next_task`] until a task
/// arrives or the queue is stopped.
///
/// [`next_task`]: TaskQueue::next_task
pub(crate) struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    cond: Condvar,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        TaskQueue {
            inner: Mutex::new(Inner {
                tasks: VecDeque::new(),
                stop: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Append a task and wake one waiting worker.
    pub fn enqueue(&self, task: Arc<T>) {
        let mut inner = self.inner.lock().unwrap();
        inner.tasks.push_back(task);
        self.cond.notify_one();
    }

    /// Block until a task is available. Returns `None` once the queue has
    /// been stopped, telling the worker to exit.
    pub fn next_task(&self) -> Option<Arc<T>> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.stop {
                return None;
            }
            if let Some(task) = inner.tasks.pop_front() {
                return Some(task);
            }
            inner = self.cond.wait(inner).unwrap();
        }
    }

    /// Set the stop flag and wake every waiter.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.stop = true;
        self.cond.notify_all();
    }
}
