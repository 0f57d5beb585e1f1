use futures::future::{BoxFuture, FutureExt, join_all};

/// Independent side effects joined once at the end.
///
/// Each task is registered either as propagating (its error is returned from
/// [`TaskSet::join`]) or as captured (its error goes to a handler and the task
/// counts as settled). All tasks run concurrently on the caller's task.
pub(crate) struct TaskSet<'a, E> {
    tasks: Vec<BoxFuture<'a, Result<(), E>>>,
}

impl<'a, E: Send + 'a> TaskSet<'a, E> {
    pub(crate) fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn propagate<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.tasks.push(task.boxed());
    }

    pub(crate) fn capture<F, X, H>(&mut self, task: F, on_error: H)
    where
        F: Future<Output = Result<(), X>> + Send + 'a,
        H: FnOnce(X) + Send + 'a,
    {
        self.tasks.push(
            async move {
                if let Err(err) = task.await {
                    on_error(err);
                }
                Ok(())
            }
            .boxed(),
        );
    }

    /// Waits for every task and returns the first propagated error in registration order.
    pub(crate) async fn join(self) -> Result<(), E> {
        join_all(self.tasks).await.into_iter().collect()
    }
}
