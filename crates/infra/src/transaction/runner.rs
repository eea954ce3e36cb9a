use futures::future::BoxFuture;
use tracing::{Instrument, Span, debug, field, info_span, warn};

use super::retry::RetryPolicy;
use super::session::{RetryPhase, Session, SessionSource, StorageError, TransactionOptions, TransientFailure};

/// Runs a unit of work inside a snapshot/majority transaction.
///
/// The unit of work is rerun on transient errors and the commit is re-sent on
/// ambiguous results, each within the bounds of the [`RetryPolicy`]. Every
/// other error aborts the transaction and reaches the caller unchanged. The
/// session is ended exactly once whatever the outcome, including when the
/// caller drops the future or the work panics.
#[derive(Debug, Clone)]
pub struct TransactionRunner<S> {
    source: S,
    policy: RetryPolicy,
    options: TransactionOptions,
}

impl<S> TransactionRunner<S>
where
    S: SessionSource,
{
    pub fn new(source: S) -> Self {
        Self::with_policy(source, RetryPolicy::default())
    }

    pub fn with_policy(source: S, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            options: TransactionOptions::default(),
        }
    }

    /// Override the read/write concerns requested on every start.
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `work` transactionally.
    ///
    /// `work` may be invoked more than once, so it must only touch storage
    /// through the session it is handed.
    pub async fn with_transaction<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        T: Send,
        E: From<StorageError> + TransientFailure + std::fmt::Display + Send,
        F: for<'s> FnMut(&'s mut S::Session) -> BoxFuture<'s, Result<T, E>> + Send,
    {
        let span = info_span!("transaction", attempt = field::Empty);
        async move {
            let mut guard = SessionGuard::new(self.source.start_session().await?);
            let outcome = match guard.session.as_mut() {
                Some(session) => self.attempt_loop(session, &mut work).await,
                None => Err(E::from(StorageError::Backend("session already released".to_string()))),
            };
            guard.release().await;
            outcome
        }
        .instrument(span)
        .await
    }

    async fn attempt_loop<T, E, F>(&self, session: &mut S::Session, work: &mut F) -> Result<T, E>
    where
        T: Send,
        E: From<StorageError> + TransientFailure + std::fmt::Display + Send,
        F: for<'s> FnMut(&'s mut S::Session) -> BoxFuture<'s, Result<T, E>> + Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            Span::current().record("attempt", attempt);
            session.start_transaction(&self.options)?;

            let failure: E = match work(&mut *session).await {
                Ok(value) => match self.commit_loop(session).await {
                    Ok(()) => {
                        debug!(attempt, "transaction committed");
                        return Ok(value);
                    }
                    Err(e) => E::from(e),
                },
                Err(e) => e,
            };

            abort_quietly(session).await;

            if !failure.is_transient() {
                return Err(failure);
            }
            if attempt >= max_attempts {
                warn!(attempt, error = %failure, "transaction retry budget exhausted");
                return Err(E::from(StorageError::RetriesExhausted {
                    phase: RetryPhase::UnitOfWork,
                    attempts: attempt,
                    last: failure.to_string(),
                }));
            }

            let delay = self.policy.delay_for_attempt(attempt);
            warn!(attempt, delay_ms = delay.as_millis() as u64, error = %failure, "retrying transaction");
            sleep(delay).await;
        }
    }

    async fn commit_loop(&self, session: &mut S::Session) -> Result<(), StorageError> {
        let max_attempts = self.policy.max_commit_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match session.commit_transaction().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_unknown_commit_result() => {
                    if attempt >= max_attempts {
                        return Err(StorageError::RetriesExhausted {
                            phase: RetryPhase::Commit,
                            attempts: attempt,
                            last: e.to_string(),
                        });
                    }
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(attempt, error = %e, "commit result unknown, re-sending commit");
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Owns the session for one `with_transaction` call.
///
/// `release` ends it in line. If the guard is dropped first (the caller's
/// future was cancelled or the work panicked) the session is aborted and ended
/// on a spawned task instead.
struct SessionGuard<S: Session> {
    session: Option<S>,
}

impl<S: Session> SessionGuard<S> {
    fn new(session: S) -> Self {
        Self { session: Some(session) }
    }

    async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            session.end_session().await;
        }
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("transaction dropped before completion; releasing session");
                handle.spawn(async move {
                    abort_quietly(&mut session).await;
                    session.end_session().await;
                });
            }
            Err(_) => warn!("transaction dropped outside a runtime; session not released"),
        }
    }
}

async fn abort_quietly<S: Session>(session: &mut S) {
    if let Err(e) = session.abort_transaction().await {
        warn!(error = %e, "abort failed; propagating original error");
    }
}

async fn sleep(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use fundcrm_core::{CoreError, ErrorKind};

    use crate::transaction::TxnError;

    #[derive(Debug, Default)]
    struct Calls {
        starts: u32,
        commits: u32,
        aborts: u32,
        ends: u32,
        commit_script: VecDeque<Result<(), StorageError>>,
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        calls: Arc<Mutex<Calls>>,
    }

    impl ScriptedSource {
        fn with_commits(script: Vec<Result<(), StorageError>>) -> Self {
            let source = Self::default();
            source.calls.lock().unwrap().commit_script = script.into();
            source
        }

        fn snapshot(&self) -> (u32, u32, u32, u32) {
            let c = self.calls.lock().unwrap();
            (c.starts, c.commits, c.aborts, c.ends)
        }
    }

    struct ScriptedSession {
        calls: Arc<Mutex<Calls>>,
    }

    #[async_trait::async_trait]
    impl Session for ScriptedSession {
        fn start_transaction(&mut self, options: &TransactionOptions) -> Result<(), StorageError> {
            assert_eq!(*options, TransactionOptions::default());
            self.calls.lock().unwrap().starts += 1;
            Ok(())
        }

        async fn commit_transaction(&mut self) -> Result<(), StorageError> {
            let mut c = self.calls.lock().unwrap();
            c.commits += 1;
            c.commit_script.pop_front().unwrap_or(Ok(()))
        }

        async fn abort_transaction(&mut self) -> Result<(), StorageError> {
            self.calls.lock().unwrap().aborts += 1;
            Ok(())
        }

        async fn end_session(&mut self) {
            self.calls.lock().unwrap().ends += 1;
        }
    }

    #[async_trait::async_trait]
    impl SessionSource for ScriptedSource {
        type Session = ScriptedSession;

        async fn start_session(&self) -> Result<ScriptedSession, StorageError> {
            Ok(ScriptedSession {
                calls: self.calls.clone(),
            })
        }
    }

    fn runner(source: ScriptedSource) -> TransactionRunner<ScriptedSource> {
        TransactionRunner::with_policy(source, RetryPolicy::immediate(3, 3))
    }

    #[tokio::test]
    async fn success_commits_once_and_releases() {
        let source = ScriptedSource::default();
        let out: Result<u32, TxnError> = runner(source.clone())
            .with_transaction(|_s| Box::pin(async { Ok::<u32, TxnError>(7) }))
            .await;

        assert_eq!(out.unwrap(), 7);
        assert_eq!(source.snapshot(), (1, 1, 0, 1));
    }

    #[tokio::test]
    async fn transient_work_error_is_retried_from_scratch() {
        let source = ScriptedSource::default();
        let mut runs = 0u32;
        let out: Result<&str, TxnError> = runner(source.clone())
            .with_transaction(|_s| {
                runs += 1;
                let first = runs == 1;
                Box::pin(async move {
                    if first {
                        Err(TxnError::from(StorageError::Transient("write conflict".into())))
                    } else {
                        Ok::<&str, TxnError>("done")
                    }
                })
            })
            .await;

        assert_eq!(out.unwrap(), "done");
        assert_eq!(runs, 2);
        // two starts, one commit, one abort, one release
        assert_eq!(source.snapshot(), (2, 1, 1, 1));
    }

    #[tokio::test]
    async fn non_transient_error_aborts_and_propagates_unchanged() {
        let source = ScriptedSource::default();
        let out: Result<(), TxnError> = runner(source.clone())
            .with_transaction(|_s| Box::pin(async { Err::<(), TxnError>(CoreError::validation("amount must be positive").into()) }))
            .await;

        match out.unwrap_err() {
            TxnError::Core(e) => {
                assert_eq!(e.kind(), ErrorKind::Validation);
                assert_eq!(e.message(), "amount must be positive");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.snapshot(), (1, 0, 1, 1));
    }

    #[tokio::test]
    async fn ambiguous_commit_is_resent_without_rerunning_work() {
        let source = ScriptedSource::with_commits(vec![
            Err(StorageError::UnknownCommitResult("timeout".into())),
            Err(StorageError::UnknownCommitResult("timeout".into())),
            Ok(()),
        ]);
        let mut runs = 0u32;
        let out: Result<(), TxnError> = runner(source.clone())
            .with_transaction(|_s| {
                runs += 1;
                Box::pin(async { Ok::<(), TxnError>(()) })
            })
            .await;

        assert!(out.is_ok());
        assert_eq!(runs, 1);
        assert_eq!(source.snapshot(), (1, 3, 0, 1));
    }

    #[tokio::test]
    async fn exhausted_commit_budget_is_not_transient() {
        let source = ScriptedSource::with_commits(vec![
            Err(StorageError::UnknownCommitResult("timeout".into())),
            Err(StorageError::UnknownCommitResult("timeout".into())),
            Err(StorageError::UnknownCommitResult("timeout".into())),
        ]);
        let out: Result<(), TxnError> = runner(source.clone())
            .with_transaction(|_s| Box::pin(async { Ok::<(), TxnError>(()) }))
            .await;

        match out.unwrap_err() {
            TxnError::Storage(StorageError::RetriesExhausted { phase, attempts, .. }) => {
                assert_eq!(phase, RetryPhase::Commit);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.snapshot(), (1, 3, 1, 1));
    }

    #[tokio::test]
    async fn transient_commit_failure_reruns_the_unit() {
        let source = ScriptedSource::with_commits(vec![Err(StorageError::Transient("conflict".into())), Ok(())]);
        let mut runs = 0u32;
        let out: Result<u32, TxnError> = runner(source.clone())
            .with_transaction(|_s| {
                runs += 1;
                let n = runs;
                Box::pin(async move { Ok::<u32, TxnError>(n) })
            })
            .await;

        assert_eq!(out.unwrap(), 2);
        assert_eq!(source.snapshot(), (2, 2, 1, 1));
    }

    #[tokio::test]
    async fn persistent_transient_errors_exhaust_the_budget() {
        let source = ScriptedSource::default();
        let out: Result<(), TxnError> = runner(source.clone())
            .with_transaction(|_s| Box::pin(async { Err::<(), TxnError>(StorageError::Transient("conflict".into()).into()) }))
            .await;

        let err = out.unwrap_err();
        assert!(!err.is_transient());
        match err {
            TxnError::Storage(StorageError::RetriesExhausted { phase, attempts, .. }) => {
                assert_eq!(phase, RetryPhase::UnitOfWork);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // every attempt aborted, session released once
        assert_eq!(source.snapshot(), (3, 0, 3, 1));
    }

    async fn wait_for_release(source: &ScriptedSource) {
        for _ in 0..100 {
            if source.snapshot().3 > 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn cancelled_transaction_still_releases_session() {
        let source = ScriptedSource::default();
        let runner = runner(source.clone());

        let out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            runner.with_transaction(|_s| {
                Box::pin(async {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    Ok::<(), TxnError>(())
                })
            }),
        )
        .await;
        assert!(out.is_err());

        wait_for_release(&source).await;
        // started, never committed, aborted and ended exactly once
        assert_eq!(source.snapshot(), (1, 0, 1, 1));
    }

    #[tokio::test]
    async fn panicking_work_still_releases_session() {
        let source = ScriptedSource::default();
        let runner = runner(source.clone());

        let joined = tokio::spawn(async move {
            runner
                .with_transaction(|_s| {
                    Box::pin(async {
                        if true {
                            panic!("work blew up");
                        }
                        Ok::<(), TxnError>(())
                    })
                })
                .await
        })
        .await;
        assert!(joined.unwrap_err().is_panic());

        wait_for_release(&source).await;
        assert_eq!(source.snapshot(), (1, 0, 1, 1));
    }

    #[tokio::test]
    async fn completed_transaction_is_not_released_twice() {
        let source = ScriptedSource::default();
        let out: Result<u32, TxnError> = runner(source.clone())
            .with_transaction(|_s| Box::pin(async { Ok::<u32, TxnError>(1) }))
            .await;
        assert!(out.is_ok());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(source.snapshot(), (1, 1, 0, 1));
    }

    #[derive(Clone, Default)]
    struct SpanLog {
        spans: Arc<Mutex<Vec<&'static str>>>,
        attempts: Arc<Mutex<Vec<u64>>>,
    }

    struct AttemptVisitor(Arc<Mutex<Vec<u64>>>);

    impl tracing::field::Visit for AttemptVisitor {
        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            if field.name() == "attempt" {
                self.0.lock().unwrap().push(value);
            }
        }

        fn record_debug(&mut self, _: &tracing::field::Field, _: &dyn std::fmt::Debug) {}
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanLog {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _: &tracing::span::Id,
            _: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.spans.lock().unwrap().push(attrs.metadata().name());
        }

        fn on_record(
            &self,
            _: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            _: tracing_subscriber::layer::Context<'_, S>,
        ) {
            values.record(&mut AttemptVisitor(self.attempts.clone()));
        }
    }

    #[tokio::test]
    async fn each_attempt_is_recorded_on_the_transaction_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let log = SpanLog::default();
        let _default = tracing::subscriber::set_default(tracing_subscriber::registry().with(log.clone()));

        let source = ScriptedSource::with_commits(vec![Err(StorageError::Transient("conflict".into())), Ok(())]);
        let out: Result<(), TxnError> = runner(source)
            .with_transaction(|_s| Box::pin(async { Ok::<(), TxnError>(()) }))
            .await;
        assert!(out.is_ok());

        assert!(log.spans.lock().unwrap().contains(&"transaction"));
        assert_eq!(*log.attempts.lock().unwrap(), vec![1, 2]);
    }
}
