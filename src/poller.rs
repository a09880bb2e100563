//! Polls queued jobs to completion and downloads results.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::KreaError;
use crate::model::Engine;
use crate::ports::krea_api::{ApiFuture, Download, JobHandle, JobStatus, KreaApi, Submission};

/// Timing for one kind of job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks.
    pub interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
    /// Retries of a transiently failing request.
    pub retries: u32,
    /// Delay before each retry.
    pub retry_delay: Duration,
}

impl PollPolicy {
    const RETRIES: u32 = 3;
    const RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Image generation and edits.
    #[must_use]
    pub const fn for_generation() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
            retries: Self::RETRIES,
            retry_delay: Self::RETRY_DELAY,
        }
    }

    /// Upscales with `engine`. Bloom is slower and polled less often.
    #[must_use]
    pub const fn for_engine(engine: Engine) -> Self {
        match engine {
            Engine::Topaz => Self::for_generation(),
            Engine::Bloom => Self {
                interval: Duration::from_secs(5),
                timeout: Duration::from_secs(300),
                retries: Self::RETRIES,
                retry_delay: Self::RETRY_DELAY,
            },
        }
    }
}

/// Result URLs of a submission, polling first if it was queued.
///
/// # Errors
///
/// See [`wait_for_job`].
pub async fn result_urls(
    api: &dyn KreaApi,
    submission: Submission,
    policy: &PollPolicy,
) -> Result<Vec<String>, KreaError> {
    match submission {
        Submission::Immediate { urls } if urls.is_empty() => Err(KreaError::Api {
            status: 200,
            message: "request completed without result URLs".to_string(),
        }),
        Submission::Immediate { urls } => Ok(urls),
        Submission::Job(handle) => wait_for_job(api, &handle, policy).await,
    }
}

/// Poll `handle` until it succeeds, fails or runs out of time.
///
/// # Errors
///
/// Returns [`KreaError::JobFailed`] for failed jobs,
/// [`KreaError::Timeout`] when the policy's timeout passes, and
/// [`KreaError::Transient`] once retries are used up.
pub async fn wait_for_job(
    api: &dyn KreaApi,
    handle: &JobHandle,
    policy: &PollPolicy,
) -> Result<Vec<String>, KreaError> {
    let job_id = handle.job_id.as_str();
    let started = Instant::now();
    eprintln!("Waiting for job {job_id}...");

    loop {
        let job = with_retries(policy, "job status", || api.job(job_id)).await?;
        let elapsed = started.elapsed();
        tracing::debug!(job_id = %job.id, status = ?job.status, elapsed_secs = elapsed.as_secs(), "polled job");

        match job.status {
            JobStatus::Succeeded if job.result_urls.is_empty() => {
                return Err(KreaError::Api {
                    status: 200,
                    message: format!("job {job_id} completed without result URLs"),
                });
            }
            JobStatus::Succeeded => return Ok(job.result_urls),
            JobStatus::Failed => {
                return Err(KreaError::JobFailed {
                    job_id: job_id.to_string(),
                    message: job.error.unwrap_or_else(|| "no reason given".to_string()),
                });
            }
            JobStatus::Pending | JobStatus::Running => {}
        }

        if elapsed >= policy.timeout {
            return Err(KreaError::Timeout { job_id: job_id.to_string(), waited_secs: elapsed.as_secs() });
        }
        sleep(policy.interval).await;
    }
}

/// Download one result, retrying transient failures.
///
/// # Errors
///
/// Returns the last error once retries are used up.
pub async fn download(api: &dyn KreaApi, url: &str, policy: &PollPolicy) -> Result<Download, KreaError> {
    with_retries(policy, "download", || api.download(url)).await
}

async fn with_retries<'a, T>(
    policy: &PollPolicy,
    what: &str,
    mut call: impl FnMut() -> ApiFuture<'a, T>,
) -> Result<T, KreaError> {
    let mut attempt = 0;
    loop {
        match call().await {
            Err(e) if e.is_transient() && attempt < policy.retries => {
                attempt += 1;
                tracing::warn!("{what} failed: {e}; retry {attempt}/{}", policy.retries);
                sleep(policy.retry_delay).await;
            }
            Err(KreaError::Network(e)) => return Err(KreaError::Transient(e.to_string())),
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::ports::krea_api::{Job, SubmitRequest};

    #[derive(Default)]
    struct ScriptedApi {
        jobs: Mutex<VecDeque<Result<Job, KreaError>>>,
        downloads: Mutex<VecDeque<Result<Download, KreaError>>>,
        job_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn with_jobs(jobs: Vec<Result<Job, KreaError>>) -> Self {
            Self { jobs: Mutex::new(jobs.into()), ..Self::default() }
        }
    }

    impl KreaApi for ScriptedApi {
        fn submit(&self, _request: &SubmitRequest) -> ApiFuture<'_, Submission> {
            Box::pin(async { Err::<Submission, _>(KreaError::Api { status: 0, message: "submit is not scripted".into() }) })
        }

        fn job(&self, job_id: &str) -> ApiFuture<'_, Job> {
            self.job_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.jobs.lock().unwrap().pop_front();
            let job_id = job_id.to_string();
            Box::pin(async move { next.unwrap_or_else(|| Ok(job(&job_id, JobStatus::Running))) })
        }

        fn download(&self, _url: &str) -> ApiFuture<'_, Download> {
            let next = self.downloads.lock().unwrap().pop_front().expect("download scripted");
            Box::pin(async move { next })
        }
    }

    fn job(id: &str, status: JobStatus) -> Job {
        Job { id: id.into(), status, result_urls: Vec::new(), error: None }
    }

    fn succeeded(id: &str) -> Job {
        Job { result_urls: vec!["https://gen.krea.ai/out.png".into()], ..job(id, JobStatus::Succeeded) }
    }

    fn handle() -> JobHandle {
        JobHandle { job_id: "job-1".into() }
    }

    #[test]
    fn policies() {
        assert_eq!(PollPolicy::for_engine(Engine::Topaz), PollPolicy::for_generation());
        let bloom = PollPolicy::for_engine(Engine::Bloom);
        assert_eq!(bloom.interval, Duration::from_secs(5));
        assert_eq!(bloom.timeout, Duration::from_secs(300));
        assert_eq!(bloom.retries, 3);
    }

    #[tokio::test]
    async fn immediate_results_skip_polling() {
        let api = ScriptedApi::default();
        let urls = result_urls(
            &api,
            Submission::Immediate { urls: vec!["https://x/a.png".into()] },
            &PollPolicy::for_generation(),
        )
        .await
        .unwrap();
        assert_eq!(urls, vec!["https://x/a.png"]);
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn immediate_results_without_urls_are_an_error() {
        let api = ScriptedApi::default();
        let err = result_urls(&api, Submission::Immediate { urls: Vec::new() }, &PollPolicy::for_generation())
            .await
            .unwrap_err();
        assert!(matches!(err, KreaError::Api { status: 200, ref message } if message.contains("without result URLs")));
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_succeeded() {
        let api = ScriptedApi::with_jobs(vec![
            Ok(job("job-1", JobStatus::Pending)),
            Ok(job("job-1", JobStatus::Running)),
            Ok(succeeded("job-1")),
        ]);
        let urls = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap();
        assert_eq!(urls, vec!["https://gen.krea.ai/out.png"]);
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_reports_reason() {
        let mut failed = job("job-1", JobStatus::Failed);
        failed.error = Some("NSFW content detected".into());
        let api = ScriptedApi::with_jobs(vec![Ok(failed)]);
        let err = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap_err();
        assert!(matches!(
            err,
            KreaError::JobFailed { ref job_id, ref message }
                if job_id == "job-1" && message == "NSFW content detected"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_job_id() {
        let api = ScriptedApi::default();
        let policy = PollPolicy::for_generation();
        let err = wait_for_job(&api, &handle(), &policy).await.unwrap_err();
        match err {
            KreaError::Timeout { job_id, waited_secs } => {
                assert_eq!(job_id, "job-1");
                assert!(waited_secs >= 120);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 61);
    }

    #[tokio::test(start_paused = true)]
    async fn success_without_urls_is_an_error() {
        let api = ScriptedApi::with_jobs(vec![Ok(job("job-1", JobStatus::Succeeded))]);
        let err = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap_err();
        assert!(matches!(err, KreaError::Api { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_failures_are_retried() {
        let api = ScriptedApi::with_jobs(vec![
            Err(KreaError::Transient("HTTP 503".into())),
            Err(KreaError::Transient("HTTP 502".into())),
            Ok(succeeded("job-1")),
        ]);
        let urls = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap();
        assert_eq!(urls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let api = ScriptedApi::with_jobs((0..4).map(|_| Err(KreaError::Transient("HTTP 503".into()))).collect());
        let err = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap_err();
        assert!(matches!(err, KreaError::Transient(_)));
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_not_retried() {
        let api = ScriptedApi::with_jobs(vec![Err(KreaError::Auth("rejected".into()))]);
        let err = wait_for_job(&api, &handle(), &PollPolicy::for_generation()).await.unwrap_err();
        assert!(matches!(err, KreaError::Auth(_)));
        assert_eq!(api.job_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn download_retries_then_succeeds() {
        let api = ScriptedApi {
            downloads: Mutex::new(
                vec![
                    Err(KreaError::Transient("HTTP 500".into())),
                    Ok(Download { data: vec![1, 2, 3], content_type: Some("image/png".into()) }),
                ]
                .into(),
            ),
            ..ScriptedApi::default()
        };
        let download = download(&api, "https://x/a.png", &PollPolicy::for_generation()).await.unwrap();
        assert_eq!(download.data, vec![1, 2, 3]);
    }
}
